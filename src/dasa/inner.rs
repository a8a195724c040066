use super::costmodel::CheapInnerAdvice;
use super::engine::DasaContext;
use super::status::DasaStatus;
use crate::algebra::*;

/// A cheaper iterative method that may stand in for a run of the engine,
/// such as coordinate ascent or SSOR sweeps on the dual.
///
/// The method works on the dual multipliers of the context through
/// [`DasaContext::dual_mut`] and must keep dropped rows at zero and
/// inequality multipliers on the side of their row.  Returning
/// [`SwitchToUpdateDowndate`](DasaStatus::SwitchToUpdateDowndate) or
/// [`Nonascent`](DasaStatus::Nonascent) hands control to the engine.
pub trait InnerMethod<T: FloatT> {
    fn name(&self) -> &'static str;

    fn run(&mut self, ctx: &mut DasaContext<T>, advice: CheapInnerAdvice) -> DasaStatus;
}
