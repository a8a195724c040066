#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Outcome of one run of the dual active set engine, or of an inner
/// method standing in for it.
///
/// None of these are errors; the projection driver branches on them.

#[repr(u32)]
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DasaStatus {
    /// The dual iterate is optimal for the current active set.
    SolutionFound,
    /// An inner method asks for the factorization-based engine.
    SwitchToUpdateDowndate,
    /// Every constraint row has been dropped.
    AllRowsDropped,
    /// An inner method failed to make ascent.
    Nonascent,
    /// Sweep or outer round budget exhausted.
    MaxIterations,
}

impl DasaStatus {
    /// true when the current iterate can be accepted as a projection
    pub fn is_solution(&self) -> bool {
        matches!(
            *self,
            DasaStatus::SolutionFound | DasaStatus::AllRowsDropped
        )
    }
}

impl std::fmt::Display for DasaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
