#![allow(non_snake_case)]
//! The dual active set engine.
//!
//! The engine maximizes the dual of
//!
//! ```text
//! minimize    ½‖x - y‖²
//! subject to  bl ≤ A x ≤ bu,  lo ≤ x ≤ hi
//! ```
//!
//! over the rows in the active set, with a proximal term `-σ/2‖λ - λ₀‖²`
//! anchored at the dual `λ₀` held when a run starts.  The primal of a
//! dual `λ` is `x = y + Aᵀλ` on free columns and the bound on bound
//! columns.
//!
//! Within a run the dual is kept as `λ + dλ`, where `λ` is fixed at the
//! start of the run.  Per column the engine keeps a reference value (the
//! base primal value of a free column, or the bound of a bound column), a
//! running value `c` with `x = reference + c` on free columns, and `cold`,
//! the part of `c` not explained by the increments `dλ` of active rows.
//! The right hand side of the Newton system is
//!
//! ```text
//! rhs_i = bound_i - Σ_j a_ij·reference_j - Σ_{j∈F} a_ij·cold_j
//! ```
//!
//! and only changes when a column is freed or a row is dropped, so a
//! changed job can recompute its forward solve from the first changed row.

use super::activeset::{ActiveSet, BoundSide, ColumnStatus, RowStatus};
use super::costmodel::{CheapInnerAdvice, FlopHistory};
use super::heap::BreakHeap;
use super::info::{DasaInfo, DasaStats};
use super::linesearch::LineFlag;
use super::modify::ModificationLog;
use super::problem::ProjectionProblem;
use super::scheduler::{Job, JobScheduler};
use super::settings::{DasaSettings, SettingsError};
use super::solve::{back_solve, forward_solve};
use super::status::DasaStatus;
use crate::algebra::*;
use crate::factor::{FactorError, LdlFactor};
use crate::io::ConfigurablePrintTarget;
use crate::timers::*;
use log::{debug, trace};
use std::io::Write;
use thiserror::Error;

/// Error codes returnable from [`DasaContext`](DasaContext) construction
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DasaError {
    #[error("Bad settings: {0}")]
    Settings(#[from] SettingsError),
    #[error("Factorization setup failed: {0}")]
    Factor(#[from] FactorError),
}

// named scratch vectors, sized once
#[derive(Debug, Clone)]
pub(crate) struct Workspace<T> {
    // per column
    pub(crate) reference: Vec<T>,
    pub(crate) c: Vec<T>,
    pub(crate) cold: Vec<T>,
    pub(crate) pa: Vec<T>,
    // per row
    pub(crate) rhs: Vec<T>,
    pub(crate) fwd: Vec<T>,
    pub(crate) u: Vec<T>,
    pub(crate) t: Vec<T>,
    pub(crate) row_mask: Vec<bool>,
}

impl<T: FloatT> Workspace<T> {
    fn new(m: usize, n: usize) -> Self {
        Self {
            reference: vec![T::zero(); n],
            c: vec![T::zero(); n],
            cold: vec![T::zero(); n],
            pa: vec![T::zero(); n],
            rhs: vec![T::zero(); m],
            fwd: vec![T::zero(); m],
            u: vec![T::zero(); m],
            t: vec![T::zero(); m],
            row_mask: vec![false; m],
        }
    }
}

/// Explicit state of the engine for one projection problem.
///
/// A fresh context has every row dropped and every column free.  The
/// caller shapes the active set with [`add_row`](DasaContext::add_row),
/// [`bind_column`](DasaContext::bind_column) and
/// [`free_column`](DasaContext::free_column) and then calls
/// [`run_dasa`](DasaContext::run_dasa).
pub struct DasaContext<T: FloatT = f64> {
    pub(crate) prob: ProjectionProblem<T>,
    pub(crate) settings: DasaSettings<T>,
    pub(crate) sigma: T,

    pub(crate) set: ActiveSet,
    pub(crate) factor: LdlFactor<T>,
    // columns whose outer product is in the factor
    pub(crate) in_factor: Vec<bool>,

    pub(crate) lambda: Vec<T>,
    pub(crate) dlambda: Vec<T>,
    pub(crate) x: Vec<T>,
    pub(crate) work: Workspace<T>,

    pub(crate) heap: BreakHeap<T>,
    pub(crate) log: ModificationLog,
    pub(crate) flops: FlopHistory,
    pub(crate) scheduler: JobScheduler,

    pub(crate) info: DasaInfo,
    pub(crate) timers: Timers,
    pub(crate) status: Option<DasaStatus>,
}

impl<T> DasaContext<T>
where
    T: FloatT,
{
    pub fn new(prob: ProjectionProblem<T>, settings: DasaSettings<T>) -> Result<Self, DasaError> {
        settings.validate()?;
        let factor = LdlFactor::new(&prob.A, &prob.At)?;
        let (m, n) = (prob.nrows(), prob.ncols());

        let amax = prob.A.max_abs();
        let sigma = if settings.scale_sigma && amax > T::zero() {
            settings.sigma * amax * amax
        } else {
            settings.sigma
        };

        let x = prob.y.clone();
        let scheduler = JobScheduler::new(&prob.tree);

        Ok(Self {
            prob,
            settings,
            sigma,
            set: ActiveSet::new(m, n),
            factor,
            in_factor: vec![true; n],
            lambda: vec![T::zero(); m],
            dlambda: vec![T::zero(); m],
            x,
            work: Workspace::new(m, n),
            heap: BreakHeap::new(n + m),
            log: ModificationLog::new(),
            flops: FlopHistory::new(),
            scheduler,
            info: DasaInfo::new(),
            timers: Timers::default(),
            status: None,
        })
    }

    pub fn problem(&self) -> &ProjectionProblem<T> {
        &self.prob
    }

    pub fn settings(&self) -> &DasaSettings<T> {
        &self.settings
    }

    /// regularization in use, after scaling
    pub fn sigma(&self) -> T {
        self.sigma
    }

    pub fn active_set(&self) -> &ActiveSet {
        &self.set
    }

    pub fn factor(&self) -> &LdlFactor<T> {
        &self.factor
    }

    /// Dual multipliers, one per row.  Zero on dropped rows.
    pub fn dual(&self) -> &[T] {
        &self.lambda
    }

    /// Mutable dual multipliers for an inner method working between runs.
    /// Entries of dropped rows must stay zero and entries of inequality
    /// rows must keep the sign of their side.
    pub fn dual_mut(&mut self) -> &mut [T] {
        &mut self.lambda
    }

    /// Primal point of the current active set: `y + Aᵀλ` on free columns,
    /// the bound on bound columns.
    pub fn primal(&self) -> &[T] {
        &self.x
    }

    pub fn stats(&self) -> &DasaStats {
        &self.info.stats
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    /// status of the most recent run, `None` before the first
    pub fn last_status(&self) -> Option<DasaStatus> {
        self.status
    }

    /// Bring a dropped row into the active set at the given side.  An
    /// equality row always enters as such.  Returns false when the row is
    /// already active or the bound at that side is infinite.
    pub fn add_row(&mut self, row: usize, side: BoundSide) -> bool {
        if self.set.is_row_active(row) {
            return false;
        }
        let status = if self.prob.is_equality(row) {
            RowStatus::Equality
        } else {
            match side {
                BoundSide::Lower if self.prob.bl[row].is_finite() => RowStatus::AtLower,
                BoundSide::Upper if self.prob.bu[row].is_finite() => RowStatus::AtUpper,
                _ => return false,
            }
        };
        self.set.activate(row, status);
        self.lambda[row] = T::zero();
        self.dlambda[row] = T::zero();
        self.log.rows_added.push(row);
        self.info.stats.rows_added += 1;
        trace!("row {row} added as {status:?}");
        true
    }

    /// Fix a column at one of its bounds, or move it to the other bound.
    /// Returns false when that bound is infinite.
    pub fn bind_column(&mut self, col: usize, side: BoundSide) -> bool {
        let bound = match side {
            BoundSide::Lower => self.prob.lo[col],
            BoundSide::Upper => self.prob.hi[col],
        };
        if !bound.is_finite() {
            return false;
        }
        let was_free = self.set.is_free(col);
        self.set.activate_bound(col, side);
        if was_free {
            self.log.cols_bound.push(col);
            self.info.stats.cols_bound += 1;
        }
        trace!("column {col} bound at {side:?}");
        true
    }

    /// Release a bound column.  Returns false when it is already free.
    pub fn free_column(&mut self, col: usize) -> bool {
        if self.set.is_free(col) {
            return false;
        }
        self.set.free(col);
        self.log.cols_freed.push(col);
        self.info.stats.cols_freed += 1;
        trace!("column {col} freed");
        true
    }

    /// Heuristic advice on trying a cheaper inner method, given the number
    /// of rows added since the last run.
    pub fn cheap_inner_advice(&self, nrowadd: usize) -> CheapInnerAdvice {
        self.flops.should_use_cheap_inner_method(
            self.settings.coorcost.to_f64().unwrap_or(0.),
            self.settings.ssorcost.to_f64().unwrap_or(0.),
            self.prob.A.nnz(),
            self.set.n_active_rows(),
            nrowadd,
        )
    }

    // bound of an active row at its current side
    #[inline]
    pub(crate) fn row_bound(&self, i: usize) -> T {
        match self.set.row_status(i) {
            RowStatus::Equality | RowStatus::AtLower => self.prob.bl[i],
            RowStatus::AtUpper => self.prob.bu[i],
            RowStatus::Dropped => T::zero(),
        }
    }

    /// Fold the increments into `λ` and recompute every per column and per
    /// row quantity from it.
    pub(crate) fn rebase(&mut self) {
        let (m, n) = (self.prob.nrows(), self.prob.ncols());

        for i in 0..m {
            if self.set.is_row_active(i) {
                self.lambda[i] += self.dlambda[i];
            } else {
                self.lambda[i] = T::zero();
            }
            self.dlambda[i] = T::zero();
        }

        // z = y + Aᵀλ
        let w = &mut self.work;
        w.reference.copy_from_slice(&self.prob.y);
        self.prob
            .A
            .gemv_t(&mut w.reference, &self.lambda, T::one(), T::one());

        for j in 0..n {
            let z = w.reference[j];
            let bound = match self.set.col_status(j) {
                ColumnStatus::Free => None,
                ColumnStatus::AtLower => Some(self.prob.lo[j]),
                ColumnStatus::AtUpper => Some(self.prob.hi[j]),
            };
            match bound {
                None => {
                    w.c[j] = T::zero();
                    w.cold[j] = T::zero();
                }
                Some(b) => {
                    w.reference[j] = b;
                    w.c[j] = z - b;
                    w.cold[j] = z - b;
                }
            }
            w.pa[j] = T::zero();
        }

        for i in 0..m {
            self.work.rhs[i] = if self.set.is_row_active(i) {
                let (cols, vals) = self.prob.At.column(i);
                let ax = cols
                    .iter()
                    .zip(vals)
                    .fold(T::zero(), |acc, (&j, &a)| acc + a * self.work.reference[j]);
                self.row_bound(i) - ax
            } else {
                T::zero()
            };
        }
    }

    /// One run of the engine over the current active set.
    pub fn run_dasa(&mut self) -> DasaStatus {
        if self.info.stats.runs == 0 {
            let _ = self
                .info
                .print_configuration(&self.settings, &self.prob, self.sigma);
        }
        self.info.stats.runs += 1;
        let _ = self.info.print_run_header(&self.settings);

        let result;
        timeit! {self.timers => "dasa";
            result = self.run_sweeps();
            self.finish();
        }
        let (status, sweeps) = result;

        self.status = Some(status);
        self.info.stats.collect_times(&self.timers);
        let _ = self.info.print_run_footer(&self.settings, status, sweeps);
        debug!("dasa run {}: {status} after {sweeps} sweeps", self.info.stats.runs);
        status
    }

    fn run_sweeps(&mut self) -> (DasaStatus, u32) {
        self.rebase();
        self.commit_modifications(false);
        debug_assert!(self.set.check_invariants());

        if self.set.n_active_rows() == 0 {
            return (DasaStatus::AllRowsDropped, 0);
        }
        self.scheduler.seed(&self.prob.tree, self.set.rows());

        let mut sweeps = 0;
        loop {
            if sweeps >= self.settings.max_sweeps {
                return (DasaStatus::MaxIterations, sweeps);
            }
            sweeps += 1;
            self.info.stats.sweeps += 1;
            let dropped0 = self.info.stats.rows_dropped;
            let freed0 = self.info.stats.cols_freed;

            let njobs = self.scheduler.jobs().len();
            for k in 0..njobs {
                let job = self.scheduler.jobs()[k].clone();
                let (changed, mark) = self.process_job(&job);
                let slot = &mut self.scheduler.jobs_mut()[k];
                slot.changed = changed;
                slot.mark = mark;
            }

            let partial = !self.scheduler.at_root(&self.prob.tree);
            let refactored = self.commit_modifications(partial);
            debug_assert!(self.set.check_invariants());
            debug_assert!(self
                .factor
                .min_active_diagonal()
                .map_or(true, |d| d >= self.sigma));

            let ndropped = (self.info.stats.rows_dropped - dropped0) as usize;
            let nfreed = (self.info.stats.cols_freed - freed0) as usize;
            let _ = self.info.print_sweep(
                &self.settings,
                sweeps,
                njobs,
                self.set.n_active_rows(),
                ndropped,
                nfreed,
                refactored,
            );
            trace!("sweep {sweeps}: {njobs} jobs, {ndropped} dropped, {nfreed} freed");

            let next = self
                .scheduler
                .advance(&self.prob.tree, self.set.rows(), refactored);
            if let Some(status) = next {
                return (status, sweeps);
            }
        }
    }

    // fold the increments and refresh the primal
    fn finish(&mut self) {
        self.rebase();
        self.x.copy_from_slice(&self.work.reference);
    }

    /// Solve and line search over one job.  Returns whether the active set
    /// changed and the first row whose right hand side changed.
    pub(crate) fn process_job(&mut self, job: &Job) -> (bool, Option<usize>) {
        let (top, bottom) = (job.rows.start, job.rows.end);
        if self.set.rows().seek(top, bottom).is_none() {
            return (false, None);
        }
        self.info.stats.jobs += 1;

        timeit! {self.timers => "solve";
            self.solve_job(job);
        }

        let outcome;
        timeit! {self.timers => "linesearch";
            outcome = self.line_search(job.rows.clone(), job.cols.clone());
        }
        trace!(
            "job {}: step {:e}, {:?}, changed = {}",
            job.block,
            outcome.step,
            outcome.flag,
            outcome.changed
        );
        if outcome.flag == LineFlag::Degenerate {
            debug!("degenerate direction in block {}", job.block);
        }
        (outcome.changed, outcome.mark)
    }

    // Newton direction t = (A_F A_Fᵀ + σI)⁻¹ rhs - dλ over the job rows
    fn solve_job(&mut self, job: &Job) {
        let (top, bottom) = (job.rows.start, job.rows.end);
        let from = job.mark.map_or(top, |m| m.max(top)).min(bottom);

        let w = &mut self.work;
        w.fwd[from..bottom].copy_from_slice(&w.rhs[from..bottom]);

        let rows = self.set.rows();
        forward_solve(&self.factor, rows, &mut w.fwd, top, bottom, job.mark);
        back_solve(&self.factor, rows, &w.fwd, &mut w.u, top, bottom);
        self.info.stats.solves += 1;

        for i in top..bottom {
            w.t[i] = if rows.contains(i) {
                w.u[i] - self.dlambda[i]
            } else {
                T::zero()
            };
        }
    }
}

/// Run the engine once on a context.  See [`DasaContext::run_dasa`].
pub fn run_dasa<T: FloatT>(ctx: &mut DasaContext<T>) -> DasaStatus {
    ctx.run_dasa()
}

impl<T: FloatT> ConfigurablePrintTarget for DasaContext<T> {
    fn print_to_stdout(&mut self) {
        self.info.print_to_stdout()
    }
    fn print_to_file(&mut self, file: std::fs::File) {
        self.info.print_to_file(file)
    }
    fn print_to_stream(&mut self, stream: Box<dyn Write + Send + Sync>) {
        self.info.print_to_stream(stream)
    }
    fn print_to_sink(&mut self) {
        self.info.print_to_sink()
    }
    fn print_to_buffer(&mut self) {
        self.info.print_to_buffer()
    }
    fn get_print_buffer(&mut self) -> std::io::Result<String> {
        self.info.get_print_buffer()
    }
}

#[path = "engine_test.rs"]
#[cfg(test)]
mod test;
