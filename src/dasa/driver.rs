//! Outer active set loop around the engine.

use super::activeset::{BoundSide, ColumnStatus, RowStatus};
use super::engine::{DasaContext, DasaError};
use super::info::DasaStats;
use super::inner::InnerMethod;
use super::problem::ProjectionProblem;
use super::settings::DasaSettings;
use super::status::DasaStatus;
use crate::algebra::*;
use crate::io::ConfigurablePrintTarget;
use crate::timers::*;
use log::debug;
use std::io::Write;

/// Result of a projection.
#[derive(Debug, Clone)]
pub struct ProjectionSolution<T> {
    /// the projected point, `clamp(y + Aᵀλ, lo, hi)`
    pub x: Vec<T>,
    pub lambda: Vec<T>,
    pub status: DasaStatus,
    pub outer_iterations: u32,
}

/// Projects a point onto `{x : bl ≤ A x ≤ bu, lo ≤ x ≤ hi}`.
///
/// Each outer round runs the engine (or an inner method) on the current
/// active set, then binds columns that left their box, frees columns that
/// moved inside it and activates violated rows.
pub struct ProjectionSolver<T: FloatT = f64> {
    ctx: DasaContext<T>,
    inner: Option<Box<dyn InnerMethod<T>>>,
    solution: ProjectionSolution<T>,
    initialized: bool,
    // rows activated by the last outer round
    nrowadd: usize,
}

impl<T> ProjectionSolver<T>
where
    T: FloatT,
{
    pub fn new(prob: ProjectionProblem<T>, settings: DasaSettings<T>) -> Result<Self, DasaError> {
        let solution = ProjectionSolution {
            x: prob.y.clone(),
            lambda: vec![T::zero(); prob.nrows()],
            status: DasaStatus::MaxIterations,
            outer_iterations: 0,
        };
        let ctx = DasaContext::new(prob, settings)?;
        Ok(Self {
            ctx,
            inner: None,
            solution,
            initialized: false,
            nrowadd: 0,
        })
    }

    pub fn set_inner_method(&mut self, method: Box<dyn InnerMethod<T>>) {
        self.inner = Some(method);
    }

    pub fn solution(&self) -> &ProjectionSolution<T> {
        &self.solution
    }

    pub fn stats(&self) -> &DasaStats {
        self.ctx.stats()
    }

    pub fn context(&self) -> &DasaContext<T> {
        &self.ctx
    }

    pub fn solve(&mut self) -> DasaStatus {
        let status;
        timeit! {self.ctx.timers => "outer";
            status = self.solve_inner();
        }
        self.solution.status = status;
        self.solution.lambda.copy_from_slice(self.ctx.dual());
        self.ctx.info.stats.collect_times(&self.ctx.timers);
        let _ = self
            .ctx
            .info
            .print_footer(&self.ctx.settings, status, &self.ctx.timers);
        status
    }

    fn solve_inner(&mut self) -> DasaStatus {
        if self.ctx.prob.nrows() == 0 {
            self.update_primal();
            return DasaStatus::AllRowsDropped;
        }
        if !self.initialized {
            self.initialize();
        }

        let max_outer = self.ctx.settings.max_outer_iter;
        for iter in 0..max_outer {
            self.solution.outer_iterations += 1;

            let status = match self.try_inner_method() {
                Some(s) => s,
                None => self.ctx.run_dasa(),
            };
            if status == DasaStatus::MaxIterations {
                self.update_primal();
                return status;
            }

            let dx = self.update_primal();
            let changed = self.update_active_set();
            let feasible = self.active_rows_within_tolerance();
            debug!(
                "outer {iter}: {status}, |dx| = {dx:e}, changed = {changed}, feasible = {feasible}"
            );

            if !changed && feasible {
                return if self.ctx.set.n_active_rows() == 0 {
                    DasaStatus::AllRowsDropped
                } else {
                    DasaStatus::SolutionFound
                };
            }
        }
        DasaStatus::MaxIterations
    }

    // equality rows active, columns bound where y is outside or on the box
    fn initialize(&mut self) {
        let prob = &self.ctx.prob;
        let (m, n) = (prob.nrows(), prob.ncols());

        let eq: Vec<usize> = (0..m).filter(|&i| prob.is_equality(i)).collect();
        let mut bind = Vec::new();
        for j in 0..n {
            let (y, lo, hi) = (prob.y[j], prob.lo[j], prob.hi[j]);
            if y <= lo {
                bind.push((j, BoundSide::Lower));
            } else if y >= hi {
                bind.push((j, BoundSide::Upper));
            }
        }

        for &i in &eq {
            self.ctx.add_row(i, BoundSide::Lower);
        }
        for (j, side) in bind {
            self.ctx.bind_column(j, side);
        }
        self.nrowadd = eq.len();
        self.initialized = true;
    }

    fn try_inner_method(&mut self) -> Option<DasaStatus> {
        if !self.ctx.settings.use_cheap_inner_method {
            return None;
        }
        let method = self.inner.as_mut()?;
        let advice = self.ctx.cheap_inner_advice(self.nrowadd);
        if !advice.any() {
            return None;
        }
        let status = method.run(&mut self.ctx, advice);
        debug!("inner method {}: {status}", method.name());
        match status {
            DasaStatus::SwitchToUpdateDowndate | DasaStatus::Nonascent => None,
            _ => Some(status),
        }
    }

    // x = clamp(y + Aᵀλ), returning the largest change in x
    fn update_primal(&mut self) -> T {
        let prob = &self.ctx.prob;
        let x = &mut self.solution.x;
        let xold = x.clone();
        x.copy_from_slice(&prob.y);
        prob.A.gemv_t(x, &self.ctx.lambda, T::one(), T::one());
        x.clip(&prob.lo, &prob.hi);
        x.dist_inf(&xold)
    }

    // Reconcile the active set with the clamped primal.  Returns true on
    // any change.
    fn update_active_set(&mut self) -> bool {
        let ctx = &mut self.ctx;
        let (m, n) = (ctx.prob.nrows(), ctx.prob.ncols());
        let tol = ctx.settings.tol_feas;
        let mut changed = false;

        // unclamped primal
        let mut z = ctx.prob.y.clone();
        ctx.prob.A.gemv_t(&mut z, &ctx.lambda, T::one(), T::one());

        for (j, &zj) in z.iter().enumerate().take(n) {
            let (lo, hi) = (ctx.prob.lo[j], ctx.prob.hi[j]);
            let target = match ctx.set.col_status(j) {
                ColumnStatus::Free if zj < lo => Some(BoundSide::Lower),
                ColumnStatus::Free if zj > hi => Some(BoundSide::Upper),
                ColumnStatus::AtLower if zj >= hi => Some(BoundSide::Upper),
                ColumnStatus::AtUpper if zj <= lo => Some(BoundSide::Lower),
                ColumnStatus::AtLower if zj > lo => {
                    changed |= ctx.free_column(j);
                    None
                }
                ColumnStatus::AtUpper if zj < hi => {
                    changed |= ctx.free_column(j);
                    None
                }
                _ => None,
            };
            if let Some(side) = target {
                changed |= ctx.bind_column(j, side);
            }
        }

        self.nrowadd = 0;
        let x = &self.solution.x;
        for i in 0..m {
            if ctx.set.is_row_active(i) {
                continue;
            }
            let r = row_dot(&ctx.prob.At, i, x);
            let side = if r < ctx.prob.bl[i] - tol {
                BoundSide::Lower
            } else if r > ctx.prob.bu[i] + tol {
                BoundSide::Upper
            } else {
                continue;
            };
            if ctx.add_row(i, side) {
                self.nrowadd += 1;
                changed = true;
            }
        }
        changed
    }

    fn active_rows_within_tolerance(&self) -> bool {
        let ctx = &self.ctx;
        let tol = ctx.settings.tol_feas;
        let x = &self.solution.x;
        ctx.set.rows().iter().all(|i| {
            let r = row_dot(&ctx.prob.At, i, x);
            let b = match ctx.set.row_status(i) {
                RowStatus::AtUpper => ctx.prob.bu[i],
                _ => ctx.prob.bl[i],
            };
            (r - b).abs() <= tol
        })
    }
}

// a_i·x through the transpose
fn row_dot<T: FloatT>(at: &CscMatrix<T>, i: usize, x: &[T]) -> T {
    let (cols, vals) = at.column(i);
    cols.iter()
        .zip(vals)
        .fold(T::zero(), |acc, (&j, &a)| acc + a * x[j])
}

impl<T: FloatT> ConfigurablePrintTarget for ProjectionSolver<T> {
    fn print_to_stdout(&mut self) {
        self.ctx.print_to_stdout()
    }
    fn print_to_file(&mut self, file: std::fs::File) {
        self.ctx.print_to_file(file)
    }
    fn print_to_stream(&mut self, stream: Box<dyn Write + Send + Sync>) {
        self.ctx.print_to_stream(stream)
    }
    fn print_to_sink(&mut self) {
        self.ctx.print_to_sink()
    }
    fn print_to_buffer(&mut self) {
        self.ctx.print_to_buffer()
    }
    fn get_print_buffer(&mut self) -> std::io::Result<String> {
        self.ctx.get_print_buffer()
    }
}
