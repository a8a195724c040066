#![allow(non_snake_case)]
//! Batched modifications of the factorization.
//!
//! Row drops and column frees are applied to the active set immediately,
//! during the line search, and logged here.  Once per sweep the log is
//! replayed against the factor, either one rank-1 change at a time or by
//! a fresh factorization, whichever the cost model expects to be cheaper.

use super::engine::DasaContext;
use crate::algebra::*;
use crate::factor::Factorization;
use crate::timers::*;
use log::debug;

/// Active set changes not yet reflected in the factor.
#[derive(Debug, Clone, Default)]
pub struct ModificationLog {
    pub rows_added: Vec<usize>,
    pub rows_deleted: Vec<usize>,
    pub cols_freed: Vec<usize>,
    pub cols_bound: Vec<usize>,
}

impl ModificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// number of logged modifications
    pub fn len(&self) -> usize {
        self.rows_added.len() + self.rows_deleted.len() + self.cols_freed.len() + self.cols_bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.rows_added.clear();
        self.rows_deleted.clear();
        self.cols_freed.clear();
        self.cols_bound.clear();
    }
}

impl<T> DasaContext<T>
where
    T: FloatT,
{
    /// Bring the factor in line with the active set.  `partial` marks
    /// changes made below the root block.  Returns true when the factor
    /// was computed afresh.
    pub(crate) fn commit_modifications(&mut self, partial: bool) -> bool {
        let dropped = self.set.take_dropped();
        self.log.rows_deleted.extend(dropped);

        if self.log.is_empty() && self.flops.factored {
            return false;
        }

        let nactive = self.set.n_active_rows();
        let nmod = self.log.len();
        let refactor = self.flops.should_refactor(nactive, nmod);

        if refactor {
            timeit! {self.timers => "factor";
                self.refactor();
            }
        } else {
            timeit! {self.timers => "update";
                self.apply_updates(partial);
            }
        }
        self.log.clear();
        refactor
    }

    fn refactor(&mut self) {
        let (m, n) = (self.prob.nrows(), self.prob.ncols());
        for j in 0..n {
            self.in_factor[j] = self.set.is_free(j);
        }
        let mask = &mut self.work.row_mask;
        for (i, active) in mask.iter_mut().enumerate().take(m) {
            *active = self.set.is_row_active(i);
        }

        let flops = self.factor.factorize(
            &self.prob.A,
            &self.prob.At,
            &self.in_factor,
            &self.work.row_mask,
            self.sigma,
        );
        let lnnz = self.factor.live_nnz();
        self.flops.record_refactor(flops, lnnz);
        self.info.stats.factorizations += 1;

        debug!(
            "refactor: {} active rows, {} free columns, nnz(L) = {}, {:.3e} flops",
            self.set.n_active_rows(),
            self.set.free_columns().len(),
            lnnz,
            flops.total()
        );
    }

    fn apply_updates(&mut self, partial: bool) {
        let A = &self.prob.A;
        let At = &self.prob.At;
        let mut flops = 0.;
        let mut count = 0;

        // bound columns leave first, while their rows are still present
        for &j in &self.log.cols_bound {
            if self.in_factor[j] && !self.set.is_free(j) {
                flops += self.factor.downdate(A, j);
                self.in_factor[j] = false;
                count += 1;
            }
        }
        for &k in &self.log.rows_deleted {
            if self.factor.is_active(k) && !self.set.is_row_active(k) {
                flops += self.factor.row_delete(k);
                count += 1;
            }
        }
        for &k in &self.log.rows_added {
            if !self.factor.is_active(k) && self.set.is_row_active(k) {
                flops += self.factor.row_add(A, At, &self.in_factor, k);
                count += 1;
            }
        }
        for &j in &self.log.cols_freed {
            if !self.in_factor[j] && self.set.is_free(j) {
                flops += self.factor.update(A, j);
                self.in_factor[j] = true;
                count += 1;
            }
        }

        self.flops.record_update(flops, count, partial);
        self.info.stats.updates += count as u64;
        debug!(
            "{} update: {count} modifications, {flops:.3e} flops",
            if partial { "partial" } else { "root" }
        );
    }
}
