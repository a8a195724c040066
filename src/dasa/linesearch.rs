//! Breakpoint line search along the Newton direction of one job.
//!
//! The dual objective along `dλ + s·t` is concave and piecewise quadratic
//! in `s`.  Its pieces end at breakpoints where a bound column starts to
//! move or the multiplier of an inequality row reaches zero.  The search
//! walks the breakpoints in increasing order, committing each event, until
//! the derivative turns nonpositive or the step budget of one is reached.

use super::activeset::{ColumnStatus, RowStatus};
use super::engine::DasaContext;
use crate::algebra::*;
use log::trace;
use std::ops::Range;

/// How the line search ended.
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFlag {
    /// the maximizer lies strictly between breakpoints
    Interior = 0,
    /// the maximizer is a breakpoint
    NondifferentiableOptimum = 1,
    /// nonpositive curvature
    Degenerate = 2,
    /// the last piece overshot the budget and was clamped
    Truncated = -1,
    /// a breakpoint past the budget ended the search at the budget
    BudgetReached = -2,
}

/// States of the breakpoint walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    Searching,
    CommittingBreakpoint(usize),
    ClampedByBudget,
    Degenerate,
    NondifferentiableOptimum,
}

#[derive(Debug, Clone, Copy)]
pub struct LineOutcome<T> {
    pub flag: LineFlag,
    pub step: T,
    /// a column was freed or a row dropped
    pub changed: bool,
    /// first row whose right hand side or factor row changed
    pub mark: Option<usize>,
}

impl<T> DasaContext<T>
where
    T: FloatT,
{
    /// Line search over the rows `rows` and columns `cols` of a job whose
    /// direction `t` is already in the workspace.  Advances `dλ` and `c`
    /// by the chosen step.
    pub(crate) fn line_search(&mut self, rows: Range<usize>, cols: Range<usize>) -> LineOutcome<T> {
        let (top, bottom) = (rows.start, rows.end);
        let n = self.prob.ncols();
        let sigma = self.sigma;
        let st0 = T::one();

        // pA = Aᵀt over the job rows
        for j in cols.clone() {
            let (ri, vi) = self.prob.A.column(j);
            let mut s = T::zero();
            for (&i, &a) in ri.iter().zip(vi) {
                if i >= bottom {
                    break;
                }
                if i >= top && self.set.is_row_active(i) {
                    s += a * self.work.t[i];
                }
            }
            self.work.pa[j] = s;
        }

        // slope and curvature at the start
        let w = &self.work;
        let mut fd = T::zero();
        let mut sd = T::zero();
        for i in self.set.rows().iter_from(self.set.rows().seek(top, bottom)) {
            if i >= bottom {
                break;
            }
            let ti = w.t[i];
            fd += (w.rhs[i] - sigma * self.dlambda[i]) * ti;
            sd += sigma * ti * ti;
        }
        for j in cols.clone().filter(|&j| self.set.is_free(j)) {
            fd -= (w.c[j] - w.cold[j]) * w.pa[j];
            sd += w.pa[j] * w.pa[j];
        }

        let mut outcome = LineOutcome {
            flag: LineFlag::Interior,
            step: T::zero(),
            changed: false,
            mark: None,
        };
        if fd <= T::zero() {
            return outcome;
        }

        // candidate breakpoints
        self.heap.clear();
        for j in cols.clone() {
            let (pa, c) = (self.work.pa[j], self.work.c[j]);
            let moves = match self.set.col_status(j) {
                ColumnStatus::AtLower => pa > T::zero(),
                ColumnStatus::AtUpper => pa < T::zero(),
                ColumnStatus::Free => false,
            };
            if moves {
                let s = -c / pa;
                if s < st0 {
                    self.heap.insert(j, s);
                }
            }
        }
        for i in self.set.rows().iter_from(self.set.rows().seek(top, bottom)) {
            if i >= bottom {
                break;
            }
            let ti = self.work.t[i];
            let leaving = match self.set.row_status(i) {
                RowStatus::AtLower => ti < T::zero(),
                RowStatus::AtUpper => ti > T::zero(),
                _ => false,
            };
            if leaving {
                let s = -(self.lambda[i] + self.dlambda[i]) / ti;
                if s < st0 {
                    self.heap.insert(n + i, T::max(T::zero(), s));
                }
            }
        }

        let mut st = T::zero();
        let mut mark = usize::MAX;

        let flag = if self.heap.is_empty() {
            st = st0;
            LineFlag::Interior
        } else {
            let mut state = LineState::Searching;
            loop {
                state = match state {
                    LineState::Searching => {
                        if sd <= T::zero() {
                            LineState::Degenerate
                        } else if let Some((id, key)) = self.heap.peek_min() {
                            let br = T::max(T::zero(), key);
                            if br >= st0 {
                                LineState::ClampedByBudget
                            } else {
                                let fnext = fd - sd * (br - st);
                                if fnext <= T::zero() {
                                    // maximizer before the breakpoint
                                    st += fd / (fd - fnext) * (br - st);
                                    break LineFlag::Interior;
                                }
                                self.heap.pop_min();
                                fd = fnext;
                                st = br;
                                LineState::CommittingBreakpoint(id)
                            }
                        } else {
                            st += fd / sd;
                            break LineFlag::Interior;
                        }
                    }
                    LineState::CommittingBreakpoint(id) => {
                        if id < n {
                            self.commit_free_column(id, &mut sd, &mut mark);
                        } else {
                            self.commit_drop_row(id - n, st, &mut fd, &mut sd, &mut mark);
                        }
                        outcome.changed = true;
                        if fd <= T::zero() {
                            LineState::NondifferentiableOptimum
                        } else {
                            LineState::Searching
                        }
                    }
                    LineState::ClampedByBudget => {
                        let s = st + fd / sd;
                        if s > st0 {
                            st = st0;
                            break LineFlag::BudgetReached;
                        }
                        st = s;
                        break LineFlag::Interior;
                    }
                    LineState::Degenerate => break LineFlag::Degenerate,
                    LineState::NondifferentiableOptimum => {
                        break LineFlag::NondifferentiableOptimum
                    }
                };
            }
        };

        let flag = if st > st0 {
            st = st0;
            LineFlag::Truncated
        } else {
            flag
        };

        // advance
        let w = &mut self.work;
        for i in top..bottom {
            if self.set.is_row_active(i) {
                self.dlambda[i] += st * w.t[i];
            }
        }
        for j in cols {
            w.c[j] += st * w.pa[j];
        }

        outcome.flag = flag;
        outcome.step = st;
        if outcome.changed {
            outcome.mark = Some(mark);
        }
        outcome
    }

    // bound column j starts to move at the current step
    fn commit_free_column(&mut self, j: usize, sd: &mut T, mark: &mut usize) {
        let pa = self.work.pa[j];
        *sd += pa * pa;

        let cold = self.work.cold[j];
        let (ri, vi) = self.prob.A.column(j);
        for (&i, &a) in ri.iter().zip(vi) {
            if self.set.is_row_active(i) {
                self.work.rhs[i] -= a * cold;
                *mark = (*mark).min(i);
            }
        }

        self.set.free(j);
        self.log.cols_freed.push(j);
        self.info.stats.cols_freed += 1;
        trace!("column {j} freed in line search");
    }

    // the multiplier of row k reaches zero at step st
    fn commit_drop_row(&mut self, k: usize, st: T, fd: &mut T, sd: &mut T, mark: &mut usize) {
        let sigma = self.sigma;
        let st0 = T::one();
        let tk = self.work.t[k];
        let delta = self.dlambda[k] + st * tk;

        // slope contribution of row k at st
        let (cols, vals) = self.prob.At.column(k);
        let w = &self.work;
        let mut gk = w.rhs[k] - sigma * delta;
        for (&j, &a) in cols.iter().zip(vals) {
            if self.set.is_free(j) {
                gk -= a * (w.c[j] + st * w.pa[j] - w.cold[j]);
            }
        }
        *fd -= gk * tk;
        *sd -= sigma * tk * tk;

        let bound = self.row_bound(k);
        self.set.deactivate(k);
        self.lambda[k] = T::zero();
        self.dlambda[k] = T::zero();
        self.work.rhs[k] -= bound;
        *mark = (*mark).min(k);

        for (&j, &akj) in cols.iter().zip(vals) {
            let w = &mut self.work;
            let cj_st = w.c[j] + st * w.pa[j];
            w.c[j] += akj * st * tk;
            w.cold[j] += akj * delta;

            let tt = akj * tk;
            let s = w.pa[j];
            w.pa[j] -= tt;
            let snew = w.pa[j];

            let status = self.set.col_status(j);
            if status == ColumnStatus::Free {
                *sd -= tt * (s + snew);
                let (ri, vi) = self.prob.A.column(j);
                for (&i, &aij) in ri.iter().zip(vi) {
                    if self.set.is_row_active(i) {
                        w.rhs[i] -= aij * akj * delta;
                        *mark = (*mark).min(i);
                    }
                }
                continue;
            }

            let moves = match status {
                ColumnStatus::AtLower => snew > T::zero(),
                _ => snew < T::zero(),
            };
            // a bound column already inside its box frees at the current step
            let key = T::max(st, st - cj_st / snew);
            if moves && key < st0 {
                if self.heap.contains(j) {
                    self.heap.update(j, key);
                } else {
                    self.heap.insert(j, key);
                }
            } else if self.heap.contains(j) {
                self.heap.delete(j);
            }
        }

        self.info.stats.rows_dropped += 1;
        trace!("row {k} dropped at step {st:e}");
    }
}
