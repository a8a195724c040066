//! Sparse LDLᵀ factorization of `A_F·A_Fᵀ + σI` with in-place row and
//! column modification.
//!
//! The engine consumes the factor through the [`Factorization`] contract:
//! a full numeric factorization, rank-1 column updates and downdates, row
//! addition and deletion, and a symbolic re-partition.  Each call reports
//! the flops it spent so that the refactor-vs-update cost model can learn
//! observed rates.

use crate::algebra::*;
use thiserror::Error;

mod ldl;
pub use ldl::*;

/// Error codes returnable from [`LdlFactor`](LdlFactor) construction
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FactorError {
    #[error("Matrix dimension fields are incompatible")]
    IncompatibleDimension,
    #[error("Bad sparse matrix format: {0}")]
    SparseFormat(#[from] SparseFormatError),
}

/// Flop counts reported by a numeric factorization.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FactorFlops {
    /// cost of forming the active part of `A_F·A_Fᵀ`
    pub aat: f64,
    /// cost of the numeric elimination alone
    pub numeric: f64,
}

impl FactorFlops {
    pub fn total(&self) -> f64 {
        self.aat + self.numeric
    }
}

/// Narrow contract between the projection engine and a sparse
/// factorization of `A_F·A_Fᵀ + σI` over the active rows.
///
/// Rows outside the active set behave as identity rows.  Columns of `A`
/// enter through `free`, a mask over the columns of `A`.
pub trait Factorization<T: FloatT> {
    /// Numeric factorization from scratch.
    fn factorize(
        &mut self,
        a: &CscMatrix<T>,
        at: &CscMatrix<T>,
        free: &[bool],
        active: &[bool],
        sigma: T,
    ) -> FactorFlops;

    /// Add `a_j a_jᵀ` for column `j` of `A`, restricted to active rows.
    fn update(&mut self, a: &CscMatrix<T>, col: usize) -> f64;

    /// Remove `a_j a_jᵀ` for column `j` of `A`, restricted to active rows.
    fn downdate(&mut self, a: &CscMatrix<T>, col: usize) -> f64;

    /// Bring an inactive row into the factorization.
    fn row_add(&mut self, a: &CscMatrix<T>, at: &CscMatrix<T>, free: &[bool], row: usize)
        -> f64;

    /// Remove an active row, leaving an identity row behind.
    fn row_delete(&mut self, row: usize) -> f64;

    /// Re-derive the live/dead partition of every column from the
    /// current active rows.
    fn resymbol(&mut self) -> f64;

    /// Nonzeros of the live factor, diagonal included.
    fn live_nnz(&self) -> usize;
}
