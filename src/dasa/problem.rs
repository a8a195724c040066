#![allow(non_snake_case)]
use super::blocktree::{BlockTree, BlockTreeError};
use crate::algebra::*;
use thiserror::Error;

/// Error codes returnable from [`ProjectionProblem`](ProjectionProblem) construction
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProblemError {
    #[error("Problem data dimensions are incompatible")]
    IncompatibleDimension,
    #[error("Bad constraint matrix: {0}")]
    SparseFormat(#[from] SparseFormatError),
    #[error("Lower bound exceeds upper bound or is NaN at {what} index {index}")]
    BadBounds { what: &'static str, index: usize },
    #[error("Projected point has a non-finite entry at index {0}")]
    NonFinitePoint(usize),
    #[error("Bad block tree: {0}")]
    BlockTree(#[from] BlockTreeError),
    #[error("Column {col} has a row outside its block and the block's ancestors")]
    Dissection { col: usize },
}

/// Data of the projection problem
///
/// ```text
/// minimize    ½‖x - y‖²
/// subject to  bl ≤ A x ≤ bu
///             lo ≤ x ≤ hi
/// ```
///
/// Infinite bounds are allowed.  A row with `bl == bu` is an equality row.
#[derive(Debug, Clone)]
pub struct ProjectionProblem<T = f64> {
    pub A: CscMatrix<T>,
    /// `Aᵀ`, giving row access to `A`
    pub At: CscMatrix<T>,
    pub bl: Vec<T>,
    pub bu: Vec<T>,
    pub lo: Vec<T>,
    pub hi: Vec<T>,
    pub y: Vec<T>,
    pub tree: BlockTree,
}

impl<T> ProjectionProblem<T>
where
    T: FloatT,
{
    pub fn new(
        A: &CscMatrix<T>,
        bl: &[T],
        bu: &[T],
        lo: &[T],
        hi: &[T],
        y: &[T],
    ) -> Result<Self, ProblemError> {
        let (m, n) = (A.m, A.n);
        if bl.len() != m || bu.len() != m || lo.len() != n || hi.len() != n || y.len() != n {
            return Err(ProblemError::IncompatibleDimension);
        }
        A.check_format()?;
        check_bounds(bl, bu, "row")?;
        check_bounds(lo, hi, "column")?;
        if let Some(j) = y.iter().position(|v| !v.is_finite()) {
            return Err(ProblemError::NonFinitePoint(j));
        }

        Ok(Self {
            A: A.clone(),
            At: A.transpose(),
            bl: bl.to_vec(),
            bu: bu.to_vec(),
            lo: lo.to_vec(),
            hi: hi.to_vec(),
            y: y.to_vec(),
            tree: BlockTree::single(m, n),
        })
    }

    /// Replace the single-block decomposition with a multilevel one.
    pub fn with_block_tree(mut self, tree: BlockTree) -> Result<Self, ProblemError> {
        if tree.nrows() != self.nrows() || tree.ncols() != self.ncols() {
            return Err(ProblemError::IncompatibleDimension);
        }
        for j in 0..self.ncols() {
            let b = tree.block_of_col(j);
            for &i in self.A.column(j).0 {
                if !tree.is_ancestor_or_self(tree.block_of_row(i), b) {
                    return Err(ProblemError::Dissection { col: j });
                }
            }
        }
        self.tree = tree;
        Ok(self)
    }

    pub fn nrows(&self) -> usize {
        self.A.m
    }

    pub fn ncols(&self) -> usize {
        self.A.n
    }

    pub fn is_equality(&self, row: usize) -> bool {
        self.bl[row] == self.bu[row]
    }
}

fn check_bounds<T: FloatT>(l: &[T], u: &[T], what: &'static str) -> Result<(), ProblemError> {
    for (index, (l, u)) in l.iter().zip(u).enumerate() {
        // NaN fails the comparison
        if !(l <= u) || *l == T::infinity() || *u == T::neg_infinity() {
            return Err(ProblemError::BadBounds { what, index });
        }
    }
    Ok(())
}
