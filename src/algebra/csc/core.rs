#![allow(non_snake_case)]

use crate::algebra::{FloatT, SparseFormatError};

/// Sparse matrix in standard Compressed Sparse Column (CSC) format
///
/// __Example usage__ : To construct the 2 x 3 constraint matrix
/// ```text
/// A = [1.  0.  2.]
///     [0.  3.  4.]
/// ```
///
/// ```no_run
/// use dasa::algebra::CscMatrix;
///
/// let A : CscMatrix<f64> = CscMatrix::new(
///    2,                                // m
///    3,                                // n
///    vec![0, 1, 2, 4],                 //colptr
///    vec![0, 1, 0, 1],                 //rowval
///    vec![1., 3., 2., 4.],             //nzval
///  );
///
/// // optional correctness check
/// assert!(A.check_format().is_ok());
/// ```

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CscMatrix<T = f64> {
    /// number of rows
    pub m: usize,
    /// number of columns
    pub n: usize,
    /// CSC format column pointer.
    ///
    /// Ths field should have length `n+1`. The last entry corresponds
    /// to the the number of nonzeros and should agree with the lengths
    /// of the `rowval` and `nzval` fields.
    pub colptr: Vec<usize>,
    /// vector of row indices
    pub rowval: Vec<usize>,
    /// vector of non-zero matrix elements
    pub nzval: Vec<T>,
}

impl<T> CscMatrix<T>
where
    T: FloatT,
{
    /// `CscMatrix` constructor.
    ///
    /// # Panics
    /// Makes rudimentary dimensional compatibility checks and panics on
    /// failure.   This constructor does __not__ ensure that rows indices
    /// are in bounds or sorted within each column.  Use
    /// [`check_format`](CscMatrix::check_format) for that.
    pub fn new(m: usize, n: usize, colptr: Vec<usize>, rowval: Vec<usize>, nzval: Vec<T>) -> Self {
        assert_eq!(rowval.len(), nzval.len());
        assert_eq!(colptr.len(), n + 1);
        assert_eq!(colptr[n], rowval.len());
        CscMatrix {
            m,
            n,
            colptr,
            rowval,
            nzval,
        }
    }

    /// allocate space for a sparse matrix with `nnz` elements
    pub fn spalloc(m: usize, n: usize, nnz: usize) -> Self {
        let mut colptr = vec![0; n + 1];
        let rowval = vec![0; nnz];
        let nzval = vec![T::zero(); nnz];
        colptr[n] = nnz;

        CscMatrix::new(m, n, colptr, rowval, nzval)
    }

    /// number of nonzeros
    pub fn nnz(&self) -> usize {
        self.colptr[self.n]
    }

    /// row indices and values of column `j`
    #[inline]
    pub fn column(&self, j: usize) -> (&[usize], &[T]) {
        let rng = self.colptr[j]..self.colptr[j + 1];
        (&self.rowval[rng.clone()], &self.nzval[rng])
    }

    /// Check that matrix data is correctly formatted.
    pub fn check_format(&self) -> Result<(), SparseFormatError> {
        if self.rowval.len() != self.nzval.len() {
            return Err(SparseFormatError::IncompatibleDimension);
        }

        if self.colptr.is_empty()
            || (self.colptr.len() - 1) != self.n
            || self.colptr[self.n] != self.rowval.len()
        {
            return Err(SparseFormatError::IncompatibleDimension);
        }

        //check for colptr monotonicity
        if self.colptr[0] != 0 || self.colptr.windows(2).any(|c| c[0] > c[1]) {
            return Err(SparseFormatError::BadColptr);
        }

        //check for row values out of bounds
        if !self.rowval.iter().all(|r| r < &self.m) {
            return Err(SparseFormatError::BadRowval);
        }

        //check for rowval monotonicity within each column
        for col in 0..self.n {
            let rng = self.colptr[col]..self.colptr[col + 1];
            if self.rowval[rng].windows(2).any(|c| c[0] >= c[1]) {
                return Err(SparseFormatError::BadRowOrdering);
            }
        }

        if self.nzval.iter().any(|v| !v.is_finite()) {
            return Err(SparseFormatError::NonFinite);
        }

        Ok(())
    }

    /// Materialized transpose.  Row indices in each column of the result
    /// are sorted whenever `self` is correctly formatted.
    pub fn transpose(&self) -> Self {
        let mut At = CscMatrix::spalloc(self.n, self.m, self.nnz());

        //count entries per row of self
        let mut rowcount = vec![0usize; self.m];
        for &r in self.rowval.iter() {
            rowcount[r] += 1;
        }
        let mut acc = 0;
        for (i, cnt) in rowcount.iter().enumerate() {
            At.colptr[i] = acc;
            acc += cnt;
        }
        At.colptr[self.m] = acc;

        //scatter, visiting the columns of self in order
        let mut next = At.colptr[0..self.m].to_vec();
        for j in 0..self.n {
            for p in self.colptr[j]..self.colptr[j + 1] {
                let r = self.rowval[p];
                let dest = next[r];
                At.rowval[dest] = j;
                At.nzval[dest] = self.nzval[p];
                next[r] += 1;
            }
        }
        At
    }

    /// Largest absolute value of any stored entry, zero if empty.
    pub fn max_abs(&self) -> T {
        self.nzval
            .iter()
            .fold(T::zero(), |acc, v| T::max(acc, v.abs()))
    }

    /// Value of the entry at `(row, col)`, if it is structurally present.
    pub fn get_entry(&self, idx: (usize, usize)) -> Option<T> {
        let (row, col) = idx;
        assert!(row < self.m && col < self.n);
        let (rows, vals) = self.column(col);
        rows.binary_search(&row).ok().map(|k| vals[k])
    }
}
