#![allow(non_snake_case)]
use super::{FactorError, FactorFlops, Factorization};
use crate::algebra::*;
use std::iter::zip;

const LDL_UNKNOWN: usize = usize::MAX;
const LDL_USED: bool = true;
const LDL_UNUSED: bool = false;

/// Performs an $LDL^T$ factorization of `A_F·A_Fᵀ + σI` over a changing
/// set of active rows.
///
/// The static pattern of every column is the pattern of the factor of the
/// full `A·Aᵀ` in natural order.  Within each column the pattern is split
/// into a live part (rows currently active, ascending) followed by a dead
/// part (inactive rows, ascending), with `lnz[j]` the live count.  Entries
/// in the dead part are always zero.

#[derive(Debug, Clone)]
pub struct LdlFactor<T = f64> {
    n: usize,
    // static column pattern of L
    colptr: Vec<usize>,
    rowidx: Vec<usize>,
    lx: Vec<T>,
    // live entries per column
    lnz: Vec<usize>,
    // diagonal
    d: Vec<T>,
    // static row pattern of L, strictly lower part, ascending
    rowptr: Vec<usize>,
    rowcol: Vec<usize>,
    // rows currently present in the factorization
    active: Vec<bool>,
    // diagonal floor
    sigma: T,
    workspace: LdlWorkspace<T>,
}

#[derive(Debug, Clone)]
struct LdlWorkspace<T> {
    fwork: Vec<T>,
    fwork2: Vec<T>,
    iwork: Vec<usize>,
    sortbuf: Vec<(usize, T)>,
}

impl<T> LdlWorkspace<T>
where
    T: FloatT,
{
    fn new(n: usize) -> Self {
        Self {
            fwork: vec![T::zero(); n],
            fwork2: vec![T::zero(); n],
            iwork: vec![0; n],
            sortbuf: Vec::new(),
        }
    }
}

impl<T> LdlFactor<T>
where
    T: FloatT,
{
    /// Symbolic analysis of `A·Aᵀ` for an `m × n` constraint matrix `A`
    /// with transpose `at`.  Every row starts inactive.
    pub fn new(a: &CscMatrix<T>, at: &CscMatrix<T>) -> Result<Self, FactorError> {
        a.check_format()?;
        if at.m != a.n || at.n != a.m || at.nnz() != a.nnz() {
            return Err(FactorError::IncompatibleDimension);
        }
        let n = a.m;

        let (Ap, Ai) = _aat_triu_pattern(a, at);

        let mut work = vec![0; n];
        let mut Lnz = vec![0; n];
        let mut etree = vec![LDL_UNKNOWN; n];
        _etree(n, &Ap, &Ai, &mut work, &mut Lnz, &mut etree);

        let (colptr, rowidx, rowptr, rowcol) = _symbolic(n, &Ap, &Ai, &Lnz, &etree);

        let nnzL = rowidx.len();
        Ok(Self {
            n,
            colptr,
            rowidx,
            lx: vec![T::zero(); nnzL],
            lnz: vec![0; n],
            d: vec![T::one(); n],
            rowptr,
            rowcol,
            active: vec![false; n],
            sigma: T::zero(),
            workspace: LdlWorkspace::new(n),
        })
    }

    /// dimension of the factor (rows of `A`)
    pub fn n(&self) -> usize {
        self.n
    }

    /// regularization floor applied at the last factorization
    pub fn sigma(&self) -> T {
        self.sigma
    }

    /// live part of column `j`: active row indices and values
    #[inline]
    pub fn live(&self, j: usize) -> (&[usize], &[T]) {
        let rng = self.colptr[j]..self.colptr[j] + self.lnz[j];
        (&self.rowidx[rng.clone()], &self.lx[rng])
    }

    /// diagonal entries of D
    #[inline]
    pub fn diag(&self) -> &[T] {
        &self.d
    }

    #[inline]
    pub fn is_active(&self, row: usize) -> bool {
        self.active[row]
    }

    /// allocated capacity of column `j`
    pub fn capacity(&self, j: usize) -> usize {
        self.colptr[j + 1] - self.colptr[j]
    }

    /// static row pattern of row `k` (columns `j < k`)
    pub fn row_pattern(&self, k: usize) -> &[usize] {
        &self.rowcol[self.rowptr[k]..self.rowptr[k + 1]]
    }

    /// Value of `L[i,j]` for `i > j`, zero when outside the live pattern.
    pub fn entry(&self, i: usize, j: usize) -> T {
        let (rows, vals) = self.live(j);
        match rows.binary_search(&i) {
            Ok(p) => vals[p],
            Err(_) => T::zero(),
        }
    }

    /// Smallest diagonal over the active rows, `None` if there are none.
    pub fn min_active_diagonal(&self) -> Option<T> {
        zip(&self.d, &self.active)
            .filter(|(_, &a)| a)
            .map(|(&d, _)| d)
            .reduce(T::min)
    }

    /// Check that every column is partitioned into sorted live and dead
    /// parts consistent with the active rows.
    pub fn check_partition(&self) -> bool {
        (0..self.n).all(|j| {
            let p0 = self.colptr[j];
            let pl = p0 + self.lnz[j];
            let pe = self.colptr[j + 1];
            let live = &self.rowidx[p0..pl];
            let dead = &self.rowidx[pl..pe];
            live.windows(2).all(|w| w[0] < w[1])
                && dead.windows(2).all(|w| w[0] < w[1])
                && live.iter().all(|&r| self.active[r])
                && dead.iter().all(|&r| !self.active[r])
                && self.lx[pl..pe].iter().all(|&v| v == T::zero())
        })
    }

    // floor a pivot at the regularization level
    #[inline]
    fn floor(&self, dk: T) -> T {
        if dk < self.sigma {
            self.sigma
        } else {
            dk
        }
    }

    // move row k from the live part of column j to its dead part
    fn kill_entry(&mut self, j: usize, k: usize) {
        let p0 = self.colptr[j];
        let pl = p0 + self.lnz[j];
        let pe = self.colptr[j + 1];

        let Ok(off) = self.rowidx[p0..pl].binary_search(&k) else {
            debug_assert!(false, "row {k} not live in column {j}");
            return;
        };
        let pos = p0 + off;
        self.rowidx[pos..pl].rotate_left(1);
        self.lx[pos..pl].rotate_left(1);
        self.lnz[j] -= 1;

        // k now sits at the head of the dead part
        let pl = pl - 1;
        let ins = pl + self.rowidx[pl + 1..pe].partition_point(|&r| r < k);
        self.rowidx[pl..=ins].rotate_left(1);
        self.lx[pl..=ins].rotate_left(1);
        self.lx[ins] = T::zero();
    }

    // move row k from the dead part of column j to its live part
    fn revive_entry(&mut self, j: usize, k: usize) {
        let p0 = self.colptr[j];
        let pl = p0 + self.lnz[j];
        let pe = self.colptr[j + 1];

        let Ok(off) = self.rowidx[pl..pe].binary_search(&k) else {
            debug_assert!(false, "row {k} not dead in column {j}");
            return;
        };
        let pos = pl + off;
        self.rowidx[pl..=pos].rotate_right(1);
        self.lx[pl..=pos].rotate_right(1);
        self.lnz[j] += 1;

        // k now sits at the tail of the live part
        let ins = p0 + self.rowidx[p0..pl].partition_point(|&r| r < k);
        self.rowidx[ins..=pl].rotate_right(1);
        self.lx[ins..=pl].rotate_right(1);
        self.lx[ins] = T::zero();
    }

    // Rank-1 modification LDLᵀ + alpha·w·wᵀ, with w held in fwork and
    // nonzero only on the live elimination path starting at `start`.
    // fwork is zero on return.
    fn rank1(&mut self, start: usize, mut alpha: T) -> f64 {
        let mut flops = 0.;
        let mut j = start;
        loop {
            let pj = self.workspace.fwork[j];
            self.workspace.fwork[j] = T::zero();

            let p0 = self.colptr[j];
            let pl = p0 + self.lnz[j];

            if pj != T::zero() {
                let dj = self.d[j];
                let dnew = self.floor(dj + alpha * pj * pj);
                let gamma = pj * alpha / dnew;
                alpha = alpha * dj / dnew;
                self.d[j] = dnew;

                let w = &mut self.workspace.fwork;
                for (&i, lij) in zip(&self.rowidx[p0..pl], &mut self.lx[p0..pl]) {
                    w[i] -= pj * *lij;
                    *lij += gamma * w[i];
                }
                flops += 4. * (self.lnz[j] as f64) + 6.;
            }

            if self.lnz[j] == 0 {
                break;
            }
            // live parent
            j = self.rowidx[p0];
        }
        flops
    }

    // scatter the active part of column `col` of A into fwork.  Returns
    // the first active row, or None when the column misses every one.
    fn scatter_column(&mut self, a: &CscMatrix<T>, col: usize) -> Option<usize> {
        let (rows, vals) = a.column(col);
        let mut first = None;
        for (&i, &v) in zip(rows, vals) {
            if self.active[i] {
                self.workspace.fwork[i] = v;
                first = first.or(Some(i));
            }
        }
        first
    }
}

impl<T> Factorization<T> for LdlFactor<T>
where
    T: FloatT,
{
    fn factorize(
        &mut self,
        a: &CscMatrix<T>,
        at: &CscMatrix<T>,
        free: &[bool],
        active: &[bool],
        sigma: T,
    ) -> FactorFlops {
        assert_eq!(active.len(), self.n);
        assert_eq!(free.len(), a.n);

        self.sigma = sigma;
        self.active.copy_from_slice(active);
        self.resymbol();
        self.lx.fill(T::zero());
        self.d.fill(T::one());

        let mut flops = FactorFlops::default();

        // next free slot in the live part of each column
        let next = &mut self.workspace.iwork;
        next.copy_from_slice(&self.colptr[0..self.n]);
        let y = &mut self.workspace.fwork;

        for k in 0..self.n {
            if !self.active[k] {
                continue;
            }

            // upper part of column k of A_F·A_Fᵀ, active rows only
            let (cols, akvals) = at.column(k);
            for (&j, &akj) in zip(cols, akvals) {
                if !free[j] {
                    continue;
                }
                let (rows, vals) = a.column(j);
                for (&i, &aij) in zip(rows, vals) {
                    if i > k {
                        break;
                    }
                    if self.active[i] {
                        y[i] += aij * akj;
                        flops.aat += 2.;
                    }
                }
            }

            let mut dk = y[k] + sigma;
            y[k] = T::zero();

            // solve with the leading block along the row pattern of k
            for &j in &self.rowcol[self.rowptr[k]..self.rowptr[k + 1]] {
                if !self.active[j] {
                    continue;
                }
                let yj = y[j];
                y[j] = T::zero();

                let f = self.colptr[j];
                let l = next[j];
                for (&i, &lij) in zip(&self.rowidx[f..l], &self.lx[f..l]) {
                    y[i] -= lij * yj;
                }
                flops.numeric += 2. * ((l - f) as f64);

                debug_assert_eq!(self.rowidx[l], k);
                let lkj = yj / self.d[j];
                self.lx[l] = lkj;
                next[j] += 1;
                dk -= yj * lkj;
                flops.numeric += 3.;
            }

            self.d[k] = if dk < sigma { sigma } else { dk };
        }
        flops
    }

    fn update(&mut self, a: &CscMatrix<T>, col: usize) -> f64 {
        match self.scatter_column(a, col) {
            Some(start) => self.rank1(start, T::one()),
            None => 0.,
        }
    }

    fn downdate(&mut self, a: &CscMatrix<T>, col: usize) -> f64 {
        match self.scatter_column(a, col) {
            Some(start) => self.rank1(start, -T::one()),
            None => 0.,
        }
    }

    fn row_add(
        &mut self,
        a: &CscMatrix<T>,
        at: &CscMatrix<T>,
        free: &[bool],
        k: usize,
    ) -> f64 {
        assert!(!self.active[k]);

        self.active[k] = true;
        for p in self.rowptr[k]..self.rowptr[k + 1] {
            let j = self.rowcol[p];
            self.revive_entry(j, k);
        }

        let mut flops = 0.;
        let y = &mut self.workspace.fwork;
        let ly = &mut self.workspace.fwork2;

        // column k of A_F·A_Fᵀ over every active row
        let (cols, akvals) = at.column(k);
        for (&j, &akj) in zip(cols, akvals) {
            if !free[j] {
                continue;
            }
            let (rows, vals) = a.column(j);
            for (&i, &aij) in zip(rows, vals) {
                if self.active[i] {
                    y[i] += aij * akj;
                }
            }
            flops += 2. * (rows.len() as f64);
        }
        let mut dk = y[k] + self.sigma;
        y[k] = T::zero();

        // L11·z = m12 along the row pattern of k, accumulating L31·z
        for p in self.rowptr[k]..self.rowptr[k + 1] {
            let j = self.rowcol[p];
            if !self.active[j] {
                continue;
            }
            let zj = y[j];
            y[j] = T::zero();

            let f = self.colptr[j];
            let l = f + self.lnz[j];
            let mut pk = LDL_UNKNOWN;
            for q in f..l {
                let i = self.rowidx[q];
                if i < k {
                    y[i] -= self.lx[q] * zj;
                } else if i > k {
                    ly[i] += self.lx[q] * zj;
                } else {
                    pk = q;
                }
            }
            flops += 2. * ((l - f) as f64);

            let lkj = zj / self.d[j];
            self.lx[pk] = lkj;
            dk -= zj * lkj;
        }
        let dk = if dk < self.sigma { self.sigma } else { dk };
        self.d[k] = dk;

        // new column k below the diagonal
        let f = self.colptr[k];
        let l = f + self.lnz[k];
        for q in f..l {
            let i = self.rowidx[q];
            self.lx[q] = (y[i] - ly[i]) / dk;
            y[i] = T::zero();
            ly[i] = T::zero();
        }
        flops += 3. * ((l - f) as f64);

        // trailing submatrix loses d_k·l_k·l_kᵀ
        if l > f {
            for q in f..l {
                self.workspace.fwork[self.rowidx[q]] = self.lx[q];
            }
            flops += self.rank1(self.rowidx[f], -dk);
        }
        flops
    }

    fn row_delete(&mut self, k: usize) -> f64 {
        assert!(self.active[k]);

        let mut flops = 0.;
        let f = self.colptr[k];
        let l = f + self.lnz[k];

        // trailing submatrix regains d_k·l_k·l_kᵀ
        if l > f {
            for q in f..l {
                self.workspace.fwork[self.rowidx[q]] = self.lx[q];
            }
            flops += self.rank1(self.rowidx[f], self.d[k]);
        }
        self.lx[f..l].fill(T::zero());
        self.d[k] = T::one();

        self.active[k] = false;
        for p in self.rowptr[k]..self.rowptr[k + 1] {
            let j = self.rowcol[p];
            self.kill_entry(j, k);
        }
        flops + (self.rowptr[k + 1] - self.rowptr[k]) as f64
    }

    fn resymbol(&mut self) -> f64 {
        let buf = &mut self.workspace.sortbuf;
        for j in 0..self.n {
            let p0 = self.colptr[j];
            let pe = self.colptr[j + 1];

            buf.clear();
            buf.extend(zip(&self.rowidx[p0..pe], &self.lx[p0..pe]).map(|(&r, &v)| (r, v)));
            buf.sort_unstable_by_key(|&(r, _)| (!self.active[r], r));

            let mut live = 0;
            for (q, &(r, v)) in zip(p0..pe, buf.iter()) {
                self.rowidx[q] = r;
                if self.active[r] {
                    self.lx[q] = v;
                    live += 1;
                } else {
                    self.lx[q] = T::zero();
                }
            }
            self.lnz[j] = live;
        }
        for (dk, &act) in zip(&mut self.d, &self.active) {
            if !act {
                *dk = T::one();
            }
        }
        self.rowidx.len() as f64
    }

    fn live_nnz(&self) -> usize {
        zip(&self.lnz, &self.active)
            .filter(|(_, &a)| a)
            .map(|(&c, _)| c + 1)
            .sum()
    }
}

// Upper triangular pattern (diagonal included) of A·Aᵀ, columns sorted.
fn _aat_triu_pattern<T: FloatT>(a: &CscMatrix<T>, at: &CscMatrix<T>) -> (Vec<usize>, Vec<usize>) {
    let m = a.m;
    let mut Ap = Vec::with_capacity(m + 1);
    let mut Ai = Vec::new();
    let mut mark = vec![LDL_UNKNOWN; m];

    Ap.push(0);
    for k in 0..m {
        let start = Ai.len();
        mark[k] = k;
        Ai.push(k);
        for &j in at.column(k).0 {
            for &i in a.column(j).0 {
                if i >= k {
                    break;
                }
                if mark[i] != k {
                    mark[i] = k;
                    Ai.push(i);
                }
            }
        }
        Ai[start..].sort_unstable();
        Ap.push(Ai.len());
    }
    (Ap, Ai)
}

// Compute the elimination tree for a symmetric matrix
// in compressed sparse column form (upper triangle).

fn _etree(
    n: usize,
    Ap: &[usize],
    Ai: &[usize],
    work: &mut [usize],
    Lnz: &mut [usize],
    etree: &mut [usize],
) {
    // zero out Lnz and work.  Set all etree values to unknown
    work.fill(0);
    Lnz.fill(0);
    etree.fill(LDL_UNKNOWN);

    for j in 0..n {
        work[j] = j;
        for istart in Ai.iter().take(Ap[j + 1]).skip(Ap[j]) {
            let mut i = *istart;

            while work[i] != j {
                if etree[i] == LDL_UNKNOWN {
                    etree[i] = j;
                }
                Lnz[i] += 1; // nonzeros in this column
                work[i] = j;
                i = etree[i];
            }
        }
    }
}

// Logical up-looking factorization.  Returns the column pattern of L
// (rows ascending within each column) and its row pattern.
fn _symbolic(
    n: usize,
    Ap: &[usize],
    Ai: &[usize],
    Lnz: &[usize],
    etree: &[usize],
) -> (Vec<usize>, Vec<usize>, Vec<usize>, Vec<usize>) {
    //set Lp to cumsum(Lnz), starting from zero
    let mut Lp = vec![0; n + 1];
    let mut acc = 0;
    for (Lp, Lnz) in zip(&mut Lp[1..], Lnz) {
        *Lp = acc + Lnz;
        acc = *Lp;
    }
    let mut Li = vec![0; acc];

    let mut rowptr = Vec::with_capacity(n + 1);
    let mut rowcol = Vec::with_capacity(acc);

    let mut y_markers = vec![LDL_UNUSED; n];
    let mut elim_buffer = vec![0; n];
    let mut next_colspace = Lp[0..n].to_vec();

    rowptr.push(0);
    for k in 0..n {
        let start = rowcol.len();

        for &bidx in &Ai[Ap[k]..Ap[k + 1]] {
            if bidx == k || y_markers[bidx] == LDL_USED {
                continue;
            }
            // walk up the elimination tree until a visited node
            y_markers[bidx] = LDL_USED;
            elim_buffer[0] = bidx;
            let mut nnz_e = 1;
            let mut next_idx = etree[bidx];
            while next_idx != LDL_UNKNOWN && next_idx < k {
                if y_markers[next_idx] == LDL_USED {
                    break;
                }
                y_markers[next_idx] = LDL_USED;
                elim_buffer[nnz_e] = next_idx;
                next_idx = etree[next_idx];
                nnz_e += 1;
            }
            rowcol.extend_from_slice(&elim_buffer[0..nnz_e]);
        }

        rowcol[start..].sort_unstable();
        for &cidx in &rowcol[start..] {
            Li[next_colspace[cidx]] = k;
            next_colspace[cidx] += 1;
            y_markers[cidx] = LDL_UNUSED;
        }
        rowptr.push(rowcol.len());
    }

    (Lp, Li, rowptr, rowcol)
}

#[path = "test.rs"]
#[cfg(test)]
mod test;
