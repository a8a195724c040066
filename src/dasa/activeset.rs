//! Active rows and bound columns, kept as intrusive lists over dense
//! index arenas.

use itertools::Itertools;

const NIL: usize = usize::MAX;

/// Doubly linked list over the indices `0..n`, stored in two arrays with
/// a sentinel node at index `n`.  Linking and unlinking never allocate.
#[derive(Debug, Clone)]
pub struct IndexList {
    next: Vec<usize>,
    prev: Vec<usize>,
    len: usize,
}

impl IndexList {
    pub fn new(n: usize) -> Self {
        let mut next = vec![NIL; n + 1];
        let mut prev = vec![NIL; n + 1];
        next[n] = n;
        prev[n] = n;
        Self { next, prev, len: 0 }
    }

    #[inline]
    fn sentinel(&self) -> usize {
        self.next.len() - 1
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn contains(&self, i: usize) -> bool {
        self.next[i] != NIL
    }

    /// first linked index in `from..end`
    pub fn seek(&self, from: usize, end: usize) -> Option<usize> {
        (from..end).find(|&i| self.contains(i))
    }

    pub fn first(&self) -> Option<usize> {
        self.wrap(self.next[self.sentinel()])
    }

    pub fn last(&self) -> Option<usize> {
        self.wrap(self.prev[self.sentinel()])
    }

    /// successor of a linked index
    #[inline]
    pub fn next(&self, i: usize) -> Option<usize> {
        debug_assert!(self.contains(i));
        self.wrap(self.next[i])
    }

    /// predecessor of a linked index
    #[inline]
    pub fn prev(&self, i: usize) -> Option<usize> {
        debug_assert!(self.contains(i));
        self.wrap(self.prev[i])
    }

    #[inline]
    fn wrap(&self, i: usize) -> Option<usize> {
        if i == self.sentinel() {
            None
        } else {
            Some(i)
        }
    }

    /// link `i` after `pos`, or at the front when `pos` is `None`
    pub fn insert_after(&mut self, pos: Option<usize>, i: usize) {
        debug_assert!(!self.contains(i));
        let p = pos.unwrap_or(self.sentinel());
        let n = self.next[p];
        self.next[p] = i;
        self.prev[i] = p;
        self.next[i] = n;
        self.prev[n] = i;
        self.len += 1;
    }

    pub fn push_back(&mut self, i: usize) {
        let last = self.last();
        self.insert_after(last, i);
    }

    pub fn unlink(&mut self, i: usize) {
        debug_assert!(self.contains(i));
        let (p, n) = (self.prev[i], self.next[i]);
        self.next[p] = n;
        self.prev[n] = p;
        self.next[i] = NIL;
        self.prev[i] = NIL;
        self.len -= 1;
    }

    pub fn iter(&self) -> IndexListIter<'_> {
        IndexListIter {
            list: self,
            cur: self.first(),
        }
    }

    /// linked indices from `start` onwards
    pub fn iter_from(&self, start: Option<usize>) -> IndexListIter<'_> {
        IndexListIter {
            list: self,
            cur: start,
        }
    }

    /// `next(prev(i)) == i` for every linked `i`, and the length agrees
    pub fn is_consistent(&self) -> bool {
        let s = self.sentinel();
        let mut count = 0;
        let mut i = self.next[s];
        while i != s {
            if i == NIL || self.next[self.prev[i]] != i || self.prev[self.next[i]] != i {
                return false;
            }
            count += 1;
            if count > self.len {
                return false;
            }
            i = self.next[i];
        }
        count == self.len
    }
}

pub struct IndexListIter<'a> {
    list: &'a IndexList,
    cur: Option<usize>,
}

impl<'a> Iterator for IndexListIter<'a> {
    type Item = usize;
    fn next(&mut self) -> Option<usize> {
        let i = self.cur?;
        self.cur = self.list.wrap(self.list.next[i]);
        Some(i)
    }
}

/// Status of a constraint row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    /// `bl == bu`; never dropped.
    Equality,
    /// active at `bl`, multiplier nonnegative
    AtLower,
    /// active at `bu`, multiplier nonpositive
    AtUpper,
    /// excluded from the factorization and every active list
    Dropped,
}

impl RowStatus {
    #[inline]
    pub fn is_active(&self) -> bool {
        !matches!(self, RowStatus::Dropped)
    }
}

/// Status of a primal variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnStatus {
    Free,
    AtLower,
    AtUpper,
}

impl ColumnStatus {
    /// `-1` at the lower bound, `+1` at the upper bound, `0` when free
    pub fn sign(&self) -> i8 {
        match self {
            ColumnStatus::Free => 0,
            ColumnStatus::AtLower => -1,
            ColumnStatus::AtUpper => 1,
        }
    }
}

/// Which side of a two-sided bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundSide {
    Lower,
    Upper,
}

/// Working active set of one projection problem.
#[derive(Debug, Clone)]
pub struct ActiveSet {
    row_status: Vec<RowStatus>,
    col_status: Vec<ColumnStatus>,
    rows: IndexList,
    bound: IndexList,
    free: Vec<usize>,
    free_pos: Vec<usize>,
    dropped: Vec<usize>,
}

impl ActiveSet {
    /// Every row dropped, every column free.
    pub fn new(m: usize, n: usize) -> Self {
        Self {
            row_status: vec![RowStatus::Dropped; m],
            col_status: vec![ColumnStatus::Free; n],
            rows: IndexList::new(m),
            bound: IndexList::new(n),
            free: (0..n).collect(),
            free_pos: (0..n).collect(),
            dropped: Vec::with_capacity(m),
        }
    }

    pub fn row_status(&self, i: usize) -> RowStatus {
        self.row_status[i]
    }

    pub fn col_status(&self, j: usize) -> ColumnStatus {
        self.col_status[j]
    }

    #[inline]
    pub fn is_row_active(&self, i: usize) -> bool {
        self.rows.contains(i)
    }

    #[inline]
    pub fn is_free(&self, j: usize) -> bool {
        self.col_status[j] == ColumnStatus::Free
    }

    /// the ascending list of active rows
    pub fn rows(&self) -> &IndexList {
        &self.rows
    }

    /// the list of columns at a bound
    pub fn bound_columns(&self) -> &IndexList {
        &self.bound
    }

    /// the free column set `F`
    pub fn free_columns(&self) -> &[usize] {
        &self.free
    }

    pub fn n_active_rows(&self) -> usize {
        self.rows.len()
    }

    /// Rows dropped since the last call to [`take_dropped`](ActiveSet::take_dropped).
    pub fn recently_dropped(&self) -> &[usize] {
        &self.dropped
    }

    pub fn take_dropped(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.dropped)
    }

    /// Link a row into the ascending active list with the given status.
    /// Runs in time proportional to the distance to the preceding active row.
    pub fn activate(&mut self, row: usize, status: RowStatus) {
        debug_assert!(status.is_active());
        debug_assert!(!self.rows.contains(row));

        let pred = (0..row).rev().find(|&i| self.rows.contains(i));
        self.rows.insert_after(pred, row);
        self.row_status[row] = status;
    }

    /// Unlink an active row and record it as recently dropped.
    pub fn deactivate(&mut self, row: usize) {
        debug_assert!(self.rows.contains(row));
        self.rows.unlink(row);
        self.row_status[row] = RowStatus::Dropped;
        self.dropped.push(row);
    }

    /// Fix a free column at one of its bounds.
    pub fn activate_bound(&mut self, col: usize, side: BoundSide) {
        if self.is_free(col) {
            // swap-remove from F
            let pos = self.free_pos[col];
            let last = self.free.len() - 1;
            self.free.swap(pos, last);
            self.free_pos[self.free[pos]] = pos;
            self.free.pop();
            self.free_pos[col] = NIL;
            self.bound.push_back(col);
        }
        self.col_status[col] = match side {
            BoundSide::Lower => ColumnStatus::AtLower,
            BoundSide::Upper => ColumnStatus::AtUpper,
        };
    }

    /// Release a bound column into `F`.
    pub fn free(&mut self, col: usize) {
        debug_assert!(!self.is_free(col));
        self.bound.unlink(col);
        self.free_pos[col] = self.free.len();
        self.free.push(col);
        self.col_status[col] = ColumnStatus::Free;
    }

    /// Debug-build verification of the list and status invariants.
    pub fn check_invariants(&self) -> bool {
        let rows_sorted = self.rows.iter().tuple_windows().all(|(a, b)| a < b);
        let rows_agree = (0..self.row_status.len())
            .all(|i| self.rows.contains(i) == self.row_status[i].is_active());
        let free_agree = self.free.iter().enumerate().all(|(p, &j)| {
            self.free_pos[j] == p && self.col_status[j] == ColumnStatus::Free
        });
        let bound_agree = self.bound.iter().all(|j| !self.is_free(j))
            && self.free.len() + self.bound.len() == self.col_status.len();
        self.rows.is_consistent()
            && self.bound.is_consistent()
            && rows_sorted
            && rows_agree
            && free_agree
            && bound_agree
    }
}

#[path = "activeset_test.rs"]
#[cfg(test)]
mod test;
