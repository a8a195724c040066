use crate::algebra::FloatT;

/// Heap position of a candidate that is not in the heap.
pub const EMPTY: usize = usize::MAX;

/// Binary min-heap of breakpoint candidates keyed by break value.
///
/// Candidates are dense ids `0..capacity`.  Equal break values are
/// ordered by candidate id, lowest first.  `position[c] == EMPTY` exactly
/// when `c` is not in the heap.
#[derive(Debug, Clone)]
pub struct BreakHeap<T> {
    heap: Vec<usize>,
    position: Vec<usize>,
    key: Vec<T>,
}

impl<T> BreakHeap<T>
where
    T: FloatT,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            position: vec![EMPTY; capacity],
            key: vec![T::zero(); capacity],
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[inline]
    pub fn contains(&self, c: usize) -> bool {
        self.position[c] != EMPTY
    }

    /// break value of a candidate in the heap
    pub fn key(&self, c: usize) -> Option<T> {
        self.contains(c).then(|| self.key[c])
    }

    pub fn insert(&mut self, c: usize, key: T) {
        debug_assert!(!self.contains(c));
        self.key[c] = key;
        self.position[c] = self.heap.len();
        self.heap.push(c);
        self.sift_up(self.heap.len() - 1);
    }

    /// change the break value of a candidate already in the heap
    pub fn update(&mut self, c: usize, key: T) {
        debug_assert!(self.contains(c));
        let old = self.key[c];
        self.key[c] = key;
        let p = self.position[c];
        if key < old {
            self.sift_up(p);
        } else {
            self.sift_down(p);
        }
    }

    /// remove a candidate from anywhere in the heap
    pub fn delete(&mut self, c: usize) {
        debug_assert!(self.contains(c));
        let p = self.position[c];
        self.position[c] = EMPTY;
        let last = self.heap.pop().unwrap_or(c);
        if p < self.heap.len() {
            self.heap[p] = last;
            self.position[last] = p;
            self.sift_up(p);
            let p = self.position[last];
            self.sift_down(p);
        }
    }

    pub fn peek_min(&self) -> Option<(usize, T)> {
        self.heap.first().map(|&c| (c, self.key[c]))
    }

    pub fn pop_min(&mut self) -> Option<(usize, T)> {
        let (c, key) = self.peek_min()?;
        self.delete(c);
        Some((c, key))
    }

    /// empty the heap, leaving every position EMPTY
    pub fn clear(&mut self) {
        for &c in &self.heap {
            self.position[c] = EMPTY;
        }
        self.heap.clear();
    }

    #[inline]
    fn less(&self, a: usize, b: usize) -> bool {
        let (ka, kb) = (self.key[a], self.key[b]);
        ka < kb || (ka == kb && a < b)
    }

    fn swap(&mut self, p: usize, q: usize) {
        self.heap.swap(p, q);
        self.position[self.heap[p]] = p;
        self.position[self.heap[q]] = q;
    }

    fn sift_up(&mut self, mut p: usize) {
        while p > 0 {
            let parent = (p - 1) / 2;
            if self.less(self.heap[p], self.heap[parent]) {
                self.swap(p, parent);
                p = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut p: usize) {
        let n = self.heap.len();
        loop {
            let l = 2 * p + 1;
            if l >= n {
                break;
            }
            let r = l + 1;
            let child = if r < n && self.less(self.heap[r], self.heap[l]) {
                r
            } else {
                l
            };
            if self.less(self.heap[child], self.heap[p]) {
                self.swap(p, child);
                p = child;
            } else {
                break;
            }
        }
    }

    /// heap order and position bookkeeping hold everywhere
    pub fn is_valid(&self) -> bool {
        let order = (1..self.heap.len()).all(|p| !self.less(self.heap[p], self.heap[(p - 1) / 2]));
        let pos = self.heap.iter().enumerate().all(|(p, &c)| self.position[c] == p);
        let count = self.position.iter().filter(|&&p| p != EMPTY).count() == self.heap.len();
        order && pos && count
    }
}

#[path = "heap_test.rs"]
#[cfg(test)]
mod test;
