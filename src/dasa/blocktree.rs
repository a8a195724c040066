#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::ops::Range;
use thiserror::Error;

/// Parent marker of the root block.
pub const NO_BLOCK: usize = usize::MAX;

/// Error codes returnable from [`BlockTree`](BlockTree) construction
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BlockTreeError {
    #[error("Block tree arrays have inconsistent lengths")]
    IncompatibleDimension,
    #[error("Row or column starts must begin at zero and be nondecreasing")]
    BadRanges,
    #[error("Block {0} is not numbered before its parent")]
    NotPostordered(usize),
    #[error("The last block must be the only root")]
    BadRoot,
    #[error("The descendants of block {0} are not numbered contiguously")]
    NotContiguous(usize),
}

/// Static multilevel decomposition of the rows and columns of `A`.
///
/// Blocks are numbered in postorder, so the parent of block `k` is
/// numbered above `k` and the root is the last block.  Every block owns a
/// half-open range of rows and of columns; the descendants of `k` are the
/// blocks `leftdesc(k)..k` and together with `k` cover the contiguous
/// ranges returned by [`subtree_rows`](BlockTree::subtree_rows) and
/// [`subtree_cols`](BlockTree::subtree_cols).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "BlockTreeParts", into = "BlockTreeParts")
)]
pub struct BlockTree {
    parent: Vec<usize>,
    kids_ptr: Vec<usize>,
    kids: Vec<usize>,
    depth: Vec<usize>,
    leftdesc: Vec<usize>,
    row_start: Vec<usize>,
    col_start: Vec<usize>,
}

impl BlockTree {
    /// A tree with a single block covering every row and column.
    pub fn single(m: usize, n: usize) -> Self {
        // one root block cannot fail validation
        Self::new(vec![NO_BLOCK], vec![0, m], vec![0, n]).unwrap()
    }

    /// Build a tree from the parent of every block and the starting row and
    /// column of every block (with one trailing end marker each).
    pub fn new(
        parent: Vec<usize>,
        row_start: Vec<usize>,
        col_start: Vec<usize>,
    ) -> Result<Self, BlockTreeError> {
        let nblk = parent.len();
        if nblk == 0 || row_start.len() != nblk + 1 || col_start.len() != nblk + 1 {
            return Err(BlockTreeError::IncompatibleDimension);
        }
        for starts in [&row_start, &col_start] {
            if starts[0] != 0 || starts.windows(2).any(|w| w[0] > w[1]) {
                return Err(BlockTreeError::BadRanges);
            }
        }

        let root = nblk - 1;
        if parent[root] != NO_BLOCK {
            return Err(BlockTreeError::BadRoot);
        }
        for (k, &p) in parent.iter().enumerate().take(root) {
            if p == NO_BLOCK {
                return Err(BlockTreeError::BadRoot);
            }
            if p <= k || p >= nblk {
                return Err(BlockTreeError::NotPostordered(k));
            }
        }

        // kids in ascending order
        let mut kids_ptr = vec![0; nblk + 1];
        for &p in parent.iter().take(root) {
            kids_ptr[p + 1] += 1;
        }
        for k in 0..nblk {
            kids_ptr[k + 1] += kids_ptr[k];
        }
        let mut next = kids_ptr.clone();
        let mut kids = vec![0; root];
        for (k, &p) in parent.iter().enumerate().take(root) {
            kids[next[p]] = k;
            next[p] += 1;
        }

        let mut leftdesc: Vec<usize> = (0..nblk).collect();
        let mut size = vec![1usize; nblk];
        for k in 0..root {
            let p = parent[k];
            leftdesc[p] = leftdesc[p].min(leftdesc[k]);
            size[p] += size[k];
        }
        for k in 0..nblk {
            if k + 1 - leftdesc[k] != size[k] {
                return Err(BlockTreeError::NotContiguous(k));
            }
        }

        let mut depth = vec![0; nblk];
        for k in (0..root).rev() {
            depth[k] = depth[parent[k]] + 1;
        }

        Ok(Self {
            parent,
            kids_ptr,
            kids,
            depth,
            leftdesc,
            row_start,
            col_start,
        })
    }

    pub fn nblocks(&self) -> usize {
        self.parent.len()
    }

    pub fn root(&self) -> usize {
        self.parent.len() - 1
    }

    pub fn nrows(&self) -> usize {
        self.row_start[self.nblocks()]
    }

    pub fn ncols(&self) -> usize {
        self.col_start[self.nblocks()]
    }

    pub fn parent(&self, k: usize) -> Option<usize> {
        match self.parent[k] {
            NO_BLOCK => None,
            p => Some(p),
        }
    }

    pub fn kids(&self, k: usize) -> &[usize] {
        &self.kids[self.kids_ptr[k]..self.kids_ptr[k + 1]]
    }

    pub fn depth(&self, k: usize) -> usize {
        self.depth[k]
    }

    pub fn leftdesc(&self, k: usize) -> usize {
        self.leftdesc[k]
    }

    pub fn is_leaf(&self, k: usize) -> bool {
        self.kids_ptr[k] == self.kids_ptr[k + 1]
    }

    /// rows owned by block `k` itself
    pub fn own_rows(&self, k: usize) -> Range<usize> {
        self.row_start[k]..self.row_start[k + 1]
    }

    /// rows of the subtree rooted at block `k`
    pub fn subtree_rows(&self, k: usize) -> Range<usize> {
        self.row_start[self.leftdesc[k]]..self.row_start[k + 1]
    }

    /// columns owned by block `k` itself
    pub fn own_cols(&self, k: usize) -> Range<usize> {
        self.col_start[k]..self.col_start[k + 1]
    }

    /// columns of the subtree rooted at block `k`
    pub fn subtree_cols(&self, k: usize) -> Range<usize> {
        self.col_start[self.leftdesc[k]]..self.col_start[k + 1]
    }

    /// block owning row `i`
    pub fn block_of_row(&self, i: usize) -> usize {
        // last block whose start is <= i, skipping empty blocks
        self.row_start.partition_point(|&s| s <= i) - 1
    }

    /// block owning column `j`
    pub fn block_of_col(&self, j: usize) -> usize {
        self.col_start.partition_point(|&s| s <= j) - 1
    }

    /// true when `a` is `b` or one of its ancestors
    pub fn is_ancestor_or_self(&self, a: usize, b: usize) -> bool {
        self.leftdesc[a] <= b && b <= a
    }
}

// serialized form, validated again on the way in
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct BlockTreeParts {
    parent: Vec<usize>,
    row_start: Vec<usize>,
    col_start: Vec<usize>,
}

#[cfg(feature = "serde")]
impl TryFrom<BlockTreeParts> for BlockTree {
    type Error = BlockTreeError;
    fn try_from(p: BlockTreeParts) -> Result<Self, Self::Error> {
        BlockTree::new(p.parent, p.row_start, p.col_start)
    }
}

#[cfg(feature = "serde")]
impl From<BlockTree> for BlockTreeParts {
    fn from(t: BlockTree) -> Self {
        BlockTreeParts {
            parent: t.parent,
            row_start: t.row_start,
            col_start: t.col_start,
        }
    }
}

#[path = "blocktree_test.rs"]
#[cfg(test)]
mod test;
