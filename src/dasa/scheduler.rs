//! Bottom-up job scheduling over the block tree.
//!
//! A job is one block whose subtree is optimized jointly: its own rows and
//! those of every descendant.  A block becomes a job once every child is
//! resolved, either by converging or by having no active rows at all.

use super::activeset::IndexList;
use super::blocktree::BlockTree;
use super::status::DasaStatus;
use std::ops::Range;

/// A block queued for one sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub block: usize,
    pub rows: Range<usize>,
    pub cols: Range<usize>,
    /// set when the line search changed the active set
    pub changed: bool,
    /// first row whose forward solve must be recomputed, `None` for all
    pub mark: Option<usize>,
}

impl Job {
    fn new(tree: &BlockTree, block: usize) -> Self {
        Self {
            block,
            rows: tree.subtree_rows(block),
            cols: tree.subtree_cols(block),
            changed: false,
            mark: None,
        }
    }
}

/// Job lists and unresolved child counters of one engine run.
#[derive(Debug, Clone)]
pub struct JobScheduler {
    kidsleft: Vec<usize>,
    jobs: Vec<Job>,
}

impl JobScheduler {
    pub fn new(tree: &BlockTree) -> Self {
        Self {
            kidsleft: vec![0; tree.nblocks()],
            jobs: Vec::with_capacity(tree.nblocks()),
        }
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn jobs_mut(&mut self) -> &mut [Job] {
        &mut self.jobs
    }

    /// true when the current sweep includes the root block
    pub fn at_root(&self, tree: &BlockTree) -> bool {
        self.jobs.iter().any(|job| job.block == tree.root())
    }

    /// Queue the first sweep: every block whose children are all resolved
    /// and whose subtree holds an active row.  Blocks with no active rows
    /// in their subtree resolve immediately.
    pub fn seed(&mut self, tree: &BlockTree, rows: &IndexList) {
        self.jobs.clear();
        for k in 0..tree.nblocks() {
            self.kidsleft[k] = tree.kids(k).len();
        }

        // postorder visits every child before its parent
        for k in 0..tree.nblocks() {
            if self.kidsleft[k] != 0 {
                continue;
            }
            let sub = tree.subtree_rows(k);
            if rows.seek(sub.start, sub.end).is_some() {
                self.jobs.push(Job::new(tree, k));
            } else if let Some(p) = tree.parent(k) {
                self.kidsleft[p] -= 1;
            }
        }
    }

    /// Build the next sweep from the outcome of the current one.
    ///
    /// Changed jobs are queued again; with `refactored` set their forward
    /// solves start over.  Converged jobs resolve their parent, which is
    /// queued once all its children are resolved, or resolved in turn when
    /// none of its own rows is active.  Returns a status when the run is
    /// over.
    pub fn advance(
        &mut self,
        tree: &BlockTree,
        rows: &IndexList,
        refactored: bool,
    ) -> Option<DasaStatus> {
        let any_changed = self.jobs.iter().any(|job| job.changed);
        if !any_changed && self.at_root(tree) {
            return Some(DasaStatus::SolutionFound);
        }
        if rows.is_empty() {
            return Some(DasaStatus::AllRowsDropped);
        }

        let mut next = Vec::with_capacity(self.jobs.len());
        for job in self.jobs.drain(..) {
            if job.changed {
                next.push(Job {
                    changed: false,
                    mark: if refactored { None } else { job.mark },
                    ..job
                });
                continue;
            }

            // walk up through resolved ancestors
            let mut k = job.block;
            loop {
                let Some(p) = tree.parent(k) else {
                    return Some(DasaStatus::SolutionFound);
                };
                self.kidsleft[p] -= 1;
                if self.kidsleft[p] > 0 {
                    break;
                }
                let own = tree.own_rows(p);
                if rows.seek(own.start, own.end).is_some() {
                    next.push(Job::new(tree, p));
                    break;
                }
                k = p;
            }
        }
        self.jobs = next;
        None
    }
}
