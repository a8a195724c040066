//! Dual active set engine for polyhedral projection.
//!
//! The engine maintains a working set of active constraint rows and bound
//! columns, and maximizes the dual of the projection problem over it with
//! Newton steps on `A_F·A_Fᵀ + σI`.  The factor of that matrix is modified
//! in place as rows drop and columns free, or refactored when the cost
//! model expects that to be cheaper.  A block tree lets subtrees of the
//! problem converge on their own before their separators are processed.
//!
//! Most users want [`ProjectionSolver`], which wraps the engine in an
//! outer loop that settles the active set.  [`DasaContext`] and
//! [`run_dasa`] expose a single engine run for callers that manage the
//! active set themselves.

pub mod activeset;
pub mod blocktree;
pub mod costmodel;
pub mod heap;
pub mod linesearch;
pub mod scheduler;
pub mod solve;

mod driver;
mod engine;
mod info;
mod inner;
#[cfg(feature = "serde")]
mod json;
mod modify;
mod problem;
mod settings;
mod status;

pub use activeset::{ActiveSet, BoundSide, ColumnStatus, RowStatus};
pub use blocktree::{BlockTree, BlockTreeError};
pub use costmodel::CheapInnerAdvice;
pub use driver::*;
pub use engine::{run_dasa, DasaContext, DasaError};
pub use info::*;
pub use inner::*;
pub use modify::ModificationLog;
pub use problem::*;
pub use settings::*;
pub use status::*;
