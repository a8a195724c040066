//! Sparse matrix and vector types used by the projection engine.

mod csc;
mod error_types;
mod floats;
mod vecmath;

pub use csc::*;
pub use error_types::*;
pub use floats::*;
pub use vecmath::*;

#[path = "tests/mod.rs"]
#[cfg(test)]
mod tests;
