//! Nested phase timers for the projection engine.

#[allow(clippy::module_inception)]
mod timers;
pub use timers::*;
