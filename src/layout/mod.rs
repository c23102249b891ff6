//! Block layouts and the reflow engine.
//!
//! [`Layout`] is the committed list of blocks; [`reflow`] turns a layout plus
//! one moved block into a new conflict-free layout.

mod core;
pub mod reflow;

pub use core::{Block, BlockId, BlockMove, Layout};
pub use reflow::{ActiveMove, ReflowOutcome, reflow, settle};
