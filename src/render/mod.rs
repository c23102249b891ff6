//! Plain-text rendering of a layout, for terminals, logs, and snapshots.

mod core;

pub use core::{LayoutRenderer, RendererSettings};
