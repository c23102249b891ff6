//! Block layout engine for a 12-column page builder grid.
//!
//! Blocks are named rectangles on an integer grid. Moving one pushes the
//! blocks it lands on downward until nothing overlaps; resizing one changes
//! only its own footprint while the pointer is held. The
//! [`InteractionController`] turns pointer samples into live previews and a
//! single commit-or-discard decision on release. Rendering block content and
//! persisting the page belong to the host.

pub mod config;
pub mod driver;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod render;
pub mod width;

pub use config::{
    ConfigError, ControllerConfig, DEFAULT_SURFACE_WIDTH_PX, GridConfig, MAX_REFLOW_PASSES,
};
pub use driver::{DriverOutput, TerminalPointerAdapter};
pub use error::{LayoutError, Result};
pub use geometry::{
    GRID_COLUMNS, GRID_ROW_HEIGHT_PX, GridError, GridPosition, MIN_HEIGHT, MIN_WIDTH, clamp,
    overlaps,
};
pub use interaction::{
    CancelReason, DragSession, GestureKind, GridDelta, Handle, HitTarget, InteractionController,
    InteractionState, NullPointerCapture, PointerCapture, PointerPosition, PreviewFrame,
    ReflowStats, SessionOutcome, ValidationIssue, Validity,
};
pub use layout::{ActiveMove, Block, BlockId, BlockMove, Layout, ReflowOutcome, reflow, settle};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use metrics::{InteractionMetrics, MetricSnapshot};
pub use render::{LayoutRenderer, RendererSettings};
pub use width::{display_width, fit_to_width};
