use std::fmt;

use thiserror::Error;

use crate::geometry::GridPosition;
use crate::layout::{BlockId, BlockMove, Layout};

/// What a pointer-down on a block started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    Drag,
    Resize,
}

impl GestureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GestureKind::Drag => "drag",
            GestureKind::Resize => "resize",
        }
    }
}

/// Pointer location in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset_from(&self, anchor: PointerPosition) -> (f64, f64) {
        (self.x - anchor.x, self.y - anchor.y)
    }
}

/// Pixel displacement snapped to whole grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridDelta {
    pub columns: i32,
    pub rows: i32,
}

impl GridDelta {
    /// Rounds to the nearest unit, halves away from zero. Non-finite input
    /// snaps to zero.
    pub fn from_pixels(dx: f64, dy: f64, column_width_px: f64, row_height_px: f64) -> Self {
        Self {
            columns: snap(dx, column_width_px),
            rows: snap(dy, row_height_px),
        }
    }
}

fn snap(pixels: f64, unit: f64) -> i32 {
    let units = (pixels / unit).round();
    if units.is_finite() { units as i32 } else { 0 }
}

/// Why a drag preview cannot be dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("out of bounds: block would span columns {x}..{right} of a {columns}-column grid")]
    OutOfBounds { x: i32, right: i32, columns: i32 },
    #[error("layout could not be resolved after {passes} reflow passes")]
    Unresolved { passes: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Validity {
    #[default]
    Valid,
    Invalid(ValidationIssue),
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }

    pub fn issue(&self) -> Option<&ValidationIssue> {
        match self {
            Validity::Valid => None,
            Validity::Invalid(issue) => Some(issue),
        }
    }

    pub fn message(&self) -> Option<String> {
        self.issue().map(ToString::to_string)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReflowStats {
    pub passes: usize,
    pub converged: bool,
}

/// State held between pointer-down and pointer-up.
#[derive(Debug, Clone)]
pub struct DragSession<K = String> {
    pub(crate) block_id: BlockId,
    pub(crate) gesture: GestureKind,
    pub(crate) anchor: PointerPosition,
    pub(crate) original_position: GridPosition,
    pub(crate) last_position: GridPosition,
    pub(crate) last_layout: Layout<K>,
    pub(crate) last_validity: Validity,
    pub(crate) last_reflow: Option<ReflowStats>,
}

impl<K> DragSession<K> {
    pub fn block_id(&self) -> &str {
        &self.block_id
    }

    pub fn gesture(&self) -> GestureKind {
        self.gesture
    }

    pub fn anchor(&self) -> PointerPosition {
        self.anchor
    }

    pub fn original_position(&self) -> GridPosition {
        self.original_position
    }

    pub fn last_position(&self) -> GridPosition {
        self.last_position
    }

    pub fn last_layout(&self) -> &Layout<K> {
        &self.last_layout
    }

    pub fn last_validity(&self) -> &Validity {
        &self.last_validity
    }

    pub fn last_reflow(&self) -> Option<ReflowStats> {
        self.last_reflow
    }
}

/// What the surface should draw after a pointer sample.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewFrame<K = String> {
    pub layout: Layout<K>,
    /// Where the held block would land.
    pub position: GridPosition,
    pub validity: Validity,
    /// `false` when the layout matches the previous frame of this session.
    pub changed: bool,
}

impl<K> PreviewFrame<K> {
    pub fn is_valid(&self) -> bool {
        self.validity.is_valid()
    }

    pub fn message(&self) -> Option<String> {
        self.validity.message()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
    /// Released while the preview was invalid.
    Invalid(ValidationIssue),
    /// The host asked for it, e.g. on focus loss.
    Requested,
    /// The controller was dropped mid-session.
    Teardown,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Invalid(issue) => write!(f, "invalid drop: {issue}"),
            CancelReason::Requested => f.write_str("requested"),
            CancelReason::Teardown => f.write_str("teardown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome<K = String> {
    Committed {
        block_id: BlockId,
        gesture: GestureKind,
        layout: Layout<K>,
        moves: Vec<BlockMove>,
    },
    Cancelled {
        block_id: BlockId,
        gesture: GestureKind,
        reason: CancelReason,
    },
}

impl<K> SessionOutcome<K> {
    pub fn is_committed(&self) -> bool {
        matches!(self, SessionOutcome::Committed { .. })
    }

    pub fn block_id(&self) -> &str {
        match self {
            SessionOutcome::Committed { block_id, .. } | SessionOutcome::Cancelled { block_id, .. } => {
                block_id
            }
        }
    }

    /// The new layout, if the session committed.
    pub fn committed_layout(&self) -> Option<&Layout<K>> {
        match self {
            SessionOutcome::Committed { layout, .. } => Some(layout),
            SessionOutcome::Cancelled { .. } => None,
        }
    }
}
