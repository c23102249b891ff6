//! Drag and resize state machine.
//!
//! An [`InteractionController`] owns the committed [`Layout`] and at most one
//! [`DragSession`]. Pointer samples produce [`PreviewFrame`]s; a release
//! either commits the last preview or throws it away. Every way out of a
//! session (commit, cancel, drop) detaches the host's pointer listeners and
//! leaves the controller idle.

mod capture;
mod session;

use serde_json::{Value, json};

use crate::config::ControllerConfig;
use crate::error::{LayoutError, Result};
use crate::geometry::{GridPosition, clamp};
use crate::layout::{ActiveMove, Block, BlockId, Layout, ReflowOutcome, reflow, settle};
use crate::logging::{LogLevel, event_with_fields, json_kv};
use crate::metrics::InteractionMetrics;

pub use capture::{NullPointerCapture, PointerCapture};
pub use session::{
    CancelReason, DragSession, GestureKind, GridDelta, PointerPosition, PreviewFrame,
    ReflowStats, SessionOutcome, ValidationIssue, Validity,
};

const LOG_TARGET: &str = "blockgrid::interaction";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    Dragging,
    Resizing,
}

/// Which part of a block sits under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Move,
    /// The bottom-right grid cell of the block.
    Resize,
}

impl Handle {
    pub fn gesture(self) -> GestureKind {
        match self {
            Handle::Move => GestureKind::Drag,
            Handle::Resize => GestureKind::Resize,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitTarget {
    pub block_id: BlockId,
    pub handle: Handle,
}

struct Candidate<K> {
    position: GridPosition,
    layout: Layout<K>,
    validity: Validity,
    reflow: Option<ReflowStats>,
}

pub struct InteractionController<K = String> {
    layout: Layout<K>,
    session: Option<DragSession<K>>,
    config: ControllerConfig,
    column_width_px: f64,
    capture: Box<dyn PointerCapture>,
    last_digest: Option<blake3::Hash>,
}

impl<K: Clone> InteractionController<K> {
    /// Take ownership of `layout`. Positions are re-checked against the grid
    /// and any overlaps are settled before the controller is returned.
    pub fn new(layout: Layout<K>, config: ControllerConfig) -> Result<Self> {
        config.grid.validate()?;
        let column_width_px = column_width(&config, config.surface_width_px)?;
        let layout = Layout::from_blocks(layout.into_blocks(), &config.grid)?;

        let mut controller = Self {
            layout: Layout::new(),
            session: None,
            config,
            column_width_px,
            capture: Box::new(NullPointerCapture),
            last_digest: None,
        };
        controller.layout = controller.normalize(layout);
        Ok(controller)
    }

    pub fn with_capture<C>(mut self, capture: C) -> Self
    where
        C: PointerCapture + 'static,
    {
        self.capture = Box::new(capture);
        self
    }

    /// Start a drag or resize of `block_id` with the pointer at `anchor`.
    ///
    /// The first frame is the unchanged layout so the surface does not jump.
    pub fn begin(
        &mut self,
        block_id: &str,
        gesture: GestureKind,
        anchor: PointerPosition,
    ) -> Result<PreviewFrame<K>> {
        if let Some(session) = self.session.as_ref() {
            return Err(LayoutError::SessionActive(session.block_id.clone()));
        }
        let original = self
            .layout
            .position_of(block_id)
            .ok_or_else(|| LayoutError::BlockNotFound(block_id.to_string()))?;

        self.capture.attach(block_id, gesture);
        self.session = Some(DragSession {
            block_id: block_id.to_string(),
            gesture,
            anchor,
            original_position: original,
            last_position: original,
            last_layout: self.layout.clone(),
            last_validity: Validity::Valid,
            last_reflow: None,
        });
        self.last_digest = Some(self.layout.digest());
        self.with_metrics(InteractionMetrics::record_session);
        self.log(
            LogLevel::Info,
            "session_started",
            [
                json_kv("block", block_id),
                json_kv("gesture", gesture.as_str()),
                json_kv("position", position_json(original)),
            ],
        );

        Ok(PreviewFrame {
            layout: self.layout.clone(),
            position: original,
            validity: Validity::Valid,
            changed: false,
        })
    }

    /// Feed an absolute pointer position.
    pub fn pointer_move(&mut self, position: PointerPosition) -> Result<PreviewFrame<K>> {
        let anchor = self
            .session
            .as_ref()
            .map(|session| session.anchor)
            .ok_or(LayoutError::NoSession)?;
        let (dx, dy) = position.offset_from(anchor);
        self.apply_delta(dx, dy)
    }

    /// Feed the total pixel displacement since the session's anchor.
    pub fn apply_delta(&mut self, dx: f64, dy: f64) -> Result<PreviewFrame<K>> {
        let (block_id, gesture, original) = match self.session.as_ref() {
            Some(session) => (
                session.block_id.clone(),
                session.gesture,
                session.original_position,
            ),
            None => return Err(LayoutError::NoSession),
        };
        let delta = GridDelta::from_pixels(
            dx,
            dy,
            self.column_width_px,
            self.config.grid.row_height_px,
        );

        let candidate = match gesture {
            GestureKind::Drag => self.drag_candidate(&block_id, original, delta),
            GestureKind::Resize => self.resize_candidate(&block_id, original, delta),
        };

        let digest = candidate.layout.digest();
        let changed = self.last_digest != Some(digest);
        self.last_digest = Some(digest);

        let valid = candidate.validity.is_valid();
        self.with_metrics(|metrics| {
            metrics.record_sample(valid);
            if let Some(stats) = candidate.reflow {
                metrics.record_reflow(stats.passes, stats.converged);
            }
        });
        if changed {
            self.log(
                LogLevel::Trace,
                "preview_computed",
                [
                    json_kv("block", block_id.as_str()),
                    json_kv("position", position_json(candidate.position)),
                    json_kv("valid", valid),
                ],
            );
        }

        let frame = PreviewFrame {
            layout: candidate.layout.clone(),
            position: candidate.position,
            validity: candidate.validity.clone(),
            changed,
        };
        if let Some(session) = self.session.as_mut() {
            session.last_position = candidate.position;
            session.last_layout = candidate.layout;
            session.last_validity = candidate.validity;
            session.last_reflow = candidate.reflow;
        }
        Ok(frame)
    }

    /// Pointer-up. A valid drag or any resize commits; an invalid drag is
    /// cancelled and the committed layout stays as it was.
    pub fn release(&mut self) -> Result<SessionOutcome<K>> {
        let session = self.session.take().ok_or(LayoutError::NoSession)?;
        self.capture.detach();
        self.last_digest = None;

        let DragSession {
            block_id,
            gesture,
            last_position,
            last_layout,
            last_validity,
            ..
        } = session;

        let layout = match (gesture, last_validity) {
            (GestureKind::Drag, Validity::Valid) => last_layout,
            (GestureKind::Drag, Validity::Invalid(issue)) => {
                return Ok(self.finish_cancelled(block_id, gesture, CancelReason::Invalid(issue)));
            }
            (GestureKind::Resize, _) if self.config.grid.settle_after_resize => {
                let outcome = reflow(
                    &last_layout,
                    Some(ActiveMove::new(&block_id, last_position)),
                    self.config.grid.max_reflow_passes,
                );
                self.with_metrics(|metrics| metrics.record_reflow(outcome.passes, outcome.converged));
                self.warn_if_unconverged(&block_id, &outcome);
                outcome.layout
            }
            (GestureKind::Resize, _) => last_layout,
        };

        let moves = self.layout.diff(&layout);
        self.layout = layout;
        self.with_metrics(InteractionMetrics::record_commit);
        self.log(
            LogLevel::Info,
            "session_committed",
            [
                json_kv("block", block_id.as_str()),
                json_kv("gesture", gesture.as_str()),
                json_kv("position", position_json(last_position)),
                json_kv("moved", moves.len()),
            ],
        );
        self.emit_metrics();

        Ok(SessionOutcome::Committed {
            block_id,
            gesture,
            layout: self.layout.clone(),
            moves,
        })
    }

    /// Swap in a new committed layout, e.g. after the host added or removed
    /// blocks on its own.
    pub fn replace_layout(&mut self, layout: Layout<K>) -> Result<()> {
        self.ensure_idle()?;
        let layout = Layout::from_blocks(layout.into_blocks(), &self.config.grid)?;
        self.layout = self.normalize(layout);
        Ok(())
    }

    /// Insert a block where the host asked and push existing blocks out of
    /// its way.
    pub fn add_block(&mut self, block: Block<K>) -> Result<()> {
        self.ensure_idle()?;
        let mut next = self.layout.clone();
        let id = block.id.clone();
        let position = block.position;
        next.insert(block, &self.config.grid)?;

        let outcome = reflow(
            &next,
            Some(ActiveMove::new(&id, position)),
            self.config.grid.max_reflow_passes,
        );
        self.with_metrics(|metrics| metrics.record_reflow(outcome.passes, outcome.converged));
        self.warn_if_unconverged(&id, &outcome);
        self.layout = outcome.layout;
        self.log(
            LogLevel::Debug,
            "block_added",
            [
                json_kv("block", id.as_str()),
                json_kv("displaced", outcome.displaced.len()),
            ],
        );
        Ok(())
    }

    pub fn remove_block(&mut self, block_id: &str) -> Result<Block<K>> {
        self.ensure_idle()?;
        let removed = self
            .layout
            .remove(block_id)
            .ok_or_else(|| LayoutError::BlockNotFound(block_id.to_string()))?;
        self.log(LogLevel::Debug, "block_removed", [json_kv("block", block_id)]);
        Ok(removed)
    }

    fn drag_candidate(
        &self,
        block_id: &str,
        original: GridPosition,
        delta: GridDelta,
    ) -> Candidate<K> {
        let grid = &self.config.grid;
        let raw_x = original.x.saturating_add(delta.columns);
        let raw_y = original.y.saturating_add(delta.rows);
        let position = GridPosition::new(
            clamp(raw_x, 0, grid.columns - original.width),
            raw_y.max(0),
            original.width,
            original.height,
        );

        let outcome = reflow(
            &self.layout,
            Some(ActiveMove::new(block_id, position)),
            grid.max_reflow_passes,
        );
        self.warn_if_unconverged(block_id, &outcome);
        let validity = drag_validity(raw_x, original.width, grid.columns, &outcome);

        Candidate {
            position,
            reflow: Some(ReflowStats {
                passes: outcome.passes,
                converged: outcome.converged,
            }),
            layout: outcome.layout,
            validity,
        }
    }

    fn resize_candidate(
        &self,
        block_id: &str,
        original: GridPosition,
        delta: GridDelta,
    ) -> Candidate<K> {
        let grid = &self.config.grid;
        let width = clamp(
            original.width.saturating_add(delta.columns),
            grid.min_width,
            grid.columns - original.x,
        );
        let height = original
            .height
            .saturating_add(delta.rows)
            .max(grid.min_height);
        let position = GridPosition::new(original.x, original.y, width, height);

        let mut layout = self.layout.clone();
        layout.set_position(block_id, position);

        Candidate {
            position,
            layout,
            validity: Validity::Valid,
            reflow: None,
        }
    }

    fn normalize(&self, layout: Layout<K>) -> Layout<K> {
        if layout.is_conflict_free() {
            return layout;
        }
        let overlaps = layout.overlapping_pairs().len();
        let outcome = settle(&layout, self.config.grid.max_reflow_passes);
        self.with_metrics(|metrics| metrics.record_reflow(outcome.passes, outcome.converged));
        self.log(
            LogLevel::Warn,
            "layout_normalized",
            [
                json_kv("overlaps", overlaps),
                json_kv("displaced", outcome.displaced.len()),
                json_kv("converged", outcome.converged),
            ],
        );
        outcome.layout
    }

    fn warn_if_unconverged(&self, block_id: &str, outcome: &ReflowOutcome<K>) {
        if outcome.converged {
            return;
        }
        self.log(
            LogLevel::Warn,
            "reflow_cap_exhausted",
            [
                json_kv("block", block_id),
                json_kv("passes", outcome.passes),
                json_kv("overlaps", outcome.layout.overlapping_pairs().len()),
            ],
        );
    }
}

impl<K> InteractionController<K> {
    pub fn layout(&self) -> &Layout<K> {
        &self.layout
    }

    /// The layout the surface should draw right now.
    pub fn preview(&self) -> &Layout<K> {
        self.session
            .as_ref()
            .map(|session| &session.last_layout)
            .unwrap_or(&self.layout)
    }

    pub fn session(&self) -> Option<&DragSession<K>> {
        self.session.as_ref()
    }

    pub fn state(&self) -> InteractionState {
        match self.session.as_ref().map(|session| session.gesture) {
            None => InteractionState::Idle,
            Some(GestureKind::Drag) => InteractionState::Dragging,
            Some(GestureKind::Resize) => InteractionState::Resizing,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.session.is_none()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn column_width_px(&self) -> f64 {
        self.column_width_px
    }

    /// Recompute the column width after the surface was resized. Allowed
    /// mid-session; later samples use the new width.
    pub fn set_surface_width(&mut self, surface_width_px: f64) -> Result<()> {
        self.column_width_px = column_width(&self.config, surface_width_px)?;
        self.config.surface_width_px = surface_width_px;
        Ok(())
    }

    /// Drop the current session without committing. Returns `None` when idle.
    pub fn cancel(&mut self) -> Option<SessionOutcome<K>> {
        let session = self.session.take()?;
        self.capture.detach();
        self.last_digest = None;
        Some(self.finish_cancelled(session.block_id, session.gesture, CancelReason::Requested))
    }

    /// Block and handle under a surface position, judged on the committed
    /// layout.
    pub fn hit_test(&self, position: PointerPosition) -> Option<HitTarget> {
        let usable = |value: f64| value.is_finite() && value >= 0.0;
        if !usable(position.x) || !usable(position.y) {
            return None;
        }
        let column = (position.x / self.column_width_px).floor() as i32;
        let row = (position.y / self.config.grid.row_height_px).floor() as i32;

        self.layout
            .iter()
            .find(|block| block.position.contains_cell(column, row))
            .map(|block| {
                let pos = block.position;
                let handle = if column == pos.right() - 1 && row == pos.bottom() - 1 {
                    Handle::Resize
                } else {
                    Handle::Move
                };
                HitTarget {
                    block_id: block.id.clone(),
                    handle,
                }
            })
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.session.as_ref() {
            Some(session) => Err(LayoutError::Locked(session.block_id.clone())),
            None => Ok(()),
        }
    }

    fn finish_cancelled(
        &mut self,
        block_id: BlockId,
        gesture: GestureKind,
        reason: CancelReason,
    ) -> SessionOutcome<K> {
        self.with_metrics(InteractionMetrics::record_cancel);
        self.log(
            LogLevel::Info,
            "session_cancelled",
            [
                json_kv("block", block_id.as_str()),
                json_kv("gesture", gesture.as_str()),
                json_kv("reason", reason.to_string()),
            ],
        );
        self.emit_metrics();
        SessionOutcome::Cancelled {
            block_id,
            gesture,
            reason,
        }
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            if logger.enabled(level) {
                let event = event_with_fields(level, LOG_TARGET, message, fields);
                let _ = logger.log_event(event);
            }
        }
    }

    fn with_metrics(&self, update: impl FnOnce(&mut InteractionMetrics)) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                update(&mut guard);
            }
        }
    }

    fn emit_metrics(&self) {
        if let (Some(logger), Some(metrics)) =
            (self.config.logger.as_ref(), self.config.metrics.as_ref())
        {
            if let Ok(guard) = metrics.lock() {
                let event = guard.snapshot().to_log_event(&self.config.metrics_target);
                let _ = logger.log_event(event);
            }
        }
    }
}

impl<K> Drop for InteractionController<K> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.capture.detach();
            self.finish_cancelled(session.block_id, session.gesture, CancelReason::Teardown);
        }
    }
}

fn column_width(config: &ControllerConfig, surface_width_px: f64) -> Result<f64> {
    if !surface_width_px.is_finite() || surface_width_px <= 0.0 {
        return Err(LayoutError::InvalidSurface(surface_width_px));
    }
    Ok(config.grid.column_width_px(surface_width_px))
}

/// Judge a drag preview. The raw horizontal extent decides bounds; a preview
/// the reflow could not untangle is never droppable.
fn drag_validity<K>(raw_x: i32, width: i32, columns: i32, outcome: &ReflowOutcome<K>) -> Validity {
    let right = raw_x.saturating_add(width);
    if raw_x < 0 || right > columns {
        return Validity::Invalid(ValidationIssue::OutOfBounds {
            x: raw_x,
            right,
            columns,
        });
    }
    if !outcome.converged && !outcome.layout.is_conflict_free() {
        return Validity::Invalid(ValidationIssue::Unresolved {
            passes: outcome.passes,
        });
    }
    Validity::Valid
}

fn position_json(position: GridPosition) -> Value {
    json!({
        "x": position.x,
        "y": position.y,
        "width": position.width,
        "height": position.height,
    })
}
