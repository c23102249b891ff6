//! Crossterm pointer adapter.
//!
//! Treats one terminal cell as one pointer unit, so a controller driven from
//! here should be configured with a surface width of `columns * cell_width`
//! and a row height equal to the lines drawn per grid row. With
//! [`TerminalPointerAdapter::tracking_terminal_width`] the surface width
//! follows the terminal instead.

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};

use crate::error::Result;
use crate::interaction::{InteractionController, PointerPosition, PreviewFrame, SessionOutcome};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};

const LOG_TARGET: &str = "blockgrid::driver";

/// What the surface should do after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverOutput<K = String> {
    Preview(PreviewFrame<K>),
    Finished(SessionOutcome<K>),
    /// The terminal changed size; the surface should be redrawn.
    Resized { columns: u16, rows: u16 },
}

pub struct TerminalPointerAdapter {
    origin_column: u16,
    origin_row: u16,
    track_width: bool,
    logger: Option<Logger>,
}

impl Default for TerminalPointerAdapter {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl TerminalPointerAdapter {
    /// `origin_*` is the terminal cell where grid column 0, row 0 is drawn.
    pub fn new(origin_column: u16, origin_row: u16) -> Self {
        Self {
            origin_column,
            origin_row,
            track_width: false,
            logger: None,
        }
    }

    /// Resize the controller's surface to the terminal columns right of the
    /// origin whenever the terminal is resized.
    pub fn tracking_terminal_width(mut self) -> Self {
        self.track_width = true;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn to_pointer(&self, column: u16, row: u16) -> PointerPosition {
        PointerPosition::new(
            f64::from(column) - f64::from(self.origin_column),
            f64::from(row) - f64::from(self.origin_row),
        )
    }

    /// Route one terminal event. Events that mean nothing in the current
    /// state yield `Ok(None)`.
    pub fn handle_event<K: Clone>(
        &mut self,
        controller: &mut InteractionController<K>,
        event: &Event,
    ) -> Result<Option<DriverOutput<K>>> {
        match event {
            Event::Mouse(mouse) => self.handle_mouse(controller, mouse),
            Event::FocusLost => Ok(self.cancel(controller, "focus_lost")),
            Event::Resize(columns, rows) => self.handle_resize(controller, *columns, *rows),
            Event::Key(KeyEvent {
                code: KeyCode::Esc,
                kind,
                ..
            }) if *kind != KeyEventKind::Release => Ok(self.cancel(controller, "escape")),
            _ => Ok(None),
        }
    }

    fn handle_mouse<K: Clone>(
        &mut self,
        controller: &mut InteractionController<K>,
        mouse: &MouseEvent,
    ) -> Result<Option<DriverOutput<K>>> {
        let pointer = self.to_pointer(mouse.column, mouse.row);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if !controller.is_idle() {
                    self.log(
                        LogLevel::Debug,
                        "pointer_down_ignored",
                        [json_kv("column", mouse.column), json_kv("row", mouse.row)],
                    );
                    return Ok(None);
                }
                let Some(target) = controller.hit_test(pointer) else {
                    return Ok(None);
                };
                let frame = controller.begin(&target.block_id, target.handle.gesture(), pointer)?;
                Ok(Some(DriverOutput::Preview(frame)))
            }
            MouseEventKind::Drag(MouseButton::Left) if !controller.is_idle() => {
                let frame = controller.pointer_move(pointer)?;
                Ok(Some(DriverOutput::Preview(frame)))
            }
            MouseEventKind::Up(MouseButton::Left) if !controller.is_idle() => {
                controller.pointer_move(pointer)?;
                let outcome = controller.release()?;
                Ok(Some(DriverOutput::Finished(outcome)))
            }
            _ => Ok(None),
        }
    }

    fn handle_resize<K>(
        &self,
        controller: &mut InteractionController<K>,
        columns: u16,
        rows: u16,
    ) -> Result<Option<DriverOutput<K>>> {
        let usable = columns.saturating_sub(self.origin_column);
        if self.track_width && usable > 0 {
            controller.set_surface_width(f64::from(usable))?;
        }
        self.log(
            LogLevel::Debug,
            "terminal_resized",
            [
                json_kv("columns", columns),
                json_kv("rows", rows),
                json_kv("column_width", controller.column_width_px()),
            ],
        );
        Ok(Some(DriverOutput::Resized { columns, rows }))
    }

    fn cancel<K>(
        &self,
        controller: &mut InteractionController<K>,
        cause: &str,
    ) -> Option<DriverOutput<K>> {
        let outcome = controller.cancel()?;
        self.log(
            LogLevel::Debug,
            "session_cancelled_by_host",
            [json_kv("cause", cause)],
        );
        Some(DriverOutput::Finished(outcome))
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.logger.as_ref() {
            let _ = logger.log_event(event_with_fields(level, LOG_TARGET, message, fields));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ControllerConfig, GridConfig};
    use crate::geometry::GridPosition;
    use crate::interaction::{CancelReason, GestureKind};
    use crate::layout::{Block, Layout};
    use crossterm::event::KeyModifiers;

    fn terminal_controller() -> InteractionController {
        let grid = GridConfig {
            row_height_px: 1.0,
            ..GridConfig::default()
        };
        let layout = Layout::from_blocks(
            vec![
                Block::new("a", "list".to_string(), GridPosition::new(0, 0, 4, 2)),
                Block::new("b", "chart".to_string(), GridPosition::new(4, 0, 4, 2)),
            ],
            &grid,
        )
        .unwrap();
        let config = ControllerConfig::with_grid(grid).with_surface_width(36.0);
        InteractionController::new(layout, config).unwrap()
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn drag_gesture_commits_through_the_controller() {
        let mut ctl = terminal_controller();
        let mut adapter = TerminalPointerAdapter::default();

        let down = adapter
            .handle_event(&mut ctl, &mouse(MouseEventKind::Down(MouseButton::Left), 1, 0))
            .unwrap();
        assert!(matches!(down, Some(DriverOutput::Preview(_))));
        assert_eq!(ctl.session().unwrap().gesture(), GestureKind::Drag);

        let drag = adapter
            .handle_event(&mut ctl, &mouse(MouseEventKind::Drag(MouseButton::Left), 13, 0))
            .unwrap();
        match drag {
            Some(DriverOutput::Preview(frame)) => {
                assert_eq!(frame.position, GridPosition::new(4, 0, 4, 2));
                assert_eq!(frame.layout.position_of("b").unwrap().y, 2);
            }
            other => panic!("expected preview, got {other:?}"),
        }

        let up = adapter
            .handle_event(&mut ctl, &mouse(MouseEventKind::Up(MouseButton::Left), 13, 0))
            .unwrap();
        assert!(matches!(up, Some(DriverOutput::Finished(outcome)) if outcome.is_committed()));
        assert_eq!(ctl.layout().position_of("a"), Some(GridPosition::new(4, 0, 4, 2)));
        assert!(ctl.is_idle());
    }

    #[test]
    fn corner_press_starts_a_resize() {
        let mut ctl = terminal_controller();
        let mut adapter = TerminalPointerAdapter::new(2, 1);

        adapter
            .handle_event(&mut ctl, &mouse(MouseEventKind::Down(MouseButton::Left), 25, 2))
            .unwrap();
        assert_eq!(ctl.session().unwrap().gesture(), GestureKind::Resize);
        assert_eq!(ctl.session().unwrap().block_id(), "b");

        adapter
            .handle_event(&mut ctl, &mouse(MouseEventKind::Up(MouseButton::Left), 31, 3))
            .unwrap();
        assert_eq!(ctl.layout().position_of("b"), Some(GridPosition::new(4, 0, 6, 3)));
    }

    #[test]
    fn focus_loss_and_escape_cancel() {
        let mut ctl = terminal_controller();
        let mut adapter = TerminalPointerAdapter::default();
        let before = ctl.layout().clone();

        adapter
            .handle_event(&mut ctl, &mouse(MouseEventKind::Down(MouseButton::Left), 1, 0))
            .unwrap();
        adapter
            .handle_event(&mut ctl, &mouse(MouseEventKind::Drag(MouseButton::Left), 20, 3))
            .unwrap();
        let out = adapter.handle_event(&mut ctl, &Event::FocusLost).unwrap();
        assert!(matches!(
            out,
            Some(DriverOutput::Finished(SessionOutcome::Cancelled {
                reason: CancelReason::Requested,
                ..
            }))
        ));
        assert_eq!(ctl.layout(), &before);

        adapter
            .handle_event(&mut ctl, &mouse(MouseEventKind::Down(MouseButton::Left), 1, 0))
            .unwrap();
        let esc = Event::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        assert!(adapter.handle_event(&mut ctl, &esc).unwrap().is_some());
        assert!(ctl.is_idle());
        assert!(adapter.handle_event(&mut ctl, &esc).unwrap().is_none());
    }

    #[test]
    fn resize_requests_redraw_and_can_track_width() {
        let mut ctl = terminal_controller();
        let mut fixed = TerminalPointerAdapter::default();
        let out = fixed.handle_event(&mut ctl, &Event::Resize(120, 40)).unwrap();
        assert!(matches!(
            out,
            Some(DriverOutput::Resized {
                columns: 120,
                rows: 40
            })
        ));
        assert_eq!(ctl.column_width_px(), 3.0);

        let mut tracking = TerminalPointerAdapter::new(12, 0).tracking_terminal_width();
        tracking.handle_event(&mut ctl, &Event::Resize(72, 40)).unwrap();
        assert_eq!(ctl.column_width_px(), 5.0);

        tracking.handle_event(&mut ctl, &Event::Resize(10, 40)).unwrap();
        assert_eq!(ctl.column_width_px(), 5.0);
    }

    #[test]
    fn stray_events_are_ignored() {
        let mut ctl = terminal_controller();
        let mut adapter = TerminalPointerAdapter::default();

        let empty_cell = mouse(MouseEventKind::Down(MouseButton::Left), 30, 5);
        assert!(adapter.handle_event(&mut ctl, &empty_cell).unwrap().is_none());
        let drag = mouse(MouseEventKind::Drag(MouseButton::Left), 3, 0);
        assert!(adapter.handle_event(&mut ctl, &drag).unwrap().is_none());
        let right = mouse(MouseEventKind::Down(MouseButton::Right), 1, 0);
        assert!(adapter.handle_event(&mut ctl, &right).unwrap().is_none());

        adapter
            .handle_event(&mut ctl, &mouse(MouseEventKind::Down(MouseButton::Left), 1, 0))
            .unwrap();
        let second = mouse(MouseEventKind::Down(MouseButton::Left), 13, 0);
        assert!(adapter.handle_event(&mut ctl, &second).unwrap().is_none());
        assert_eq!(ctl.session().unwrap().block_id(), "a");
    }
}
