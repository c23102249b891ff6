use super::session::GestureKind;

/// Host hook for the global pointer listeners a session needs.
///
/// The controller calls `attach` when a session starts and `detach` exactly
/// once when it ends, whether it commits, cancels, or the controller is
/// dropped.
pub trait PointerCapture: Send {
    fn attach(&mut self, block_id: &str, gesture: GestureKind);

    fn detach(&mut self);
}

/// Capture used when the host routes pointer events itself.
#[derive(Debug, Default)]
pub struct NullPointerCapture;

impl PointerCapture for NullPointerCapture {
    fn attach(&mut self, _block_id: &str, _gesture: GestureKind) {}

    fn detach(&mut self) {}
}
