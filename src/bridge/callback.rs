//! Notifications back to the bound launcher

/// Callback channel of the bound client. Implementations must not block
/// the control thread for long; delivery failures are theirs to log.
pub trait OverlayCallback: Send {
    fn overlay_status_changed(&mut self, status: i32);
    fn overlay_scroll_changed(&mut self, progress: f32);
}
