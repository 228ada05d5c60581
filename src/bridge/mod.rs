//! Launcher bridge - the service side of the overlay binding
//!
//! A launcher binds with a callback, then drives the feed with
//! `start_scroll` / `on_scroll` / `end_scroll`. Those calls become
//! synthetic touch samples for the same state machine that handles real
//! touches on the feed surface. The surface is attached to the host when
//! a scroll starts and detached once the feed is back at zero with
//! nothing in flight.
//!
//! All calls are applied on the control thread (see [`control`]); the
//! bridge itself is single-threaded and never returns errors to the
//! launcher, it logs them and keeps its last good state.

pub mod callback;
pub mod control;
pub mod host;
pub mod protocol;
pub mod server;

use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::config::RebindPolicy;
use crate::error::BridgeError;
use crate::feed::{FeedController, FeedEvent};
use crate::input::{GestureClassifier, MotionPhase, MotionSample, SwipeDetector};

pub use callback::OverlayCallback;
pub use control::{BridgeHandle, ControlLoop, ControlMessage};
pub use host::{HeadlessHost, LayoutParams, SurfaceHost};
pub use protocol::{decode_overlay_flags, OverlayNotification, OverlayRequest, STATUS_BOUND};
pub use server::{serve_connection, FeedServer};

/// A call from a launcher connection, ready for the control thread
pub enum BridgeCall {
    WindowAttached {
        layout: LayoutParams,
        flags: i32,
        callback: Box<dyn OverlayCallback>,
    },
    WindowDetached {
        is_changing_configurations: bool,
    },
    /// The calling connection went away
    ClientGone,
    StartScroll,
    OnScroll {
        progress: f32,
    },
    EndScroll,
    CloseOverlay {
        flags: i32,
    },
    OpenOverlay {
        flags: i32,
    },
    OnPause,
    OnResume,
    SetActivityState {
        flags: i32,
    },
    RequestVoiceDetection {
        start: bool,
    },
}

impl BridgeCall {
    pub fn name(&self) -> &'static str {
        match self {
            BridgeCall::WindowAttached { .. } => "window_attached",
            BridgeCall::WindowDetached { .. } => "window_detached",
            BridgeCall::ClientGone => "client_gone",
            BridgeCall::StartScroll => "start_scroll",
            BridgeCall::OnScroll { .. } => "on_scroll",
            BridgeCall::EndScroll => "end_scroll",
            BridgeCall::CloseOverlay { .. } => "close_overlay",
            BridgeCall::OpenOverlay { .. } => "open_overlay",
            BridgeCall::OnPause => "on_pause",
            BridgeCall::OnResume => "on_resume",
            BridgeCall::SetActivityState { .. } => "set_activity_state",
            BridgeCall::RequestVoiceDetection { .. } => "request_voice_detection",
        }
    }

    /// Calls that act on a binding and so must come from its owner
    fn needs_binding(&self) -> bool {
        matches!(
            self,
            BridgeCall::WindowDetached { .. }
                | BridgeCall::StartScroll
                | BridgeCall::OnScroll { .. }
                | BridgeCall::EndScroll
                | BridgeCall::CloseOverlay { .. }
                | BridgeCall::OpenOverlay { .. }
        )
    }
}

/// Input from the feed surface itself
#[derive(Debug, Clone, Copy)]
pub enum LocalInput {
    Touch(MotionSample),
    Back,
}

/// Who is driving the current gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputSource {
    Launcher,
    Surface,
}

enum Binding {
    Unbound,
    Bound {
        client: u64,
        callback: Box<dyn OverlayCallback>,
        layout: LayoutParams,
    },
}

pub struct LauncherFeed<C = SwipeDetector> {
    controller: FeedController<C>,
    host: Box<dyn SurfaceHost>,
    binding: Binding,
    attached: bool,
    rebind_policy: RebindPolicy,
    default_extent: f32,
    /// Last launcher scroll progress, in [-1, 1]
    last_scroll: f32,
    active_source: Option<InputSource>,
    last_reported: Option<f32>,
}

impl<C: GestureClassifier> LauncherFeed<C> {
    pub fn new(controller: FeedController<C>, host: Box<dyn SurfaceHost>, rebind_policy: RebindPolicy) -> Self {
        let default_extent = controller.shift_range();
        Self {
            controller,
            host,
            binding: Binding::Unbound,
            attached: false,
            rebind_policy,
            default_extent,
            last_scroll: 0.0,
            active_source: None,
            last_reported: None,
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.binding, Binding::Bound { .. })
    }

    pub fn bound_client(&self) -> Option<u64> {
        match self.binding {
            Binding::Bound { client, .. } => Some(client),
            Binding::Unbound => None,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn controller(&self) -> &FeedController<C> {
        &self.controller
    }

    pub fn is_animating(&self) -> bool {
        self.controller.is_animating()
    }

    /// Apply one call from launcher connection `client`
    pub fn dispatch(&mut self, client: u64, call: BridgeCall, now: Instant) {
        let name = call.name();
        if let Err(e) = self.handle_call(client, call, now) {
            warn!(client, call = name, error = %e, "Launcher call dropped");
        }
        self.flush_events();
    }

    /// Apply input coming from the feed surface
    pub fn dispatch_local(&mut self, input: LocalInput, now: Instant) {
        if let Err(e) = self.handle_local(input, now) {
            warn!(error = %e, "Surface input dropped");
        }
        self.flush_events();
    }

    /// Advance running animations; called every frame while animating
    pub fn on_frame(&mut self, now: Instant) {
        self.controller.advance(now);
        self.flush_events();
    }

    fn handle_call(&mut self, client: u64, call: BridgeCall, now: Instant) -> Result<(), BridgeError> {
        if call.needs_binding() {
            self.check_owner(client)?;
        }
        match call {
            BridgeCall::WindowAttached { layout, flags, callback } => {
                self.bind(client, layout, flags, callback);
                Ok(())
            }
            BridgeCall::WindowDetached { is_changing_configurations } => {
                info!(is_changing_configurations, "Launcher window detached");
                self.unbind();
                Ok(())
            }
            BridgeCall::ClientGone => {
                if self.bound_client() == Some(client) {
                    info!(client, "Bound launcher disconnected");
                    self.unbind();
                }
                Ok(())
            }
            BridgeCall::StartScroll => self.start_scroll(now),
            BridgeCall::OnScroll { progress } => self.on_scroll(progress, now),
            BridgeCall::EndScroll => self.end_scroll(now),
            BridgeCall::CloseOverlay { flags } => {
                let (animated, duration) = decode_overlay_flags(flags);
                self.controller.close_overlay(animated, duration, now)?;
                Ok(())
            }
            BridgeCall::OpenOverlay { flags } => {
                self.set_attached(true)?;
                let (animated, duration) = decode_overlay_flags(flags);
                self.controller.open_overlay(animated, duration, now)?;
                Ok(())
            }
            BridgeCall::OnPause => {
                debug!("onPause");
                Ok(())
            }
            BridgeCall::OnResume => {
                debug!("onResume");
                Ok(())
            }
            BridgeCall::SetActivityState { flags } => {
                debug!(flags, "setActivityState");
                Ok(())
            }
            BridgeCall::RequestVoiceDetection { start } => {
                debug!(start, "requestVoiceDetection");
                Ok(())
            }
        }
    }

    fn handle_local(&mut self, input: LocalInput, now: Instant) -> Result<(), BridgeError> {
        match input {
            LocalInput::Back => {
                self.controller.on_back_pressed(now)?;
                Ok(())
            }
            LocalInput::Touch(sample) => {
                if !self.attached {
                    return Ok(());
                }
                if sample.phase == MotionPhase::Down {
                    if self.active_source == Some(InputSource::Launcher) {
                        debug!("Touch ignored during a launcher scroll");
                        return Ok(());
                    }
                    self.active_source = Some(InputSource::Surface);
                } else if self.active_source != Some(InputSource::Surface) {
                    return Ok(());
                }
                if sample.is_terminal() {
                    self.active_source = None;
                }
                self.controller.on_touch_sample(sample)?;
                Ok(())
            }
        }
    }

    fn bind(&mut self, client: u64, layout: LayoutParams, flags: i32, mut callback: Box<dyn OverlayCallback>) {
        if self.is_bound() {
            match self.rebind_policy {
                RebindPolicy::Detach => {
                    info!(client, "Rebind: detaching the previous binding");
                    self.release();
                }
                RebindPolicy::Handoff => {
                    info!(client, "Rebind: handing the surface to the new binding");
                }
            }
        }

        if !self.controller.is_in_transition() {
            let extent = layout.width.map(|w| w as f32).unwrap_or(self.default_extent);
            self.controller.set_shift_range(extent);
        }

        callback.overlay_status_changed(STATUS_BOUND);
        self.binding = Binding::Bound { client, callback, layout };
        self.last_reported = None;
        info!(client, flags, "Launcher bound");
    }

    fn unbind(&mut self) {
        if self.is_bound() {
            info!("Launcher unbound");
        }
        self.release();
    }

    /// Detach the surface and drop the binding and everything in flight
    fn release(&mut self) {
        if let Err(e) = self.set_attached(false) {
            error!(error = %e, "Failed to detach feed surface");
        }
        self.binding = Binding::Unbound;
        self.controller.reset();
        self.active_source = None;
        self.last_scroll = 0.0;
        self.last_reported = None;
    }

    fn check_owner(&self, client: u64) -> Result<(), BridgeError> {
        match self.bound_client() {
            None => Err(BridgeError::NotBound),
            Some(owner) if owner == client => Ok(()),
            Some(_) => Err(BridgeError::NotOwner(client)),
        }
    }

    fn start_scroll(&mut self, now: Instant) -> Result<(), BridgeError> {
        if self.active_source == Some(InputSource::Surface) {
            debug!("Launcher scroll ignored during a surface drag");
            return Ok(());
        }
        self.set_attached(true)?;
        self.active_source = Some(InputSource::Launcher);
        self.last_scroll = 0.0;
        self.controller.on_touch_sample(MotionSample::down(now, 0.0))?;
        Ok(())
    }

    fn on_scroll(&mut self, progress: f32, now: Instant) -> Result<(), BridgeError> {
        if self.active_source != Some(InputSource::Launcher) {
            debug!(progress, "Scroll without startScroll ignored");
            return Ok(());
        }
        self.last_scroll = progress.clamp(-1.0, 1.0);
        let position = self.last_scroll * self.controller.shift_range();
        self.controller.on_touch_sample(MotionSample::moved(now, position))?;
        Ok(())
    }

    fn end_scroll(&mut self, now: Instant) -> Result<(), BridgeError> {
        if self.active_source != Some(InputSource::Launcher) {
            debug!("endScroll without startScroll ignored");
            return Ok(());
        }
        self.active_source = None;
        let position = self.last_scroll * self.controller.shift_range();
        self.controller.on_touch_sample(MotionSample::up(now, position))?;
        Ok(())
    }

    fn set_attached(&mut self, attached: bool) -> Result<(), BridgeError> {
        if self.attached == attached {
            return Ok(());
        }
        if attached {
            let Binding::Bound { layout, .. } = &self.binding else {
                return Err(BridgeError::NotBound);
            };
            self.host.attach(layout)?;
        } else {
            self.host.detach()?;
        }
        self.attached = attached;
        debug!(attached, "Feed surface attachment changed");
        Ok(())
    }

    fn flush_events(&mut self) {
        for event in self.controller.take_events() {
            match event {
                FeedEvent::Progress(progress) => self.report_progress(progress),
                FeedEvent::Settled(state) => {
                    debug!(state = ?state, "Feed settled");
                    let progress = self.controller.progress();
                    if self.last_reported != Some(progress) {
                        self.report_progress(progress);
                    }
                }
            }
        }
        self.detach_if_idle();
    }

    fn report_progress(&mut self, progress: f32) {
        match &mut self.binding {
            Binding::Bound { callback, .. } => {
                callback.overlay_scroll_changed(progress);
                self.last_reported = Some(progress);
            }
            Binding::Unbound => debug!(progress, "No launcher bound, progress not reported"),
        }
    }

    /// The surface stays while the feed shows anything or a gesture or
    /// animation is still going
    fn detach_if_idle(&mut self) {
        let idle = self.controller.progress() <= 0.0
            && !self.controller.is_dragging_or_settling()
            && !self.controller.is_animating()
            && self.active_source.is_none();
        if self.attached && idle {
            if let Err(e) = self.set_attached(false) {
                error!(error = %e, "Failed to detach feed surface");
            }
        }
    }
}

impl<C> Drop for LauncherFeed<C> {
    fn drop(&mut self) {
        if self.attached {
            if let Err(e) = self.host.detach() {
                error!(error = %e, "Failed to detach feed surface on shutdown");
            }
        }
    }
}
