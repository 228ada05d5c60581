//! Control thread
//!
//! Every remote call and surface input is posted to one calloop event
//! loop and applied there in arrival order. While the feed animates, a
//! frame timer drives it; the timer removes itself once the feed is at
//! rest.

use std::time::{Duration, Instant};

use calloop::channel::{self, Channel, Event, Sender};
use calloop::timer::{TimeoutAction, Timer};
use calloop::{EventLoop, LoopHandle, RegistrationToken};
use tracing::{debug, error, info};

use super::{BridgeCall, LauncherFeed, LocalInput};
use crate::error::BridgeError;
use crate::input::{GestureClassifier, SwipeDetector};

/// Message delivered to the control thread
pub enum ControlMessage {
    /// A call from launcher connection `client`
    Call { client: u64, call: BridgeCall },
    Local(LocalInput),
    Shutdown,
}

/// Posts work to the control thread from any thread
#[derive(Clone)]
pub struct BridgeHandle {
    sender: Sender<ControlMessage>,
}

impl BridgeHandle {
    pub fn post(&self, message: ControlMessage) -> Result<(), BridgeError> {
        self.sender.send(message).map_err(|_| BridgeError::Disconnected)
    }

    pub fn call(&self, client: u64, call: BridgeCall) -> Result<(), BridgeError> {
        self.post(ControlMessage::Call { client, call })
    }

    pub fn shutdown(&self) -> Result<(), BridgeError> {
        self.post(ControlMessage::Shutdown)
    }
}

pub struct ControlState<C: 'static = SwipeDetector> {
    feed: LauncherFeed<C>,
    handle: LoopHandle<'static, ControlState<C>>,
    frame_timer: Option<RegistrationToken>,
    frame_interval: Duration,
    running: bool,
}

impl<C: GestureClassifier + 'static> ControlState<C> {
    fn handle_message(&mut self, message: ControlMessage) {
        let now = Instant::now();
        match message {
            ControlMessage::Call { client, call } => {
                debug!(client, call = call.name(), "Control call");
                self.feed.dispatch(client, call, now);
            }
            ControlMessage::Local(input) => self.feed.dispatch_local(input, now),
            ControlMessage::Shutdown => {
                info!("Control loop shutting down");
                self.running = false;
            }
        }
        self.schedule_frames();
    }

    /// Start the frame timer if the feed needs frames and none is running
    fn schedule_frames(&mut self) {
        if self.frame_timer.is_some() || !self.feed.is_animating() {
            return;
        }
        let interval = self.frame_interval;
        let timer = Timer::from_duration(interval);
        let inserted = self.handle.insert_source(timer, move |_, _, state: &mut ControlState<C>| {
            state.feed.on_frame(Instant::now());
            if state.feed.is_animating() {
                TimeoutAction::ToDuration(interval)
            } else {
                state.frame_timer = None;
                TimeoutAction::Drop
            }
        });
        match inserted {
            Ok(token) => self.frame_timer = Some(token),
            Err(e) => error!(error = %e.error, "Failed to start frame timer"),
        }
    }
}

pub struct ControlLoop<C: 'static = SwipeDetector> {
    event_loop: EventLoop<'static, ControlState<C>>,
    state: ControlState<C>,
}

impl<C: GestureClassifier + 'static> ControlLoop<C> {
    pub fn new(feed: LauncherFeed<C>, frame_interval: Duration) -> Result<(Self, BridgeHandle), BridgeError> {
        let event_loop: EventLoop<'static, ControlState<C>> = EventLoop::try_new()?;
        let (sender, channel): (Sender<ControlMessage>, Channel<ControlMessage>) = channel::channel();

        event_loop
            .handle()
            .insert_source(channel, |event, _, state: &mut ControlState<C>| match event {
                Event::Msg(message) => state.handle_message(message),
                Event::Closed => {
                    info!("All bridge handles dropped");
                    state.running = false;
                }
            })
            .map_err(|e| e.error)?;

        let state = ControlState {
            feed,
            handle: event_loop.handle(),
            frame_timer: None,
            frame_interval,
            running: true,
        };

        Ok((Self { event_loop, state }, BridgeHandle { sender }))
    }

    /// Run until shutdown is requested or every handle is dropped
    pub fn run(&mut self) -> Result<(), BridgeError> {
        info!("Control loop running");
        while self.state.running {
            self.event_loop.dispatch(None, &mut self.state)?;
        }
        Ok(())
    }

    /// Dispatch whatever is ready, waiting at most `timeout`
    pub fn dispatch_pending(&mut self, timeout: Option<Duration>) -> Result<(), BridgeError> {
        self.event_loop.dispatch(timeout, &mut self.state)?;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn feed(&self) -> &LauncherFeed<C> {
        &self.state.feed
    }

    pub fn has_frame_timer(&self) -> bool {
        self.state.frame_timer.is_some()
    }
}
