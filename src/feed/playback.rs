//! Animation playback controller
//!
//! Holds a fraction in [0, 1] that can be seeked directly while a finger
//! drags, or run toward an end value over a duration. Runs are linear in
//! time. The end action registered with [`PlaybackController::set_end_action`]
//! is handed back by [`PlaybackController::advance`] when a run completes,
//! and dropped on cancel.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Run {
    from: f32,
    to: f32,
    started: Instant,
    duration: Duration,
}

impl Run {
    fn fraction_at(&self, now: Instant) -> (f32, bool) {
        if self.duration.is_zero() {
            return (self.to, true);
        }
        let t = now.saturating_duration_since(self.started).as_secs_f32() / self.duration.as_secs_f32();
        if t >= 1.0 {
            (self.to, true)
        } else {
            (self.from + (self.to - self.from) * t, false)
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum PlaybackState {
    Idle,
    Running(Run),
    /// Stopped mid-run; the fraction holds until seeked or run again
    Paused,
}

/// Result of advancing a running playback
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackStep<A> {
    Frame(f32),
    Finished { fraction: f32, action: Option<A> },
}

#[derive(Debug)]
pub struct PlaybackController<A> {
    fraction: f32,
    state: PlaybackState,
    end_action: Option<A>,
}

impl<A> PlaybackController<A> {
    pub fn new() -> Self {
        Self {
            fraction: 0.0,
            state: PlaybackState::Idle,
            end_action: None,
        }
    }

    pub fn fraction(&self) -> f32 {
        self.fraction
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, PlaybackState::Running(_))
    }

    /// Seek to `fraction`
    pub fn set_play_fraction(&mut self, fraction: f32) {
        self.fraction = fraction.clamp(0.0, 1.0);
    }

    pub fn set_end_action(&mut self, action: A) {
        self.end_action = Some(action);
    }

    /// Run from the current fraction to `to` over `duration`
    pub fn animate_to(&mut self, to: f32, duration: Duration, now: Instant) {
        let to = to.clamp(0.0, 1.0);
        let duration = if self.fraction == to { Duration::ZERO } else { duration };
        self.state = PlaybackState::Running(Run {
            from: self.fraction,
            to,
            started: now,
            duration,
        });
    }

    /// Stop a running playback where it is, keeping the end action
    pub fn pause(&mut self) {
        if self.is_running() {
            self.state = PlaybackState::Paused;
        }
    }

    /// Stop without completing; the end action is dropped
    pub fn cancel(&mut self) {
        self.state = PlaybackState::Idle;
        self.end_action = None;
    }

    /// Move a running playback to `now`
    pub fn advance(&mut self, now: Instant) -> Option<PlaybackStep<A>> {
        let PlaybackState::Running(run) = self.state else {
            return None;
        };
        let (fraction, done) = run.fraction_at(now);
        self.fraction = fraction;
        if done {
            self.state = PlaybackState::Idle;
            Some(PlaybackStep::Finished {
                fraction,
                action: self.end_action.take(),
            })
        } else {
            Some(PlaybackStep::Frame(fraction))
        }
    }
}

impl<A> Default for PlaybackController<A> {
    fn default() -> Self {
        Self::new()
    }
}
