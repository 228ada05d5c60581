//! Single-axis swipe detection
//!
//! Turns a stream of [`MotionSample`]s into drag lifecycle events:
//! - `Start` once the finger has moved past the touch slop in a
//!   detectable direction
//! - `Drag` for every following move, with displacement and velocity
//! - `End` on release, flagged as a fling when the release velocity is
//!   above the fling threshold
//!
//! After `End` the detector stays in the settling state until the owner
//! reports that the settle animation finished.

use std::f32::consts::PI;
use std::time::{Duration, Instant};

use super::touch::{MotionPhase, MotionSample};

/// Drags toward increasing positions may start
pub const DIRECTION_POSITIVE: u8 = 1 << 0;
/// Drags toward decreasing positions may start
pub const DIRECTION_NEGATIVE: u8 = 1 << 1;
pub const DIRECTION_BOTH: u8 = DIRECTION_POSITIVE | DIRECTION_NEGATIVE;

/// Time constant of the velocity low-pass filter (ms)
const VELOCITY_DAMPENING_RC: f32 = 1000.0 / (2.0 * PI * 10.0);

/// Base duration used to derive settle durations (ms)
const ANIMATION_DURATION_MS: f32 = 1200.0;

/// Shortest settle animation (ms)
const MIN_SETTLE_DURATION_MS: f32 = 100.0;

/// Drag lifecycle event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragEvent {
    /// Drag started (slop exceeded, or a settling drag was grabbed again)
    Start,

    /// Drag in progress
    Drag {
        /// Displacement from the down position, in pixels
        displacement: f32,
        /// Filtered velocity in px/ms
        velocity: f32,
    },

    /// Finger lifted
    End { velocity: f32, fling: bool },
}

/// Capabilities the overlay state machine needs from a gesture source
pub trait GestureClassifier {
    /// Inject one sample, returning the drag events it produced in order
    fn feed_sample(&mut self, sample: MotionSample) -> Vec<DragEvent>;

    /// True while a drag or its settle animation is in flight
    fn is_dragging_or_settling(&self) -> bool;

    /// True while a finger is actively dragging
    fn is_dragging(&self) -> bool;

    /// Sign of the first displacement of the current gesture
    fn was_initial_touch_positive(&self) -> bool;

    /// Restrict which directions may start a drag. With
    /// `ignore_slop_when_settling`, a down during settling grabs the
    /// drag immediately.
    fn set_detectable_scroll_conditions(&mut self, directions: u8, ignore_slop_when_settling: bool);

    /// The settle animation is over
    fn finished_scrolling(&mut self);
}

/// Tuning for [`SwipeDetector`]
#[derive(Debug, Clone)]
pub struct SwipeConfig {
    /// Distance a finger must travel before a drag starts (px)
    pub touch_slop: f32,

    /// Release velocity above which a drag end is a fling (px/ms)
    pub fling_velocity: f32,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            touch_slop: 8.0,
            fling_velocity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrollState {
    Idle,
    Dragging,
    Settling,
}

/// Swipe detector along one axis
#[derive(Debug, Clone)]
pub struct SwipeDetector {
    config: SwipeConfig,
    state: ScrollState,
    directions: u8,
    ignore_slop_when_settling: bool,
    down_pos: f32,
    last_pos: f32,
    last_time: Option<Instant>,
    displacement: f32,
    velocity: f32,
    initial_positive: bool,
}

impl SwipeDetector {
    pub fn new(config: SwipeConfig) -> Self {
        Self {
            config,
            state: ScrollState::Idle,
            directions: DIRECTION_BOTH,
            ignore_slop_when_settling: false,
            down_pos: 0.0,
            last_pos: 0.0,
            last_time: None,
            displacement: 0.0,
            velocity: 0.0,
            initial_positive: true,
        }
    }

    fn should_scroll_start(&self) -> bool {
        let d = self.displacement;
        if d == 0.0 || d.abs() < self.config.touch_slop {
            return false;
        }
        if d > 0.0 {
            self.directions & DIRECTION_POSITIVE != 0
        } else {
            self.directions & DIRECTION_NEGATIVE != 0
        }
    }

    /// Low-pass filtered velocity. Event times are compared at
    /// millisecond granularity, so two samples within the same
    /// millisecond contribute no velocity.
    fn compute_velocity(&mut self, delta: f32, time: Instant) -> f32 {
        let dt = match self.last_time {
            Some(last) => time.saturating_duration_since(last).as_millis() as f32,
            None => 0.0,
        };
        self.last_time = Some(time);

        let velocity = if dt > 0.0 { delta / dt } else { 0.0 };
        if self.velocity.abs() < 0.001 {
            self.velocity = velocity;
        } else {
            let alpha = dt / (VELOCITY_DAMPENING_RC + dt);
            self.velocity = (1.0 - alpha) * self.velocity + alpha * velocity;
        }
        self.velocity
    }
}

impl Default for SwipeDetector {
    fn default() -> Self {
        Self::new(SwipeConfig::default())
    }
}

impl GestureClassifier for SwipeDetector {
    fn feed_sample(&mut self, sample: MotionSample) -> Vec<DragEvent> {
        let mut events = Vec::new();

        match sample.phase {
            MotionPhase::Down => {
                self.down_pos = sample.position;
                self.last_pos = sample.position;
                self.last_time = Some(sample.time);
                self.displacement = 0.0;
                self.velocity = 0.0;

                if self.state == ScrollState::Settling && self.ignore_slop_when_settling {
                    self.state = ScrollState::Dragging;
                    events.push(DragEvent::Start);
                }
            }
            MotionPhase::Move => {
                let delta = sample.position - self.last_pos;
                self.last_pos = sample.position;
                let velocity = self.compute_velocity(delta, sample.time);
                self.displacement = sample.position - self.down_pos;

                if self.state != ScrollState::Dragging && self.should_scroll_start() {
                    self.initial_positive = self.displacement > 0.0;
                    self.state = ScrollState::Dragging;
                    events.push(DragEvent::Start);
                }

                if self.state == ScrollState::Dragging {
                    events.push(DragEvent::Drag {
                        displacement: self.displacement,
                        velocity,
                    });
                }
            }
            MotionPhase::Up | MotionPhase::Cancel => {
                if self.state == ScrollState::Dragging {
                    let delta = sample.position - self.last_pos;
                    self.last_pos = sample.position;
                    let velocity = self.compute_velocity(delta, sample.time);
                    let fling = velocity.abs() > self.config.fling_velocity;

                    self.state = ScrollState::Settling;
                    events.push(DragEvent::End { velocity, fling });
                }
            }
        }

        events
    }

    fn is_dragging_or_settling(&self) -> bool {
        self.state != ScrollState::Idle
    }

    fn is_dragging(&self) -> bool {
        self.state == ScrollState::Dragging
    }

    fn was_initial_touch_positive(&self) -> bool {
        self.initial_positive
    }

    fn set_detectable_scroll_conditions(&mut self, directions: u8, ignore_slop_when_settling: bool) {
        self.directions = directions;
        self.ignore_slop_when_settling = ignore_slop_when_settling;
    }

    fn finished_scrolling(&mut self) {
        self.state = ScrollState::Idle;
    }
}

/// Duration of the settle animation after a release with `velocity`
/// (px/ms) that still has `progress_needed` of the transition to cover
pub fn calculate_duration(velocity: f32, progress_needed: f32) -> Duration {
    let velocity_divisor = (0.5 * velocity).abs().max(2.0);
    let travel_distance = progress_needed.max(0.2);
    let ms = (ANIMATION_DURATION_MS / velocity_divisor * travel_distance).max(MIN_SETTLE_DURATION_MS);
    Duration::from_millis(ms as u64)
}
