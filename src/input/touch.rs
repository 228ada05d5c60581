//! Touch samples along the drag axis

use std::time::Instant;

/// Phase of a motion sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// One positional sample, either from a real touch or synthesized
/// from a remote scroll call
#[derive(Debug, Clone, Copy)]
pub struct MotionSample {
    pub time: Instant,
    pub phase: MotionPhase,
    /// Position along the drag axis in pixels
    pub position: f32,
}

impl MotionSample {
    pub fn new(time: Instant, phase: MotionPhase, position: f32) -> Self {
        Self { time, phase, position }
    }

    pub fn down(time: Instant, position: f32) -> Self {
        Self::new(time, MotionPhase::Down, position)
    }

    pub fn moved(time: Instant, position: f32) -> Self {
        Self::new(time, MotionPhase::Move, position)
    }

    pub fn up(time: Instant, position: f32) -> Self {
        Self::new(time, MotionPhase::Up, position)
    }

    /// Up or Cancel
    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, MotionPhase::Up | MotionPhase::Cancel)
    }
}
