//! Deterministic gesture source for tests and replay
//!
//! Every fed sample is recorded and answered with the next scripted
//! batch of drag events, regardless of the sample's position or time.

use std::collections::VecDeque;

use super::swipe::{DragEvent, GestureClassifier};
use super::touch::MotionSample;

#[derive(Debug, Default)]
pub struct ScriptedClassifier {
    script: VecDeque<Vec<DragEvent>>,
    /// Samples fed so far
    pub fed: Vec<MotionSample>,
    /// Last detectable directions set by the owner
    pub directions: u8,
    /// Last slop override set by the owner
    pub ignore_slop_when_settling: bool,
    dragging: bool,
    settling: bool,
    initial_positive: bool,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self {
            initial_positive: true,
            ..Self::default()
        }
    }

    /// Queue the events returned for the next fed sample
    pub fn then(mut self, events: Vec<DragEvent>) -> Self {
        self.script.push_back(events);
        self
    }

    pub fn initial_positive(mut self, positive: bool) -> Self {
        self.initial_positive = positive;
        self
    }

    /// Batches not yet consumed
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl GestureClassifier for ScriptedClassifier {
    fn feed_sample(&mut self, sample: MotionSample) -> Vec<DragEvent> {
        self.fed.push(sample);
        let events = self.script.pop_front().unwrap_or_default();
        for event in &events {
            match event {
                DragEvent::Start => {
                    self.dragging = true;
                    self.settling = false;
                }
                DragEvent::Drag { .. } => {}
                DragEvent::End { .. } => {
                    self.dragging = false;
                    self.settling = true;
                }
            }
        }
        events
    }

    fn is_dragging_or_settling(&self) -> bool {
        self.dragging || self.settling
    }

    fn is_dragging(&self) -> bool {
        self.dragging
    }

    fn was_initial_touch_positive(&self) -> bool {
        self.initial_positive
    }

    fn set_detectable_scroll_conditions(&mut self, directions: u8, ignore_slop_when_settling: bool) {
        self.directions = directions;
        self.ignore_slop_when_settling = ignore_slop_when_settling;
    }

    fn finished_scrolling(&mut self) {
        self.settling = false;
    }
}
