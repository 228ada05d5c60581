//! Feed overlay state machine
//!
//! Owns the committed open/closed state and the transition in flight.
//! Drag events from the gesture source seek the playback controller while
//! a finger is down; on release the transition settles to a target state
//! chosen from the release velocity (fling) or from how far the
//! transition got.
//!
//! Progress changes and completed transitions are queued as
//! [`FeedEvent`]s for the owner to drain with [`FeedController::take_events`].

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::playback::{PlaybackController, PlaybackStep};
use super::state::FeedState;
use crate::error::FeedError;
use crate::input::{
    calculate_duration, DragEvent, GestureClassifier, MotionPhase, MotionSample, SwipeDetector,
    DIRECTION_BOTH, DIRECTION_NEGATIVE, DIRECTION_POSITIVE,
};

/// Fraction past which a released drag commits to the target state.
/// Exactly 0.5 commits.
pub const SUCCESS_TRANSITION_PROGRESS: f32 = 0.5;

const SINGLE_FRAME_MS: f32 = 16.0;

/// Duration of a programmatic close/open when the caller gives none
pub const DEFAULT_SETTLE_DURATION: Duration = Duration::from_millis(350);

/// Something the owner of the controller needs to react to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeedEvent {
    /// Overlay progress changed
    Progress(f32),
    /// A transition completed in this state
    Settled(FeedState),
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    from: FeedState,
    /// `None` until a drag direction picks a target
    to: Option<FeedState>,
    start_progress: f32,
    displacement_shift: f32,
    /// Transition fraction per pixel of displacement
    progress_multiplier: f32,
}

impl Transition {
    fn unarmed(from: FeedState) -> Self {
        Self {
            from,
            to: None,
            start_progress: 0.0,
            displacement_shift: 0.0,
            progress_multiplier: 0.0,
        }
    }

    fn is_armed(&self) -> bool {
        self.to.is_some()
    }
}

pub struct FeedController<C = SwipeDetector> {
    detector: C,
    playback: PlaybackController<FeedState>,
    transition: Option<Transition>,
    current_state: FeedState,
    progress: f32,
    /// Pixels of drag that cover a full transition
    shift_range: f32,
    settle_duration: Duration,
    /// Whether the current touch sequence was accepted on down
    intercepting: bool,
    events: Vec<FeedEvent>,
}

impl<C: GestureClassifier> FeedController<C> {
    pub fn new(detector: C, shift_range: f32) -> Self {
        Self {
            detector,
            playback: PlaybackController::new(),
            transition: None,
            current_state: FeedState::Closed,
            progress: 0.0,
            shift_range: shift_range.max(1.0),
            settle_duration: DEFAULT_SETTLE_DURATION,
            intercepting: false,
            events: Vec::new(),
        }
    }

    /// Default duration for programmatic close/open
    pub fn with_settle_duration(mut self, duration: Duration) -> Self {
        self.settle_duration = duration;
        self
    }

    pub fn current_state(&self) -> FeedState {
        self.current_state
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn shift_range(&self) -> f32 {
        self.shift_range
    }

    /// Takes effect from the next armed transition
    pub fn set_shift_range(&mut self, shift_range: f32) {
        self.shift_range = shift_range.max(1.0);
    }

    /// `(from, to)` of the armed transition
    pub fn transition(&self) -> Option<(FeedState, FeedState)> {
        self.transition.and_then(|t| t.to.map(|to| (t.from, to)))
    }

    pub fn is_in_transition(&self) -> bool {
        self.transition.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.detector.is_dragging()
    }

    pub fn is_dragging_or_settling(&self) -> bool {
        self.detector.is_dragging_or_settling()
    }

    /// True while a settle or programmatic animation needs frames
    pub fn is_animating(&self) -> bool {
        self.playback.is_running()
    }

    pub fn detector(&self) -> &C {
        &self.detector
    }

    pub fn take_events(&mut self) -> Vec<FeedEvent> {
        std::mem::take(&mut self.events)
    }

    /// Feed one touch sample. Down decides whether the whole sequence is
    /// accepted; the rest of a rejected sequence is dropped.
    pub fn on_touch_sample(&mut self, sample: MotionSample) -> Result<(), FeedError> {
        if sample.phase == MotionPhase::Down {
            self.intercepting = self.should_intercept();
            if !self.intercepting {
                debug!("Ignoring touch while the feed is closing");
                return Ok(());
            }
            let settling = self.transition.is_some_and(|t| t.is_armed());
            let directions = self.swipe_directions();
            self.detector.set_detectable_scroll_conditions(directions, settling);
        } else if !self.intercepting {
            return Ok(());
        }

        let mut result = Ok(());
        for event in self.detector.feed_sample(sample) {
            match event {
                DragEvent::Start => self.on_drag_start(),
                DragEvent::Drag { displacement, velocity } => {
                    self.on_drag(displacement, velocity);
                }
                DragEvent::End { velocity, fling } => {
                    result = self.on_drag_end(velocity, fling, sample.time);
                }
            }
        }

        if sample.is_terminal() {
            self.intercepting = false;
        }
        result
    }

    fn should_intercept(&self) -> bool {
        !(self.playback.is_running()
            && self.transition.is_some_and(|t| t.is_armed() && t.from == FeedState::Open))
    }

    fn swipe_directions(&self) -> u8 {
        if self.transition.is_some_and(|t| t.is_armed()) {
            return DIRECTION_BOTH;
        }
        let state = self.current_state;
        let mut directions = 0;
        if state.target(true) != state {
            directions |= DIRECTION_POSITIVE;
        }
        if state.target(false) != state {
            directions |= DIRECTION_NEGATIVE;
        }
        directions
    }

    fn progress_multiplier(&self, from: FeedState, to: FeedState) -> f32 {
        let total_shift = (to.progress() - from.progress()) * self.shift_range;
        if total_shift == 0.0 {
            1.0 / self.shift_range
        } else {
            1.0 / total_shift
        }
    }

    /// Re-point the transition. Returns false when nothing changed or
    /// there is no state in the requested direction.
    fn reinit_transition(&mut self, reached_to_state: bool, toward_positive: bool) -> bool {
        let Some(t) = self.transition else {
            return false;
        };
        let new_from = if reached_to_state { t.to.unwrap_or(t.from) } else { t.from };
        let new_to = new_from.target(toward_positive);

        if new_from == new_to || (new_from == t.from && Some(new_to) == t.to) {
            return false;
        }

        self.transition = Some(Transition {
            from: new_from,
            to: Some(new_to),
            start_progress: 0.0,
            displacement_shift: t.displacement_shift,
            progress_multiplier: self.progress_multiplier(new_from, new_to),
        });
        self.playback.cancel();
        self.playback.set_play_fraction(0.0);
        debug!(from = ?new_from, to = ?new_to, "Transition armed");
        true
    }

    fn on_drag_start(&mut self) {
        let regrab = self.transition.is_some_and(|t| t.is_armed());
        if regrab {
            self.playback.pause();
            let fraction = self.playback.fraction();
            if let Some(t) = self.transition.as_mut() {
                t.start_progress = fraction;
                t.displacement_shift = 0.0;
            }
            debug!(fraction, "Drag grabbed a running transition");
        } else {
            self.playback.cancel();
            self.playback.set_play_fraction(0.0);
            self.transition = Some(Transition::unarmed(self.current_state));
            let positive = self.detector.was_initial_touch_positive();
            self.reinit_transition(false, positive);
            self.sync_progress();
        }
    }

    fn on_drag(&mut self, displacement: f32, velocity: f32) -> bool {
        let Some(mut t) = self.transition else {
            return true;
        };
        if !t.is_armed() {
            if !self.reinit_transition(false, displacement > 0.0) {
                return true;
            }
            match self.transition {
                Some(armed) => t = armed,
                None => return true,
            }
        }

        let delta = displacement - t.displacement_shift;
        let fraction = t.start_progress + delta * t.progress_multiplier;
        self.playback.set_play_fraction(fraction);
        self.sync_progress();

        // Dragging back after overshooting the target re-anchors the
        // transition there, so the reversal is felt immediately
        if fraction >= 1.0 {
            let toward_positive = if velocity != 0.0 { velocity > 0.0 } else { delta > 0.0 };
            if self.reinit_transition(true, toward_positive) {
                if let Some(anchored) = self.transition.as_mut() {
                    anchored.displacement_shift = displacement;
                }
                self.sync_progress();
            }
        }
        true
    }

    fn on_drag_end(&mut self, velocity: f32, fling: bool, now: Instant) -> Result<(), FeedError> {
        let armed = self.transition.and_then(|t| t.to.map(|to| (t, to)));
        let Some((t, to)) = armed else {
            warn!(state = ?self.current_state, "Drag ended without an armed transition");
            self.transition = None;
            self.playback.cancel();
            self.detector.finished_scrolling();
            return Err(FeedError::Unarmed);
        };

        let progress = self.playback.fraction();
        let target = if fling {
            if velocity.signum() == t.progress_multiplier.signum() {
                to
            } else {
                t.from
            }
        } else if progress >= SUCCESS_TRANSITION_PROGRESS {
            to
        } else {
            t.from
        };

        let nudged = (progress + velocity * SINGLE_FRAME_MS * t.progress_multiplier).clamp(0.0, 1.0);
        let (start, end, duration) = if target == to {
            if progress >= 1.0 {
                (1.0, 1.0, Duration::ZERO)
            } else {
                (nudged, 1.0, calculate_duration(velocity, 1.0 - progress.max(0.0)))
            }
        } else if progress <= 0.0 {
            (0.0, 0.0, Duration::ZERO)
        } else {
            (nudged, 0.0, calculate_duration(velocity, progress.min(1.0)))
        };

        debug!(
            velocity,
            fling,
            progress,
            target = ?target,
            duration_ms = duration.as_millis() as u64,
            "Drag end"
        );

        self.playback.set_play_fraction(start);
        self.sync_progress();
        self.playback.set_end_action(target);
        self.playback.animate_to(end, duration, now);
        self.advance(now);
        Ok(())
    }

    /// Drive a running animation to `now`
    pub fn advance(&mut self, now: Instant) {
        match self.playback.advance(now) {
            None => {}
            Some(PlaybackStep::Frame(_)) => self.sync_progress(),
            Some(PlaybackStep::Finished { action, .. }) => {
                self.sync_progress();
                if let Some(target) = action {
                    self.complete(target);
                }
            }
        }
    }

    fn complete(&mut self, target: FeedState) {
        self.transition = None;
        self.detector.finished_scrolling();
        self.current_state = target;
        self.set_progress(target.progress());
        debug!(state = ?target, "Transition complete");
        self.events.push(FeedEvent::Settled(target));
    }

    /// Close outside of any drag. `duration` of `None` uses the default.
    pub fn close_overlay(&mut self, animated: bool, duration: Option<Duration>, now: Instant) -> Result<(), FeedError> {
        self.settle_to(FeedState::Closed, animated, duration, now)
    }

    pub fn open_overlay(&mut self, animated: bool, duration: Option<Duration>, now: Instant) -> Result<(), FeedError> {
        self.settle_to(FeedState::Open, animated, duration, now)
    }

    pub fn on_back_pressed(&mut self, now: Instant) -> Result<(), FeedError> {
        self.close_overlay(true, None, now)
    }

    fn settle_to(
        &mut self,
        target: FeedState,
        animated: bool,
        duration: Option<Duration>,
        now: Instant,
    ) -> Result<(), FeedError> {
        if self.detector.is_dragging() {
            return Err(FeedError::DragInProgress);
        }
        self.playback.cancel();
        self.detector.finished_scrolling();

        if !animated {
            self.complete(target);
            return Ok(());
        }

        let from = target.opposite();
        self.transition = Some(Transition {
            from,
            to: Some(target),
            start_progress: 0.0,
            displacement_shift: 0.0,
            progress_multiplier: self.progress_multiplier(from, target),
        });
        self.playback.set_play_fraction((self.progress - from.progress()).abs());
        self.playback.set_end_action(target);
        self.playback
            .animate_to(1.0, duration.unwrap_or(self.settle_duration), now);
        self.advance(now);
        Ok(())
    }

    /// Back to a fresh closed machine, dropping anything in flight
    pub fn reset(&mut self) {
        self.playback.cancel();
        self.playback.set_play_fraction(0.0);
        self.transition = None;
        self.detector.finished_scrolling();
        self.current_state = FeedState::Closed;
        self.progress = 0.0;
        self.intercepting = false;
        self.events.clear();
    }

    fn sync_progress(&mut self) {
        if let Some(Transition { from, to: Some(to), .. }) = self.transition {
            let fraction = self.playback.fraction();
            self.set_progress(from.progress() + (to.progress() - from.progress()) * fraction);
        }
    }

    fn set_progress(&mut self, progress: f32) {
        let progress = progress.clamp(0.0, 1.0);
        if progress != self.progress {
            self.progress = progress;
            self.events.push(FeedEvent::Progress(progress));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ScriptedClassifier;

    const EXTENT: f32 = 1080.0;

    fn ms(base: Instant, millis: u64) -> Instant {
        base + Duration::from_millis(millis)
    }

    fn drag(displacement: f32, velocity: f32) -> DragEvent {
        DragEvent::Drag { displacement, velocity }
    }

    /// Down, one move that starts the drag at `displacement`, then release
    fn swipe(displacement: f32, release: DragEvent) -> ScriptedClassifier {
        ScriptedClassifier::new()
            .then(vec![])
            .then(vec![DragEvent::Start, drag(displacement, 1.0)])
            .then(vec![release])
    }

    fn run_swipe<C: GestureClassifier>(controller: &mut FeedController<C>, t0: Instant, position: f32) {
        controller.on_touch_sample(MotionSample::down(t0, 0.0)).unwrap();
        controller.on_touch_sample(MotionSample::moved(ms(t0, 100), position)).unwrap();
        controller.on_touch_sample(MotionSample::up(ms(t0, 200), position)).unwrap();
    }

    #[test]
    fn test_fling_toward_target_opens() {
        let t0 = Instant::now();
        let classifier = swipe(648.0, DragEvent::End { velocity: 50.0, fling: true });
        let mut controller = FeedController::new(classifier, EXTENT);

        run_swipe(&mut controller, t0, 648.0);
        controller.advance(ms(t0, 400));

        assert_eq!(controller.current_state(), FeedState::Open);
        assert_eq!(controller.progress(), 1.0);
        assert!(!controller.is_in_transition());
        assert!(!controller.is_dragging_or_settling());
        assert_eq!(controller.take_events().last(), Some(&FeedEvent::Settled(FeedState::Open)));
    }

    #[test]
    fn test_fling_against_target_returns_to_source() {
        let t0 = Instant::now();
        let classifier = swipe(648.0, DragEvent::End { velocity: -50.0, fling: true });
        let mut controller = FeedController::new(classifier, EXTENT);

        run_swipe(&mut controller, t0, 648.0);
        controller.advance(ms(t0, 1000));

        assert_eq!(controller.current_state(), FeedState::Closed);
        assert_eq!(controller.progress(), 0.0);
    }

    #[test]
    fn test_release_at_half_commits() {
        let t0 = Instant::now();
        let classifier = swipe(512.0, DragEvent::End { velocity: 0.0, fling: false });
        let mut controller = FeedController::new(classifier, 1024.0);

        run_swipe(&mut controller, t0, 512.0);
        controller.advance(ms(t0, 1000));
        assert_eq!(controller.current_state(), FeedState::Open);
        assert_eq!(controller.progress(), 1.0);
    }

    #[test]
    fn test_short_release_settles_closed() {
        let t0 = Instant::now();
        let classifier = swipe(108.0, DragEvent::End { velocity: 0.0, fling: false });
        let mut controller = FeedController::new(classifier, EXTENT);

        run_swipe(&mut controller, t0, 108.0);
        assert!(controller.is_animating());
        assert!((controller.progress() - 0.1).abs() < 0.001);

        // 120ms settle started at the release
        controller.advance(ms(t0, 260));
        assert!(controller.progress() > 0.0 && controller.progress() < 0.1);
        assert_eq!(controller.current_state(), FeedState::Closed);
        assert!(controller.is_in_transition());

        controller.advance(ms(t0, 320));
        assert!(!controller.is_animating());
        assert!(!controller.is_in_transition());
        assert_eq!(controller.progress(), 0.0);
        assert_eq!(controller.take_events().last(), Some(&FeedEvent::Settled(FeedState::Closed)));
    }

    #[test]
    fn test_drag_end_without_transition_is_recoverable() {
        let t0 = Instant::now();
        let classifier = ScriptedClassifier::new()
            .then(vec![])
            .then(vec![DragEvent::End { velocity: 3.0, fling: true }]);
        let mut controller = FeedController::new(classifier, EXTENT);

        controller.on_touch_sample(MotionSample::down(t0, 0.0)).unwrap();
        let result = controller.on_touch_sample(MotionSample::up(ms(t0, 50), 0.0));

        assert_eq!(result, Err(FeedError::Unarmed));
        assert_eq!(controller.current_state(), FeedState::Closed);
        assert_eq!(controller.progress(), 0.0);
        assert!(!controller.is_in_transition());
    }

    #[test]
    fn test_drag_in_blocked_direction_never_arms() {
        let t0 = Instant::now();
        let classifier = ScriptedClassifier::new()
            .initial_positive(false)
            .then(vec![])
            .then(vec![DragEvent::Start, drag(-200.0, -1.0)])
            .then(vec![DragEvent::End { velocity: 0.0, fling: false }]);
        let mut controller = FeedController::new(classifier, EXTENT);

        controller.on_touch_sample(MotionSample::down(t0, 0.0)).unwrap();
        assert_eq!(controller.detector().directions, DIRECTION_POSITIVE);
        controller.on_touch_sample(MotionSample::moved(ms(t0, 50), -200.0)).unwrap();
        assert_eq!(controller.transition(), None);
        assert_eq!(controller.progress(), 0.0);

        let result = controller.on_touch_sample(MotionSample::up(ms(t0, 100), -200.0));
        assert_eq!(result, Err(FeedError::Unarmed));
        assert_eq!(controller.current_state(), FeedState::Closed);
    }

    #[test]
    fn test_regrab_resumes_from_captured_fraction() {
        let t0 = Instant::now();
        let classifier = ScriptedClassifier::new()
            .then(vec![])
            .then(vec![DragEvent::Start, drag(648.0, 1.0)])
            .then(vec![DragEvent::End { velocity: 0.0, fling: false }])
            // second touch grabs the settling overlay
            .then(vec![DragEvent::Start])
            .then(vec![drag(-216.0, -1.0)])
            .then(vec![DragEvent::End { velocity: 0.0, fling: false }]);
        let mut controller = FeedController::new(classifier, EXTENT);

        run_swipe(&mut controller, t0, 648.0);
        assert_eq!(controller.transition(), Some((FeedState::Closed, FeedState::Open)));
        controller.advance(ms(t0, 300));
        let captured = controller.progress();
        assert!(captured > 0.6 && captured < 1.0);

        controller.on_touch_sample(MotionSample::down(ms(t0, 300), 500.0)).unwrap();
        assert!(controller.detector().ignore_slop_when_settling);
        assert_eq!(controller.detector().directions, DIRECTION_BOTH);
        assert!(!controller.is_animating());
        // Paused, not cancelled: progress holds until the finger moves
        controller.advance(ms(t0, 2000));
        assert_eq!(controller.progress(), captured);

        controller.on_touch_sample(MotionSample::moved(ms(t0, 400), 284.0)).unwrap();
        assert!((controller.progress() - (captured - 0.2)).abs() < 0.001);

        controller.on_touch_sample(MotionSample::up(ms(t0, 500), 284.0)).unwrap();
        controller.advance(ms(t0, 2000));
        assert_eq!(controller.current_state(), FeedState::Open);
    }

    #[test]
    fn test_overdrag_reanchors_on_reversal() {
        let t0 = Instant::now();
        let classifier = ScriptedClassifier::new()
            .then(vec![])
            .then(vec![DragEvent::Start, drag(1200.0, 2.0)])
            .then(vec![drag(1150.0, -1.0)])
            .then(vec![drag(1100.0, -1.0)]);
        let mut controller = FeedController::new(classifier, EXTENT);

        controller.on_touch_sample(MotionSample::down(t0, 0.0)).unwrap();
        controller.on_touch_sample(MotionSample::moved(ms(t0, 50), 1200.0)).unwrap();
        assert_eq!(controller.progress(), 1.0);
        assert_eq!(controller.transition(), Some((FeedState::Closed, FeedState::Open)));

        controller.on_touch_sample(MotionSample::moved(ms(t0, 100), 1150.0)).unwrap();
        assert_eq!(controller.transition(), Some((FeedState::Open, FeedState::Closed)));
        assert_eq!(controller.progress(), 1.0);

        controller.on_touch_sample(MotionSample::moved(ms(t0, 150), 1100.0)).unwrap();
        assert!((controller.progress() - (1.0 - 50.0 / EXTENT)).abs() < 0.001);
    }

    #[test]
    fn test_close_overlay_animated_from_open() {
        let t0 = Instant::now();
        let mut controller = FeedController::new(ScriptedClassifier::new(), EXTENT);
        controller.open_overlay(false, None, t0).unwrap();
        assert_eq!(controller.current_state(), FeedState::Open);
        controller.take_events();

        controller.close_overlay(true, Some(Duration::from_millis(200)), t0).unwrap();
        controller.advance(ms(t0, 100));
        assert!((controller.progress() - 0.5).abs() < 0.01);
        // Committed state only changes on completion
        assert_eq!(controller.current_state(), FeedState::Open);

        controller.advance(ms(t0, 200));
        assert_eq!(controller.current_state(), FeedState::Closed);
        assert_eq!(controller.progress(), 0.0);
        assert_eq!(controller.take_events().last(), Some(&FeedEvent::Settled(FeedState::Closed)));
    }

    #[test]
    fn test_close_overlay_immediate() {
        let t0 = Instant::now();
        let mut controller = FeedController::new(ScriptedClassifier::new(), EXTENT);
        controller.open_overlay(true, None, t0).unwrap();
        controller.advance(ms(t0, 350));
        assert_eq!(controller.current_state(), FeedState::Open);

        controller.close_overlay(false, None, ms(t0, 400)).unwrap();
        assert_eq!(controller.current_state(), FeedState::Closed);
        assert_eq!(controller.progress(), 0.0);
        assert!(!controller.is_animating());
    }

    #[test]
    fn test_close_rejected_during_drag() {
        let t0 = Instant::now();
        let classifier = ScriptedClassifier::new()
            .then(vec![])
            .then(vec![DragEvent::Start, drag(300.0, 1.0)]);
        let mut controller = FeedController::new(classifier, EXTENT);

        controller.on_touch_sample(MotionSample::down(t0, 0.0)).unwrap();
        controller.on_touch_sample(MotionSample::moved(ms(t0, 50), 300.0)).unwrap();
        let before = controller.progress();

        assert_eq!(controller.close_overlay(true, None, t0), Err(FeedError::DragInProgress));
        assert_eq!(controller.progress(), before);
        assert_eq!(controller.transition(), Some((FeedState::Closed, FeedState::Open)));
    }

    #[test]
    fn test_touch_ignored_while_closing_from_open() {
        let t0 = Instant::now();
        let classifier = ScriptedClassifier::new().then(vec![DragEvent::Start]);
        let mut controller = FeedController::new(classifier, EXTENT);
        controller.open_overlay(false, None, t0).unwrap();
        controller.on_back_pressed(t0).unwrap();
        assert!(controller.is_animating());

        controller.on_touch_sample(MotionSample::down(ms(t0, 10), 0.0)).unwrap();
        assert!(controller.detector().fed.is_empty());
        assert_eq!(controller.detector().remaining(), 1);
    }

    #[test]
    fn test_terminal_values_are_pinned() {
        let releases = [
            (100.0, DragEvent::End { velocity: 0.0, fling: false }),
            (700.0, DragEvent::End { velocity: 0.0, fling: false }),
            (300.0, DragEvent::End { velocity: 4.0, fling: true }),
            (900.0, DragEvent::End { velocity: -4.0, fling: true }),
            (1500.0, DragEvent::End { velocity: 0.2, fling: false }),
        ];
        for (displacement, release) in releases {
            let t0 = Instant::now();
            let mut controller = FeedController::new(swipe(displacement, release), EXTENT);
            run_swipe(&mut controller, t0, displacement);
            controller.advance(ms(t0, 5000));

            let state = controller.current_state();
            assert_eq!(controller.progress(), state.progress());
            assert!(!controller.is_in_transition());
        }
    }

    #[test]
    fn test_swipe_detector_end_to_end() {
        let t0 = Instant::now();
        let mut controller = FeedController::new(SwipeDetector::default(), EXTENT);

        controller.on_touch_sample(MotionSample::down(t0, 0.0)).unwrap();
        controller.on_touch_sample(MotionSample::moved(ms(t0, 100), 300.0)).unwrap();
        controller.on_touch_sample(MotionSample::moved(ms(t0, 300), 700.0)).unwrap();
        controller.on_touch_sample(MotionSample::up(ms(t0, 600), 700.0)).unwrap();
        assert!(controller.is_dragging_or_settling());

        controller.advance(ms(t0, 2000));
        assert_eq!(controller.current_state(), FeedState::Open);
        assert!(!controller.is_dragging_or_settling());

        // From open only a drag back toward closed is detectable
        controller.on_touch_sample(MotionSample::down(ms(t0, 3000), 700.0)).unwrap();
        controller.on_touch_sample(MotionSample::moved(ms(t0, 3100), 900.0)).unwrap();
        assert!(!controller.is_dragging());
    }
}
