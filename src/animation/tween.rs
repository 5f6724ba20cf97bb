use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use super::easing::EasingFunction;
use super::properties::{Keyframes, PropertyKind, VisualState};
use super::scroll_trigger::ToggleAction;
use super::timeline::TimelineId;
use crate::host::ElementId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(Uuid);

impl TweenId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TweenId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TweenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tween-{}", &self.0.simple().to_string()[..8])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenState {
    /// Waiting out its start delay
    Delayed,
    Running,
    Paused,
    /// Resting at the boundary its direction points to
    Finished,
}

/// Interpolation of one element from `keyframes.start` to `keyframes.end`.
///
/// Progress is tracked as a linear position in `[0, 1]`; the easing curve is
/// applied when sampling, so reversing replays the same curve backwards.
#[derive(Debug, Clone)]
pub struct Tween {
    pub element: ElementId,
    /// Properties this tween currently owns
    keyframes: Keyframes,
    /// Everything it was created with, reclaimed when a trigger replays it
    authored: Keyframes,
    duration: Duration,
    easing: EasingFunction,
    delay: Duration,
    position: f64,
    direction: Direction,
    paused: bool,
    /// Kept by the scheduler after finishing so triggers can replay it
    persistent: bool,
    /// Needs a render on the next tick even if time did not move it
    dirty: bool,
    pub timeline: Option<TimelineId>,
    pub scope: Option<String>,
}

impl Tween {
    pub fn new(
        element: ElementId,
        keyframes: Keyframes,
        duration: Duration,
        easing: EasingFunction,
    ) -> Self {
        Self {
            element,
            authored: keyframes.clone(),
            keyframes,
            duration,
            easing,
            delay: Duration::ZERO,
            position: 0.0,
            direction: Direction::Forward,
            paused: false,
            persistent: false,
            dirty: false,
            timeline: None,
            scope: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Start paused; something else (a scroll trigger) decides when to play.
    pub fn paused(mut self) -> Self {
        self.paused = true;
        self
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    pub fn in_timeline(mut self, timeline: TimelineId) -> Self {
        self.timeline = Some(timeline);
        self
    }

    pub fn in_scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope;
        self
    }

    pub fn keyframes(&self) -> &Keyframes {
        &self.keyframes
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn easing(&self) -> EasingFunction {
        self.easing
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Linear time progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        self.position as f32
    }

    pub fn state(&self) -> TweenState {
        if self.is_finished() {
            TweenState::Finished
        } else if self.paused {
            TweenState::Paused
        } else if !self.delay.is_zero() {
            TweenState::Delayed
        } else {
            TweenState::Running
        }
    }

    /// Delayed or running: the only states a newer tween can take
    /// properties from.
    pub fn is_in_flight(&self) -> bool {
        matches!(self.state(), TweenState::Delayed | TweenState::Running)
    }

    pub fn is_finished(&self) -> bool {
        match self.direction {
            Direction::Forward => self.position >= 1.0,
            Direction::Reverse => self.position <= 0.0,
        }
    }

    /// Move time forward by `dt`. Returns whether the tween produced a new
    /// frame.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if self.paused || self.is_finished() {
            return false;
        }

        let mut dt = dt;
        if !self.delay.is_zero() {
            if dt < self.delay {
                self.delay -= dt;
                return false;
            }
            dt -= self.delay;
            self.delay = Duration::ZERO;
        }

        let step = if self.duration.is_zero() {
            1.0
        } else {
            dt.as_secs_f64() / self.duration.as_secs_f64()
        };

        self.position = match self.direction {
            Direction::Forward => (self.position + step).min(1.0),
            Direction::Reverse => (self.position - step).max(0.0),
        };
        true
    }

    /// The visual state at the current position.
    pub fn sample(&self) -> VisualState {
        let eased = if self.position >= 1.0 {
            1.0
        } else if self.position <= 0.0 {
            0.0
        } else {
            self.easing.apply(self.position as f32)
        };
        self.keyframes.sample(eased)
    }

    /// Return and clear the pending-render flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Stop animating `kind`; a newer tween owns it now. Returns whether any
    /// properties remain.
    pub fn release(&mut self, kind: PropertyKind) -> bool {
        self.keyframes.remove(kind);
        !self.keyframes.is_empty()
    }

    /// Take back every authored property. Returns the property kinds now
    /// owned.
    pub fn reclaim(&mut self) -> Vec<PropertyKind> {
        self.keyframes = self.authored.clone();
        self.keyframes.kinds()
    }

    pub fn play(&mut self) {
        self.direction = Direction::Forward;
        self.paused = false;
    }

    pub fn reverse(&mut self) {
        self.direction = Direction::Reverse;
        self.paused = false;
        self.delay = Duration::ZERO;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn restart(&mut self) {
        self.position = 0.0;
        self.direction = Direction::Forward;
        self.paused = false;
        self.delay = Duration::ZERO;
        self.dirty = true;
    }

    /// Back to the start state, paused.
    pub fn reset(&mut self) {
        self.position = 0.0;
        self.direction = Direction::Forward;
        self.paused = true;
        self.dirty = true;
    }

    /// Jump to the end state.
    pub fn complete(&mut self) {
        self.position = 1.0;
        self.direction = Direction::Forward;
        self.delay = Duration::ZERO;
        self.dirty = true;
    }

    pub fn apply(&mut self, action: ToggleAction) {
        match action {
            ToggleAction::Play => self.play(),
            ToggleAction::Pause => self.pause(),
            ToggleAction::Resume => self.resume(),
            ToggleAction::Reverse => self.reverse(),
            ToggleAction::Restart => self.restart(),
            ToggleAction::Reset => self.reset(),
            ToggleAction::Complete => self.complete(),
            ToggleAction::None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::properties::{PropertyValue, VisualState};

    fn fade(duration_ms: u64) -> Tween {
        let keyframes = Keyframes::settling(VisualState::new().with(PropertyValue::Opacity(0.0)));
        Tween::new(
            ElementId(1),
            keyframes,
            Duration::from_millis(duration_ms),
            EasingFunction::Linear,
        )
    }

    fn opacity(tween: &Tween) -> f32 {
        tween.sample().get(PropertyKind::Opacity).unwrap().as_f32()
    }

    #[test]
    fn test_linear_progress() {
        let mut tween = fade(1000);
        assert!(tween.advance(Duration::from_millis(250)));
        assert!((opacity(&tween) - 0.25).abs() < 1e-6);
        assert_eq!(tween.state(), TweenState::Running);

        tween.advance(Duration::from_millis(2000));
        assert_eq!(opacity(&tween), 1.0);
        assert!(tween.is_finished());
        assert!(!tween.advance(Duration::from_millis(16)));
    }

    #[test]
    fn test_delay_is_consumed_first() {
        let mut tween = fade(1000).with_delay(Duration::from_millis(500));
        assert!(!tween.advance(Duration::from_millis(400)));
        assert_eq!(tween.state(), TweenState::Delayed);

        assert!(tween.advance(Duration::from_millis(200)));
        assert!((tween.progress() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_paused_until_played() {
        let mut tween = fade(100).paused();
        assert_eq!(tween.state(), TweenState::Paused);
        assert!(!tween.advance(Duration::from_millis(50)));

        tween.apply(ToggleAction::Play);
        assert!(tween.advance(Duration::from_millis(50)));
        assert!((tween.progress() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_reverse_from_current_position() {
        let mut tween = fade(1000);
        tween.advance(Duration::from_millis(600));
        tween.apply(ToggleAction::Reverse);
        tween.advance(Duration::from_millis(200));
        assert!((tween.progress() - 0.4).abs() < 1e-6);

        tween.advance(Duration::from_secs(1));
        assert!(tween.is_finished());
        assert_eq!(opacity(&tween), 0.0);
    }

    #[test]
    fn test_reset_and_complete_mark_dirty() {
        let mut tween = fade(1000);
        tween.advance(Duration::from_millis(300));

        tween.apply(ToggleAction::Complete);
        assert!(tween.take_dirty());
        assert!(!tween.take_dirty());
        assert_eq!(opacity(&tween), 1.0);

        tween.apply(ToggleAction::Reset);
        assert!(tween.take_dirty());
        assert_eq!(opacity(&tween), 0.0);
        assert_eq!(tween.state(), TweenState::Paused);
    }

    #[test]
    fn test_zero_duration_jumps_to_end() {
        let mut tween = fade(0);
        assert!(tween.advance(Duration::from_millis(1)));
        assert_eq!(opacity(&tween), 1.0);
    }

    #[test]
    fn test_release_properties() {
        let keyframes = Keyframes::settling(
            VisualState::new()
                .with(PropertyValue::Opacity(0.0))
                .with(PropertyValue::Scale(0.5)),
        );
        let mut tween = Tween::new(ElementId(1), keyframes, Duration::from_secs(1), EasingFunction::Linear);
        assert!(tween.release(PropertyKind::Scale));
        assert!(!tween.release(PropertyKind::Opacity));

        assert_eq!(tween.reclaim(), vec![PropertyKind::Opacity, PropertyKind::Scale]);
        assert_eq!(tween.sample().len(), 2);
    }

    #[test]
    fn test_in_flight_states() {
        let mut tween = fade(100).with_delay(Duration::from_millis(50));
        assert!(tween.is_in_flight());
        tween.advance(Duration::from_millis(200));
        assert!(tween.is_finished());
        assert!(!tween.is_in_flight());

        let mut gated = fade(100).paused();
        assert!(!gated.is_in_flight());
        gated.apply(ToggleAction::Play);
        assert!(gated.is_in_flight());
    }
}
