//! Scroll-gated playback: trigger bands, toggle actions and the per-element
//! `Idle -> Entered -> Exited` state machine.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, trace};
use uuid::Uuid;

use super::tween::TweenId;
use crate::error::{MotionError, Result};
use crate::host::viewport::{ViewportEvent, ViewportEvents};
use crate::host::{ElementId, Rect};

static POSITION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(top|center|bottom|-?\d+(?:\.\d+)?%)\s+(top|center|bottom|-?\d+(?:\.\d+)?%)$")
        .expect("valid trigger position regex")
});

/// One edge of a trigger band: "when `element_edge` of the element meets
/// `viewport_line` of the viewport". Both are fractions (0.0 = top).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerPosition {
    pub element_edge: f32,
    pub viewport_line: f32,
}

impl TriggerPosition {
    fn fraction(token: &str) -> Option<f32> {
        match token {
            "top" => Some(0.0),
            "center" => Some(0.5),
            "bottom" => Some(1.0),
            percent => percent
                .strip_suffix('%')
                .and_then(|n| n.parse::<f32>().ok())
                .map(|n| n / 100.0),
        }
    }

    /// Scroll offset at which this position is reached.
    pub fn scroll_offset(&self, rect: Rect, viewport_height: f32) -> f32 {
        rect.top + self.element_edge * rect.height - self.viewport_line * viewport_height
    }
}

impl FromStr for TriggerPosition {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || MotionError::InvalidTriggerPosition(s.to_string());
        let normalized = s.trim().to_ascii_lowercase();
        let caps = POSITION_PATTERN.captures(&normalized).ok_or_else(invalid)?;
        let element_edge = Self::fraction(&caps[1]).ok_or_else(invalid)?;
        let viewport_line = Self::fraction(&caps[2]).ok_or_else(invalid)?;
        Ok(Self {
            element_edge,
            viewport_line,
        })
    }
}

/// The scroll region during which an element counts as "in view".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerBand {
    pub start: TriggerPosition,
    pub end: TriggerPosition,
}

impl TriggerBand {
    /// Parse a band from its start and optional end position. Without an end
    /// the band closes when the element's bottom passes the viewport top.
    pub fn parse(start: &str, end: Option<&str>) -> Result<Self> {
        Ok(Self {
            start: start.parse()?,
            end: end.unwrap_or("bottom top").parse()?,
        })
    }

    /// Scroll offsets `(start, end)` for an element at `rect`.
    pub fn scroll_range(&self, rect: Rect, viewport_height: f32) -> (f32, f32) {
        (
            self.start.scroll_offset(rect, viewport_height),
            self.end.scroll_offset(rect, viewport_height),
        )
    }
}

impl Default for TriggerBand {
    fn default() -> Self {
        Self {
            start: TriggerPosition {
                element_edge: 0.0,
                viewport_line: 0.8,
            },
            end: TriggerPosition {
                element_edge: 1.0,
                viewport_line: 0.2,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Play,
    Pause,
    Resume,
    Reverse,
    Restart,
    Reset,
    Complete,
    None,
}

impl FromStr for ToggleAction {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "play" => Ok(ToggleAction::Play),
            "pause" => Ok(ToggleAction::Pause),
            "resume" => Ok(ToggleAction::Resume),
            "reverse" => Ok(ToggleAction::Reverse),
            "restart" => Ok(ToggleAction::Restart),
            "reset" => Ok(ToggleAction::Reset),
            "complete" => Ok(ToggleAction::Complete),
            "none" => Ok(ToggleAction::None),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ToggleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            ToggleAction::Play => "play",
            ToggleAction::Pause => "pause",
            ToggleAction::Resume => "resume",
            ToggleAction::Reverse => "reverse",
            ToggleAction::Restart => "restart",
            ToggleAction::Reset => "reset",
            ToggleAction::Complete => "complete",
            ToggleAction::None => "none",
        };
        f.write_str(word)
    }
}

/// Actions for `onEnter onLeave onEnterBack onLeaveBack`, in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleActions {
    pub on_enter: ToggleAction,
    pub on_leave: ToggleAction,
    pub on_enter_back: ToggleAction,
    pub on_leave_back: ToggleAction,
}

impl ToggleActions {
    pub fn for_event(&self, event: ViewportEvent) -> ToggleAction {
        match event {
            ViewportEvent::Enter => self.on_enter,
            ViewportEvent::Leave => self.on_leave,
            ViewportEvent::EnterBack => self.on_enter_back,
            ViewportEvent::LeaveBack => self.on_leave_back,
        }
    }
}

impl Default for ToggleActions {
    /// `play none none reverse`
    fn default() -> Self {
        Self {
            on_enter: ToggleAction::Play,
            on_leave: ToggleAction::None,
            on_enter_back: ToggleAction::None,
            on_leave_back: ToggleAction::Reverse,
        }
    }
}

impl FromStr for ToggleActions {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || MotionError::InvalidToggleActions(s.to_string());
        let actions: Vec<ToggleAction> = s
            .split_whitespace()
            .map(|word| word.to_ascii_lowercase().parse::<ToggleAction>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| invalid())?;

        match actions.as_slice() {
            [on_enter, on_leave, on_enter_back, on_leave_back] => Ok(Self {
                on_enter: *on_enter,
                on_leave: *on_leave,
                on_enter_back: *on_enter_back,
                on_leave_back: *on_leave_back,
            }),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for ToggleActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.on_enter, self.on_leave, self.on_enter_back, self.on_leave_back
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerId(Uuid);

impl TriggerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TriggerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trigger-{}", &self.0.simple().to_string()[..8])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Idle,
    Entered,
    Exited,
}

impl TriggerState {
    /// Advance the state machine. Returns the next state and whether the
    /// event's toggle action should run.
    ///
    /// Only `Enter` leaves `Idle`/`Exited`, and only `LeaveBack` leaves
    /// `Entered`. While `Entered`, `Leave` and `EnterBack` fire their actions
    /// without a state change and a repeated `Enter` is swallowed.
    pub fn on_event(self, event: ViewportEvent) -> (TriggerState, bool) {
        match (self, event) {
            (TriggerState::Idle | TriggerState::Exited, ViewportEvent::Enter) => {
                (TriggerState::Entered, true)
            }
            (TriggerState::Entered, ViewportEvent::LeaveBack) => (TriggerState::Exited, true),
            (TriggerState::Entered, ViewportEvent::Leave | ViewportEvent::EnterBack) => {
                (TriggerState::Entered, true)
            }
            (state, _) => (state, false),
        }
    }
}

/// A live scroll trigger bound to one element and the tweens it drives.
#[derive(Debug)]
pub struct ScrollTrigger {
    pub id: TriggerId,
    pub element: ElementId,
    pub band: TriggerBand,
    pub actions: ToggleActions,
    pub tweens: Vec<TweenId>,
    pub scope: Option<String>,
    state: TriggerState,
    events: ViewportEvents,
}

impl ScrollTrigger {
    pub fn new(
        element: ElementId,
        band: TriggerBand,
        actions: ToggleActions,
        tweens: Vec<TweenId>,
        events: ViewportEvents,
    ) -> Self {
        Self {
            id: TriggerId::new(),
            element,
            band,
            actions,
            tweens,
            scope: None,
            state: TriggerState::Idle,
            events,
        }
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    /// Feed one event through the state machine.
    pub fn handle(&mut self, event: ViewportEvent) -> Option<ToggleAction> {
        let (next, fire) = self.state.on_event(event);
        trace!(
            "🎯 {} on {}: {:?} {:?} -> {:?}",
            self.id,
            self.element,
            event,
            self.state,
            next
        );
        self.state = next;

        let action = self.actions.for_event(event);
        (fire && action != ToggleAction::None).then_some(action)
    }

    /// Drain pending viewport events, returning the actions to run in order.
    pub fn poll(&mut self) -> Vec<ToggleAction> {
        let mut actions = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => actions.extend(self.handle(event)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("🔌 Viewport watch for {} closed", self.element);
                    break;
                }
            }
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_parse_band() {
        let band = TriggerBand::parse("top 80%", Some("bottom 20%")).unwrap();
        assert_eq!(band, TriggerBand::default());

        let open = TriggerBand::parse("top 80%", None).unwrap();
        assert_eq!(open.end.element_edge, 1.0);
        assert_eq!(open.end.viewport_line, 0.0);

        assert_eq!(
            "center center".parse::<TriggerPosition>().unwrap(),
            TriggerPosition {
                element_edge: 0.5,
                viewport_line: 0.5
            }
        );
        assert!(TriggerBand::parse("top", None).is_err());
        assert!(TriggerBand::parse("left 80%", None).is_err());
    }

    #[test]
    fn test_scroll_range() {
        let rect = Rect {
            top: 1000.0,
            height: 200.0,
        };
        let (start, end) = TriggerBand::default().scroll_range(rect, 1000.0);
        assert_eq!(start, 200.0);
        assert_eq!(end, 1000.0);
    }

    #[test]
    fn test_parse_toggle_actions() {
        let actions: ToggleActions = "play none none reverse".parse().unwrap();
        assert_eq!(actions, ToggleActions::default());
        assert_eq!(actions.to_string(), "play none none reverse");

        let actions: ToggleActions = "restart pause resume reset".parse().unwrap();
        assert_eq!(actions.on_leave, ToggleAction::Pause);
        assert!("play none".parse::<ToggleActions>().is_err());
        assert!("play none none rewind".parse::<ToggleActions>().is_err());
    }

    #[test]
    fn test_state_machine_transitions() {
        use ViewportEvent::*;

        let (state, fired) = TriggerState::Idle.on_event(Enter);
        assert_eq!((state, fired), (TriggerState::Entered, true));

        let (state, fired) = state.on_event(Enter);
        assert_eq!((state, fired), (TriggerState::Entered, false));

        let (state, fired) = state.on_event(LeaveBack);
        assert_eq!((state, fired), (TriggerState::Exited, true));

        let (state, fired) = state.on_event(LeaveBack);
        assert_eq!((state, fired), (TriggerState::Exited, false));

        let (state, fired) = state.on_event(Enter);
        assert_eq!((state, fired), (TriggerState::Entered, true));

        assert_eq!(TriggerState::Idle.on_event(LeaveBack), (TriggerState::Idle, false));
    }

    #[test]
    fn test_trigger_maps_events_to_actions() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut trigger = ScrollTrigger::new(
            ElementId(1),
            TriggerBand::default(),
            ToggleActions::default(),
            Vec::new(),
            rx,
        );

        tx.send(ViewportEvent::Enter).unwrap();
        tx.send(ViewportEvent::Leave).unwrap();
        tx.send(ViewportEvent::EnterBack).unwrap();
        tx.send(ViewportEvent::LeaveBack).unwrap();
        assert_eq!(
            trigger.poll(),
            vec![ToggleAction::Play, ToggleAction::Reverse]
        );
        assert_eq!(trigger.state(), TriggerState::Exited);

        drop(tx);
        assert!(trigger.poll().is_empty());
    }
}
