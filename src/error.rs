use thiserror::Error;

use crate::animation::properties::PropertyKind;

pub type Result<T> = std::result::Result<T, MotionError>;

/// Errors surfaced by the motion library.
///
/// A target that resolves to no element is absent from this list:
/// playback on a missing element is a silent no-op, never an error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MotionError {
    #[error("unknown animation preset '{0}'")]
    UnknownPreset(String),

    #[error("unknown easing '{0}'")]
    UnknownEasing(String),

    #[error("invalid scroll trigger position '{0}'")]
    InvalidTriggerPosition(String),

    #[error("invalid toggle actions '{0}': expected four of play, pause, resume, reverse, restart, reset, complete, none")]
    InvalidToggleActions(String),

    #[error("start and end states define different properties (start: {start:?}, end: {end:?})")]
    MismatchedKeys {
        start: Vec<PropertyKind>,
        end: Vec<PropertyKind>,
    },

    #[error("property {0:?} mixes pixel and percentage lengths")]
    MismatchedUnits(PropertyKind),

    #[error("viewport observer unavailable: {0}")]
    ObserverUnavailable(String),

    #[error("invalid selector '{0}'")]
    Selector(String),

    #[error("{setting} must not overshoot its end value, '{ease}' does")]
    NonMonotonicEasing { setting: String, ease: String },
}
