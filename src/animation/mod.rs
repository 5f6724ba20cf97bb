pub mod easing;
pub mod preset;
pub mod properties;
pub mod scheduler;
pub mod scroll_trigger;
pub mod timeline;
pub mod tween;

// Re-export commonly used types
pub use easing::{EaseMode, EasingFunction};
pub use preset::{Preset, PresetCatalog, PresetSummary, SlideDirection};
pub use properties::{Keyframes, Length, PropertyKind, PropertyValue, VisualState};
pub use scheduler::AnimationScheduler;
pub use scroll_trigger::{ScrollTrigger, ToggleAction, ToggleActions, TriggerBand, TriggerId, TriggerState};
pub use timeline::{Position, Segment, Timeline, TimelineBuilder, TimelineHandle, TimelineId};
pub use tween::{Direction, Tween, TweenId, TweenState};
