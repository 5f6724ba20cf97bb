//! folio-motion - scroll-aware entrance animations for content pages
//!
//! A catalog of named motion presets, a frame-driven playback engine with
//! staggering, scroll triggers bound to viewport bands, and page-transition
//! timelines. Rendering and viewport detection sit behind the
//! [`host::ElementHost`] and [`host::ViewportObserver`] traits.

pub mod animation;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod scene;

// Re-export commonly used types
pub use config::Config;
pub use engine::{HoverBinding, MotionEngine, PlaybackHandle, ScrollRegistration, Teardown};
pub use error::{MotionError, Result};

pub use animation::{AnimationScheduler, EasingFunction, Keyframes, PresetCatalog, PropertyKind, PropertyValue};
pub use animation::{Length, Position, Segment, Timeline, TimelineBuilder, TimelineHandle, VisualState};
pub use animation::{ScrollTrigger, ToggleAction, ToggleActions, TriggerBand, TriggerState, Tween, TweenId};
pub use host::{ElementHost, ElementId, ElementSpec, HeadlessDocument, Rect, Target};
pub use host::{LayoutObserver, ScriptedObserver, ViewportEvent, ViewportObserver};
