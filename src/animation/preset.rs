//! The closed catalog of named entrance effects.
//!
//! Every preset starts from a displaced, transparent, scaled or rotated state
//! and settles to the visual identity. Easing differs per preset so hero text,
//! card grids and badges each get a recognisable motion.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use super::easing::{EaseMode, EasingFunction};
use super::properties::{Keyframes, Length, PropertyValue, VisualState};
use crate::config::MotionSettings;
use crate::error::{MotionError, Result};

/// Direction for the slide-and-fade family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideDirection {
    Left,
    Right,
    Up,
    Down,
}

impl SlideDirection {
    fn offset(self) -> (f32, f32) {
        match self {
            SlideDirection::Left => (-80.0, 0.0),
            SlideDirection::Right => (80.0, 0.0),
            SlideDirection::Up => (0.0, -80.0),
            SlideDirection::Down => (0.0, 80.0),
        }
    }

    pub fn preset_name(self) -> &'static str {
        match self {
            SlideDirection::Left => "slideAndFadeLeft",
            SlideDirection::Right => "slideAndFadeRight",
            SlideDirection::Up => "slideAndFadeUp",
            SlideDirection::Down => "slideAndFadeDown",
        }
    }
}

/// An immutable motion definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub name: String,
    pub keyframes: Keyframes,
    pub duration: Duration,
    pub easing: EasingFunction,
}

impl Preset {
    fn settling(name: &str, start: VisualState, duration: Duration, easing: EasingFunction) -> Self {
        Self {
            name: name.to_string(),
            keyframes: Keyframes::settling(start),
            duration,
            easing,
        }
    }

    pub fn start_state(&self) -> &VisualState {
        self.keyframes.start()
    }

    pub fn end_state(&self) -> &VisualState {
        self.keyframes.end()
    }
}

/// Summary row used by `folio-motion presets`.
#[derive(Debug, Clone, Serialize)]
pub struct PresetSummary {
    pub name: String,
    pub duration_secs: f32,
    pub ease: String,
    pub properties: Vec<String>,
}

impl From<&Preset> for PresetSummary {
    fn from(preset: &Preset) -> Self {
        Self {
            name: preset.name.clone(),
            duration_secs: preset.duration.as_secs_f32(),
            ease: preset.easing.to_string(),
            properties: preset
                .start_state()
                .kinds()
                .iter()
                .map(|kind| format!("{:?}", kind))
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PresetCatalog {
    presets: BTreeMap<String, Preset>,
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self::new(&MotionSettings::default())
    }
}

impl PresetCatalog {
    /// Build the catalog. Presets without their own timing inherit the
    /// default duration and ease from `settings`.
    pub fn new(settings: &MotionSettings) -> Self {
        let default_duration = settings.duration();
        let default_ease = settings.ease;
        let back = EasingFunction::Back {
            overshoot: 1.7,
            mode: EaseMode::Out,
        };
        let bounce = EasingFunction::Bounce(EaseMode::Out);

        let px = Length::Px;
        let x = |v| PropertyValue::OffsetX(px(v));
        let y = |v| PropertyValue::OffsetY(px(v));
        let hidden = PropertyValue::Opacity(0.0);

        let mut presets = vec![
            Preset::settling(
                "fadeInUp",
                VisualState::new().with(y(60.0)).with(hidden),
                default_duration,
                default_ease,
            ),
            Preset::settling(
                "fadeInLeft",
                VisualState::new().with(x(-60.0)).with(hidden),
                default_duration,
                default_ease,
            ),
            Preset::settling(
                "fadeInRight",
                VisualState::new().with(x(60.0)).with(hidden),
                default_duration,
                default_ease,
            ),
            Preset::settling(
                "slideInFromTop",
                VisualState::new().with(y(-100.0)).with(hidden),
                default_duration,
                bounce,
            ),
            Preset::settling(
                "slideInFromBottom",
                VisualState::new().with(y(100.0)).with(hidden),
                default_duration,
                back,
            ),
            Preset::settling(
                "rotateScaleIn",
                VisualState::new()
                    .with(PropertyValue::RotationZ(-180.0))
                    .with(PropertyValue::Scale(0.0))
                    .with(hidden),
                Duration::from_millis(1200),
                back,
            ),
            Preset::settling(
                "bounceIn",
                VisualState::new().with(PropertyValue::Scale(0.0)).with(hidden),
                Duration::from_millis(800),
                bounce,
            ),
            Preset::settling(
                "flipIn",
                VisualState::new()
                    .with(PropertyValue::RotationY(-90.0))
                    .with(hidden),
                Duration::from_millis(800),
                EasingFunction::POWER2_OUT,
            ),
            Preset::settling(
                "elasticScale",
                VisualState::new().with(PropertyValue::Scale(0.3)).with(hidden),
                Duration::from_millis(1500),
                EasingFunction::Elastic {
                    amplitude: 1.0,
                    period: 0.3,
                    mode: EaseMode::Out,
                },
            ),
            Preset::settling(
                "scaleIn",
                VisualState::new().with(PropertyValue::Scale(0.8)).with(hidden),
                default_duration,
                back,
            ),
        ];

        for direction in [
            SlideDirection::Left,
            SlideDirection::Right,
            SlideDirection::Up,
            SlideDirection::Down,
        ] {
            let (dx, dy) = direction.offset();
            presets.push(Preset::settling(
                direction.preset_name(),
                VisualState::new()
                    .with(x(dx))
                    .with(y(dy))
                    .with(hidden)
                    .with(PropertyValue::Scale(0.8)),
                Duration::from_secs(1),
                EasingFunction::Power {
                    degree: 3,
                    mode: EaseMode::Out,
                },
            ));
        }

        Self {
            presets: presets
                .into_iter()
                .map(|preset| (preset.name.clone(), preset))
                .collect(),
        }
    }

    pub fn lookup(&self, name: &str) -> Result<&Preset> {
        self.presets
            .get(name)
            .ok_or_else(|| MotionError::UnknownPreset(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.presets.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.values()
    }

    pub fn summaries(&self) -> Vec<PresetSummary> {
        self.iter().map(PresetSummary::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::properties::PropertyKind;

    #[test]
    fn test_every_preset_has_matching_keys() {
        let catalog = PresetCatalog::default();
        for preset in catalog.iter() {
            let found = catalog.lookup(&preset.name).unwrap();
            assert_eq!(
                found.start_state().kinds(),
                found.end_state().kinds(),
                "{}",
                preset.name
            );
        }
    }

    #[test]
    fn test_end_state_is_settled_identity() {
        let catalog = PresetCatalog::default();
        for preset in catalog.iter() {
            for value in preset.end_state().values() {
                let expected = match value.kind() {
                    PropertyKind::Opacity | PropertyKind::Scale => 1.0,
                    _ => 0.0,
                };
                assert_eq!(value.as_f32(), expected, "{} {:?}", preset.name, value.kind());
            }
        }
    }

    #[test]
    fn test_unknown_preset() {
        let catalog = PresetCatalog::default();
        assert_eq!(
            catalog.lookup("fadeInDiagonal").unwrap_err(),
            MotionError::UnknownPreset("fadeInDiagonal".to_string())
        );
    }

    #[test]
    fn test_timings() {
        let catalog = PresetCatalog::default();
        let fade = catalog.lookup("fadeInUp").unwrap();
        assert_eq!(fade.duration, Duration::from_millis(800));
        assert_eq!(fade.easing, EasingFunction::POWER2_OUT);

        let elastic = catalog.lookup("elasticScale").unwrap();
        assert_eq!(elastic.duration, Duration::from_millis(1500));
        assert_eq!(elastic.easing.to_string(), "elastic.out(1, 0.3)");

        let rotate = catalog.lookup("rotateScaleIn").unwrap();
        assert_eq!(rotate.duration, Duration::from_millis(1200));
    }

    #[test]
    fn test_distinct_eases_per_context() {
        let catalog = PresetCatalog::default();
        let top = catalog.lookup("slideInFromTop").unwrap().easing;
        let bottom = catalog.lookup("slideInFromBottom").unwrap().easing;
        let elastic = catalog.lookup("elasticScale").unwrap().easing;
        assert_ne!(top, bottom);
        assert_ne!(bottom, elastic);
    }

    #[test]
    fn test_slide_and_fade_directions() {
        let catalog = PresetCatalog::default();
        let left = catalog.lookup(SlideDirection::Left.preset_name()).unwrap();
        assert_eq!(
            left.start_state().get(PropertyKind::OffsetX),
            Some(PropertyValue::OffsetX(Length::Px(-80.0)))
        );
        assert_eq!(
            left.start_state().get(PropertyKind::OffsetY),
            Some(PropertyValue::OffsetY(Length::Px(0.0)))
        );
        assert_eq!(catalog.names().count(), 14);
    }
}
