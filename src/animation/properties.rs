use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{MotionError, Result};

/// A translation length. Panels slide by percentage of their own size,
/// everything else by pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Length {
    Px(f32),
    Percent(f32),
}

impl Length {
    pub fn value(self) -> f32 {
        match self {
            Length::Px(v) | Length::Percent(v) => v,
        }
    }

    fn with_value(self, value: f32) -> Self {
        match self {
            Length::Px(_) => Length::Px(value),
            Length::Percent(_) => Length::Percent(value),
        }
    }

    fn same_unit(self, other: Length) -> bool {
        matches!(
            (self, other),
            (Length::Px(_), Length::Px(_)) | (Length::Percent(_), Length::Percent(_))
        )
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Px(v) => write!(f, "{}px", v),
            Length::Percent(v) => write!(f, "{}%", v),
        }
    }
}

/// The closed set of animatable properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    OffsetX,
    OffsetY,
    Opacity,
    Scale,
    RotationZ,
    RotationY,
    WidthPercent,
    /// Numeric text content, rendered as a rounded integer.
    Counter,
    /// How many characters of a typed string are shown.
    TextReveal,
}

/// A value for one [`PropertyKind`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    OffsetX(Length),
    OffsetY(Length),
    Opacity(f32),
    Scale(f32),
    /// Degrees, in-plane.
    RotationZ(f32),
    /// Degrees, about the vertical axis.
    RotationY(f32),
    WidthPercent(f32),
    Counter(f32),
    TextReveal(f32),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::OffsetX(_) => PropertyKind::OffsetX,
            PropertyValue::OffsetY(_) => PropertyKind::OffsetY,
            PropertyValue::Opacity(_) => PropertyKind::Opacity,
            PropertyValue::Scale(_) => PropertyKind::Scale,
            PropertyValue::RotationZ(_) => PropertyKind::RotationZ,
            PropertyValue::RotationY(_) => PropertyKind::RotationY,
            PropertyValue::WidthPercent(_) => PropertyKind::WidthPercent,
            PropertyValue::Counter(_) => PropertyKind::Counter,
            PropertyValue::TextReveal(_) => PropertyKind::TextReveal,
        }
    }

    pub fn as_f32(&self) -> f32 {
        match *self {
            PropertyValue::OffsetX(len) | PropertyValue::OffsetY(len) => len.value(),
            PropertyValue::Opacity(v)
            | PropertyValue::Scale(v)
            | PropertyValue::RotationZ(v)
            | PropertyValue::RotationY(v)
            | PropertyValue::WidthPercent(v)
            | PropertyValue::Counter(v)
            | PropertyValue::TextReveal(v) => v,
        }
    }

    /// Interpolate towards `target`. Callers pair values through
    /// [`Keyframes::new`], which rejects kind and unit mismatches, so a
    /// mismatch here only happens on misuse and yields `target` unchanged.
    pub fn interpolate(&self, target: &PropertyValue, progress: f32) -> PropertyValue {
        let lerp = |from: f32, to: f32| from + (to - from) * progress;

        match (*self, *target) {
            (PropertyValue::OffsetX(from), PropertyValue::OffsetX(to)) if from.same_unit(to) => {
                PropertyValue::OffsetX(to.with_value(lerp(from.value(), to.value())))
            }
            (PropertyValue::OffsetY(from), PropertyValue::OffsetY(to)) if from.same_unit(to) => {
                PropertyValue::OffsetY(to.with_value(lerp(from.value(), to.value())))
            }
            (PropertyValue::Opacity(from), PropertyValue::Opacity(to)) => {
                PropertyValue::Opacity(lerp(from, to))
            }
            (PropertyValue::Scale(from), PropertyValue::Scale(to)) => {
                PropertyValue::Scale(lerp(from, to))
            }
            (PropertyValue::RotationZ(from), PropertyValue::RotationZ(to)) => {
                PropertyValue::RotationZ(lerp(from, to))
            }
            (PropertyValue::RotationY(from), PropertyValue::RotationY(to)) => {
                PropertyValue::RotationY(lerp(from, to))
            }
            (PropertyValue::WidthPercent(from), PropertyValue::WidthPercent(to)) => {
                PropertyValue::WidthPercent(lerp(from, to))
            }
            (PropertyValue::Counter(from), PropertyValue::Counter(to)) => {
                PropertyValue::Counter(lerp(from, to))
            }
            (PropertyValue::TextReveal(from), PropertyValue::TextReveal(to)) => {
                PropertyValue::TextReveal(lerp(from, to))
            }
            _ => *target,
        }
    }

    /// Whole characters a [`PropertyValue::TextReveal`] shows.
    pub fn revealed_chars(&self) -> Option<usize> {
        match *self {
            PropertyValue::TextReveal(v) => Some(v.max(0.0).floor() as usize),
            _ => None,
        }
    }

    /// The resting value for this property's kind.
    pub fn settled(kind: PropertyKind) -> PropertyValue {
        match kind {
            PropertyKind::OffsetX => PropertyValue::OffsetX(Length::Px(0.0)),
            PropertyKind::OffsetY => PropertyValue::OffsetY(Length::Px(0.0)),
            PropertyKind::Opacity => PropertyValue::Opacity(1.0),
            PropertyKind::Scale => PropertyValue::Scale(1.0),
            PropertyKind::RotationZ => PropertyValue::RotationZ(0.0),
            PropertyKind::RotationY => PropertyValue::RotationY(0.0),
            PropertyKind::WidthPercent => PropertyValue::WidthPercent(100.0),
            PropertyKind::Counter => PropertyValue::Counter(0.0),
            PropertyKind::TextReveal => PropertyValue::TextReveal(0.0),
        }
    }
}

/// A set of property values for one element, at most one per kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualState {
    values: BTreeMap<PropertyKind, PropertyValue>,
}

impl VisualState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, value: PropertyValue) -> Self {
        self.set(value);
        self
    }

    pub fn set(&mut self, value: PropertyValue) {
        self.values.insert(value.kind(), value);
    }

    pub fn get(&self, kind: PropertyKind) -> Option<PropertyValue> {
        self.values.get(&kind).copied()
    }

    pub fn remove(&mut self, kind: PropertyKind) -> Option<PropertyValue> {
        self.values.remove(&kind)
    }

    pub fn contains(&self, kind: PropertyKind) -> bool {
        self.values.contains_key(&kind)
    }

    pub fn kinds(&self) -> Vec<PropertyKind> {
        self.values.keys().copied().collect()
    }

    pub fn values(&self) -> impl Iterator<Item = &PropertyValue> {
        self.values.values()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Overlay `other` on top of this state.
    pub fn merge(&mut self, other: &VisualState) {
        for value in other.values() {
            self.set(*value);
        }
    }

    /// The settled identity for the same keys as `self`, preserving the
    /// length unit of offsets.
    pub fn settled_like(&self) -> VisualState {
        let mut settled = VisualState::new();
        for value in self.values() {
            let rest = match *value {
                PropertyValue::OffsetX(len) => PropertyValue::OffsetX(len.with_value(0.0)),
                PropertyValue::OffsetY(len) => PropertyValue::OffsetY(len.with_value(0.0)),
                other => PropertyValue::settled(other.kind()),
            };
            settled.set(rest);
        }
        settled
    }

    /// Render as CSS declarations (`transform`, `opacity`, `width`). Counter
    /// and text reveal values are text, not style, and are skipped.
    pub fn to_css(&self) -> Vec<(String, String)> {
        let mut declarations = Vec::new();
        let mut transforms = Vec::new();

        let x = self.get(PropertyKind::OffsetX);
        let y = self.get(PropertyKind::OffsetY);
        if x.is_some() || y.is_some() {
            let x = x.map(|v| v.to_string()).unwrap_or_else(|| "0px".to_string());
            let y = y.map(|v| v.to_string()).unwrap_or_else(|| "0px".to_string());
            transforms.push(format!("translate({}, {})", x, y));
        }
        if let Some(PropertyValue::RotationZ(deg)) = self.get(PropertyKind::RotationZ) {
            transforms.push(format!("rotate({}deg)", deg));
        }
        if let Some(PropertyValue::RotationY(deg)) = self.get(PropertyKind::RotationY) {
            transforms.push(format!("rotateY({}deg)", deg));
        }
        if let Some(PropertyValue::Scale(scale)) = self.get(PropertyKind::Scale) {
            transforms.push(format!("scale({})", scale));
        }
        if !transforms.is_empty() {
            declarations.push(("transform".to_string(), transforms.join(" ")));
        }
        if let Some(PropertyValue::Opacity(opacity)) = self.get(PropertyKind::Opacity) {
            declarations.push(("opacity".to_string(), opacity.to_string()));
        }
        if let Some(width) = self.get(PropertyKind::WidthPercent) {
            declarations.push(("width".to_string(), width.to_string()));
        }

        declarations
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::OffsetX(len) | PropertyValue::OffsetY(len) => write!(f, "{}", len),
            PropertyValue::Opacity(v) | PropertyValue::Scale(v) => write!(f, "{}", v),
            PropertyValue::RotationZ(v) | PropertyValue::RotationY(v) => write!(f, "{}deg", v),
            PropertyValue::WidthPercent(v) => write!(f, "{}%", v),
            PropertyValue::Counter(v) => write!(f, "{}", v.round()),
            PropertyValue::TextReveal(v) => write!(f, "{}", v.max(0.0).floor()),
        }
    }
}

impl FromIterator<PropertyValue> for VisualState {
    fn from_iter<I: IntoIterator<Item = PropertyValue>>(iter: I) -> Self {
        let mut state = VisualState::new();
        for value in iter {
            state.set(value);
        }
        state
    }
}

/// A validated start/end pair: both sides define exactly the same property
/// kinds, with matching length units.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframes {
    start: VisualState,
    end: VisualState,
}

impl Keyframes {
    pub fn new(start: VisualState, end: VisualState) -> Result<Self> {
        if start.kinds() != end.kinds() {
            return Err(MotionError::MismatchedKeys {
                start: start.kinds(),
                end: end.kinds(),
            });
        }

        for (from, to) in start.values().zip(end.values()) {
            if let (
                PropertyValue::OffsetX(a) | PropertyValue::OffsetY(a),
                PropertyValue::OffsetX(b) | PropertyValue::OffsetY(b),
            ) = (from, to)
            {
                if !a.same_unit(*b) {
                    return Err(MotionError::MismatchedUnits(from.kind()));
                }
            }
        }

        Ok(Self { start, end })
    }

    /// Keyframes that end at the settled identity of `start`.
    pub fn settling(start: VisualState) -> Self {
        let end = start.settled_like();
        Self { start, end }
    }

    pub fn start(&self) -> &VisualState {
        &self.start
    }

    pub fn end(&self) -> &VisualState {
        &self.end
    }

    pub fn kinds(&self) -> Vec<PropertyKind> {
        self.start.kinds()
    }

    /// Sample at eased progress. Values outside [0, 1] extrapolate, which is
    /// how overshooting curves (back, elastic) move past the end state.
    pub fn sample(&self, progress: f32) -> VisualState {
        self.start
            .values()
            .zip(self.end.values())
            .map(|(from, to)| from.interpolate(to, progress))
            .collect()
    }

    /// Drop one property from both sides.
    pub fn remove(&mut self, kind: PropertyKind) {
        self.start.remove(kind);
        self.end.remove(kind);
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_empty()
    }

    /// Swap start and end.
    pub fn reversed(&self) -> Self {
        Self {
            start: self.end.clone(),
            end: self.start.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fade_up() -> VisualState {
        VisualState::new()
            .with(PropertyValue::OffsetY(Length::Px(60.0)))
            .with(PropertyValue::Opacity(0.0))
    }

    #[test]
    fn test_property_interpolation() {
        let from = PropertyValue::OffsetY(Length::Px(100.0));
        let to = PropertyValue::OffsetY(Length::Px(200.0));

        let result = from.interpolate(&to, 0.5);
        assert_eq!(result, PropertyValue::OffsetY(Length::Px(150.0)));
    }

    #[test]
    fn test_settling_keyframes_share_keys() {
        let keyframes = Keyframes::settling(fade_up());
        assert_eq!(keyframes.start().kinds(), keyframes.end().kinds());
        assert_eq!(
            keyframes.end().get(PropertyKind::OffsetY),
            Some(PropertyValue::OffsetY(Length::Px(0.0)))
        );
        assert_eq!(
            keyframes.end().get(PropertyKind::Opacity),
            Some(PropertyValue::Opacity(1.0))
        );
    }

    #[test]
    fn test_mismatched_keys_rejected() {
        let end = VisualState::new().with(PropertyValue::Opacity(1.0));
        let err = Keyframes::new(fade_up(), end).unwrap_err();
        assert!(matches!(err, MotionError::MismatchedKeys { .. }));
    }

    #[test]
    fn test_mismatched_units_rejected() {
        let start = VisualState::new().with(PropertyValue::OffsetY(Length::Percent(100.0)));
        let end = VisualState::new().with(PropertyValue::OffsetY(Length::Px(0.0)));
        assert_eq!(
            Keyframes::new(start, end).unwrap_err(),
            MotionError::MismatchedUnits(PropertyKind::OffsetY)
        );
    }

    #[test]
    fn test_sample_midpoint() {
        let keyframes = Keyframes::settling(fade_up());
        let mid = keyframes.sample(0.5);
        assert_eq!(
            mid.get(PropertyKind::OffsetY),
            Some(PropertyValue::OffsetY(Length::Px(30.0)))
        );
        assert_eq!(mid.get(PropertyKind::Opacity), Some(PropertyValue::Opacity(0.5)));
    }

    #[test]
    fn test_percent_offsets_stay_percent() {
        let start = VisualState::new().with(PropertyValue::OffsetY(Length::Percent(100.0)));
        let keyframes = Keyframes::settling(start);
        assert_eq!(
            keyframes.sample(1.0).get(PropertyKind::OffsetY),
            Some(PropertyValue::OffsetY(Length::Percent(0.0)))
        );
    }

    #[test]
    fn test_css_rendering() {
        let state = VisualState::new()
            .with(PropertyValue::OffsetY(Length::Px(60.0)))
            .with(PropertyValue::Scale(0.5))
            .with(PropertyValue::Opacity(0.25))
            .with(PropertyValue::WidthPercent(75.0));

        let css = state.to_css();
        assert_eq!(
            css,
            vec![
                ("transform".to_string(), "translate(0px, 60px) scale(0.5)".to_string()),
                ("opacity".to_string(), "0.25".to_string()),
                ("width".to_string(), "75%".to_string()),
            ]
        );
    }

    #[test]
    fn test_counter_display_rounds() {
        assert_eq!(PropertyValue::Counter(41.6).to_string(), "42");
    }

    #[test]
    fn test_text_reveal_counts_whole_characters() {
        assert_eq!(PropertyValue::TextReveal(2.9).revealed_chars(), Some(2));
        assert_eq!(PropertyValue::TextReveal(-1.0).revealed_chars(), Some(0));
        assert_eq!(PropertyValue::Counter(2.9).revealed_chars(), None);
        assert_eq!(PropertyValue::TextReveal(2.9).to_string(), "2");

        let typed = VisualState::new()
            .with(PropertyValue::TextReveal(3.0))
            .with(PropertyValue::Opacity(1.0));
        assert_eq!(typed.to_css(), vec![("opacity".to_string(), "1".to_string())]);
    }
}
