use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use super::easing::EasingFunction;
use super::properties::VisualState;
use super::tween::TweenId;
use crate::host::ElementId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimelineId(Uuid);

impl TimelineId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TimelineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TimelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timeline-{}", &self.0.simple().to_string()[..8])
    }
}

/// Where a segment is placed relative to what is already on the timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Position {
    /// Time zero
    Start,
    /// At the current end of the timeline (`">"`)
    AfterPrevious,
    /// Together with the previous segment (`"<"`)
    WithPrevious,
    /// Before the current end (`"-=d"`)
    Overlap(Duration),
    /// After the current end (`"+=d"`)
    Gap(Duration),
    /// Absolute time
    At(Duration),
}

/// One step of a timeline: the same motion applied to a list of elements,
/// each successive element offset by `stagger`.
#[derive(Debug, Clone)]
pub struct Segment {
    pub targets: Vec<ElementId>,
    /// `None` means "from whatever the element currently shows".
    pub from: Option<VisualState>,
    pub to: VisualState,
    pub duration: Duration,
    pub easing: EasingFunction,
    pub stagger: Duration,
    pub position: Position,
}

impl Segment {
    /// A segment that animates from an explicit start state.
    pub fn from_to(
        targets: Vec<ElementId>,
        from: VisualState,
        to: VisualState,
        duration: Duration,
        easing: EasingFunction,
    ) -> Self {
        Self {
            targets,
            from: Some(from),
            to,
            duration,
            easing,
            stagger: Duration::ZERO,
            position: Position::AfterPrevious,
        }
    }

    /// A segment that animates from the current state.
    pub fn to(
        targets: Vec<ElementId>,
        to: VisualState,
        duration: Duration,
        easing: EasingFunction,
    ) -> Self {
        Self {
            targets,
            from: None,
            to,
            duration,
            easing,
            stagger: Duration::ZERO,
            position: Position::AfterPrevious,
        }
    }

    pub fn stagger(mut self, stagger: Duration) -> Self {
        self.stagger = stagger;
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Time from the first element starting to the last one finishing.
    pub fn span(&self) -> Duration {
        let followers = self.targets.len().saturating_sub(1);
        self.duration.saturating_add(self.offset_of(followers))
    }

    /// Start offset of the element at `index` within this segment.
    pub fn offset_of(&self, index: usize) -> Duration {
        u32::try_from(index)
            .ok()
            .and_then(|index| self.stagger.checked_mul(index))
            .unwrap_or(Duration::MAX)
    }
}

/// Ordered segments with resolved start times.
#[derive(Debug, Clone)]
pub struct Timeline {
    pub id: TimelineId,
    segments: Vec<Segment>,
    starts: Vec<Duration>,
}

impl Timeline {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Absolute start time of segment `index`.
    pub fn segment_start(&self, index: usize) -> Option<Duration> {
        self.starts.get(index).copied()
    }

    pub fn segment_end(&self, index: usize) -> Option<Duration> {
        let start = self.segment_start(index)?;
        Some(start.saturating_add(self.segments[index].span()))
    }

    pub fn segment_starts(&self) -> &[Duration] {
        &self.starts
    }

    pub fn total_duration(&self) -> Duration {
        (0..self.segments.len())
            .filter_map(|i| self.segment_end(i))
            .max()
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| s.targets.is_empty())
    }
}

/// Timeline builder for fluent API
#[derive(Debug, Default)]
pub struct TimelineBuilder {
    segments: Vec<Segment>,
    starts: Vec<Duration>,
    end: Duration,
}

impl TimelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segment(mut self, segment: Segment) -> Self {
        let previous_start = self.starts.last().copied().unwrap_or(Duration::ZERO);
        let start = match segment.position {
            Position::Start => Duration::ZERO,
            Position::AfterPrevious => self.end,
            Position::WithPrevious => previous_start,
            Position::Overlap(d) => self.end.saturating_sub(d),
            Position::Gap(d) => self.end.saturating_add(d),
            Position::At(t) => t,
        };

        self.end = self.end.max(start.saturating_add(segment.span()));
        self.starts.push(start);
        self.segments.push(segment);
        self
    }

    pub fn build(self) -> Timeline {
        Timeline {
            id: TimelineId::new(),
            segments: self.segments,
            starts: self.starts,
        }
    }
}

/// What a caller gets back from starting a timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineHandle {
    pub id: TimelineId,
    pub segment_starts: Vec<Duration>,
    pub total_duration: Duration,
    pub tweens: Vec<TweenId>,
}

impl TimelineHandle {
    pub fn is_noop(&self) -> bool {
        self.tweens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::properties::PropertyValue;

    fn ids(n: u64) -> Vec<ElementId> {
        (0..n).map(ElementId).collect()
    }

    fn fade() -> VisualState {
        VisualState::new().with(PropertyValue::Opacity(1.0))
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_segment_span_includes_stagger() {
        let segment = Segment::to(ids(4), fade(), ms(600), EasingFunction::Linear).stagger(ms(100));
        assert_eq!(segment.span(), ms(900));
        assert_eq!(segment.offset_of(2), ms(200));

        let single = Segment::to(ids(1), fade(), ms(600), EasingFunction::Linear).stagger(ms(100));
        assert_eq!(single.span(), ms(600));
    }

    #[test]
    fn test_huge_stagger_saturates() {
        let segment = Segment::to(ids(3), fade(), ms(600), EasingFunction::Linear).stagger(Duration::MAX);
        assert_eq!(segment.offset_of(1), Duration::MAX);
        assert_eq!(segment.span(), Duration::MAX);

        let timeline = TimelineBuilder::new()
            .segment(segment)
            .segment(
                Segment::to(ids(1), fade(), ms(500), EasingFunction::Linear).at(Position::Gap(ms(100))),
            )
            .build();
        assert_eq!(timeline.segment_start(1), Some(Duration::MAX));
        assert_eq!(timeline.total_duration(), Duration::MAX);
    }

    #[test]
    fn test_overlap_starts_before_previous_end() {
        let timeline = TimelineBuilder::new()
            .segment(Segment::to(ids(1), fade(), ms(500), EasingFunction::Linear))
            .segment(
                Segment::to(ids(3), fade(), ms(600), EasingFunction::Linear)
                    .stagger(ms(100))
                    .at(Position::Overlap(ms(300))),
            )
            .build();

        assert_eq!(timeline.segment_start(1), Some(ms(200)));
        assert!(timeline.segment_start(1) < timeline.segment_end(0));
        // 500 + (600 + 2 * 100) - 300
        assert_eq!(timeline.total_duration(), ms(1000));
    }

    #[test]
    fn test_positions() {
        let timeline = TimelineBuilder::new()
            .segment(Segment::to(ids(1), fade(), ms(500), EasingFunction::Linear))
            .segment(Segment::to(ids(1), fade(), ms(200), EasingFunction::Linear).at(Position::WithPrevious))
            .segment(Segment::to(ids(1), fade(), ms(100), EasingFunction::Linear).at(Position::Gap(ms(50))))
            .segment(Segment::to(ids(1), fade(), ms(100), EasingFunction::Linear).at(Position::At(ms(10))))
            .segment(Segment::to(ids(1), fade(), ms(100), EasingFunction::Linear).at(Position::Overlap(ms(5000))))
            .build();

        assert_eq!(
            timeline.segment_starts(),
            &[ms(0), ms(0), ms(550), ms(10), ms(0)]
        );
        assert_eq!(timeline.total_duration(), ms(650));
    }

    #[test]
    fn test_empty_timeline() {
        let timeline = TimelineBuilder::new().build();
        assert_eq!(timeline.total_duration(), Duration::ZERO);
        assert!(timeline.is_empty());
    }
}
