//! The per-frame scheduler. One instance is owned by the engine; the host
//! drives it once per rendered frame.

use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, trace};

use super::properties::PropertyKind;
use super::scroll_trigger::ToggleAction;
use super::timeline::TimelineId;
use super::tween::{Tween, TweenId};
use crate::host::{render_state, ElementHost, ElementId};

#[derive(Debug, Default)]
pub struct AnimationScheduler {
    tweens: HashMap<TweenId, Tween>,
    /// Registration order, which is also render order
    order: Vec<TweenId>,
    timelines: HashMap<TimelineId, Vec<TweenId>>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tween. Any in-flight tween on the same element gives up the
    /// properties the new one animates, and is dropped if none remain.
    pub fn register_frame_callback(&mut self, tween: Tween) -> TweenId {
        self.supersede(tween.element, &tween.keyframes().kinds(), None);

        let id = TweenId::new();
        if let Some(timeline) = tween.timeline {
            self.timelines.entry(timeline).or_default().push(id);
        }
        trace!(
            "➕ {} on {} ({:?}, delay {:?})",
            id,
            tween.element,
            tween.duration(),
            tween.delay()
        );
        self.order.push(id);
        self.tweens.insert(id, tween);
        id
    }

    /// Strip `kinds` from delayed or running tweens on `element` other than
    /// `owner`. Paused and finished tweens keep them. Emptied tweens are
    /// dropped unless persistent, since their trigger may replay them.
    fn supersede(&mut self, element: ElementId, kinds: &[PropertyKind], owner: Option<TweenId>) {
        let mut emptied = Vec::new();

        for id in &self.order {
            if Some(*id) == owner {
                continue;
            }
            let Some(existing) = self.tweens.get_mut(id) else {
                continue;
            };
            if existing.element != element || !existing.is_in_flight() {
                continue;
            }
            let remaining = kinds.iter().fold(true, |_, kind| existing.release(*kind));
            if !remaining && !existing.is_persistent() {
                emptied.push(*id);
            }
        }

        for id in emptied {
            debug!("♻️  {} superseded on {}", id, element);
            self.unregister_frame_callback(id);
        }
    }

    pub fn unregister_frame_callback(&mut self, id: TweenId) -> Option<Tween> {
        let tween = self.tweens.remove(&id)?;
        self.order.retain(|other| *other != id);
        if let Some(timeline) = tween.timeline {
            if let Some(members) = self.timelines.get_mut(&timeline) {
                members.retain(|other| *other != id);
            }
        }
        Some(tween)
    }

    /// Advance every tween by `dt` and write changed frames to `host`.
    /// Returns the number of frames rendered.
    pub fn tick<H: ElementHost + ?Sized>(&mut self, dt: Duration, host: &mut H) -> usize {
        let mut rendered = 0;
        let mut finished = Vec::new();

        for id in &self.order {
            let Some(tween) = self.tweens.get_mut(id) else {
                continue;
            };

            if !host.exists(tween.element) {
                trace!("👻 {} lost its element {}", id, tween.element);
                finished.push(*id);
                continue;
            }

            let advanced = tween.advance(dt);
            let dirty = tween.take_dirty();
            if advanced || dirty {
                render_state(host, tween.element, &tween.sample());
                rendered += 1;
            }

            if tween.is_finished() && !tween.is_persistent() {
                finished.push(*id);
            }
        }

        for id in finished {
            self.unregister_frame_callback(id);
        }
        self.dispose_finished_timelines();

        rendered
    }

    fn dispose_finished_timelines(&mut self) {
        self.timelines.retain(|id, members| {
            if members.is_empty() {
                debug!("🏁 {} complete", id);
                false
            } else {
                true
            }
        });
    }

    /// Run a toggle action on one tween. Returns false if it is gone.
    ///
    /// Actions that move or redraw the tween are a new request on its
    /// element: it reclaims its authored properties from whatever else is
    /// animating them.
    pub fn apply(&mut self, id: TweenId, action: ToggleAction) -> bool {
        let Some(tween) = self.tweens.get_mut(&id) else {
            return false;
        };
        tween.apply(action);
        if matches!(action, ToggleAction::Pause | ToggleAction::None) {
            return true;
        }

        let element = tween.element;
        let kinds = tween.reclaim();
        self.supersede(element, &kinds, Some(id));
        true
    }

    pub fn get(&self, id: TweenId) -> Option<&Tween> {
        self.tweens.get(&id)
    }

    pub fn contains(&self, id: TweenId) -> bool {
        self.tweens.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }

    /// Tweens in render order.
    pub fn iter(&self) -> impl Iterator<Item = (TweenId, &Tween)> {
        self.order
            .iter()
            .filter_map(|id| self.tweens.get(id).map(|tween| (*id, tween)))
    }

    pub fn tweens_for(&self, element: ElementId) -> Vec<TweenId> {
        self.iter()
            .filter(|(_, tween)| tween.element == element)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn timeline_active(&self, id: TimelineId) -> bool {
        self.timelines.contains_key(&id)
    }

    pub fn active_timelines(&self) -> usize {
        self.timelines.len()
    }

    fn remove_where(&mut self, predicate: impl Fn(&Tween) -> bool) -> usize {
        let doomed: Vec<TweenId> = self
            .iter()
            .filter(|(_, tween)| predicate(tween))
            .map(|(id, _)| id)
            .collect();
        let count = doomed.len();
        for id in doomed {
            self.unregister_frame_callback(id);
        }
        self.dispose_finished_timelines();
        count
    }

    pub fn remove_scope(&mut self, scope: &str) -> usize {
        self.remove_where(|tween| tween.scope.as_deref() == Some(scope))
    }

    /// Whether any registered tween on `element` owns `kind`.
    pub fn animates(&self, element: ElementId, kind: PropertyKind) -> bool {
        self.tweens
            .values()
            .any(|tween| tween.element == element && tween.keyframes().start().contains(kind))
    }

    pub fn remove_element(&mut self, element: ElementId) -> usize {
        self.remove_where(|tween| tween.element == element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::easing::EasingFunction;
    use crate::animation::properties::{Keyframes, PropertyKind, PropertyValue, VisualState};
    use crate::animation::timeline::TimelineId;
    use crate::host::{ElementSpec, HeadlessDocument};

    fn tween(element: ElementId, values: &[PropertyValue], ms: u64) -> Tween {
        let start: VisualState = values.iter().copied().collect();
        Tween::new(
            element,
            Keyframes::settling(start),
            Duration::from_millis(ms),
            EasingFunction::Linear,
        )
    }

    fn document() -> (HeadlessDocument, ElementId) {
        let mut doc = HeadlessDocument::new(800.0);
        let el = doc.append(None, ElementSpec::new("div").class("card"));
        (doc, el)
    }

    #[test]
    fn test_tick_renders_and_drops_finished() {
        let (mut doc, el) = document();
        let mut scheduler = AnimationScheduler::new();
        scheduler.register_frame_callback(tween(el, &[PropertyValue::Opacity(0.0)], 100));

        assert_eq!(scheduler.tick(Duration::from_millis(50), &mut doc), 1);
        let mid = doc.computed_value(el, PropertyKind::Opacity).unwrap();
        assert!((mid - 0.5).abs() < 1e-4);

        scheduler.tick(Duration::from_millis(50), &mut doc);
        assert_eq!(doc.computed_value(el, PropertyKind::Opacity), Some(1.0));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_new_tween_supersedes_overlapping_properties() {
        let (mut doc, el) = document();
        let mut scheduler = AnimationScheduler::new();
        let first = scheduler.register_frame_callback(tween(
            el,
            &[PropertyValue::Opacity(0.0), PropertyValue::Scale(0.5)],
            1000,
        ));
        let second = scheduler.register_frame_callback(tween(el, &[PropertyValue::Scale(2.0)], 1000));

        let remaining = scheduler.get(first).unwrap().keyframes().kinds();
        assert_eq!(remaining, vec![PropertyKind::Opacity]);

        let third = scheduler.register_frame_callback(tween(el, &[PropertyValue::Opacity(0.2)], 1000));
        assert!(!scheduler.contains(first));
        assert!(scheduler.contains(second));
        assert!(scheduler.contains(third));

        scheduler.tick(Duration::from_millis(10), &mut doc);
        assert_eq!(scheduler.len(), 2);
    }

    #[test]
    fn test_other_elements_are_untouched() {
        let (mut doc, el) = document();
        let other = doc.append(None, ElementSpec::new("div"));
        let mut scheduler = AnimationScheduler::new();
        let first = scheduler.register_frame_callback(tween(el, &[PropertyValue::Opacity(0.0)], 1000));
        scheduler.register_frame_callback(tween(other, &[PropertyValue::Opacity(0.0)], 1000));
        assert_eq!(scheduler.get(first).unwrap().keyframes().kinds().len(), 1);
        assert_eq!(scheduler.tweens_for(other).len(), 1);
    }

    #[test]
    fn test_removed_element_drops_tween() {
        let (mut doc, el) = document();
        let mut scheduler = AnimationScheduler::new();
        scheduler.register_frame_callback(tween(el, &[PropertyValue::Opacity(0.0)], 1000));

        doc.remove(el);
        assert_eq!(scheduler.tick(Duration::from_millis(16), &mut doc), 0);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_persistent_tweens_survive_completion() {
        let (mut doc, el) = document();
        let mut scheduler = AnimationScheduler::new();
        let id = scheduler.register_frame_callback(
            tween(el, &[PropertyValue::Opacity(0.0)], 100).persistent(),
        );

        scheduler.tick(Duration::from_millis(200), &mut doc);
        assert!(scheduler.contains(id));

        assert!(scheduler.apply(id, ToggleAction::Reverse));
        scheduler.tick(Duration::from_millis(200), &mut doc);
        assert_eq!(doc.computed_value(el, PropertyKind::Opacity), Some(0.0));
    }

    #[test]
    fn test_gated_tweens_keep_properties_until_replayed() {
        let (mut doc, el) = document();
        let mut scheduler = AnimationScheduler::new();
        let gated = scheduler.register_frame_callback(
            tween(el, &[PropertyValue::Opacity(0.0), PropertyValue::Scale(0.8)], 100)
                .paused()
                .persistent(),
        );

        // a hover while the gated tween waits leaves it whole
        let hover = scheduler.register_frame_callback(tween(el, &[PropertyValue::Scale(1.05)], 100));
        assert_eq!(
            scheduler.get(gated).unwrap().keyframes().kinds(),
            vec![PropertyKind::Opacity, PropertyKind::Scale]
        );

        // playing it again takes scale back from the running hover
        let hover_in_flight =
            scheduler.register_frame_callback(tween(el, &[PropertyValue::Scale(1.05)], 100));
        assert!(!scheduler.contains(hover));
        assert!(scheduler.apply(gated, ToggleAction::Play));
        assert!(!scheduler.contains(hover_in_flight));
        assert_eq!(scheduler.get(gated).unwrap().keyframes().kinds().len(), 2);

        scheduler.tick(Duration::from_millis(200), &mut doc);
        assert_eq!(doc.computed_value(el, PropertyKind::Scale), Some(1.0));

        // a hover on the finished tween runs, then a reverse reclaims scale
        scheduler.register_frame_callback(tween(el, &[PropertyValue::Scale(1.05)], 100));
        scheduler.tick(Duration::from_millis(200), &mut doc);
        assert_eq!(scheduler.get(gated).unwrap().keyframes().kinds().len(), 2);
        assert!(scheduler.apply(gated, ToggleAction::Reverse));
        scheduler.tick(Duration::from_millis(200), &mut doc);
        assert_eq!(doc.computed_value(el, PropertyKind::Scale), Some(0.8));
        assert_eq!(doc.computed_value(el, PropertyKind::Opacity), Some(0.0));
    }

    #[test]
    fn test_timeline_disposed_after_last_tween() {
        let (mut doc, el) = document();
        let other = doc.append(None, ElementSpec::new("div"));
        let timeline = TimelineId::new();
        let mut scheduler = AnimationScheduler::new();
        scheduler.register_frame_callback(
            tween(el, &[PropertyValue::Opacity(0.0)], 100).in_timeline(timeline),
        );
        scheduler.register_frame_callback(
            tween(other, &[PropertyValue::Opacity(0.0)], 100)
                .with_delay(Duration::from_millis(100))
                .in_timeline(timeline),
        );

        scheduler.tick(Duration::from_millis(100), &mut doc);
        assert!(scheduler.timeline_active(timeline));
        scheduler.tick(Duration::from_millis(100), &mut doc);
        assert!(!scheduler.timeline_active(timeline));
        assert_eq!(scheduler.active_timelines(), 0);
    }

    #[test]
    fn test_remove_scope() {
        let (_doc, el) = document();
        let mut scheduler = AnimationScheduler::new();
        scheduler.register_frame_callback(
            tween(el, &[PropertyValue::Opacity(0.0)], 100).in_scope(Some("about".to_string())),
        );
        scheduler.register_frame_callback(tween(el, &[PropertyValue::Scale(0.0)], 100));

        assert_eq!(scheduler.remove_scope("about"), 1);
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.remove_element(el), 1);
        assert!(scheduler.is_empty());
    }
}
