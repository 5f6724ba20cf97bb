//! The playback engine: turns "animate this element with that preset" into
//! tweens on the scheduler, scroll triggers on the observer, and timelines
//! for page transitions.

use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::animation::easing::{EaseMode, EasingFunction};
use crate::animation::preset::{PresetCatalog, SlideDirection};
use crate::animation::properties::{Keyframes, Length, PropertyKind, PropertyValue, VisualState};
use crate::animation::scheduler::AnimationScheduler;
use crate::animation::scroll_trigger::{ScrollTrigger, ToggleActions, TriggerBand, TriggerId};
use crate::animation::timeline::{Position, Segment, Timeline, TimelineBuilder, TimelineHandle};
use crate::animation::tween::{Tween, TweenId};
use crate::config::{seconds, Config};
use crate::error::Result;
use crate::host::{render_state, ElementHost, ElementId, Target};
use crate::host::viewport::ViewportObserver;

const POWER2_IN: EasingFunction = EasingFunction::Power {
    degree: 2,
    mode: EaseMode::In,
};

/// Tweens started by one playback call, with the delay each one waits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackHandle {
    pub tweens: Vec<TweenId>,
    pub delays: Vec<Duration>,
}

impl PlaybackHandle {
    pub fn is_noop(&self) -> bool {
        self.tweens.is_empty()
    }
}

/// Triggers and their paused tweens created by one scroll-gated call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrollRegistration {
    pub triggers: Vec<TriggerId>,
    pub tweens: Vec<TweenId>,
}

impl ScrollRegistration {
    pub fn is_noop(&self) -> bool {
        self.triggers.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoverBinding {
    pub element: ElementId,
    pub scope: Option<String>,
}

/// What a scope disposal or element removal tore down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Teardown {
    pub tweens: usize,
    pub triggers: usize,
    pub hovers: usize,
}

impl Teardown {
    pub fn total(&self) -> usize {
        self.tweens + self.triggers + self.hovers
    }
}

pub struct MotionEngine<H: ElementHost, O: ViewportObserver> {
    host: H,
    observer: O,
    config: Config,
    catalog: PresetCatalog,
    scheduler: AnimationScheduler,
    triggers: Vec<ScrollTrigger>,
    hovers: Vec<HoverBinding>,
    /// Full text of elements being typed, by element
    typed: HashMap<ElementId, String>,
    scope: Option<String>,
    band: TriggerBand,
    actions: ToggleActions,
}

impl<H: ElementHost, O: ViewportObserver> MotionEngine<H, O> {
    pub fn new(host: H, observer: O, config: Config) -> Result<Self> {
        let band = config.scroll_trigger.band()?;
        let actions = config.scroll_trigger.actions()?;
        config.counter.easing()?;
        config.progress_bar.easing()?;
        let catalog = PresetCatalog::new(&config.motion);
        info!(
            "🎬 Motion engine ready: {} presets, trigger band {} / {}, actions '{}'",
            catalog.names().count(),
            config.scroll_trigger.start,
            config.scroll_trigger.end,
            actions
        );

        Ok(Self {
            host,
            observer,
            config,
            catalog,
            scheduler: AnimationScheduler::new(),
            triggers: Vec::new(),
            hovers: Vec::new(),
            typed: HashMap::new(),
            scope: None,
            band,
            actions,
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Borrow the host and observer together, e.g. to feed layout from one
    /// into the other.
    pub fn split_mut(&mut self) -> (&mut H, &mut O) {
        (&mut self.host, &mut self.observer)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &PresetCatalog {
        &self.catalog
    }

    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    pub fn triggers(&self) -> &[ScrollTrigger] {
        &self.triggers
    }

    pub fn hover_bindings(&self) -> &[HoverBinding] {
        &self.hovers
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.config.motion.reduced_motion = reduced;
    }

    fn reduced_motion(&self) -> bool {
        self.config.motion.reduced_motion
    }

    /// Run `f` with every registration it makes tagged with `scope`, so that
    /// [`dispose_scope`](Self::dispose_scope) can tear them down together.
    pub fn scoped<R>(&mut self, scope: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.scope.replace(scope.to_string());
        let result = f(self);
        self.scope = previous;
        result
    }

    /// Animate every element `target` resolves to with `preset`, starting
    /// after `delay` seconds.
    pub fn play(&mut self, target: impl Into<Target>, preset: &str, delay: f64) -> Result<PlaybackHandle> {
        let elements = self.host.resolve(&target.into())?;
        self.play_elements(elements, preset, seconds(delay), Duration::ZERO)
    }

    /// Like [`play`](Self::play), with the k-th element waiting
    /// `base_delay + k * stagger` seconds.
    pub fn play_staggered(
        &mut self,
        targets: impl Into<Target>,
        preset: &str,
        base_delay: f64,
        stagger: f64,
    ) -> Result<PlaybackHandle> {
        let elements = self.host.resolve(&targets.into())?;
        self.play_elements(elements, preset, seconds(base_delay), seconds(stagger))
    }

    pub fn stagger_fade_in_up(&mut self, targets: impl Into<Target>, delay: f64) -> Result<PlaybackHandle> {
        let stagger = self.config.motion.stagger;
        self.play_staggered(targets, "fadeInUp", delay, stagger)
    }

    pub fn slide_and_fade(
        &mut self,
        target: impl Into<Target>,
        direction: SlideDirection,
        delay: f64,
    ) -> Result<PlaybackHandle> {
        self.play(target, direction.preset_name(), delay)
    }

    /// Fade every matching element out from whatever opacity it shows now,
    /// over the default duration and ease, after `delay` seconds.
    pub fn fade_out(&mut self, target: impl Into<Target>, delay: f64) -> Result<PlaybackHandle> {
        let elements = self.host.resolve(&target.into())?;
        let to = VisualState::new().with(PropertyValue::Opacity(0.0));

        if self.reduced_motion() {
            for element in &elements {
                render_state(&mut self.host, *element, &to);
            }
            return Ok(PlaybackHandle::default());
        }

        let duration = self.config.motion.duration();
        let easing = self.config.motion.ease;
        let delay = seconds(delay);
        let mut handle = PlaybackHandle::default();
        for element in elements {
            let keyframes = self.keyframes_from_current(element, &to)?;
            let tween = Tween::new(element, keyframes, duration, easing)
                .with_delay(delay)
                .in_scope(self.scope.clone());
            handle.tweens.push(self.scheduler.register_frame_callback(tween));
            handle.delays.push(delay);
        }

        if !handle.is_noop() {
            debug!("🌫️  Fading out {} elements ({:?}, {})", handle.tweens.len(), duration, easing);
        }
        Ok(handle)
    }

    /// Clear every matching element and type `text` into it one character
    /// every `speed` seconds (the configured typewriter speed if `None`).
    pub fn type_writer(&mut self, target: impl Into<Target>, text: &str, speed: Option<f64>) -> Result<PlaybackHandle> {
        let elements = self.host.resolve(&target.into())?;
        let length = text.chars().count();

        if self.reduced_motion() || length == 0 {
            for element in &elements {
                self.host.set_text(*element, text);
            }
            return Ok(PlaybackHandle::default());
        }

        let per_char = seconds(speed.unwrap_or(self.config.motion.typewriter_speed));
        let duration = u32::try_from(length)
            .ok()
            .and_then(|count| per_char.checked_mul(count))
            .unwrap_or(Duration::MAX);
        let hidden = VisualState::new().with(PropertyValue::TextReveal(0.0));
        let keyframes = Keyframes::new(
            hidden.clone(),
            VisualState::new().with(PropertyValue::TextReveal(length as f32)),
        )?;

        let mut handle = PlaybackHandle::default();
        for element in elements {
            self.host.set_text(element, "");
            render_state(&mut self.host, element, &hidden);
            self.typed.insert(element, text.to_string());

            let tween = Tween::new(element, keyframes.clone(), duration, EasingFunction::Linear)
                .in_scope(self.scope.clone());
            handle.tweens.push(self.scheduler.register_frame_callback(tween));
            handle.delays.push(Duration::ZERO);
        }

        if !handle.is_noop() {
            debug!("⌨️  Typing {} characters into {} elements", length, handle.tweens.len());
        }
        Ok(handle)
    }

    fn play_elements(
        &mut self,
        elements: Vec<ElementId>,
        name: &str,
        base: Duration,
        stagger: Duration,
    ) -> Result<PlaybackHandle> {
        let preset = match self.catalog.lookup(name) {
            Ok(preset) => preset.clone(),
            Err(err) => {
                self.settle(&elements);
                return Err(err);
            }
        };

        if elements.is_empty() {
            debug!("🎬 '{}' matched no elements, skipping", name);
            return Ok(PlaybackHandle::default());
        }

        if self.reduced_motion() {
            for element in &elements {
                render_state(&mut self.host, *element, preset.end_state());
            }
            debug!("🎬 '{}' settled {} elements (reduced motion)", name, elements.len());
            return Ok(PlaybackHandle::default());
        }

        let mut handle = PlaybackHandle::default();
        for (k, element) in elements.into_iter().enumerate() {
            let delay = stagger
                .checked_mul(k as u32)
                .map_or(Duration::MAX, |offset| base.saturating_add(offset));
            render_state(&mut self.host, element, preset.start_state());

            let tween = Tween::new(element, preset.keyframes.clone(), preset.duration, preset.easing)
                .with_delay(delay)
                .in_scope(self.scope.clone());
            handle.tweens.push(self.scheduler.register_frame_callback(tween));
            handle.delays.push(delay);
        }

        debug!(
            "🎬 '{}' on {} elements ({:?}, {})",
            name,
            handle.tweens.len(),
            preset.duration,
            preset.easing
        );
        Ok(handle)
    }

    /// Stop a playback call's tweens where they are. Returns how many were
    /// still running.
    pub fn cancel(&mut self, handle: &PlaybackHandle) -> usize {
        let cancelled = handle
            .tweens
            .iter()
            .filter_map(|id| self.scheduler.unregister_frame_callback(*id))
            .count();
        if cancelled > 0 {
            debug!("⏹️  Cancelled {} tweens", cancelled);
        }
        cancelled
    }

    /// Show elements at rest when playback could not be set up, so nothing
    /// authored as hidden stays hidden.
    fn settle(&mut self, elements: &[ElementId]) {
        let identity: VisualState = [
            PropertyValue::settled(PropertyKind::OffsetX),
            PropertyValue::settled(PropertyKind::OffsetY),
            PropertyValue::settled(PropertyKind::Opacity),
            PropertyValue::settled(PropertyKind::Scale),
            PropertyValue::settled(PropertyKind::RotationZ),
            PropertyValue::settled(PropertyKind::RotationY),
        ]
        .into_iter()
        .collect();

        for element in elements {
            render_state(&mut self.host, *element, &identity);
        }
    }

    /// Gate `preset` on each element's visibility: play when it scrolls into
    /// the trigger band, react to the configured toggle actions after that.
    pub fn create_scroll_animation(&mut self, target: impl Into<Target>, preset: &str) -> Result<ScrollRegistration> {
        let elements = self.host.resolve(&target.into())?;
        let preset = match self.catalog.lookup(preset) {
            Ok(preset) => preset.clone(),
            Err(err) => {
                self.settle(&elements);
                return Err(err);
            }
        };

        let mut registration = ScrollRegistration::default();
        for element in elements {
            let gated = self.gate(
                element,
                preset.keyframes.clone(),
                preset.duration,
                preset.easing,
                self.band,
                true,
            );
            if let Some((trigger, tween)) = gated {
                registration.triggers.push(trigger);
                registration.tweens.push(tween);
            }
        }

        if !registration.is_noop() {
            debug!(
                "📜 '{}' gated on {} elements",
                preset.name,
                registration.triggers.len()
            );
        }
        Ok(registration)
    }

    /// Count the first matching element's text up from 0 to `end_value`
    /// once it scrolls into view. `duration` defaults to the configured
    /// counter duration.
    pub fn animate_counter(
        &mut self,
        target: impl Into<Target>,
        end_value: f32,
        duration: Option<f64>,
    ) -> Result<ScrollRegistration> {
        let Some(element) = self.host.resolve(&target.into())?.into_iter().next() else {
            return Ok(ScrollRegistration::default());
        };

        let settings = &self.config.counter;
        let band = TriggerBand::parse(&settings.start, None)?;
        let duration = seconds(duration.unwrap_or(settings.duration));
        let easing = settings.easing()?;
        let keyframes = Keyframes::new(
            VisualState::new().with(PropertyValue::Counter(0.0)),
            VisualState::new().with(PropertyValue::Counter(end_value)),
        )?;

        let mut registration = ScrollRegistration::default();
        if let Some((trigger, tween)) = self.gate(element, keyframes, duration, easing, band, false) {
            debug!("🔢 Counter on {} to {}", element, end_value);
            registration.triggers.push(trigger);
            registration.tweens.push(tween);
        }
        Ok(registration)
    }

    /// Grow each matching bar's width from 0% to `percentage` once it
    /// scrolls into view.
    pub fn animate_progress_bar(&mut self, target: impl Into<Target>, percentage: f32) -> Result<ScrollRegistration> {
        let elements = self.host.resolve(&target.into())?;

        let settings = &self.config.progress_bar;
        let band = TriggerBand::parse(&settings.start, None)?;
        let duration = seconds(settings.duration);
        let easing = settings.easing()?;
        let keyframes = Keyframes::new(
            VisualState::new().with(PropertyValue::WidthPercent(0.0)),
            VisualState::new().with(PropertyValue::WidthPercent(percentage)),
        )?;

        let mut registration = ScrollRegistration::default();
        for element in elements {
            if let Some((trigger, tween)) = self.gate(element, keyframes.clone(), duration, easing, band, true) {
                registration.triggers.push(trigger);
                registration.tweens.push(tween);
            }
        }
        Ok(registration)
    }

    /// Register a paused, persistent tween on `element` and a trigger that
    /// drives it. Returns `None` when nothing was registered, in which case
    /// the element has been placed at its end state.
    fn gate(
        &mut self,
        element: ElementId,
        keyframes: Keyframes,
        duration: Duration,
        easing: EasingFunction,
        band: TriggerBand,
        render_start: bool,
    ) -> Option<(TriggerId, TweenId)> {
        if self.reduced_motion() {
            render_state(&mut self.host, element, keyframes.end());
            return None;
        }

        let events = match self.observer.watch(element, &band) {
            Ok(events) => events,
            Err(err) => {
                warn!("⚠️  Cannot watch {}, showing it at rest: {}", element, err);
                render_state(&mut self.host, element, keyframes.end());
                return None;
            }
        };

        if render_start {
            render_state(&mut self.host, element, keyframes.start());
        }

        let tween = Tween::new(element, keyframes, duration, easing)
            .paused()
            .persistent()
            .in_scope(self.scope.clone());
        let tween_id = self.scheduler.register_frame_callback(tween);

        let mut trigger = ScrollTrigger::new(element, band, self.actions, vec![tween_id], events);
        trigger.scope = self.scope.clone();
        let trigger_id = trigger.id;
        self.triggers.push(trigger);

        Some((trigger_id, tween_id))
    }

    /// Scale the first matching element up while the pointer is over it.
    pub fn bind_hover(&mut self, target: impl Into<Target>) -> Result<Option<HoverBinding>> {
        let Some(element) = self.host.resolve(&target.into())?.into_iter().next() else {
            return Ok(None);
        };

        let binding = HoverBinding {
            element,
            scope: self.scope.clone(),
        };
        self.hovers.retain(|b| b.element != element);
        self.hovers.push(binding.clone());
        debug!("🖱️  Hover bound on {}", element);
        Ok(Some(binding))
    }

    pub fn pointer_enter(&mut self, element: ElementId) -> Option<TweenId> {
        let scale = self.config.hover.scale;
        self.hover_to(element, scale)
    }

    pub fn pointer_leave(&mut self, element: ElementId) -> Option<TweenId> {
        self.hover_to(element, 1.0)
    }

    fn hover_to(&mut self, element: ElementId, scale: f32) -> Option<TweenId> {
        let binding = self.hovers.iter().find(|b| b.element == element)?.clone();
        if !self.host.exists(element) {
            return None;
        }

        let to = VisualState::new().with(PropertyValue::Scale(scale));
        if self.reduced_motion() {
            render_state(&mut self.host, element, &to);
            return None;
        }

        let keyframes = match self.keyframes_from_current(element, &to) {
            Ok(keyframes) => keyframes,
            Err(err) => {
                warn!("⚠️  Cannot hover {}: {}", element, err);
                return None;
            }
        };
        let settings = &self.config.hover;
        let tween = Tween::new(element, keyframes, seconds(settings.duration), settings.ease)
            .in_scope(binding.scope);
        Some(self.scheduler.register_frame_callback(tween))
    }

    /// Keyframes from whatever `element` shows now to `to`. Properties never
    /// written before start from rest.
    fn keyframes_from_current(&self, element: ElementId, to: &VisualState) -> Result<Keyframes> {
        let rest = to.settled_like();
        let from: VisualState = rest
            .values()
            .map(|value| self.host.computed(element, value.kind()).unwrap_or(*value))
            .collect();

        Keyframes::new(from, to.clone()).or_else(|_| Keyframes::new(rest, to.clone()))
    }

    /// Slide the transition panel in, then stagger the page content in
    /// while the panel is still moving.
    pub fn page_transition_in(&mut self) -> Result<TimelineHandle> {
        let settings = self.config.page_transition.clone();
        let panels = self.host.query_selector_all(&settings.panel_selector)?;
        let children = self.host.query_selector_all(&settings.content_selector)?;

        let timeline = TimelineBuilder::new()
            .segment(Segment::from_to(
                panels,
                VisualState::new().with(PropertyValue::OffsetY(Length::Percent(100.0))),
                VisualState::new().with(PropertyValue::OffsetY(Length::Percent(0.0))),
                seconds(settings.panel_duration),
                EasingFunction::POWER2_OUT,
            ))
            .segment(
                Segment::from_to(
                    children,
                    VisualState::new()
                        .with(PropertyValue::OffsetY(Length::Px(settings.content_offset)))
                        .with(PropertyValue::Opacity(0.0)),
                    VisualState::new()
                        .with(PropertyValue::OffsetY(Length::Px(0.0)))
                        .with(PropertyValue::Opacity(1.0)),
                    seconds(settings.content_in_duration),
                    EasingFunction::POWER2_OUT,
                )
                .stagger(seconds(settings.content_in_stagger))
                .at(Position::Overlap(seconds(settings.overlap_in))),
            )
            .build();

        self.play_timeline(timeline)
    }

    /// Stagger the page content out, then slide the panel away.
    pub fn page_transition_out(&mut self) -> Result<TimelineHandle> {
        let settings = self.config.page_transition.clone();
        let panels = self.host.query_selector_all(&settings.panel_selector)?;
        let children = self.host.query_selector_all(&settings.content_selector)?;

        let timeline = TimelineBuilder::new()
            .segment(
                Segment::to(
                    children,
                    VisualState::new()
                        .with(PropertyValue::OffsetY(Length::Px(-settings.content_offset)))
                        .with(PropertyValue::Opacity(0.0)),
                    seconds(settings.content_out_duration),
                    POWER2_IN,
                )
                .stagger(seconds(settings.content_out_stagger)),
            )
            .segment(
                Segment::to(
                    panels,
                    VisualState::new().with(PropertyValue::OffsetY(Length::Percent(-100.0))),
                    seconds(settings.panel_duration),
                    POWER2_IN,
                )
                .at(Position::Overlap(seconds(settings.overlap_out))),
            )
            .build();

        self.play_timeline(timeline)
    }

    /// Schedule every segment of `timeline`. The scheduler drops the
    /// timeline once its last tween finishes.
    pub fn play_timeline(&mut self, timeline: Timeline) -> Result<TimelineHandle> {
        let mut handle = TimelineHandle {
            id: timeline.id,
            segment_starts: timeline.segment_starts().to_vec(),
            total_duration: timeline.total_duration(),
            tweens: Vec::new(),
        };

        if timeline.is_empty() {
            debug!("🎞️  {} has no elements, skipping", timeline.id);
            return Ok(handle);
        }

        if self.reduced_motion() {
            for segment in timeline.segments() {
                for element in &segment.targets {
                    render_state(&mut self.host, *element, &segment.to);
                }
            }
            return Ok(handle);
        }

        let mut planned = Vec::new();
        for (index, segment) in timeline.segments().iter().enumerate() {
            let start = timeline.segment_start(index).unwrap_or(Duration::ZERO);
            for (k, element) in segment.targets.iter().enumerate() {
                let keyframes = match &segment.from {
                    Some(from) => Keyframes::new(from.clone(), segment.to.clone())?,
                    None => self.keyframes_from_current(*element, &segment.to)?,
                };
                let tween = Tween::new(*element, keyframes, segment.duration, segment.easing)
                    .with_delay(start.saturating_add(segment.offset_of(k)))
                    .in_timeline(timeline.id)
                    .in_scope(self.scope.clone());
                planned.push((segment.from.is_some(), tween));
            }
        }

        for (immediate, tween) in planned {
            if immediate {
                render_state(&mut self.host, tween.element, tween.keyframes().start());
            }
            handle.tweens.push(self.scheduler.register_frame_callback(tween));
        }

        debug!(
            "🎞️  {} scheduled: {} tweens over {:?}",
            timeline.id,
            handle.tweens.len(),
            handle.total_duration
        );
        Ok(handle)
    }

    /// Tear down every tween, trigger and hover binding registered under
    /// `scope`.
    pub fn dispose_scope(&mut self, scope: &str) -> Teardown {
        let in_scope = |s: &Option<String>| s.as_deref() == Some(scope);

        let tweens = self.scheduler.remove_scope(scope);
        let before = self.triggers.len();
        self.triggers.retain(|t| !in_scope(&t.scope));
        let triggers = before - self.triggers.len();
        let before = self.hovers.len();
        self.hovers.retain(|h| !in_scope(&h.scope));
        let hovers = before - self.hovers.len();

        let teardown = Teardown {
            tweens,
            triggers,
            hovers,
        };
        info!(
            "🧹 Disposed scope '{}': {} tweens, {} triggers, {} hover bindings",
            scope, teardown.tweens, teardown.triggers, teardown.hovers
        );
        teardown
    }

    /// Forget everything attached to an element that has been unmounted.
    pub fn element_removed(&mut self, element: ElementId) -> Teardown {
        self.typed.remove(&element);
        let tweens = self.scheduler.remove_element(element);
        let before = self.triggers.len();
        self.triggers.retain(|t| t.element != element);
        let triggers = before - self.triggers.len();
        let before = self.hovers.len();
        self.hovers.retain(|h| h.element != element);
        let hovers = before - self.hovers.len();

        let teardown = Teardown {
            tweens,
            triggers,
            hovers,
        };
        if teardown.total() > 0 {
            debug!("🧹 {} removed: {:?}", element, teardown);
        }
        teardown
    }

    /// Advance one frame: move every tween by `dt`, then run the actions of
    /// triggers that fired during the frame. A tween started by a trigger
    /// shows its first frame now and starts moving on the next tick.
    /// Returns the number of frames written to the host.
    pub fn tick(&mut self, dt: Duration) -> usize {
        let mut rendered = self.scheduler.tick(dt, &mut self.host);

        for trigger in &mut self.triggers {
            for action in trigger.poll() {
                trace!("🎯 {} -> {}", trigger.id, action);
                for id in &trigger.tweens {
                    if !self.scheduler.apply(*id, action) {
                        continue;
                    }
                    if let Some(tween) = self.scheduler.get(*id) {
                        render_state(&mut self.host, tween.element, &tween.sample());
                        rendered += 1;
                    }
                }
            }
        }

        self.show_typed_text();

        let host = &self.host;
        let scheduler = &self.scheduler;
        self.triggers.retain(|trigger| {
            let live = host.exists(trigger.element)
                && trigger.tweens.iter().any(|id| scheduler.contains(*id));
            if !live {
                debug!("🔌 Releasing {} on {}", trigger.id, trigger.element);
            }
            live
        });

        rendered
    }

    /// Turn each typed element's revealed character count into its text.
    /// Elements drop out once nothing is typing into them.
    fn show_typed_text(&mut self) {
        for (element, text) in &self.typed {
            let Some(shown) = self
                .host
                .computed(*element, PropertyKind::TextReveal)
                .and_then(|value| value.revealed_chars())
            else {
                continue;
            };
            let visible: String = text.chars().take(shown).collect();
            if self.host.text(*element).as_deref() != Some(visible.as_str()) {
                self.host.set_text(*element, &visible);
            }
        }

        let host = &self.host;
        let scheduler = &self.scheduler;
        self.typed.retain(|element, _| {
            host.exists(*element) && scheduler.animates(*element, PropertyKind::TextReveal)
        });
    }
}
