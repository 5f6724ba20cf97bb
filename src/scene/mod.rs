//! Scene files: a small page, a list of timed engine calls and a scroll
//! script, replayed frame by frame against a [`HeadlessDocument`].

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::{seconds, Config};
use crate::engine::MotionEngine;
use crate::host::{ElementHost, ElementId, ElementSpec, HeadlessDocument, LayoutObserver, Target};

#[derive(Debug, Clone, Deserialize)]
pub struct Scene {
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f32,

    /// Seconds of simulated time
    #[serde(default = "default_scene_duration")]
    pub duration: f64,

    #[serde(default)]
    pub elements: Vec<SceneElement>,

    #[serde(default)]
    pub steps: Vec<SceneStep>,

    #[serde(default)]
    pub scroll: Vec<ScrollKey>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneElement {
    pub name: String,

    #[serde(default = "default_tag")]
    pub tag: String,

    #[serde(default)]
    pub classes: Vec<String>,

    pub id: Option<String>,

    /// Name of an element declared earlier
    pub parent: Option<String>,

    #[serde(default)]
    pub top: f32,

    #[serde(default = "default_element_height")]
    pub height: f32,

    pub text: Option<String>,

    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneStep {
    /// Seconds from scene start
    #[serde(default)]
    pub at: f64,

    /// Registrations made by this step belong to this scope
    pub scope: Option<String>,

    #[serde(flatten)]
    pub call: SceneCall,
}

/// One engine call. Targets are selectors resolved when the step runs.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SceneCall {
    Play {
        target: String,
        preset: String,
        #[serde(default)]
        delay: f64,
    },
    Stagger {
        target: String,
        #[serde(default = "default_stagger_preset")]
        preset: String,
        #[serde(default)]
        delay: f64,
        stagger: Option<f64>,
    },
    Scroll {
        target: String,
        #[serde(default = "default_stagger_preset")]
        preset: String,
    },
    FadeOut {
        target: String,
        #[serde(default)]
        delay: f64,
    },
    TypeWriter {
        target: String,
        text: String,
        speed: Option<f64>,
    },
    /// Without `value` the element's current text is the end value
    Counter {
        target: String,
        value: Option<f32>,
        duration: Option<f64>,
    },
    /// Without `percentage` each bar's `data-percentage` attribute is used
    ProgressBar {
        target: String,
        percentage: Option<f32>,
    },
    PageIn,
    PageOut,
    Hover {
        target: String,
    },
    PointerEnter {
        target: String,
    },
    PointerLeave {
        target: String,
    },
    Remove {
        target: String,
    },
    DisposeScope {
        scope: String,
    },
}

/// Scroll position at a point in time; positions in between are linear.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScrollKey {
    pub at: f64,
    pub y: f32,
}

impl Scene {
    pub async fn load(path: &str) -> Result<Self> {
        let expanded_path = shellexpand::tilde(path);
        info!("📄 Reading scene from: {}", expanded_path);

        let content = fs::read_to_string(expanded_path.as_ref())
            .await
            .with_context(|| format!("Failed to read scene file '{}'", expanded_path))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut scene: Scene = toml::from_str(content).context("Failed to parse scene")?;
        scene.steps.sort_by(|a, b| a.at.total_cmp(&b.at));
        scene.scroll.sort_by(|a, b| a.at.total_cmp(&b.at));
        Ok(scene)
    }

    /// Mount the declared elements. Returns the document and the handle of
    /// every element by name.
    pub fn build_document(&self) -> Result<(HeadlessDocument, HashMap<String, ElementId>)> {
        let mut doc = HeadlessDocument::new(self.viewport_height);
        let mut names = HashMap::new();

        for element in &self.elements {
            if names.contains_key(&element.name) {
                bail!("Duplicate element name '{}'", element.name);
            }
            let parent = match &element.parent {
                Some(parent) => Some(*names.get(parent).with_context(|| {
                    format!(
                        "Element '{}' names unknown parent '{}'",
                        element.name, parent
                    )
                })?),
                None => None,
            };

            let mut spec = ElementSpec::new(&element.tag).rect(element.top, element.height);
            spec.classes = element.classes.clone();
            spec.id = element.id.clone();
            spec.text = element.text.clone();
            spec.attrs = element.attrs.clone();

            let id = doc.append(parent, spec);
            names.insert(element.name.clone(), id);
        }

        Ok((doc, names))
    }

    /// Scroll offset at `t` seconds.
    pub fn scroll_at(&self, t: f64) -> f32 {
        let Some(first) = self.scroll.first() else {
            return 0.0;
        };
        if t <= first.at {
            return first.y;
        }

        for pair in self.scroll.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.at {
                let span = b.at - a.at;
                if span <= 0.0 {
                    return b.y;
                }
                let f = ((t - a.at) / span) as f32;
                return a.y + (b.y - a.y) * f;
            }
        }

        self.scroll.last().map(|k| k.y).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone)]
pub struct ElementReport {
    pub name: String,
    pub label: String,
    pub text: Option<String>,
    pub css: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct SceneReport {
    pub frames: usize,
    pub rendered: usize,
    pub viewport_events: usize,
    pub active_tweens: usize,
    pub active_triggers: usize,
    pub failed_steps: Vec<String>,
    pub elements: Vec<ElementReport>,
}

pub struct SceneRunner {
    engine: MotionEngine<HeadlessDocument, LayoutObserver>,
    scene: Scene,
    names: HashMap<String, ElementId>,
    frame: Duration,
    realtime: bool,
}

impl SceneRunner {
    pub fn new(scene: Scene, config: Config) -> Result<Self> {
        let (doc, names) = scene.build_document()?;
        let frame = config.motion.frame_interval();
        let engine = MotionEngine::new(doc, LayoutObserver::new(), config)?;
        Ok(Self {
            engine,
            scene,
            names,
            frame,
            realtime: false,
        })
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.frame = Duration::from_secs(1) / fps.max(1);
        self
    }

    /// Pace frames with a wall-clock interval instead of stepping as fast
    /// as possible.
    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    pub fn engine(&self) -> &MotionEngine<HeadlessDocument, LayoutObserver> {
        &self.engine
    }

    pub async fn run(mut self) -> Result<SceneReport> {
        let total = seconds(self.scene.duration);
        let steps = std::mem::take(&mut self.scene.steps);
        let mut pending = steps.into_iter().peekable();
        let mut report = SceneReport::default();
        let mut interval = tokio::time::interval(self.frame);

        info!(
            "▶️  Previewing {} elements, {} steps over {:?} at {:?}/frame",
            self.names.len(),
            pending.len(),
            total,
            self.frame
        );

        let mut now = Duration::ZERO;
        loop {
            let t = now.as_secs_f64();

            let scroll_y = self.scene.scroll_at(t);
            let viewport_height = self.scene.viewport_height;
            let (doc, observer) = self.engine.split_mut();
            report.viewport_events += observer.update(scroll_y, viewport_height, |el| doc.rect(el));

            while let Some(step) = pending.next_if(|s| seconds(s.at) <= now) {
                if let Err(err) = self.run_step(&step) {
                    warn!("⚠️  Step '{:?}' at {}s failed: {:#}", step.call, step.at, err);
                    report.failed_steps.push(format!("{}s: {:#}", step.at, err));
                }
            }

            if self.realtime {
                interval.tick().await;
            }
            report.rendered += self.engine.tick(self.frame);
            report.frames += 1;

            if now >= total {
                break;
            }
            now += self.frame;
        }

        report.active_tweens = self.engine.scheduler().len();
        report.active_triggers = self.engine.triggers().len();
        report.elements = self.element_reports();
        info!(
            "✅ Preview finished: {} frames, {} renders, {} viewport events",
            report.frames, report.rendered, report.viewport_events
        );
        Ok(report)
    }

    fn element_reports(&self) -> Vec<ElementReport> {
        let doc = self.engine.host();
        let mut by_id: HashMap<ElementId, &str> = HashMap::new();
        for (name, id) in &self.names {
            by_id.insert(*id, name);
        }

        doc.elements()
            .into_iter()
            .map(|el| ElementReport {
                name: by_id.get(&el).map(|n| n.to_string()).unwrap_or_default(),
                label: doc.describe(el),
                text: doc.text(el),
                css: doc.css(el),
            })
            .collect()
    }

    fn run_step(&mut self, step: &SceneStep) -> Result<()> {
        debug!("📋 Step at {}s: {:?}", step.at, step.call);
        match &step.scope {
            Some(scope) => {
                let scope = scope.clone();
                let call = step.call.clone();
                self.engine
                    .scoped(&scope, |engine| Self::call(engine, &call))
            }
            None => Self::call(&mut self.engine, &step.call),
        }
    }

    fn call(engine: &mut MotionEngine<HeadlessDocument, LayoutObserver>, call: &SceneCall) -> Result<()> {
        let first = |engine: &MotionEngine<HeadlessDocument, LayoutObserver>, target: &str| -> Result<Option<ElementId>> {
            Ok(engine.host().query_selector_all(target)?.into_iter().next())
        };

        match call {
            SceneCall::Play {
                target,
                preset,
                delay,
            } => {
                engine.play(target.as_str(), preset, *delay)?;
            }
            SceneCall::Stagger {
                target,
                preset,
                delay,
                stagger,
            } => {
                let stagger = stagger.unwrap_or(engine.config().motion.stagger);
                engine.play_staggered(target.as_str(), preset, *delay, stagger)?;
            }
            SceneCall::Scroll { target, preset } => {
                engine.create_scroll_animation(target.as_str(), preset)?;
            }
            SceneCall::FadeOut { target, delay } => {
                engine.fade_out(target.as_str(), *delay)?;
            }
            SceneCall::TypeWriter { target, text, speed } => {
                engine.type_writer(target.as_str(), text, *speed)?;
            }
            SceneCall::Counter {
                target,
                value,
                duration,
            } => {
                let Some(element) = first(engine, target)? else {
                    return Ok(());
                };
                let value = match value {
                    Some(value) => *value,
                    None => {
                        let text = engine.host().text(element).unwrap_or_default();
                        text.trim()
                            .trim_end_matches('+')
                            .parse::<f32>()
                            .with_context(|| format!("Counter text '{}' is not a number", text))?
                    }
                };
                engine.animate_counter(element, value, *duration)?;
            }
            SceneCall::ProgressBar { target, percentage } => match percentage {
                Some(percentage) => {
                    engine.animate_progress_bar(target.as_str(), *percentage)?;
                }
                None => {
                    let bars = engine.host().query_selector_all(target)?;
                    for element in bars {
                        let percentage = engine
                            .host()
                            .attr(element, "data-percentage")
                            .with_context(|| format!("{} has no data-percentage", element))?
                            .parse::<f32>()
                            .context("Invalid data-percentage")?;
                        engine.animate_progress_bar(element, percentage)?;
                    }
                }
            },
            SceneCall::PageIn => {
                engine.page_transition_in()?;
            }
            SceneCall::PageOut => {
                engine.page_transition_out()?;
            }
            SceneCall::Hover { target } => {
                engine.bind_hover(target.as_str())?;
            }
            SceneCall::PointerEnter { target } => {
                if let Some(element) = first(engine, target)? {
                    engine.pointer_enter(element);
                }
            }
            SceneCall::PointerLeave { target } => {
                if let Some(element) = first(engine, target)? {
                    engine.pointer_leave(element);
                }
            }
            SceneCall::Remove { target } => {
                let doomed = engine.host().query_selector_all(target)?;
                for element in doomed {
                    for removed in engine.host_mut().remove(element) {
                        engine.element_removed(removed);
                    }
                }
            }
            SceneCall::DisposeScope { scope } => {
                engine.dispose_scope(scope);
            }
        }
        Ok(())
    }

    /// Resolve a selector against the scene document, as steps do.
    pub fn resolve(&self, selector: &str) -> Result<Vec<ElementId>> {
        Ok(self.engine.host().resolve(&Target::from(selector))?)
    }

    pub fn element(&self, name: &str) -> Option<ElementId> {
        self.names.get(name).copied()
    }
}

// Default values for scene files
fn default_viewport_height() -> f32 {
    800.0
}
fn default_scene_duration() -> f64 {
    3.0
}
fn default_tag() -> String {
    "div".to_string()
}
fn default_element_height() -> f32 {
    100.0
}
fn default_stagger_preset() -> String {
    "fadeInUp".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"
viewport_height = 1000
duration = 1.0

[[elements]]
name = "main"
tag = "main"
classes = ["page-content"]

[[elements]]
name = "title"
tag = "h1"
parent = "main"
top = 100

[[steps]]
at = 0.5
op = "play"
target = "h1"
preset = "fadeInUp"

[[steps]]
at = 0.0
op = "dispose_scope"
scope = "home"

[[scroll]]
at = 0.0
y = 0

[[scroll]]
at = 2.0
y = 1000
"#;

    #[test]
    fn test_parse_scene() {
        let scene = Scene::from_toml_str(SCENE).unwrap();
        assert_eq!(scene.viewport_height, 1000.0);
        assert_eq!(scene.elements.len(), 2);
        assert_eq!(scene.elements[1].tag, "h1");
        assert_eq!(scene.elements[0].height, 100.0);
        // sorted by time
        assert!(matches!(scene.steps[0].call, SceneCall::DisposeScope { .. }));
        assert!(matches!(scene.steps[1].call, SceneCall::Play { delay, .. } if delay == 0.0));
    }

    #[test]
    fn test_scroll_interpolation() {
        let scene = Scene::from_toml_str(SCENE).unwrap();
        assert_eq!(scene.scroll_at(0.0), 0.0);
        assert_eq!(scene.scroll_at(1.0), 500.0);
        assert_eq!(scene.scroll_at(5.0), 1000.0);

        let still = Scene::from_toml_str("").unwrap();
        assert_eq!(still.scroll_at(3.0), 0.0);
    }

    #[test]
    fn test_build_document() {
        let scene = Scene::from_toml_str(SCENE).unwrap();
        let (doc, names) = scene.build_document().unwrap();
        let title = names["title"];
        assert_eq!(doc.query_selector_all(".page-content > h1").unwrap(), vec![title]);
        assert_eq!(doc.rect(title).unwrap().top, 100.0);
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let scene = Scene::from_toml_str(
            r#"
[[elements]]
name = "orphan"
parent = "nowhere"
"#,
        )
        .unwrap();
        let err = scene.build_document().unwrap_err();
        assert!(err.to_string().contains("nowhere"));
    }

    #[test]
    fn test_unknown_op_rejected() {
        assert!(Scene::from_toml_str("[[steps]]\nop = \"teleport\"\n").is_err());
    }
}
