use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info};

use crate::animation::easing::EasingFunction;
use crate::animation::scroll_trigger::{ToggleActions, TriggerBand};
use crate::error::MotionError;

/// Convert configured seconds to a `Duration` at microsecond precision, so
/// `0.8` becomes exactly 800ms.
pub fn seconds(secs: f64) -> Duration {
    Duration::from_micros((secs.max(0.0) * 1_000_000.0).round() as u64)
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub motion: MotionSettings,

    #[serde(default)]
    pub scroll_trigger: ScrollTriggerSettings,

    #[serde(default)]
    pub counter: CounterSettings,

    #[serde(default)]
    pub progress_bar: ProgressBarSettings,

    #[serde(default)]
    pub hover: HoverSettings,

    #[serde(default)]
    pub page_transition: PageTransitionSettings,
}

/// Defaults shared by presets that don't fix their own timing.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MotionSettings {
    /// Seconds
    #[serde(default = "default_duration")]
    pub duration: f64,

    #[serde(default)]
    pub ease: EasingFunction,

    /// Seconds between successive elements of a staggered group
    #[serde(default = "default_stagger")]
    pub stagger: f64,

    /// Skip tweening and place elements at their end state
    #[serde(default)]
    pub reduced_motion: bool,

    /// Frame rate used by the preview runner
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Seconds per character for typed text
    #[serde(default = "default_typewriter_speed")]
    pub typewriter_speed: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ScrollTriggerSettings {
    #[serde(default = "default_trigger_start")]
    pub start: String,

    #[serde(default = "default_trigger_end")]
    pub end: String,

    #[serde(default = "default_toggle_actions")]
    pub toggle_actions: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CounterSettings {
    #[serde(default = "default_counter_duration")]
    pub duration: f64,

    #[serde(default)]
    pub ease: EasingFunction,

    #[serde(default = "default_trigger_start")]
    pub start: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProgressBarSettings {
    #[serde(default = "default_progress_duration")]
    pub duration: f64,

    #[serde(default)]
    pub ease: EasingFunction,

    #[serde(default = "default_trigger_start")]
    pub start: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HoverSettings {
    #[serde(default = "default_hover_scale")]
    pub scale: f32,

    #[serde(default = "default_hover_duration")]
    pub duration: f64,

    #[serde(default)]
    pub ease: EasingFunction,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PageTransitionSettings {
    #[serde(default = "default_panel_selector")]
    pub panel_selector: String,

    #[serde(default = "default_content_selector")]
    pub content_selector: String,

    #[serde(default = "default_panel_duration")]
    pub panel_duration: f64,

    /// Vertical offset (px) children enter from and leave to
    #[serde(default = "default_content_offset")]
    pub content_offset: f32,

    #[serde(default = "default_content_in_duration")]
    pub content_in_duration: f64,

    #[serde(default = "default_stagger")]
    pub content_in_stagger: f64,

    /// How far the child segment starts before the panel finishes
    #[serde(default = "default_overlap_in")]
    pub overlap_in: f64,

    #[serde(default = "default_content_out_duration")]
    pub content_out_duration: f64,

    #[serde(default = "default_stagger_out")]
    pub content_out_stagger: f64,

    #[serde(default = "default_overlap_out")]
    pub overlap_out: f64,
}

impl Config {
    pub async fn load(path: &str) -> Result<Self> {
        let expanded_path = shellexpand::tilde(path);
        info!("📄 Reading motion config from: {}", expanded_path);

        let content = fs::read_to_string(expanded_path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file '{}'", expanded_path))?;

        let config = Self::from_toml_str(&content)?;
        debug!(
            "📋 Config loaded: duration={}s ease={} stagger={}s reduced_motion={}",
            config.motion.duration, config.motion.ease, config.motion.stagger, config.motion.reduced_motion
        );
        Ok(config)
    }

    /// Load `path`, or fall back to defaults when the file does not exist.
    pub async fn load_or_default(path: &str) -> Result<Self> {
        let expanded_path = shellexpand::tilde(path);
        if fs::metadata(expanded_path.as_ref()).await.is_err() {
            info!("📋 No config at {}, using defaults", expanded_path);
            return Ok(Self::default());
        }
        Self::load(path).await
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse motion config")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject trigger strings that would otherwise only fail on first use.
    pub fn validate(&self) -> Result<()> {
        self.scroll_trigger.band()?;
        self.scroll_trigger.actions()?;
        TriggerBand::parse(&self.counter.start, None)?;
        TriggerBand::parse(&self.progress_bar.start, None)?;
        self.counter.easing()?;
        self.progress_bar.easing()?;
        Ok(())
    }

    pub fn default_path() -> String {
        dirs::config_dir()
            .map(|dir| dir.join("folio-motion").join("motion.toml"))
            .unwrap_or_else(|| PathBuf::from("~/.config/folio-motion/motion.toml"))
            .to_string_lossy()
            .into_owned()
    }
}

impl MotionSettings {
    pub fn duration(&self) -> Duration {
        seconds(self.duration)
    }

    pub fn stagger(&self) -> Duration {
        seconds(self.stagger)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }
}

impl ScrollTriggerSettings {
    pub fn band(&self) -> crate::Result<TriggerBand> {
        TriggerBand::parse(&self.start, Some(&self.end))
    }

    pub fn actions(&self) -> crate::Result<ToggleActions> {
        self.toggle_actions.parse()
    }
}

/// Counters and progress bars only count up, so their ease must stay
/// within [0, 1] and never turn back.
fn monotonic(setting: &str, ease: EasingFunction) -> crate::Result<EasingFunction> {
    if ease.is_monotonic() {
        Ok(ease)
    } else {
        Err(MotionError::NonMonotonicEasing {
            setting: setting.to_string(),
            ease: ease.to_string(),
        })
    }
}

impl CounterSettings {
    pub fn easing(&self) -> crate::Result<EasingFunction> {
        monotonic("counter.ease", self.ease)
    }
}

impl ProgressBarSettings {
    pub fn easing(&self) -> crate::Result<EasingFunction> {
        monotonic("progress_bar.ease", self.ease)
    }
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            duration: default_duration(),
            ease: EasingFunction::default(),
            stagger: default_stagger(),
            reduced_motion: false,
            fps: default_fps(),
            typewriter_speed: default_typewriter_speed(),
        }
    }
}

impl Default for ScrollTriggerSettings {
    fn default() -> Self {
        Self {
            start: default_trigger_start(),
            end: default_trigger_end(),
            toggle_actions: default_toggle_actions(),
        }
    }
}

impl Default for CounterSettings {
    fn default() -> Self {
        Self {
            duration: default_counter_duration(),
            ease: EasingFunction::default(),
            start: default_trigger_start(),
        }
    }
}

impl Default for ProgressBarSettings {
    fn default() -> Self {
        Self {
            duration: default_progress_duration(),
            ease: EasingFunction::default(),
            start: default_trigger_start(),
        }
    }
}

impl Default for HoverSettings {
    fn default() -> Self {
        Self {
            scale: default_hover_scale(),
            duration: default_hover_duration(),
            ease: EasingFunction::default(),
        }
    }
}

impl Default for PageTransitionSettings {
    fn default() -> Self {
        Self {
            panel_selector: default_panel_selector(),
            content_selector: default_content_selector(),
            panel_duration: default_panel_duration(),
            content_offset: default_content_offset(),
            content_in_duration: default_content_in_duration(),
            content_in_stagger: default_stagger(),
            overlap_in: default_overlap_in(),
            content_out_duration: default_content_out_duration(),
            content_out_stagger: default_stagger_out(),
            overlap_out: default_overlap_out(),
        }
    }
}

// Default values for configuration
fn default_duration() -> f64 {
    0.8
}
fn default_stagger() -> f64 {
    0.1
}
fn default_stagger_out() -> f64 {
    0.05
}
fn default_fps() -> u32 {
    60
}
fn default_typewriter_speed() -> f64 {
    0.05
}
fn default_trigger_start() -> String {
    "top 80%".to_string()
}
fn default_trigger_end() -> String {
    "bottom 20%".to_string()
}
fn default_toggle_actions() -> String {
    "play none none reverse".to_string()
}
fn default_counter_duration() -> f64 {
    2.0
}
fn default_progress_duration() -> f64 {
    1.5
}
fn default_hover_scale() -> f32 {
    1.05
}
fn default_hover_duration() -> f64 {
    0.3
}
fn default_panel_selector() -> String {
    ".page-transition".to_string()
}
fn default_content_selector() -> String {
    ".page-content > *".to_string()
}
fn default_panel_duration() -> f64 {
    0.5
}
fn default_content_offset() -> f32 {
    30.0
}
fn default_content_in_duration() -> f64 {
    0.6
}
fn default_overlap_in() -> f64 {
    0.3
}
fn default_content_out_duration() -> f64 {
    0.3
}
fn default_overlap_out() -> f64 {
    0.2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_are_exact() {
        assert_eq!(seconds(0.8), Duration::from_millis(800));
        assert_eq!(seconds(0.1), Duration::from_millis(100));
        assert_eq!(seconds(-1.0), Duration::ZERO);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.motion.duration(), Duration::from_millis(800));
        assert_eq!(config.motion.ease.to_string(), "power2.out");
        assert_eq!(config.scroll_trigger.start, "top 80%");
        assert_eq!(config.progress_bar.duration, 1.5);
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_toml_str(
            r#"
[motion]
ease = "power3.out"
reduced_motion = true

[scroll_trigger]
start = "top 90%"
"#,
        )
        .unwrap();
        assert!(config.motion.reduced_motion);
        assert_eq!(config.motion.ease.to_string(), "power3.out");
        assert_eq!(config.motion.stagger, 0.1);
        assert_eq!(config.scroll_trigger.start, "top 90%");
        assert_eq!(config.scroll_trigger.end, "bottom 20%");
    }

    #[test]
    fn test_bad_ease_rejected() {
        let err = Config::from_toml_str("[motion]\nease = \"wiggle\"\n").unwrap_err();
        assert!(format!("{:#}", err).contains("wiggle"));
    }

    #[test]
    fn test_bad_trigger_rejected() {
        assert!(Config::from_toml_str("[scroll_trigger]\nstart = \"sideways\"\n").is_err());
        assert!(Config::from_toml_str("[scroll_trigger]\ntoggle_actions = \"play\"\n").is_err());
    }

    #[test]
    fn test_overshooting_counter_ease_rejected() {
        let err = Config::from_toml_str("[counter]\nease = \"back.out(1.7)\"\n").unwrap_err();
        assert!(format!("{:#}", err).contains("counter.ease"));

        let err = Config::from_toml_str("[progress_bar]\nease = \"elastic.out\"\n").unwrap_err();
        assert!(format!("{:#}", err).contains("progress_bar.ease"));

        let config = Config::from_toml_str("[counter]\nease = \"expo.out\"\n").unwrap();
        assert_eq!(config.counter.easing().unwrap().to_string(), "expo.out");
    }

    #[test]
    fn test_frame_interval() {
        let settings = MotionSettings {
            fps: 50,
            ..MotionSettings::default()
        };
        assert_eq!(settings.frame_interval(), Duration::from_millis(20));
    }
}
