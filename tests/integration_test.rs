use folio_motion::{Config, EasingFunction};
use std::io::Write;
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.motion.duration, 0.8);
    assert_eq!(config.motion.stagger, 0.1);
    assert_eq!(config.motion.ease, EasingFunction::POWER2_OUT);
    assert!(!config.motion.reduced_motion);
    assert_eq!(config.scroll_trigger.toggle_actions, "play none none reverse");
    assert_eq!(config.hover.scale, 1.05);
    assert_eq!(config.page_transition.content_selector, ".page-content > *");
}

#[tokio::test]
async fn test_config_from_file() {
    let config_content = r##"
[motion]
duration = 1.2
ease = "back.out(1.7)"
stagger = 0.15

[scroll_trigger]
start = "top 90%"
toggle_actions = "play pause resume reset"

[counter]
duration = 3.0

[page_transition]
panel_selector = "#curtain"
"##;

    // Create temporary config file
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file
        .write_all(config_content.as_bytes())
        .expect("Failed to write to temp file");
    let temp_path = temp_file.path().to_str().unwrap();

    let config = Config::load(temp_path).await.expect("Failed to load config");

    assert_eq!(config.motion.duration, 1.2);
    assert_eq!(config.motion.ease.to_string(), "back.out(1.7)");
    assert_eq!(config.motion.stagger, 0.15);
    assert_eq!(config.scroll_trigger.start, "top 90%");
    assert_eq!(config.scroll_trigger.end, "bottom 20%");
    assert_eq!(config.counter.duration, 3.0);
    assert_eq!(config.progress_bar.duration, 1.5);
    assert_eq!(config.page_transition.panel_selector, "#curtain");
    assert_eq!(config.page_transition.content_selector, ".page-content > *");
}

#[tokio::test]
async fn test_missing_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("motion.toml");

    let config = Config::load_or_default(path.to_str().unwrap())
        .await
        .expect("Missing config should not be an error");
    assert_eq!(config, Config::default());

    assert!(Config::load(path.to_str().unwrap()).await.is_err());
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file
        .write_all(b"[scroll_trigger]\nstart = \"halfway\"\n")
        .expect("Failed to write to temp file");

    let err = Config::load_or_default(temp_file.path().to_str().unwrap())
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("halfway"));
}

#[test]
fn test_config_round_trips_through_toml() {
    let mut config = Config::default();
    config.motion.reduced_motion = true;
    config.hover.scale = 1.1;

    let serialized = toml::to_string(&config).expect("Failed to serialize config");
    let parsed = Config::from_toml_str(&serialized).expect("Failed to parse config");
    assert_eq!(parsed, config);
}
