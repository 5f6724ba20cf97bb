use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use folio_motion::animation::PresetCatalog;
use folio_motion::scene::{Scene, SceneRunner};
use folio_motion::Config;

#[derive(Parser)]
#[command(name = "folio-motion")]
#[command(about = "Scroll-triggered page animations: preset catalog and headless preview")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration file path (defaults to ~/.config/folio-motion/motion.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the animation presets
    Presets {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replay a scene file against a headless page and print the result
    Preview {
        /// Scene file (TOML)
        scene: String,

        /// Frames per second (overrides [motion] fps)
        #[arg(long)]
        fps: Option<u32>,

        /// Pace frames in real time
        #[arg(long)]
        realtime: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("folio_motion={log_level}"))
        .with_target(false)
        .init();

    info!("🦀 Starting folio-motion v{}", env!("CARGO_PKG_VERSION"));

    let config_path = cli.config.unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path).await?;

    match cli.command {
        Commands::Presets { json } => {
            let catalog = PresetCatalog::new(&config.motion);
            if json {
                println!("{}", serde_json::to_string_pretty(&catalog.summaries())?);
            } else {
                println!("🎨 {} presets", catalog.names().count());
                for summary in catalog.summaries() {
                    println!(
                        "  {:<20} {:>5.2}s  {:<22} {}",
                        summary.name,
                        summary.duration_secs,
                        summary.ease,
                        summary.properties.join(", ")
                    );
                }
            }
        }
        Commands::Preview {
            scene,
            fps,
            realtime,
        } => {
            let scene = Scene::load(&scene).await?;
            let mut runner = SceneRunner::new(scene, config)?.realtime(realtime);
            if let Some(fps) = fps {
                runner = runner.with_fps(fps);
            }

            let report = runner.run().await?;
            println!(
                "🎬 {} frames, {} renders, {} viewport events, {} tweens and {} triggers still active",
                report.frames,
                report.rendered,
                report.viewport_events,
                report.active_tweens,
                report.active_triggers
            );
            for element in &report.elements {
                let css: Vec<String> = element
                    .css
                    .iter()
                    .map(|(property, value)| format!("{property}: {value}"))
                    .collect();
                println!(
                    "  {:<12} {:<28} {:<8} {}",
                    element.name,
                    element.label,
                    element.text.as_deref().unwrap_or("-"),
                    css.join("; ")
                );
            }

            if !report.failed_steps.is_empty() {
                for failure in &report.failed_steps {
                    error!("❌ {}", failure);
                }
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
