//! handvox - hand-gesture voxel builder.
//!
//! Classifies hand landmarks into stable gestures and turns them into
//! voxel edits, camera rotation and zoom.

mod backend;
pub mod interaction;
pub mod ipc;
mod state;
pub mod tracking;
pub mod world;

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use crate::state::Settings;
use crate::tracking::{GestureLabel, NoPersonalization, StaticThresholds, ThresholdProvider};

#[derive(Parser, Debug)]
#[command(name = "handvox", about = "Hand-gesture voxel builder")]
struct Cli {
    /// Backend to use: replay or live
    #[arg(long, default_value = "live")]
    backend: String,

    /// Session file to replay (JSON lines)
    #[arg(long)]
    session: Option<PathBuf>,

    /// Snapshot to load before the first frame
    #[arg(long)]
    load: Option<PathBuf>,

    /// Write a snapshot here when the run ends
    #[arg(long)]
    export: Option<PathBuf>,

    /// Personalized pinch distance threshold (normalized hand units)
    #[arg(long)]
    pinch_threshold: Option<f32>,

    /// Hold time before a pinch places or a victory undoes
    #[arg(long)]
    hold_delay_ms: Option<f64>,

    /// Quiet time after rotate/zoom before a pinch is accepted
    #[arg(long)]
    debounce_ms: Option<f64>,

    /// Scene rotation per unit of pointer movement
    #[arg(long)]
    sensitivity: Option<f32>,

    /// Label unmatched poses UNKNOWN instead of OPEN_PALM
    #[arg(long)]
    strict_unmatched: bool,

    /// Report every frame, not only changes
    #[arg(long)]
    verbose_frames: bool,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

impl Cli {
    fn settings(&self) -> Settings {
        let mut settings = Settings::default();

        let provider: Box<dyn ThresholdProvider> = match self.pinch_threshold {
            Some(t) => Box::new(StaticThresholds::default().with(GestureLabel::Pinch, t)),
            None => Box::new(NoPersonalization),
        };
        settings.classifier = settings.classifier.with_personalization(&*provider);
        if self.strict_unmatched {
            settings.classifier.unmatched = GestureLabel::Unknown;
        }

        if let Some(ms) = self.hold_delay_ms {
            settings.interaction.hold_delay_ms = ms;
        }
        if let Some(ms) = self.debounce_ms {
            settings.interaction.rotate_debounce_ms = ms;
        }
        if let Some(s) = self.sensitivity {
            settings.interaction.rotate_sensitivity = s;
        }
        settings
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("handvox {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Logs go to stderr; stdout carries events and IPC responses.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "handvox=info".into()),
        )
        .init();

    info!("handvox v{} starting", env!("CARGO_PKG_VERSION"));
    info!("backend: {}", cli.backend);

    let backend_type = match cli.backend.as_str() {
        "replay" => backend::BackendType::Replay,
        "live" => backend::BackendType::Live,
        other => {
            anyhow::bail!("unknown backend: {other}. Use: replay or live");
        }
    };

    let settings = cli.settings();
    let options = backend::BackendOptions {
        session: cli.session,
        load: cli.load,
        export: cli.export,
        verbose_frames: cli.verbose_frames,
    };

    backend::run(backend_type, settings, options)
}
