//! Frame drivers: recorded session replay and live stdin feed.
//!
//! Both read JSON-lines records. A frame record carries up to two hands of
//! 21 `[x, y, z]` landmarks, either nested or as the detector's flat float
//! buffer; a command record carries an IPC s-expression:
//!
//! ```text
//! {"t": 1033.4, "sample": 31, "hands": [[[0.51, 0.62, 0.0], ...]]}
//! {"t": 1066.8, "sample": 32, "landmarks": [0.51, 0.62, 0.0, ...], "num_hands": 1}
//! {"command": "(:type :status :id 1)"}
//! ```

pub mod live;
pub mod replay;

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::{info, warn};

use crate::interaction::{Clock, FrameOutput, InteractionState};
use crate::ipc;
use crate::state::{HandvoxState, Settings};
use crate::tracking::hand_landmarks::MAX_HANDS;
use crate::tracking::{GestureLabel, HandLandmarks};
use crate::world::VoxelKey;

/// Backend type selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Replay,
    Live,
}

/// Options shared by every backend.
#[derive(Debug, Clone, Default)]
pub struct BackendOptions {
    /// Session file (replay only).
    pub session: Option<PathBuf>,
    /// Snapshot to load before the first frame.
    pub load: Option<PathBuf>,
    /// Where to write a snapshot after the run.
    pub export: Option<PathBuf>,
    /// Print a frame event every frame instead of only on changes.
    pub verbose_frames: bool,
}

/// One line of a session stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SessionRecord {
    Frame {
        /// Capture time in milliseconds.
        t: f64,
        /// Video sample counter; absent means every frame is new.
        #[serde(default)]
        sample: Option<u64>,
        hands: Vec<Vec<[f32; 3]>>,
    },
    FlatFrame {
        t: f64,
        #[serde(default)]
        sample: Option<u64>,
        /// 63 floats per hand, hands back to back.
        landmarks: Vec<f32>,
        num_hands: usize,
    },
    Command {
        command: String,
    },
}

impl SessionRecord {
    /// Capture time of a frame record.
    pub fn time(&self) -> Option<f64> {
        match self {
            Self::Frame { t, .. } | Self::FlatFrame { t, .. } => Some(*t),
            Self::Command { .. } => None,
        }
    }
}

/// Parse one record, logging and skipping malformed lines.
pub fn parse_record(line: &str) -> Option<SessionRecord> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("Malformed session record skipped: {}", e);
            None
        }
    }
}

/// Convert raw hands into landmark sets. Any malformed hand degrades the
/// whole frame to "no hands".
pub fn decode_hands(raw: &[Vec<[f32; 3]>]) -> Vec<HandLandmarks> {
    let decoded: Option<Vec<HandLandmarks>> = raw
        .iter()
        .take(MAX_HANDS)
        .map(|hand| HandLandmarks::from_triples(hand))
        .collect();
    decoded.unwrap_or_else(|| {
        warn!("Frame with malformed hand data treated as empty");
        Vec::new()
    })
}

/// Event line for a processed frame.
pub fn frame_event(out: &FrameOutput) -> String {
    let cursor = out
        .cursor
        .map(|k| format!("({} {} {})", k.x, k.y, k.z))
        .unwrap_or_else(|| "nil".to_string());
    let gesture = format!(":{}", out.gesture.as_str());
    let state = format!(":{}", out.state.as_str());
    let status = format!("\"{}\"", out.status.replace('"', "\\\""));
    ipc::format_event(
        "frame",
        &[
            ("gesture", gesture.as_str()),
            ("state", state.as_str()),
            ("cursor", cursor.as_str()),
            ("pulse", if out.pulse { "t" } else { "nil" }),
            ("status", status.as_str()),
        ],
    )
}

/// Drives a [`HandvoxState`] from records and collects output lines.
pub struct Session {
    pub state: HandvoxState,
    verbose_frames: bool,
    next_sample: u64,
    last_reported: Option<(GestureLabel, InteractionState, Option<VoxelKey>)>,
}

impl Session {
    pub fn new(state: HandvoxState, verbose_frames: bool) -> Self {
        Self {
            state,
            verbose_frames,
            next_sample: 0,
            last_reported: None,
        }
    }

    /// Handle one record, reading frame time from `clock`.
    pub fn handle(&mut self, record: SessionRecord, clock: &impl Clock) -> Option<String> {
        match record {
            SessionRecord::Frame { sample, hands, .. } => {
                self.frame(sample, &decode_hands(&hands), clock.now_ms())
            }
            SessionRecord::FlatFrame { sample, landmarks, num_hands, .. } => {
                let hands = HandLandmarks::from_flat(&landmarks, num_hands);
                self.frame(sample, &hands, clock.now_ms())
            }
            SessionRecord::Command { command } => self.command(&command),
        }
    }

    /// Feed one frame. Returns an event line when something visible changed.
    pub fn frame(&mut self, sample: Option<u64>, hands: &[HandLandmarks], now_ms: f64) -> Option<String> {
        let sample = sample.unwrap_or(self.next_sample);
        self.next_sample = sample.saturating_add(1);
        let out = self.state.tick(sample, hands, now_ms)?;

        let key = (out.gesture, out.state, out.cursor);
        let changed = self.last_reported != Some(key);
        self.last_reported = Some(key);
        (changed || out.pulse || self.verbose_frames).then(|| frame_event(&out))
    }

    /// Dispatch an IPC command.
    pub fn command(&mut self, raw: &str) -> Option<String> {
        ipc::handle_message(&mut self.state, raw)
    }
}

/// Load a snapshot file into the world.
fn load_snapshot(state: &mut HandvoxState, path: &Path) -> anyhow::Result<()> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let count = state
        .controller
        .load_snapshot(&data)
        .with_context(|| format!("decoding snapshot {}", path.display()))?;
    info!("Loaded {} voxels from {}", count, path.display());
    Ok(())
}

/// Write the world to a snapshot file.
fn export_snapshot(state: &HandvoxState, path: &Path) -> anyhow::Result<()> {
    let json = state.controller.export_json()?;
    std::fs::write(path, json)
        .with_context(|| format!("writing snapshot {}", path.display()))?;
    info!(
        "Exported {} voxels to {}",
        state.controller.world().len(),
        path.display()
    );
    Ok(())
}

/// Run the pipeline with the selected backend.
pub fn run(backend: BackendType, settings: Settings, options: BackendOptions) -> anyhow::Result<()> {
    let mut state = HandvoxState::new(settings);
    if let Some(path) = &options.load {
        load_snapshot(&mut state, path)?;
    }

    let mut session = Session::new(state, options.verbose_frames);
    match backend {
        BackendType::Replay => {
            let path = options
                .session
                .as_deref()
                .context("replay backend needs a session file")?;
            replay::run(&mut session, path)?;
        }
        BackendType::Live => live::run(&mut session)?,
    }

    if let Some(path) = &options.export {
        export_snapshot(&session.state, path)?;
    }
    Ok(())
}
