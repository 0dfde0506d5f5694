//! Central state: the single owner of every piece of per-frame mutable
//! data (tracker buffers, interaction machine, voxel world).
//!
//! Backends feed frames through [`HandvoxState::tick`] and IPC commands
//! through `ipc::handle_message`; nothing else touches this struct.

use tracing::{debug, info};

use crate::interaction::{CameraConfig, FrameOutput, InteractionConfig, InteractionController};
use crate::tracking::{ClassifierConfig, GestureTracker, HandLandmarks, StabilizerConfig};
use crate::world::GroundConfig;

/// Drops frames whose sample counter has not advanced (stalled feed).
#[derive(Debug, Default)]
pub struct FrameGate {
    last_sample: Option<u64>,
    skipped: u64,
}

impl FrameGate {
    /// True if `sample` is new and the frame should be processed.
    pub fn admit(&mut self, sample: u64) -> bool {
        if self.last_sample.is_some_and(|last| sample <= last) {
            self.skipped += 1;
            debug!("Frame gate: sample {} is stale, skipped", sample);
            return false;
        }
        self.last_sample = Some(sample);
        true
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

/// Component configuration collected by `main`.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub classifier: ClassifierConfig,
    pub stabilizer: StabilizerConfig,
    pub interaction: InteractionConfig,
    pub camera: CameraConfig,
    pub ground: GroundConfig,
}

/// Central handvox state.
pub struct HandvoxState {
    pub tracker: GestureTracker,
    pub controller: InteractionController,
    pub frame_gate: FrameGate,
    /// Frames that reached the pipeline.
    pub frames: u64,
    /// Output of the most recent processed frame.
    pub last_output: Option<FrameOutput>,
    /// Shutdown flag.
    pub running: bool,
}

impl HandvoxState {
    pub fn new(settings: Settings) -> Self {
        info!(
            "HandvoxState initialized (pinch threshold {:.3}, hold {}ms)",
            settings.classifier.pinch_threshold, settings.interaction.hold_delay_ms
        );
        Self {
            tracker: GestureTracker::new(settings.classifier, settings.stabilizer),
            controller: InteractionController::new(
                settings.interaction,
                settings.camera,
                settings.ground,
            ),
            frame_gate: FrameGate::default(),
            frames: 0,
            last_output: None,
            running: true,
        }
    }

    /// Run one classify → stabilize → interact cycle. Returns None when the
    /// frame gate rejects a duplicate sample.
    pub fn tick(&mut self, sample: u64, hands: &[HandLandmarks], now_ms: f64) -> Option<FrameOutput> {
        if !self.frame_gate.admit(sample) {
            return None;
        }
        self.frames += 1;
        let tracked = self.tracker.process(hands);
        let output = self.controller.apply(tracked.gesture, tracked.pointer(), now_ms);
        self.last_output = Some(output.clone());
        Some(output)
    }

    /// Clear the scene and every gesture buffer.
    pub fn reset(&mut self) {
        self.controller.reset();
        self.tracker.reset();
        info!("State reset");
    }

    /// Status as an s-expression plist.
    pub fn status_sexp(&self) -> String {
        let gesture = self
            .last_output
            .as_ref()
            .map_or("none", |o| o.gesture.as_str());
        let status = self.last_output.as_ref().map_or("", |o| o.status.as_str());
        format!(
            "(:frames {} :skipped {} :gesture :{} :stable :{} :message \"{}\" :world {})",
            self.frames,
            self.frame_gate.skipped(),
            gesture,
            self.tracker.stable().as_str(),
            status.replace('\\', "\\\\").replace('"', "\\\""),
            self.controller.status_sexp(),
        )
    }
}

impl Default for HandvoxState {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::InteractionState;
    use crate::tracking::hand_landmarks::testing;
    use crate::tracking::GestureLabel;
    use glam::Vec3;

    const FRAME_MS: f64 = 34.0;

    fn origin() -> Vec3 {
        Vec3::new(0.5, 0.6, 0.0)
    }

    #[test]
    fn test_frame_gate_skips_duplicates() {
        let mut gate = FrameGate::default();
        assert!(gate.admit(1));
        assert!(!gate.admit(1));
        assert!(!gate.admit(0));
        assert!(gate.admit(2));
        assert_eq!(gate.skipped(), 2);
    }

    #[test]
    fn test_duplicate_sample_does_not_advance_pipeline() {
        let mut s = HandvoxState::default();
        let hand = [testing::open_palm(origin())];
        assert!(s.tick(1, &hand, 0.0).is_some());
        assert!(s.tick(1, &hand, 34.0).is_none());
        assert_eq!(s.frames, 1);
    }

    #[test]
    fn test_landmark_pinch_hold_places_one_voxel() {
        let mut s = HandvoxState::default();
        let mut t = 0.0;
        let mut sample = 0;
        for _ in 0..10 {
            sample += 1;
            s.tick(sample, &[testing::open_palm(origin())], t);
            t += FRAME_MS;
        }
        for _ in 0..70 {
            sample += 1;
            s.tick(sample, &[testing::pinch(origin())], t);
            t += FRAME_MS;
        }
        assert_eq!(s.controller.world().len(), 1);
        assert_eq!(s.controller.state(), InteractionState::BlockPlaced);
    }

    #[test]
    fn test_fist_and_open_palm_zoom_out() {
        let mut s = HandvoxState::default();
        let hands = [
            testing::fist(origin()),
            testing::open_palm(Vec3::new(0.2, 0.6, 0.0)),
        ];
        let out = s.tick(1, &hands, 0.0);
        assert_eq!(out.as_ref().map(|o| o.gesture), Some(GestureLabel::ZoomOut));
        assert!((s.controller.camera().distance() - 10.2).abs() < 1e-5);
    }

    #[test]
    fn test_no_hands_stays_idle() {
        let mut s = HandvoxState::default();
        for i in 0..20 {
            let out = s.tick(i, &[], i as f64 * FRAME_MS);
            assert_eq!(out.map(|o| o.state), Some(InteractionState::Idle));
        }
    }

    #[test]
    fn test_status_sexp_nests_world() {
        let s = HandvoxState::default();
        let sexp = s.status_sexp();
        assert!(sexp.contains(":frames 0"));
        assert!(sexp.contains(":stable :none"));
        assert!(sexp.contains(":world (:state :idle"));
    }

    #[test]
    fn test_reset_clears_world_and_gesture_window() {
        let mut s = HandvoxState::default();
        let mut t = 0.0;
        for i in 1..=80 {
            let hand = if i <= 10 { testing::open_palm(origin()) } else { testing::pinch(origin()) };
            s.tick(i, &[hand], t);
            t += FRAME_MS;
        }
        assert_eq!(s.controller.world().len(), 1);
        assert_eq!(s.tracker.stable(), GestureLabel::Pinch);

        s.reset();
        assert!(s.controller.world().is_empty());
        assert_eq!(s.tracker.stable(), GestureLabel::None);
        assert!(s.status_sexp().contains(":stable :none"));
    }
}
