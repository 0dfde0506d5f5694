//! Per-frame interaction controller.
//!
//! Owns the voxel world, the camera rig and the state machine. Each frame
//! it steps the machine with the stabilized gesture, refreshes the cursor
//! from the pointer, executes the machine's commands against the world and
//! returns a [`FrameOutput`] for the presentation layer.

use tracing::{debug, info};

use super::camera::{ndc_from_pointer, CameraConfig, CameraRig};
use super::machine::{Command, InteractionConfig, InteractionMachine, InteractionState};
use crate::tracking::GestureLabel;
use glam::Vec3;
use crate::world::snapshot::{self, SnapshotError, SnapshotRecord};
use crate::world::target::{GroundConfig, Target, TargetResolver};
use crate::world::voxel::{Color, VoxelKey, VoxelWorld};

/// Build colors, cycled by swipes.
pub const PALETTE: [Color; 6] = [
    Color(0x4caf50),
    Color(0x2196f3),
    Color(0xf44336),
    Color(0xffc107),
    Color(0x9c27b0),
    Color(0xeceff1),
];

/// What the presentation layer needs after a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    pub gesture: GestureLabel,
    pub state: InteractionState,
    /// Candidate placement cell, None when hidden or without a target.
    pub cursor: Option<VoxelKey>,
    pub status: String,
    /// A place or undo committed this frame.
    pub pulse: bool,
    pub hidden_cursor: bool,
}

pub struct InteractionController {
    world: VoxelWorld,
    resolver: TargetResolver,
    camera: CameraRig,
    machine: InteractionMachine,
    palette_index: usize,
    /// Last pointer position in NDC used for targeting.
    last_ndc: Option<(f32, f32)>,
    target: Option<Target>,
    /// Previous pointer position while rotating.
    rotation_anchor: Option<(f32, f32)>,
}

impl InteractionController {
    pub fn new(interaction: InteractionConfig, camera: CameraConfig, ground: GroundConfig) -> Self {
        Self {
            world: VoxelWorld::new(),
            resolver: TargetResolver::new(ground),
            camera: CameraRig::new(camera),
            machine: InteractionMachine::new(interaction),
            palette_index: 0,
            last_ndc: None,
            target: None,
            rotation_anchor: None,
        }
    }

    /// Advance one frame.
    pub fn apply(&mut self, gesture: GestureLabel, pointer: Option<Vec3>, now_ms: f64) -> FrameOutput {
        let commands = self.machine.step(gesture, now_ms);
        let ndc = pointer.map(ndc_from_pointer);

        // Zoom frames short-circuit; rotation hides the cursor.
        if !matches!(
            self.machine.state(),
            InteractionState::Rotating | InteractionState::Zooming
        ) {
            self.retarget(ndc);
        }

        let mut pulse = false;
        for command in commands {
            match command {
                Command::Zoom { delta } => {
                    let d = self.camera.zoom(delta, &self.machine.config);
                    debug!("Camera distance {:.2}", d);
                }
                Command::BeginRotation => self.rotation_anchor = ndc,
                Command::Rotate => self.rotate_towards(ndc),
                Command::AttemptPlace => {
                    if self.place_at_cursor() {
                        self.machine.placement_committed();
                        pulse = true;
                    }
                }
                Command::CommitUndo => pulse = self.undo(),
                Command::CycleColor { step } => self.cycle_color(step),
            }
        }

        let state = self.machine.state();
        let hidden = state == InteractionState::Rotating;
        FrameOutput {
            gesture,
            state,
            cursor: if hidden { None } else { self.cursor() },
            status: self.machine.status(now_ms),
            pulse,
            hidden_cursor: hidden,
        }
    }

    fn retarget(&mut self, ndc: Option<(f32, f32)>) {
        self.last_ndc = ndc;
        self.target = ndc.and_then(|(x, y)| {
            let ray = self.camera.ray_from_ndc(x, y);
            self.resolver.resolve(&self.world, &ray)
        });
    }

    fn refresh_target(&mut self) {
        self.retarget(self.last_ndc);
    }

    fn rotate_towards(&mut self, ndc: Option<(f32, f32)>) {
        let Some(cur) = ndc else {
            return;
        };
        if let Some(prev) = self.rotation_anchor {
            let k = self.machine.config.rotate_sensitivity;
            self.camera.rotate((cur.0 - prev.0) * k, (cur.1 - prev.1) * k);
        }
        self.rotation_anchor = Some(cur);
    }

    fn cycle_color(&mut self, step: i32) {
        let n = PALETTE.len() as i32;
        self.palette_index = (self.palette_index as i32 + step).rem_euclid(n) as usize;
        info!("Build color {}", self.current_color().hex());
    }

    // ── World operations ───────────────────────────────────

    /// Place the current color at the cursor. False without a target or
    /// when the cell is occupied.
    pub fn place_at_cursor(&mut self) -> bool {
        let Some(target) = self.target else {
            return false;
        };
        let placed = self.world.place(target.cell(), self.current_color());
        if placed {
            self.refresh_target();
        }
        placed
    }

    /// Remove the voxel under the pointer (not the adjacent free cell).
    pub fn remove_at_cursor(&mut self) -> bool {
        let Some(hit) = self.target.and_then(|t| t.hit_voxel()) else {
            return false;
        };
        let removed = self.world.remove(hit);
        if removed {
            self.refresh_target();
        }
        removed
    }

    /// Invert the newest world mutation. False when the log is empty.
    pub fn undo(&mut self) -> bool {
        let undone = self.world.undo().is_some();
        if undone {
            self.refresh_target();
        }
        undone
    }

    /// Clear voxels, undo log and scene rotation.
    pub fn reset(&mut self) {
        self.world.clear();
        self.camera.reset_rotation();
        self.rotation_anchor = None;
        self.refresh_target();
        info!("World reset");
    }

    pub fn export_snapshot(&self) -> Vec<SnapshotRecord> {
        snapshot::export(&self.world)
    }

    pub fn export_json(&self) -> Result<String, SnapshotError> {
        snapshot::export_json(&self.world)
    }

    /// Reset, then recreate voxels from `data`. On a decode error the world
    /// stays empty.
    pub fn load_snapshot(&mut self, data: &str) -> Result<usize, SnapshotError> {
        self.reset();
        let created = snapshot::restore_json(&mut self.world, data)?;
        self.refresh_target();
        info!("Loaded {} voxels from snapshot", created);
        Ok(created)
    }

    // ── Accessors ──────────────────────────────────────────

    pub fn world(&self) -> &VoxelWorld {
        &self.world
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn state(&self) -> InteractionState {
        self.machine.state()
    }

    pub fn config_mut(&mut self) -> &mut InteractionConfig {
        &mut self.machine.config
    }

    pub fn current_color(&self) -> Color {
        PALETTE[self.palette_index]
    }

    pub fn cursor(&self) -> Option<VoxelKey> {
        self.target.map(|t| t.cell())
    }

    /// Status as an s-expression plist.
    pub fn status_sexp(&self) -> String {
        let cursor = self
            .cursor()
            .map(|k| format!("({} {} {})", k.x, k.y, k.z))
            .unwrap_or_else(|| "nil".to_string());
        let (rx, ry) = self.camera.rotation();
        format!(
            "(:state :{} :voxels {} :undo-depth {} :color \"{}\" :distance {:.2} :rotation ({:.3} {:.3}) :cursor {})",
            self.machine.state().as_str(),
            self.world.len(),
            self.world.undo_depth(),
            self.current_color().hex(),
            self.camera.distance(),
            rx,
            ry,
            cursor,
        )
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(
            InteractionConfig::default(),
            CameraConfig::default(),
            GroundConfig::default(),
        )
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_MS: f64 = 34.0;
    const AIM: Vec3 = Vec3::new(0.45, 0.55, 0.0);

    /// Feed `n` frames of one gesture starting at `*t`.
    fn feed(c: &mut InteractionController, g: GestureLabel, p: Option<Vec3>, n: usize, t: &mut f64) -> Vec<FrameOutput> {
        (0..n)
            .map(|_| {
                let out = c.apply(g, p, *t);
                *t += FRAME_MS;
                out
            })
            .collect()
    }

    #[test]
    fn test_open_palm_then_long_pinch_places_exactly_one() {
        let mut c = InteractionController::default();
        let mut t = 0.0;
        feed(&mut c, GestureLabel::OpenPalm, Some(AIM), 10, &mut t);
        let outs = feed(&mut c, GestureLabel::Pinch, Some(AIM), 70, &mut t);

        assert_eq!(c.world().len(), 1, "exactly one voxel");
        assert_eq!(c.state(), InteractionState::BlockPlaced);
        assert_eq!(outs.iter().filter(|o| o.pulse).count(), 1);
        assert!(outs.last().is_some_and(|o| o.cursor.is_some()));
    }

    #[test]
    fn test_second_hold_builds_against_first() {
        let mut c = InteractionController::default();
        let mut t = 0.0;
        feed(&mut c, GestureLabel::Pinch, Some(AIM), 70, &mut t);
        feed(&mut c, GestureLabel::OpenPalm, Some(AIM), 5, &mut t);
        feed(&mut c, GestureLabel::Pinch, Some(AIM), 70, &mut t);

        let keys: Vec<_> = c.world().iter().map(|v| v.key).collect();
        assert_eq!(keys.len(), 2);
        let (a, b) = (keys[0], keys[1]);
        let manhattan = (a.x - b.x).abs() + (a.y - b.y).abs() + (a.z - b.z).abs();
        assert_eq!(manhattan, 1, "second voxel shares a face with the first");
    }

    #[test]
    fn test_zoom_out_moves_camera_back() {
        let mut c = InteractionController::default();
        let out = c.apply(GestureLabel::ZoomOut, Some(AIM), 0.0);
        assert_eq!(out.state, InteractionState::Zooming);
        assert!((c.camera().distance() - 10.2).abs() < 1e-5);

        let mut t = 34.0;
        feed(&mut c, GestureLabel::ZoomOut, None, 100, &mut t);
        assert_eq!(c.camera().distance(), 20.0);
    }

    #[test]
    fn test_zoom_frame_keeps_previous_cursor() {
        let mut c = InteractionController::default();
        let before = c.apply(GestureLabel::OpenPalm, Some(AIM), 0.0).cursor;
        assert!(before.is_some());
        let during = c.apply(GestureLabel::ZoomIn, None, 34.0).cursor;
        assert_eq!(during, before);
    }

    #[test]
    fn test_rotation_hides_cursor_and_accumulates() {
        let mut c = InteractionController::default();
        let out = c.apply(GestureLabel::Closed, Some(Vec3::new(0.5, 0.5, 0.0)), 0.0);
        assert!(out.hidden_cursor);
        assert_eq!(out.cursor, None);
        assert_eq!(c.camera().rotation(), (0.0, 0.0), "entry only anchors");

        c.apply(GestureLabel::Closed, Some(Vec3::new(0.4, 0.5, 0.0)), 34.0);
        let (rx, ry) = c.camera().rotation();
        // Pointer moved left in image space, right in mirrored NDC: +0.2.
        assert!((ry - 0.2 * 3.5).abs() < 1e-5, "ry = {}", ry);
        assert_eq!(rx, 0.0);
    }

    #[test]
    fn test_victory_hold_undoes_last_placement() {
        let mut c = InteractionController::default();
        let mut t = 0.0;
        feed(&mut c, GestureLabel::Pinch, Some(AIM), 70, &mut t);
        assert_eq!(c.world().len(), 1);

        feed(&mut c, GestureLabel::OpenPalm, Some(AIM), 3, &mut t);
        let outs = feed(&mut c, GestureLabel::Victory, Some(AIM), 70, &mut t);
        assert!(c.world().is_empty());
        assert_eq!(c.state(), InteractionState::UndoComplete);
        assert_eq!(outs.iter().filter(|o| o.pulse).count(), 1);
    }

    #[test]
    fn test_undo_on_empty_log_completes_without_pulse() {
        let mut c = InteractionController::default();
        let mut t = 0.0;
        let outs = feed(&mut c, GestureLabel::Victory, Some(AIM), 70, &mut t);
        assert_eq!(c.state(), InteractionState::UndoComplete);
        assert!(outs.iter().all(|o| !o.pulse));
    }

    #[test]
    fn test_no_pointer_means_no_placement() {
        let mut c = InteractionController::default();
        let mut t = 0.0;
        let outs = feed(&mut c, GestureLabel::Pinch, None, 80, &mut t);
        assert!(c.world().is_empty());
        assert_eq!(c.state(), InteractionState::DrawWait);
        assert!(outs.iter().all(|o| o.cursor.is_none()));
    }

    #[test]
    fn test_swipes_cycle_palette() {
        let mut c = InteractionController::default();
        c.apply(GestureLabel::SwipeRight, Some(AIM), 0.0);
        assert_eq!(c.current_color(), PALETTE[1]);
        c.apply(GestureLabel::SwipeLeft, Some(AIM), 34.0);
        c.apply(GestureLabel::SwipeLeft, Some(AIM), 68.0);
        assert_eq!(c.current_color(), PALETTE[PALETTE.len() - 1]);
    }

    #[test]
    fn test_remove_at_cursor_removes_hit_voxel() {
        let mut c = InteractionController::default();
        c.apply(GestureLabel::OpenPalm, Some(AIM), 0.0);
        assert!(c.place_at_cursor());
        let placed = c.world().iter().next().map(|v| v.key);
        assert!(c.remove_at_cursor());
        assert!(c.world().is_empty(), "removed {:?}", placed);
        assert!(!c.remove_at_cursor(), "floor target has nothing to remove");
    }

    #[test]
    fn test_reset_clears_world_and_rotation() {
        let mut c = InteractionController::default();
        c.apply(GestureLabel::OpenPalm, Some(AIM), 0.0);
        c.place_at_cursor();
        c.apply(GestureLabel::Closed, Some(Vec3::new(0.5, 0.5, 0.0)), 34.0);
        c.apply(GestureLabel::Closed, Some(Vec3::new(0.3, 0.3, 0.0)), 68.0);
        c.reset();
        assert!(c.world().is_empty());
        assert_eq!(c.world().undo_depth(), 0);
        assert_eq!(c.camera().rotation(), (0.0, 0.0));
    }

    #[test]
    fn test_snapshot_round_trip_through_controller() {
        let mut c = InteractionController::default();
        c.apply(GestureLabel::OpenPalm, Some(AIM), 0.0);
        c.place_at_cursor();
        c.place_at_cursor();
        let json = c.export_json().unwrap();

        let mut other = InteractionController::default();
        assert_eq!(other.load_snapshot(&json).unwrap(), 2);
        assert_eq!(other.export_snapshot(), c.export_snapshot());

        assert!(other.load_snapshot("not json").is_err());
        assert!(other.world().is_empty(), "failed load leaves the world empty");
    }

    #[test]
    fn test_status_sexp_fields() {
        let c = InteractionController::default();
        let s = c.status_sexp();
        assert!(s.starts_with("(:state :idle"));
        assert!(s.contains(":voxels 0"));
        assert!(s.contains(":color \"#4caf50\""));
        assert!(s.contains(":cursor nil"));
    }
}
