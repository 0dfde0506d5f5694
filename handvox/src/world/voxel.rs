//! Voxel world and undo log.
//!
//! Voxels live on an integer cell grid; cell `(x, y, z)` is the unit cube
//! spanning `[x, x+1) × [y, y+1) × [z, z+1)`, so its center sits on the
//! half-integer offset. `y = 0` is the floor layer.

use std::collections::HashMap;
use std::fmt;

use glam::Vec3;
use tracing::{debug, info};

// ── Keys and colors ────────────────────────────────────────

/// Quantized voxel position; unique key in the world map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoxelKey {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl VoxelKey {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Axis-aligned bounds of the cell.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let min = Vec3::new(self.x as f32, self.y as f32, self.z as f32);
        (min, min + Vec3::new(1.0, 1.0, 1.0))
    }

    /// Neighboring cell one step along a unit axis offset. None when the
    /// step leaves the `i32` grid.
    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Option<Self> {
        Some(Self::new(
            self.x.checked_add(dx)?,
            self.y.checked_add(dy)?,
            self.z.checked_add(dz)?,
        ))
    }
}

impl fmt::Display for VoxelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    /// `#rrggbb` form.
    pub fn hex(&self) -> String {
        format!("#{:06x}", self.0 & 0x00ff_ffff)
    }

    /// Parse `#rrggbb`, `rrggbb` or `0xrrggbb`.
    pub fn parse(s: &str) -> Option<Color> {
        let digits = s
            .strip_prefix('#')
            .or_else(|| s.strip_prefix("0x"))
            .unwrap_or(s);
        if digits.len() != 6 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Color)
    }
}

/// A placed unit cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voxel {
    pub key: VoxelKey,
    pub color: Color,
}

// ── Undo log ───────────────────────────────────────────────

/// A reversible world mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoAction {
    Add { key: VoxelKey, color: Color },
    Remove { key: VoxelKey, color: Color },
}

// ── World ──────────────────────────────────────────────────

/// Set of placed voxels plus a chronological undo stack.
#[derive(Debug, Default)]
pub struct VoxelWorld {
    voxels: HashMap<VoxelKey, Color>,
    undo_log: Vec<UndoAction>,
}

impl VoxelWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a voxel. Returns false (no-op) if the cell is occupied.
    pub fn place(&mut self, key: VoxelKey, color: Color) -> bool {
        if self.voxels.contains_key(&key) {
            debug!("Place at {} ignored: occupied", key);
            return false;
        }
        self.voxels.insert(key, color);
        self.undo_log.push(UndoAction::Add { key, color });
        info!("Placed voxel at {} ({})", key, color.hex());
        true
    }

    /// Remove a voxel. Returns false (no-op) if the cell is empty.
    pub fn remove(&mut self, key: VoxelKey) -> bool {
        match self.voxels.remove(&key) {
            Some(color) => {
                self.undo_log.push(UndoAction::Remove { key, color });
                info!("Removed voxel at {}", key);
                true
            }
            None => false,
        }
    }

    /// Invert the most recent mutation. Returns the inverted action, or
    /// None when the log is empty.
    pub fn undo(&mut self) -> Option<UndoAction> {
        let action = self.undo_log.pop()?;
        match action {
            UndoAction::Add { key, .. } => {
                self.voxels.remove(&key);
            }
            UndoAction::Remove { key, color } => {
                self.voxels.insert(key, color);
            }
        }
        info!("Undo: {:?}", action);
        Some(action)
    }

    /// Drop every voxel and the whole undo log.
    pub fn clear(&mut self) {
        self.voxels.clear();
        self.undo_log.clear();
    }

    /// Insert without logging (snapshot restore). Returns false on duplicates.
    pub(crate) fn restore(&mut self, key: VoxelKey, color: Color) -> bool {
        if self.voxels.contains_key(&key) {
            return false;
        }
        self.voxels.insert(key, color);
        true
    }

    pub fn contains(&self, key: VoxelKey) -> bool {
        self.voxels.contains_key(&key)
    }

    pub fn color_at(&self, key: VoxelKey) -> Option<Color> {
        self.voxels.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_log.len()
    }

    /// Iterate over all voxels (unordered).
    pub fn iter(&self) -> impl Iterator<Item = Voxel> + '_ {
        self.voxels.iter().map(|(key, color)| Voxel {
            key: *key,
            color: *color,
        })
    }

    /// Highest occupied layer in the `(x, z)` column.
    pub fn column_top(&self, x: i32, z: i32) -> Option<i32> {
        self.voxels
            .keys()
            .filter(|k| k.x == x && k.z == z)
            .map(|k| k.y)
            .max()
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color(0xff0000);
    const BLUE: Color = Color(0x0000ff);

    fn snapshot(world: &VoxelWorld) -> Vec<Voxel> {
        let mut v: Vec<Voxel> = world.iter().collect();
        v.sort_by_key(|vx| vx.key);
        v
    }

    #[test]
    fn test_place_then_undo_restores_previous_set() {
        let mut w = VoxelWorld::new();
        w.place(VoxelKey::new(0, 0, 0), RED);
        let before = snapshot(&w);

        assert!(w.place(VoxelKey::new(1, 0, 0), BLUE));
        assert_eq!(w.len(), 2);
        w.undo();
        assert_eq!(snapshot(&w), before);
    }

    #[test]
    fn test_remove_then_undo_restores_color() {
        let mut w = VoxelWorld::new();
        let k = VoxelKey::new(2, 1, -3);
        w.place(k, BLUE);
        assert!(w.remove(k));
        assert!(!w.contains(k));

        assert_eq!(w.undo(), Some(UndoAction::Remove { key: k, color: BLUE }));
        assert_eq!(w.color_at(k), Some(BLUE));
    }

    #[test]
    fn test_place_is_idempotent() {
        let mut w = VoxelWorld::new();
        let k = VoxelKey::new(0, 0, 0);
        assert!(w.place(k, RED));
        assert!(!w.place(k, BLUE), "second place must be a no-op");
        assert_eq!(w.undo_depth(), 1);
        assert_eq!(w.color_at(k), Some(RED));
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut w = VoxelWorld::new();
        assert!(!w.remove(VoxelKey::new(5, 5, 5)));
        assert_eq!(w.undo_depth(), 0);
    }

    #[test]
    fn test_undo_empty_log() {
        let mut w = VoxelWorld::new();
        assert_eq!(w.undo(), None);
    }

    #[test]
    fn test_undo_inverts_one_action_per_call() {
        let mut w = VoxelWorld::new();
        w.place(VoxelKey::new(0, 0, 0), RED);
        w.place(VoxelKey::new(0, 1, 0), RED);
        w.undo();
        assert_eq!(w.len(), 1);
        assert!(w.contains(VoxelKey::new(0, 0, 0)));
        assert_eq!(w.undo_depth(), 1);
    }

    #[test]
    fn test_column_top() {
        let mut w = VoxelWorld::new();
        assert_eq!(w.column_top(0, 0), None);
        w.place(VoxelKey::new(0, 0, 0), RED);
        w.place(VoxelKey::new(0, 2, 0), RED);
        w.place(VoxelKey::new(1, 7, 0), RED);
        assert_eq!(w.column_top(0, 0), Some(2));
    }

    #[test]
    fn test_key_geometry() {
        let k = VoxelKey::new(-1, 0, 2);
        assert_eq!(k.bounds(), (Vec3::new(-1.0, 0.0, 2.0), Vec3::new(0.0, 1.0, 3.0)));
        assert_eq!(k.offset(0, 1, 0), Some(VoxelKey::new(-1, 1, 2)));
        assert_eq!(k.to_string(), "-1,0,2");
    }

    #[test]
    fn test_offset_stops_at_grid_edge() {
        assert_eq!(VoxelKey::new(i32::MAX, 0, 0).offset(1, 0, 0), None);
        assert_eq!(VoxelKey::new(0, 0, i32::MIN).offset(0, 0, -1), None);
        assert_eq!(
            VoxelKey::new(0, i32::MAX, 0).offset(0, -1, 0),
            Some(VoxelKey::new(0, i32::MAX - 1, 0))
        );
    }

    #[test]
    fn test_color_hex_round_trip() {
        let c = Color(0x12abef);
        assert_eq!(c.hex(), "#12abef");
        assert_eq!(Color::parse("#12abef"), Some(c));
        assert_eq!(Color::parse("0x12abef"), Some(c));
        assert_eq!(Color::parse("nope"), None);
    }

    #[test]
    fn test_clear() {
        let mut w = VoxelWorld::new();
        w.place(VoxelKey::new(0, 0, 0), RED);
        w.clear();
        assert!(w.is_empty());
        assert_eq!(w.undo_depth(), 0);
    }
}
