//! Persisted form of the voxel set.
//!
//! A snapshot is a JSON array of `{ "x", "y", "z", "color" }` records, one
//! per voxel, with integer cell coordinates and `#rrggbb` colors. Loading
//! is lenient per entry (bad records are skipped) but strict about the
//! overall shape.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::voxel::{Color, VoxelKey, VoxelWorld};

/// Snapshot decode failures.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("snapshot must be a JSON array of voxel records")]
    NotAList,
}

/// One exported voxel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub color: String,
}

/// Largest cell coordinate magnitude accepted on load. Keeps neighbor
/// arithmetic in range and cell bounds exact in `f32`.
pub const MAX_CELL_COORD: i32 = 1 << 20;

/// Record shape accepted on load: float coordinates are floored to their
/// cell, colors may be `#rrggbb` strings or packed integers.
#[derive(Debug, Deserialize)]
struct LooseRecord {
    x: f64,
    y: f64,
    z: f64,
    color: serde_json::Value,
}

impl LooseRecord {
    fn into_voxel(self) -> Option<(VoxelKey, Color)> {
        let cell = |v: f64| {
            let v = v.floor();
            let limit = f64::from(MAX_CELL_COORD);
            (v.is_finite() && v >= -limit && v < limit).then_some(v as i32)
        };
        let key = VoxelKey::new(cell(self.x)?, cell(self.y)?, cell(self.z)?);
        if key.y < 0 {
            return None;
        }
        let color = match &self.color {
            serde_json::Value::String(s) => Color::parse(s)?,
            serde_json::Value::Number(n) => Color(u32::try_from(n.as_u64()?).ok()? & 0x00ff_ffff),
            _ => return None,
        };
        Some((key, color))
    }
}

/// Export every voxel, ordered by key for stable output.
pub fn export(world: &VoxelWorld) -> Vec<SnapshotRecord> {
    let mut voxels: Vec<_> = world.iter().collect();
    voxels.sort_by_key(|v| v.key);
    voxels
        .into_iter()
        .map(|v| SnapshotRecord {
            x: v.key.x,
            y: v.key.y,
            z: v.key.z,
            color: v.color.hex(),
        })
        .collect()
}

/// Export as a JSON string.
pub fn export_json(world: &VoxelWorld) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(&export(world))?)
}

/// Restore voxels from JSON into `world` (expected to be empty). Returns
/// the number of voxels created; malformed or duplicate entries are skipped.
pub fn restore_json(world: &mut VoxelWorld, data: &str) -> Result<usize, SnapshotError> {
    let value: serde_json::Value = serde_json::from_str(data)?;
    let serde_json::Value::Array(entries) = value else {
        return Err(SnapshotError::NotAList);
    };

    let mut created = 0;
    for (i, entry) in entries.into_iter().enumerate() {
        let parsed = serde_json::from_value::<LooseRecord>(entry)
            .ok()
            .and_then(LooseRecord::into_voxel);
        match parsed {
            Some((key, color)) if world.restore(key, color) => created += 1,
            Some((key, _)) => warn!("Snapshot entry {} duplicates {}, skipped", i, key),
            None => warn!("Snapshot entry {} malformed, skipped", i),
        }
    }
    Ok(created)
}
