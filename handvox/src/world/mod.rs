//! Voxel scene: grid storage, undo log, raycast targeting and snapshots.

pub mod snapshot;
pub mod target;
pub mod voxel;

pub use snapshot::{SnapshotError, SnapshotRecord};
pub use target::{GroundConfig, Ray, Target, TargetResolver};
pub use voxel::{Color, UndoAction, Voxel, VoxelKey, VoxelWorld};
