//! Voxel target resolution: which cell would the next place/remove act on.
//!
//! A ray through the pointer is tested against every placed voxel first;
//! the nearest hit stacks the candidate on the struck face. Otherwise the
//! ray is intersected with the finite floor grid and the candidate lands
//! on top of whatever already occupies that column.

use glam::Vec3;
use tracing::trace;

use super::voxel::{VoxelKey, VoxelWorld};

/// A ray in scene-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction.
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self {
            origin,
            dir: dir.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }
}

/// Resolved cursor target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Ray struck an existing voxel; `cell` is the neighbor across the hit face.
    Stack { hit: VoxelKey, cell: VoxelKey },
    /// Ray reached the floor; `cell` is the first free cell of that column.
    Floor { cell: VoxelKey },
}

impl Target {
    /// Cell the next placement would occupy.
    pub fn cell(&self) -> VoxelKey {
        match self {
            Self::Stack { cell, .. } | Self::Floor { cell } => *cell,
        }
    }

    /// Existing voxel under the pointer, if any.
    pub fn hit_voxel(&self) -> Option<VoxelKey> {
        match self {
            Self::Stack { hit, .. } => Some(*hit),
            Self::Floor { .. } => None,
        }
    }
}

/// Slab-method ray/AABB intersection. Returns the entry distance and the
/// axis (0 = x, 1 = y, 2 = z) of the entered face, or None on a miss or
/// when the origin is inside the box.
pub fn ray_aabb_entry(ray: &Ray, min: Vec3, max: Vec3) -> Option<(f32, usize)> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut enter_axis = 0;

    for axis in 0..3 {
        let o = ray.origin[axis];
        let d = ray.dir[axis];
        let (lo, hi) = (min[axis], max[axis]);

        if d.abs() < 1e-8 {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let (mut t0, mut t1) = ((lo - o) * inv, (hi - o) * inv);
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        if t0 > t_enter {
            t_enter = t0;
            enter_axis = axis;
        }
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }

    if t_enter < 0.0 || t_exit < 0.0 {
        return None;
    }
    Some((t_enter, enter_axis))
}

/// Floor grid bounds.
#[derive(Debug, Clone)]
pub struct GroundConfig {
    /// Floor spans cells `-half_extent .. half_extent` on x and z.
    pub half_extent: i32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self { half_extent: 10 }
    }
}

/// Raycasting target resolver.
#[derive(Debug, Clone, Default)]
pub struct TargetResolver {
    pub config: GroundConfig,
}

impl TargetResolver {
    pub fn new(config: GroundConfig) -> Self {
        Self { config }
    }

    /// Resolve the target under `ray`, or None when nothing valid is hit.
    pub fn resolve(&self, world: &VoxelWorld, ray: &Ray) -> Option<Target> {
        if let Some((hit, t, axis)) = Self::nearest_voxel(world, ray) {
            let step = if ray.dir[axis] > 0.0 { -1 } else { 1 };
            let cell = match axis {
                0 => hit.offset(step, 0, 0),
                1 => hit.offset(0, step, 0),
                _ => hit.offset(0, 0, step),
            }?;
            trace!("Ray hit voxel {} at t={:.3}, candidate {}", hit, t, cell);
            if cell.y < 0 {
                return None;
            }
            return Some(Target::Stack { hit, cell });
        }
        self.floor_cell(world, ray).map(|cell| Target::Floor { cell })
    }

    fn nearest_voxel(world: &VoxelWorld, ray: &Ray) -> Option<(VoxelKey, f32, usize)> {
        world
            .iter()
            .filter_map(|v| {
                let (min, max) = v.key.bounds();
                ray_aabb_entry(ray, min, max).map(|(t, axis)| (v.key, t, axis))
            })
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Floor intersection, lifted to the first free layer of its column.
    pub(crate) fn floor_cell(&self, world: &VoxelWorld, ray: &Ray) -> Option<VoxelKey> {
        if ray.dir.y.abs() < 1e-8 {
            return None;
        }
        let t = -ray.origin.y / ray.dir.y;
        if t < 0.0 {
            return None;
        }
        let p = ray.at(t);
        let x = p.x.floor() as i32;
        let z = p.z.floor() as i32;
        let h = self.config.half_extent;
        if x < -h || x >= h || z < -h || z >= h {
            return None;
        }
        let y = match world.column_top(x, z) {
            Some(top) => top.checked_add(1)?,
            None => 0,
        };
        Some(VoxelKey::new(x, y, z))
    }
}

// ── Tests ──────────────────────────────────────────────────
