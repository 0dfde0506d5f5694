//! Orbit camera and pointer-to-ray projection.
//!
//! The camera orbits the scene origin at a fixed elevation; zoom changes
//! the orbit distance. User rotation is applied to the scene, not the
//! camera, so rays are carried back into scene-local space before they are
//! tested against the voxel grid.

use glam::{Mat4, Quat, Vec3};

use super::machine::InteractionConfig;
use crate::world::target::Ray;

const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 100.0;

/// Camera projection parameters.
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Initial orbit distance from the scene origin.
    pub distance: f32,
    /// Vertical field of view in degrees.
    pub fov_y_deg: f32,
    /// Viewport width / height.
    pub aspect: f32,
    /// Orbit elevation above the floor plane, in degrees.
    pub elevation_deg: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: 10.0,
            fov_y_deg: 60.0,
            aspect: 16.0 / 9.0,
            elevation_deg: 35.0,
        }
    }
}

/// Convert a normalized image-space pointer into NDC. The x axis is
/// flipped for the mirrored camera view.
pub fn ndc_from_pointer(p: Vec3) -> (f32, f32) {
    ((1.0 - p.x) * 2.0 - 1.0, 1.0 - 2.0 * p.y)
}

/// Camera state plus accumulated scene rotation.
#[derive(Debug, Clone)]
pub struct CameraRig {
    pub config: CameraConfig,
    distance: f32,
    /// Scene rotation about X (radians).
    rot_x: f32,
    /// Scene rotation about Y (radians).
    rot_y: f32,
}

impl CameraRig {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            distance: config.distance,
            config,
            rot_x: 0.0,
            rot_y: 0.0,
        }
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn rotation(&self) -> (f32, f32) {
        (self.rot_x, self.rot_y)
    }

    /// Move the camera by `delta`, clamped to the configured range.
    pub fn zoom(&mut self, delta: f32, limits: &InteractionConfig) -> f32 {
        self.distance = (self.distance + delta).clamp(limits.min_distance, limits.max_distance);
        self.distance
    }

    /// Accumulate a relative scene rotation.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.rot_y += dx;
        self.rot_x += dy;
    }

    pub fn reset_rotation(&mut self) {
        self.rot_x = 0.0;
        self.rot_y = 0.0;
    }

    /// Camera position in world space.
    pub fn eye(&self) -> Vec3 {
        let e = self.config.elevation_deg.to_radians();
        Vec3::new(0.0, self.distance * e.sin(), self.distance * e.cos())
    }

    /// Combined projection * view matrix for the current orbit.
    pub fn view_proj(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_rh(
            self.config.fov_y_deg.to_radians(),
            self.config.aspect,
            NEAR_PLANE,
            FAR_PLANE,
        );
        projection * view
    }

    /// Ray through an NDC point, expressed in scene-local coordinates.
    pub fn ray_from_ndc(&self, ndc_x: f32, ndc_y: f32) -> Ray {
        let inv = self.view_proj().inverse();
        let near = inv.project_point3(Vec3::new(ndc_x, ndc_y, 0.0));
        let far = inv.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        let dir = (far - near).normalize_or_zero();

        let to_scene = self.scene_rotation().inverse();
        Ray::new(to_scene * self.eye(), to_scene * dir)
    }

    /// Rotation applied to the scene (XYZ Euler order, no roll).
    fn scene_rotation(&self) -> Quat {
        Quat::from_rotation_x(self.rot_x) * Quat::from_rotation_y(self.rot_y)
    }
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}
