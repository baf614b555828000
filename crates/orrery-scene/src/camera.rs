//! Fixed look-at camera producing view and projection matrices.

use glam::{Mat4, Vec3};

/// A camera with a fixed eye, target, and up vector, constant across the
/// run. The view matrix is recomputed every frame from these three values;
/// no caching.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Eye position in scene units.
    pub eye: Vec3,
    /// Look-at target.
    pub target: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Near clip plane distance (always positive).
    pub near: f32,
    /// Far clip plane distance (always positive, > near).
    pub far: f32,
}

impl Camera {
    /// Compute the view matrix from the eye/target/up triple.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// Compute the perspective projection matrix with reverse-Z.
    ///
    /// Near and far are swapped in the projection so the near plane maps to
    /// depth 1 and the far plane to depth 0; the depth buffer clears to 0
    /// and compares GreaterEqual.
    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y,
            aspect_ratio,
            self.far,  // swapped: far as "near" parameter
            self.near, // swapped: near as "far" parameter
        )
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 70.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: std::f32::consts::FRAC_PI_4, // 45 degrees
            near: 0.1,
            far: 1000.0,
        }
    }
}
