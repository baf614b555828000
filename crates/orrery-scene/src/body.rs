//! Celestial body descriptions and their time-driven transforms.

use glam::{Mat4, Vec3};

/// A circular orbit in the XZ plane around the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orbit {
    /// Orbit radius in scene units.
    pub radius: f32,
    /// Angular speed in radians per second.
    pub angular_speed: f32,
}

impl Orbit {
    /// Position on the orbit at the given elapsed time.
    ///
    /// Angle zero puts the body at `(radius, 0, 0)`; the body then sweeps
    /// through positive Z.
    pub fn position_at(&self, elapsed_seconds: f32) -> Vec3 {
        let angle = elapsed_seconds * self.angular_speed;
        Vec3::new(
            self.radius * angle.cos(),
            0.0,
            self.radius * angle.sin(),
        )
    }
}

/// A body in the scene: sphere tessellation parameters plus the per-frame
/// transform inputs. The GPU mesh and texture are owned by the renderer;
/// this struct only names the texture and describes the geometry.
#[derive(Clone, Debug)]
pub struct CelestialBody {
    /// Stable name, also used as the texture cache key.
    pub name: &'static str,
    /// Sphere radius passed to the mesh generator.
    pub radius: f32,
    /// Latitude band count for tessellation.
    pub lat_bands: u32,
    /// Longitude band count for tessellation.
    pub long_bands: u32,
    /// Per-axis scale applied on top of the mesh radius.
    pub scale: Vec3,
    /// Spin around the local vertical axis, radians per second.
    pub spin_rate: f32,
    /// Circular orbit, or `None` for a body fixed at the origin.
    pub orbit: Option<Orbit>,
    /// Image file name resolved against the configured asset directory.
    pub texture_file: &'static str,
}

impl CelestialBody {
    /// World position at the given elapsed time.
    pub fn position_at(&self, elapsed_seconds: f32) -> Vec3 {
        match &self.orbit {
            Some(orbit) => orbit.position_at(elapsed_seconds),
            None => Vec3::ZERO,
        }
    }

    /// Spin angle around the vertical axis at the given elapsed time.
    pub fn spin_angle_at(&self, elapsed_seconds: f32) -> f32 {
        elapsed_seconds * self.spin_rate
    }

    /// Model matrix at the given elapsed time: translation by the orbital
    /// position, then spin around Y, then scale.
    pub fn model_matrix_at(&self, elapsed_seconds: f32) -> Mat4 {
        Mat4::from_translation(self.position_at(elapsed_seconds))
            * Mat4::from_rotation_y(self.spin_angle_at(elapsed_seconds))
            * Mat4::from_scale(self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orbiting_body() -> CelestialBody {
        CelestialBody {
            name: "probe",
            radius: 1.0,
            lat_bands: 8,
            long_bands: 8,
            scale: Vec3::ONE,
            spin_rate: 2.0,
            orbit: Some(Orbit {
                radius: 15.0,
                angular_speed: 1.0,
            }),
            texture_file: "probe.png",
        }
    }

    #[test]
    fn test_orbit_starts_on_positive_x() {
        let body = orbiting_body();
        let pos = body.position_at(0.0);
        assert!((pos - Vec3::new(15.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_orbit_sweeps_through_positive_z() {
        let body = orbiting_body();
        // angular_speed 1.0, so elapsed pi/2 puts the body a quarter turn in.
        let pos = body.position_at(std::f32::consts::FRAC_PI_2);
        assert!((pos - Vec3::new(0.0, 0.0, 15.0)).length() < 1e-4);
    }

    #[test]
    fn test_orbit_stays_in_plane() {
        let body = orbiting_body();
        for i in 0..32 {
            let pos = body.position_at(i as f32 * 0.37);
            assert_eq!(pos.y, 0.0);
            assert!((pos.length() - 15.0).abs() < 1e-4, "orbit radius drifted");
        }
    }

    #[test]
    fn test_body_without_orbit_stays_at_origin() {
        let body = CelestialBody {
            orbit: None,
            ..orbiting_body()
        };
        assert_eq!(body.position_at(0.0), Vec3::ZERO);
        assert_eq!(body.position_at(123.4), Vec3::ZERO);
    }

    #[test]
    fn test_spin_angle_scales_with_time() {
        let body = orbiting_body();
        assert_eq!(body.spin_angle_at(0.0), 0.0);
        assert!((body.spin_angle_at(1.5) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_model_matrix_composition_order() {
        let body = CelestialBody {
            scale: Vec3::new(3.0, 3.0, 3.0),
            ..orbiting_body()
        };
        let t = 0.8;
        let expected = Mat4::from_translation(body.position_at(t))
            * Mat4::from_rotation_y(body.spin_angle_at(t))
            * Mat4::from_scale(body.scale);
        let actual = body.model_matrix_at(t);
        assert!(
            actual.abs_diff_eq(expected, 1e-6),
            "model matrix must be translate * rotate_y * scale"
        );
    }

    #[test]
    fn test_model_matrix_translation_column() {
        let body = orbiting_body();
        let t = 2.1;
        let matrix = body.model_matrix_at(t);
        let translation = matrix.col(3).truncate();
        assert!((translation - body.position_at(t)).length() < 1e-5);
    }
}
