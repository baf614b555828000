//! The solar scene: two bodies, a fixed camera, and one point light.

use glam::Vec3;

use crate::body::{CelestialBody, Orbit};
use crate::camera::Camera;
use crate::clock::SceneClock;

/// Light parameters shared by every draw in the scene.
#[derive(Clone, Copy, Debug)]
pub struct LightSettings {
    /// Point light position, passed to the shader as-is.
    pub position: Vec3,
    /// Ambient light color.
    pub ambient: Vec3,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            ambient: Vec3::splat(0.5),
        }
    }
}

/// Complete scene state: bodies in draw order, camera, light, and clock.
pub struct Scene {
    /// The sun, fixed at the origin.
    pub sun: CelestialBody,
    /// The earth, orbiting the sun.
    pub earth: CelestialBody,
    /// Fixed look-at camera.
    pub camera: Camera,
    /// Point light and ambient term.
    pub light: LightSettings,
    /// Elapsed scene time.
    pub clock: SceneClock,
}

impl Scene {
    /// Build the sun-and-earth scene with its fixed constants.
    pub fn solar() -> Self {
        let sun = CelestialBody {
            name: "sun",
            radius: 3.0,
            lat_bands: 30,
            long_bands: 30,
            scale: Vec3::splat(3.0),
            spin_rate: 0.5,
            orbit: None,
            texture_file: "sun.png",
        };
        let earth = CelestialBody {
            name: "earth",
            radius: 1.0,
            lat_bands: 30,
            long_bands: 30,
            scale: Vec3::ONE,
            spin_rate: 2.0,
            orbit: Some(Orbit {
                radius: 15.0,
                angular_speed: 1.0,
            }),
            texture_file: "earth.png",
        };

        Self {
            sun,
            earth,
            camera: Camera::default(),
            light: LightSettings::default(),
            clock: SceneClock::new(),
        }
    }

    /// Advance the scene clock by one frame.
    pub fn update(&mut self, delta_seconds: f64) {
        self.clock.advance(delta_seconds);
    }

    /// Bodies in their fixed draw order: sun first, then earth.
    pub fn bodies(&self) -> [&CelestialBody; 2] {
        [&self.sun, &self.earth]
    }
}
