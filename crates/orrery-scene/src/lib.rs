//! Scene state for the solar scene: celestial bodies, clock, camera, and light parameters.

pub mod body;
pub mod camera;
pub mod clock;
pub mod scene;

pub use body::{CelestialBody, Orbit};
pub use camera::Camera;
pub use clock::SceneClock;
pub use scene::{LightSettings, Scene};
