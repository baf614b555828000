//! Procedural sphere tessellation: latitude/longitude band meshes for celestial bodies.

pub mod sphere;

pub use sphere::{SphereMesh, generate_sphere};
