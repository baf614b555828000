//! Latitude/longitude band sphere generation for celestial body rendering.

use glam::Vec3;

/// A triangulated sphere produced by [`generate_sphere`].
pub struct SphereMesh {
    /// Vertex positions, `radius` away from the origin.
    pub positions: Vec<Vec3>,
    /// Texture coordinates per vertex, both axes flipped to match image convention.
    pub uvs: Vec<[f32; 2]>,
    /// Normal vectors (unit length, equal to `position / radius`).
    pub normals: Vec<Vec3>,
    /// Triangle indices into the vertex rows.
    pub indices: Vec<u16>,
}

impl SphereMesh {
    /// Number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Generate a sphere mesh from latitude and longitude band counts.
///
/// Vertices are emitted row-major, outer loop over latitude (pole to pole),
/// inner loop over longitude (full revolution), so the vertex at
/// `(lat, lon)` lives at index `lat * (long_bands + 1) + lon`. Each quad
/// between adjacent bands becomes two triangles. The triangles wind
/// clockwise when viewed from outside the sphere, so pipelines drawing this
/// mesh keep face culling disabled.
///
/// Pure function: identical inputs yield bit-identical meshes.
pub fn generate_sphere(radius: f32, lat_bands: u32, long_bands: u32) -> SphereMesh {
    let vertex_count = ((lat_bands + 1) * (long_bands + 1)) as usize;
    let mut positions = Vec::with_capacity(vertex_count);
    let mut uvs = Vec::with_capacity(vertex_count);
    let mut normals = Vec::with_capacity(vertex_count);

    for lat in 0..=lat_bands {
        let theta = lat as f32 * std::f32::consts::PI / lat_bands as f32;
        let sin_theta = theta.sin();
        let cos_theta = theta.cos();

        for lon in 0..=long_bands {
            let phi = lon as f32 * std::f32::consts::TAU / long_bands as f32;
            let direction = Vec3::new(
                phi.cos() * sin_theta,
                cos_theta,
                phi.sin() * sin_theta,
            );

            positions.push(radius * direction);
            normals.push(direction);
            uvs.push([
                1.0 - lon as f32 / long_bands as f32,
                1.0 - lat as f32 / lat_bands as f32,
            ]);
        }
    }

    let mut indices = Vec::with_capacity((lat_bands * long_bands * 6) as usize);
    for lat in 0..lat_bands {
        for lon in 0..long_bands {
            let first = (lat * (long_bands + 1) + lon) as u16;
            let second = first + long_bands as u16 + 1;

            indices.extend_from_slice(&[first, second, first + 1]);
            indices.extend_from_slice(&[second, second + 1, first + 1]);
        }
    }

    SphereMesh {
        positions,
        uvs,
        normals,
        indices,
    }
}
