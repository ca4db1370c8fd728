//! Sphere geometry shared by the Earth, cloud, picking and starfield layers.
//!
//! All globe layers must rasterize country borders at the same pixels as the
//! index texture, so they are built from one generator whose texture mapping
//! agrees with [`crate::anchor_position`].

use std::f32::consts::{PI, TAU};

/// Sizes of the globe layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobeParams {
    pub radius: f32,
    pub segments: u32,
    /// Height of the cloud shell above the surface.
    pub cloud_offset: f32,
    pub picking_width_segments: u32,
    pub picking_height_segments: u32,
    pub starfield_radius: f32,
    pub starfield_segments: u32,
}

impl Default for GlobeParams {
    fn default() -> Self {
        Self {
            radius: 0.5,
            segments: 32,
            cloud_offset: 0.003,
            picking_width_segments: 64,
            picking_height_segments: 32,
            starfield_radius: 90.0,
            starfield_segments: 64,
        }
    }
}

/// Indexed triangle list for a UV sphere.
#[derive(Debug, Clone, Default)]
pub struct SphereGeometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl SphereGeometry {
    /// Flip the winding and normals so the sphere is seen from inside.
    #[must_use]
    pub fn inverted(mut self) -> Self {
        for triangle in self.indices.chunks_exact_mut(3) {
            triangle.swap(1, 2);
        }
        for normal in &mut self.normals {
            *normal = normal.map(|c| -c);
        }
        self
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Build a UV sphere centered at the origin.
///
/// Texture `u` runs west to east from longitude -180 and `v` runs from the
/// north pole (`v = 0`, image row 0) to the south pole. Faces are wound
/// counter-clockwise seen from outside.
#[must_use]
pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> SphereGeometry {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);
    let columns = width_segments + 1;
    let rows = height_segments + 1;

    let mut geometry = SphereGeometry {
        positions: Vec::with_capacity((columns * rows) as usize),
        normals: Vec::with_capacity((columns * rows) as usize),
        uvs: Vec::with_capacity((columns * rows) as usize),
        indices: Vec::with_capacity((width_segments * height_segments * 6) as usize),
    };

    #[allow(clippy::cast_precision_loss)]
    for iy in 0..rows {
        let v = iy as f32 / height_segments as f32;

        // Pole vertices take the middle of their face so the texture is not skewed.
        let u_offset = if iy == 0 {
            0.5 / width_segments as f32
        } else if iy == height_segments {
            -0.5 / width_segments as f32
        } else {
            0.0
        };

        for ix in 0..columns {
            let u = ix as f32 / width_segments as f32;
            let (sin_phi, cos_phi) = (u * TAU).sin_cos();
            let (sin_theta, cos_theta) = (v * PI).sin_cos();

            let normal = [-cos_phi * sin_theta, cos_theta, sin_phi * sin_theta];
            geometry
                .positions
                .push(normal.map(|component| component * radius));
            geometry.normals.push(normal);
            geometry.uvs.push([u + u_offset, v]);
        }
    }

    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * columns + ix + 1;
            let b = iy * columns + ix;
            let c = (iy + 1) * columns + ix;
            let d = (iy + 1) * columns + ix + 1;

            if iy != 0 {
                geometry.indices.extend([a, b, d]);
            }
            if iy != height_segments - 1 {
                geometry.indices.extend([b, c, d]);
            }
        }
    }

    geometry
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use proptest::prelude::*;

    use super::*;
    use crate::dataset::anchor_position;

    #[test]
    fn vertex_and_index_counts() {
        let sphere = uv_sphere(0.5, 64, 32);
        assert_eq!(sphere.vertex_count(), 65 * 33);
        // Two triangles per quad, minus one per pole row.
        assert_eq!(sphere.indices.len(), (64 * 32 * 2 - 64 * 2) * 3);
        assert!(sphere.indices.iter().all(|&i| (i as usize) < sphere.vertex_count()));
    }

    #[test]
    fn texture_center_is_prime_meridian_on_equator() {
        let sphere = uv_sphere(0.5, 64, 32);
        let position = sphere
            .uvs
            .iter()
            .position(|uv| (uv[0] - 0.5).abs() < 1e-6 && (uv[1] - 0.5).abs() < 1e-6)
            .unwrap();
        let vertex = Vec3::from(sphere.positions[position]);
        assert!(vertex.abs_diff_eq(anchor_position(0.0, 0.0, 0.5), 1e-5));
    }

    #[test]
    fn top_row_is_north_pole() {
        let sphere = uv_sphere(1.0, 8, 4);
        for (position, uv) in sphere.positions.iter().zip(&sphere.uvs).take(9) {
            assert!((position[1] - 1.0).abs() < 1e-6);
            assert!(uv[1].abs() < 1e-6);
        }
    }

    #[test]
    fn faces_wind_outward() {
        let sphere = uv_sphere(1.0, 16, 8);
        for triangle in sphere.indices.chunks_exact(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]]
                .map(|i| Vec3::from(sphere.positions[i as usize]));
            let face_normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(face_normal.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn inverted_faces_wind_inward() {
        let sphere = uv_sphere(1.0, 16, 8).inverted();
        for triangle in sphere.indices.chunks_exact(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]]
                .map(|i| Vec3::from(sphere.positions[i as usize]));
            assert!((b - a).cross(c - a).dot(a + b + c) < 0.0);
        }
        for (position, normal) in sphere.positions.iter().zip(&sphere.normals) {
            assert!(Vec3::from(*position).dot(Vec3::from(*normal)) < 0.0);
        }
    }

    proptest! {
        #[test]
        fn vertices_lie_on_the_sphere(radius in 0.1f32..100.0, w in 3u32..48, h in 2u32..24) {
            let sphere = uv_sphere(radius, w, h);
            for (position, normal) in sphere.positions.iter().zip(&sphere.normals) {
                let p = Vec3::from(*position);
                prop_assert!((p.length() - radius).abs() < radius * 1e-5);
                prop_assert!(p.normalize().abs_diff_eq(Vec3::from(*normal), 1e-4));
            }
        }
    }
}
