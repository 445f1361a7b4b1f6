//! Latitude/longitude sphere mesh for the planet.

use std::f32::consts::{PI, TAU};

use crate::backend::MeshData;

/// Generate a UV sphere of `radius` with `width_segments` around the equator
/// and `height_segments` from pole to pole.
///
/// UVs are equirectangular with `v = 0` at the north pole, matching the first
/// row of an uploaded image. Triangles wind counter-clockwise seen from
/// outside; the degenerate triangles at the poles are skipped.
pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);

    let columns = width_segments + 1;
    let rows = height_segments + 1;
    let vertex_count = (columns * rows) as usize;

    let mut mesh = MeshData {
        positions: Vec::with_capacity(vertex_count),
        normals: Vec::with_capacity(vertex_count),
        uvs: Vec::with_capacity(vertex_count),
        indices: Vec::new(),
    };

    for iy in 0..rows {
        let v = iy as f32 / height_segments as f32;
        let theta = v * PI;
        for ix in 0..columns {
            let u = ix as f32 / width_segments as f32;
            let phi = u * TAU;

            let normal = [
                -phi.cos() * theta.sin(),
                theta.cos(),
                phi.sin() * theta.sin(),
            ];
            mesh.positions
                .push([normal[0] * radius, normal[1] * radius, normal[2] * radius]);
            mesh.normals.push(normal);
            mesh.uvs.push([u, v]);
        }
    }

    let index = |ix: u32, iy: u32| iy * columns + ix;
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = index(ix + 1, iy);
            let b = index(ix, iy);
            let c = index(ix, iy + 1);
            let d = index(ix + 1, iy + 1);

            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_vertex_and_triangle_counts() {
        let mesh = uv_sphere(1.0, 32, 32);
        assert_eq!(mesh.vertex_count(), 33 * 33);
        // Two triangles per quad, minus one per quad in the polar rows.
        assert_eq!(mesh.triangle_count(), 32 * 32 * 2 - 2 * 32);
        assert_eq!(mesh.normals.len(), mesh.vertex_count());
        assert_eq!(mesh.uvs.len(), mesh.vertex_count());
    }

    #[test]
    fn test_vertices_on_radius() {
        let mesh = uv_sphere(2.5, 16, 12);
        for p in &mesh.positions {
            let len = Vec3::from_array(*p).length();
            assert!((len - 2.5).abs() < 1e-5, "vertex off sphere: length = {len}");
        }
    }

    #[test]
    fn test_indices_valid() {
        let mesh = uv_sphere(1.0, 32, 32);
        let n = mesh.vertex_count() as u32;
        assert!(mesh.indices.iter().all(|&i| i < n));
    }

    #[test]
    fn test_uvs_in_range_and_poles() {
        let mesh = uv_sphere(1.0, 8, 8);
        for uv in &mesh.uvs {
            assert!((0.0..=1.0).contains(&uv[0]) && (0.0..=1.0).contains(&uv[1]));
        }
        // First row is the north pole.
        assert!((mesh.positions[0][1] - 1.0).abs() < 1e-6);
        assert_eq!(mesh.uvs[0][1], 0.0);
    }

    #[test]
    fn test_winding_faces_outward() {
        let mesh = uv_sphere(1.0, 32, 32);
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from_array(mesh.positions[i as usize]));
            let face_normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(
                face_normal.dot(centroid) > 0.0,
                "triangle {tri:?} faces inward"
            );
        }
    }
}
