//! # Mesh Data
//!
//! Static triangle lists consumed by the rasterizer. Meshes arrive from
//! collaborators (asset loaders are out of scope); the constructors here
//! exist for tests and the demo scene.

use glam::{Vec2, Vec3, Vec4};

/// One mesh vertex: position, normal, color, texture coordinates.
#[derive(Clone, Copy, Debug)]
pub struct Vertex {
    /// Object-space position.
    pub position: Vec3,
    /// Object-space normal.
    pub normal: Vec3,
    /// Vertex color, multiplied into the material color.
    pub color: Vec4,
    /// Texture coordinates.
    pub uv: Vec2,
}

/// A static triangle list. `vertices.len()` is always a multiple of three;
/// triangle *i* is `vertices[3*i .. 3*i+3]`.
pub struct Mesh {
    vertices: Vec<Vertex>,
    local_min: Vec3,
    local_max: Vec3,
}

impl Mesh {
    /// Builds a mesh from a triangle list, computing the local AABB once.
    ///
    /// # Panics
    ///
    /// Panics if the vertex count is not a multiple of three.
    #[must_use]
    pub fn from_vertices(vertices: Vec<Vertex>) -> Self {
        assert!(
            vertices.len() % 3 == 0,
            "mesh vertices must form whole triangles"
        );
        let mut local_min = Vec3::splat(f32::MAX);
        let mut local_max = Vec3::splat(f32::MIN);
        for vertex in &vertices {
            local_min = local_min.min(vertex.position);
            local_max = local_max.max(vertex.position);
        }
        if vertices.is_empty() {
            local_min = Vec3::ZERO;
            local_max = Vec3::ZERO;
        }
        Self {
            vertices,
            local_min,
            local_max,
        }
    }

    /// The triangle list.
    #[inline]
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Number of triangles.
    #[inline]
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Object-space AABB minimum corner.
    #[inline]
    #[must_use]
    pub const fn local_min(&self) -> Vec3 {
        self.local_min
    }

    /// Object-space AABB maximum corner.
    #[inline]
    #[must_use]
    pub const fn local_max(&self) -> Vec3 {
        self.local_max
    }

    /// An axis-aligned unit quad in the XY plane, facing +Z, centered at the
    /// origin, scaled by `size`.
    #[must_use]
    pub fn quad(size: f32) -> Self {
        let h = size * 0.5;
        let n = Vec3::Z;
        let c = Vec4::ONE;
        let v = |x: f32, y: f32, u: f32, w: f32| Vertex {
            position: Vec3::new(x, y, 0.0),
            normal: n,
            color: c,
            uv: Vec2::new(u, w),
        };
        Self::from_vertices(vec![
            v(-h, -h, 0.0, 1.0),
            v(-h, h, 0.0, 0.0),
            v(h, h, 1.0, 0.0),
            v(-h, -h, 0.0, 1.0),
            v(h, h, 1.0, 0.0),
            v(h, -h, 1.0, 1.0),
        ])
    }

    /// An axis-aligned cube centered at the origin with edge length `size`,
    /// white vertices, per-face normals, and a full UV square per face.
    #[must_use]
    pub fn cube(size: f32) -> Self {
        let h = size * 0.5;
        let mut vertices = Vec::with_capacity(36);
        // (normal, tangent u, tangent v) per face.
        let faces = [
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        ];
        for (normal, tu, tv) in faces {
            let center = normal * h;
            let corner = |su: f32, sv: f32| center + tu * (su * h) + tv * (sv * h);
            let vertex = |su: f32, sv: f32| Vertex {
                position: corner(su, sv),
                normal,
                color: Vec4::ONE,
                uv: Vec2::new(su * 0.5 + 0.5, 0.5 - sv * 0.5),
            };
            // Two triangles, wound consistently when seen down the normal.
            vertices.extend_from_slice(&[
                vertex(-1.0, -1.0),
                vertex(-1.0, 1.0),
                vertex(1.0, 1.0),
                vertex(-1.0, -1.0),
                vertex(1.0, 1.0),
                vertex(1.0, -1.0),
            ]);
        }
        Self::from_vertices(vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_shape() {
        let cube = Mesh::cube(2.0);
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.local_min(), Vec3::splat(-1.0));
        assert_eq!(cube.local_max(), Vec3::splat(1.0));
    }

    #[test]
    fn test_quad_bounds() {
        let quad = Mesh::quad(4.0);
        assert_eq!(quad.triangle_count(), 2);
        assert_eq!(quad.local_min(), Vec3::new(-2.0, -2.0, 0.0));
        assert_eq!(quad.local_max(), Vec3::new(2.0, 2.0, 0.0));
    }

    #[test]
    #[should_panic(expected = "whole triangles")]
    fn test_partial_triangle_rejected() {
        let v = Vertex {
            position: Vec3::ZERO,
            normal: Vec3::Z,
            color: Vec4::ONE,
            uv: Vec2::ZERO,
        };
        let _ = Mesh::from_vertices(vec![v, v]);
    }
}
