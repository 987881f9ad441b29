//! # Bounding Volumes
//!
//! The per-frame derived bounds an entity carries: oriented box, axis-aligned
//! box, and sphere. These are plain value types recomputed every frame from
//! the entity's transform; nothing here is authoritative scene data.

use glam::{Mat3, Vec3};

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Box center.
    #[inline]
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half extents per axis.
    #[inline]
    #[must_use]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }
}

/// Bounding sphere.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sphere {
    /// Center.
    pub center: Vec3,
    /// Radius.
    pub radius: f32,
}

/// Oriented bounding box: a center plus three half-extent axes (the local
/// box axes scaled by the transform).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Obb {
    /// Box center in world space.
    pub center: Vec3,
    /// Columns are the half-extent vectors along each local axis.
    pub axes: Mat3,
}

impl Obb {
    /// Corner `i` of 8, sign bits of `i` selecting the axis directions.
    #[inline]
    #[must_use]
    pub fn corner(&self, i: usize) -> Vec3 {
        let sx = if i & 1 == 0 { -1.0 } else { 1.0 };
        let sy = if i & 2 == 0 { -1.0 } else { 1.0 };
        let sz = if i & 4 == 0 { -1.0 } else { 1.0 };
        self.center + self.axes.x_axis * sx + self.axes.y_axis * sy + self.axes.z_axis * sz
    }

    /// The tightest AABB containing this box.
    #[must_use]
    pub fn aabb(&self) -> Aabb {
        let extent = self.axes.x_axis.abs() + self.axes.y_axis.abs() + self.axes.z_axis.abs();
        Aabb {
            min: self.center - extent,
            max: self.center + extent,
        }
    }

    /// A sphere containing this box. Exact for orthogonal axes.
    #[must_use]
    pub fn sphere(&self) -> Sphere {
        let radius = (self.axes.x_axis.length_squared()
            + self.axes.y_axis.length_squared()
            + self.axes.z_axis.length_squared())
        .sqrt();
        Sphere {
            center: self.center,
            radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_obb_aabb() {
        let obb = Obb {
            center: Vec3::new(1.0, 2.0, 3.0),
            axes: Mat3::from_diagonal(Vec3::new(0.5, 1.0, 2.0)),
        };
        let aabb = obb.aabb();
        assert_eq!(aabb.min, Vec3::new(0.5, 1.0, 1.0));
        assert_eq!(aabb.max, Vec3::new(1.5, 3.0, 5.0));
        assert_eq!(aabb.center(), obb.center);
    }

    #[test]
    fn test_rotated_obb_aabb_grows() {
        let rotation = Mat3::from_rotation_z(std::f32::consts::FRAC_PI_4);
        let obb = Obb {
            center: Vec3::ZERO,
            axes: rotation * Mat3::from_diagonal(Vec3::ONE),
        };
        let aabb = obb.aabb();
        // A rotated unit box needs sqrt(2) of room in x and y.
        assert!(aabb.max.x > 1.2 && aabb.max.y > 1.2);
    }

    #[test]
    fn test_sphere_contains_corners() {
        let rotation = Mat3::from_rotation_y(0.7);
        let obb = Obb {
            center: Vec3::new(5.0, 0.0, 0.0),
            axes: rotation * Mat3::from_diagonal(Vec3::new(1.0, 2.0, 3.0)),
        };
        let sphere = obb.sphere();
        for i in 0..8 {
            let corner = obb.corner(i);
            assert!((corner - sphere.center).length() <= sphere.radius + 1e-4);
        }
    }
}
