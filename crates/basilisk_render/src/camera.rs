//! # Camera & Frustum
//!
//! View/projection matrices and the six world-space frustum planes. The
//! orchestrator recomputes these once per frame; everything downstream
//! consumes them as plain values.

use glam::{Mat4, Vec3, Vec4, Vec4Swizzles};

/// Six world-space frustum planes as `(normal, d)` with
/// `dot(plane.xyz, p) + plane.w >= 0` inside.
///
/// Order: left, right, bottom, top, near, far.
#[derive(Clone, Copy, Debug)]
pub struct Frustum {
    /// The planes.
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extracts the planes from a view-projection matrix (Gribb-Hartmann),
    /// assuming the [0, 1] clip depth convention.
    #[must_use]
    pub fn from_matrix(view_proj: Mat4) -> Self {
        let r0 = view_proj.row(0);
        let r1 = view_proj.row(1);
        let r2 = view_proj.row(2);
        let r3 = view_proj.row(3);
        let normalize = |p: Vec4| {
            let len = p.xyz().length();
            if len > f32::EPSILON {
                p / len
            } else {
                p
            }
        };
        Self {
            planes: [
                normalize(r3 + r0), // left
                normalize(r3 - r0), // right
                normalize(r3 + r1), // bottom
                normalize(r3 - r1), // top
                normalize(r2),      // near (z >= 0)
                normalize(r3 - r2), // far
            ],
        }
    }

    /// Conservative sphere test: false only when the sphere is entirely
    /// outside at least one plane.
    #[inline]
    #[must_use]
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.xyz().dot(center) + plane.w >= -radius)
    }
}

/// Per-frame camera state: matrices plus the world-space frustum.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    /// World-to-view matrix.
    pub view: Mat4,
    /// View-to-clip matrix ([0, 1] depth).
    pub proj: Mat4,
    /// `proj * view`, the matrix the pipeline actually multiplies by.
    pub view_proj: Mat4,
    /// World-space frustum extracted from `view_proj`.
    pub frustum: Frustum,
    /// World-space camera position, for depth sorting.
    pub eye: Vec3,
}

impl Camera {
    /// Builds a camera from view and projection matrices.
    #[must_use]
    pub fn new(view: Mat4, proj: Mat4) -> Self {
        let view_proj = proj * view;
        Self {
            view,
            proj,
            view_proj,
            frustum: Frustum::from_matrix(view_proj),
            eye: view.inverse().w_axis.xyz(),
        }
    }

    /// A right-handed perspective look-at camera with [0, 1] depth.
    #[must_use]
    pub fn perspective(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y_radians: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let view = Mat4::look_at_rh(eye, target, up);
        let proj = Mat4::perspective_rh(fov_y_radians, aspect, near, far);
        Self::new(view, proj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_camera() -> Camera {
        Camera::perspective(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            Vec3::Y,
            std::f32::consts::FRAC_PI_3,
            16.0 / 9.0,
            0.1,
            100.0,
        )
    }

    #[test]
    fn test_sphere_in_front_is_inside() {
        let camera = test_camera();
        assert!(camera.frustum.intersects_sphere(Vec3::ZERO, 1.0));
    }

    #[test]
    fn test_sphere_behind_camera_is_outside() {
        let camera = test_camera();
        assert!(!camera.frustum.intersects_sphere(Vec3::new(0.0, 0.0, 50.0), 1.0));
    }

    #[test]
    fn test_sphere_straddling_plane_is_kept() {
        let camera = test_camera();
        // Center outside the left plane but the radius reaches in.
        assert!(camera.frustum.intersects_sphere(Vec3::new(-20.0, 0.0, -10.0), 30.0));
    }

    #[test]
    fn test_eye_recovered_from_view() {
        let camera = test_camera();
        assert!((camera.eye - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-4);
    }
}
