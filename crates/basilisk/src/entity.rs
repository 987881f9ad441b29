//! # Entities
//!
//! A pooled mesh instance: transform, material, motion, and the per-frame
//! derived state the renderer consumes (bounds, screen rectangle, tile
//! overlap mask). An entity missing its mesh or material is silently skipped
//! by every phase - unrenderable never means fatal.

use std::sync::Arc;

use basilisk_core::{PoolHeader, Poolable, TileGrid, TileRect};
use basilisk_render::{Camera, DepthMode, Material, Mesh};
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4Swizzles};

use crate::bounds::{Aabb, Obb, Sphere};

const EPS_W: f32 = 1e-6;

/// A pooled renderable entity.
pub struct Entity {
    header: PoolHeader,
    /// Mesh reference; `None` means the entity is skipped.
    pub mesh: Option<Arc<Mesh>>,
    /// Material reference; `None` means the entity is skipped.
    pub material: Option<Arc<Material>>,
    /// Object-to-world transform.
    pub transform: Mat4,
    /// Linear velocity, integrated by the serial physics step.
    pub velocity: Vec3,
    /// Angular velocity in radians/second around the object axes.
    pub angular_velocity: Vec3,
    /// Depth-test/write combination used when drawing.
    pub depth_mode: DepthMode,

    // Derived per frame by `update_bounds`.
    /// World-space oriented bounding box.
    pub world_obb: Obb,
    /// World-space axis-aligned bounding box.
    pub world_aabb: Aabb,
    /// World-space bounding sphere.
    pub world_sphere: Sphere,
    /// Screen-space bounding rectangle, `None` when culled.
    pub screen_rect: Option<TileRect>,
    /// One bit per tile whose rectangle the screen rect overlaps.
    pub tile_mask: u64,
    /// Distance from the camera eye, for depth sorting.
    pub depth_key: f32,
}

impl Entity {
    /// Creates an entity at the identity transform.
    #[must_use]
    pub fn new(mesh: Arc<Mesh>, material: Arc<Material>) -> Self {
        Self {
            header: PoolHeader::new(),
            mesh: Some(mesh),
            material: Some(material),
            transform: Mat4::IDENTITY,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            depth_mode: DepthMode::ReadWrite,
            world_obb: Obb::default(),
            world_aabb: Aabb::default(),
            world_sphere: Sphere::default(),
            screen_rect: None,
            tile_mask: 0,
            depth_key: 0.0,
        }
    }

    /// Serial physics step: integrate angular and linear velocity into the
    /// transform.
    pub fn integrate(&mut self, dt: f32) {
        if self.angular_velocity != Vec3::ZERO {
            let spin = Mat4::from_euler(
                glam::EulerRot::XYZ,
                self.angular_velocity.x * dt,
                self.angular_velocity.y * dt,
                self.angular_velocity.z * dt,
            );
            self.transform = self.transform * spin;
        }
        if self.velocity != Vec3::ZERO {
            self.transform.w_axis += (self.velocity * dt).extend(0.0);
        }
    }

    /// Recomputes world bounds, frustum-culls, projects the screen
    /// rectangle, and derives the tile overlap mask.
    ///
    /// Returns true if the entity will reach at least one tile this frame.
    /// Entities without mesh or material, outside the frustum, or projecting
    /// to an empty rectangle are invisible - they simply don't appear.
    pub fn update_bounds(&mut self, camera: &Camera, grid: &TileGrid) -> bool {
        self.screen_rect = None;
        self.tile_mask = 0;

        let (Some(mesh), Some(_)) = (&self.mesh, &self.material) else {
            return false;
        };

        // OBB = the mesh's local box pushed through the transform.
        let local_center = (mesh.local_min() + mesh.local_max()) * 0.5;
        let half = (mesh.local_max() - mesh.local_min()) * 0.5;
        let rotation = Mat3::from_mat4(self.transform);
        let center = self.transform.transform_point3(local_center);
        self.world_obb = Obb {
            center,
            axes: Mat3::from_cols(
                rotation.x_axis * half.x,
                rotation.y_axis * half.y,
                rotation.z_axis * half.z,
            ),
        };
        self.world_aabb = self.world_obb.aabb();
        self.world_sphere = self.world_obb.sphere();
        self.depth_key = (center - camera.eye).length();

        if !camera
            .frustum
            .intersects_sphere(self.world_sphere.center, self.world_sphere.radius)
        {
            return false;
        }

        // Screen rectangle from the eight OBB corners. A corner at or behind
        // the eye makes the projection unbounded; fall back to the full
        // target and let the rasterizer's clipper sort it out.
        let width = grid.width() as f32;
        let height = grid.height() as f32;
        let mut min = Vec2::splat(f32::MAX);
        let mut max = Vec2::splat(f32::MIN);
        let mut crosses_near = false;
        for i in 0..8 {
            let clip = camera.view_proj * self.world_obb.corner(i).extend(1.0);
            if clip.w < EPS_W {
                crosses_near = true;
                break;
            }
            let ndc = clip.xyz() / clip.w;
            let screen = Vec2::new(
                (ndc.x * 0.5 + 0.5) * width,
                (0.5 - ndc.y * 0.5) * height,
            );
            min = min.min(screen);
            max = max.max(screen);
        }

        let target_rect = TileRect {
            left: 0,
            top: 0,
            right: grid.width() as i32,
            bottom: grid.height() as i32,
        };
        let rect = if crosses_near {
            target_rect
        } else {
            #[allow(clippy::cast_possible_truncation)]
            let projected = TileRect {
                left: min.x.floor() as i32,
                top: min.y.floor() as i32,
                right: max.x.ceil() as i32,
                bottom: max.y.ceil() as i32,
            };
            projected.intersect(&target_rect)
        };
        if rect.is_empty() {
            return false;
        }

        self.screen_rect = Some(rect);
        self.tile_mask = grid.overlap_mask(&rect);
        true
    }
}

impl Poolable for Entity {
    fn header(&self) -> &PoolHeader {
        &self.header
    }
    fn header_mut(&mut self) -> &mut PoolHeader {
        &mut self.header
    }
}
