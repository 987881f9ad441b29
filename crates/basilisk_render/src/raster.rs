//! # Triangle Rasterizer / Clipper
//!
//! Per triangle: transform to world and clip space, Sutherland-Hodgman clip
//! against the six homogeneous frustum planes, fan-triangulate, project,
//! reject back faces by signed screen area, then fill with incremental edge
//! functions and a pluggable per-pixel shader.
//!
//! The pixel loop's bounding box is intersected with the render target and
//! the job's claimed tile rectangle before the first pixel is touched - that
//! clamp is what keeps concurrent tile jobs race-free on the shared buffers.
//!
//! All scratch state lives on the stack; drawing a mesh performs no heap
//! allocation.

use basilisk_core::{TileRect, Winding};
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4, Vec4Swizzles};

use crate::camera::Camera;
use crate::color::pack;
use crate::material::{
    DepthMode, Lighting, Material, PixelInput, PixelOutput, PixelShader, Shading,
};
use crate::mesh::Mesh;
use crate::target::TargetView;

/// Triangles whose clip-space w falls under this are dropped (degenerate
/// projection denominators).
const EPS_W: f32 = 1e-6;

/// Default signed-area epsilon for back-face rejection, in pixels squared.
pub const DEFAULT_AREA_EPSILON: f32 = 1e-3;

/// Clipping a triangle against six planes yields at most 9 vertices; the
/// scratch arrays leave headroom beyond the common 3-7 range.
const MAX_CLIP_VERTS: usize = 10;

/// The six frustum planes in homogeneous clip space, [0, w] depth
/// convention. A vertex is inside when `dot(plane, clip) >= 0`.
const CLIP_PLANES: [Vec4; 6] = [
    Vec4::new(1.0, 0.0, 0.0, 1.0),  // left:   x + w >= 0
    Vec4::new(-1.0, 0.0, 0.0, 1.0), // right:  w - x >= 0
    Vec4::new(0.0, 1.0, 0.0, 1.0),  // bottom: y + w >= 0
    Vec4::new(0.0, -1.0, 0.0, 1.0), // top:    w - y >= 0
    Vec4::new(0.0, 0.0, 1.0, 0.0),  // near:   z >= 0
    Vec4::new(0.0, 0.0, -1.0, 1.0), // far:    w - z >= 0
];

/// Per-draw context: the shared buffers, the frame's camera and lighting,
/// and the back-face convention.
pub struct DrawContext<'a> {
    /// Shared color+depth view (tile-partitioned access).
    pub target: &'a TargetView<'a>,
    /// Camera matrices for this frame.
    pub camera: &'a Camera,
    /// Directional light + ambient.
    pub lighting: &'a Lighting,
    /// Which screen winding is front-facing.
    pub winding: Winding,
    /// Signed-area epsilon below which triangles are dropped as degenerate.
    pub area_epsilon: f32,
}

/// A vertex in clip space carrying every interpolated attribute.
///
/// Attributes are interpolated at plane crossings *before* the perspective
/// divide; `uv_w` is the texture coordinate pre-divided by clip w so the
/// rasterizer can recover perspective-correct UVs per pixel.
#[derive(Clone, Copy)]
struct ClipVertex {
    clip: Vec4,
    world: Vec3,
    normal: Vec3,
    albedo: Vec4,
    intensity: f32,
    uv_w: Vec2,
}

impl ClipVertex {
    #[inline]
    fn lerp(a: &Self, b: &Self, t: f32) -> Self {
        Self {
            clip: a.clip.lerp(b.clip, t),
            world: a.world.lerp(b.world, t),
            normal: a.normal.lerp(b.normal, t),
            albedo: a.albedo.lerp(b.albedo, t),
            intensity: a.intensity + (b.intensity - a.intensity) * t,
            uv_w: a.uv_w.lerp(b.uv_w, t),
        }
    }
}

/// A projected vertex in screen space.
#[derive(Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    depth: f32,
    inv_w: f32,
    world: Vec3,
    normal: Vec3,
    albedo: Vec4,
    intensity: f32,
    uv_w: Vec2,
}

/// Draws one mesh's triangles into `clip_rect`, which the caller has already
/// restricted to its claimed tile. Returns the number of triangles that
/// reached the pixel loop (the per-tile stats counter).
///
/// Degenerate geometry is dropped via epsilon thresholds; nothing here
/// panics or allocates.
#[must_use]
pub fn draw_mesh(
    ctx: &DrawContext<'_>,
    mesh: &Mesh,
    transform: &Mat4,
    material: &Material,
    depth_mode: DepthMode,
    clip_rect: &TileRect,
) -> u32 {
    let target_rect = TileRect {
        left: 0,
        top: 0,
        right: ctx.target.width() as i32,
        bottom: ctx.target.height() as i32,
    };
    let rect = clip_rect.intersect(&target_rect);
    if rect.is_empty() {
        return 0;
    }

    let normal_matrix = normal_matrix(transform);
    let mut drawn = 0u32;

    for triangle in mesh.vertices().chunks_exact(3) {
        let mut clipped = [None::<ClipVertex>; 3];
        let mut degenerate = false;
        for (slot, vertex) in clipped.iter_mut().zip(triangle) {
            let world = transform.transform_point3(vertex.position);
            let clip = ctx.camera.view_proj * world.extend(1.0);
            if clip.w.abs() < EPS_W {
                degenerate = true;
                break;
            }
            let normal = (normal_matrix * vertex.normal).normalize_or_zero();
            *slot = Some(ClipVertex {
                clip,
                world,
                normal,
                albedo: vertex.color * material.color,
                intensity: ctx.lighting.intensity(normal),
                uv_w: vertex.uv / clip.w,
            });
        }
        if degenerate {
            continue;
        }
        // All three vertices were filled above.
        let (Some(v0), Some(v1), Some(v2)) = (clipped[0], clipped[1], clipped[2]) else {
            continue;
        };

        let mut polygon = [v0; MAX_CLIP_VERTS];
        polygon[1] = v1;
        polygon[2] = v2;
        let count = clip_polygon(&mut polygon, 3);
        if count < 3 {
            continue;
        }

        // Fan-triangulate from vertex 0 and rasterize each piece.
        let Some(s0) = project(&polygon[0], ctx.target) else {
            continue;
        };
        for i in 1..count - 1 {
            let (Some(s1), Some(s2)) = (project(&polygon[i], ctx.target), project(&polygon[i + 1], ctx.target))
            else {
                continue;
            };
            drawn += raster_triangle(ctx, &s0, &s1, &s2, material, depth_mode, &rect);
        }
    }

    drawn
}

/// Inverse-transpose of the upper 3x3, with a fallback for singular
/// transforms.
fn normal_matrix(transform: &Mat4) -> Mat3 {
    let m = Mat3::from_mat4(*transform);
    if m.determinant().abs() < EPS_W {
        m
    } else {
        m.inverse().transpose()
    }
}

/// Sutherland-Hodgman against all six planes, in place. Returns the vertex
/// count of the resulting convex polygon (0 when fully clipped away).
fn clip_polygon(polygon: &mut [ClipVertex; MAX_CLIP_VERTS], mut count: usize) -> usize {
    let mut scratch = [polygon[0]; MAX_CLIP_VERTS];

    for plane in CLIP_PLANES {
        if count < 3 {
            return 0;
        }

        let mut out = 0usize;
        for i in 0..count {
            let current = polygon[i];
            let next = polygon[(i + 1) % count];
            let d_current = plane.dot(current.clip);
            let d_next = plane.dot(next.clip);

            if d_current >= 0.0 {
                if out < MAX_CLIP_VERTS {
                    scratch[out] = current;
                    out += 1;
                }
            }
            if (d_current >= 0.0) != (d_next >= 0.0) {
                let denom = d_current - d_next;
                // A vanishing denominator means the edge runs parallel in
                // the plane; the crossing point is dropped.
                if denom.abs() > EPS_W {
                    let t = d_current / denom;
                    if out < MAX_CLIP_VERTS {
                        scratch[out] = ClipVertex::lerp(&current, &next, t);
                        out += 1;
                    }
                }
            }
        }

        polygon[..out].copy_from_slice(&scratch[..out]);
        count = out;
    }

    count
}

/// Perspective divide + viewport transform. Depth is clamped to [0, 1].
fn project(vertex: &ClipVertex, target: &TargetView<'_>) -> Option<ScreenVertex> {
    let w = vertex.clip.w;
    if w < EPS_W {
        return None;
    }
    let ndc = vertex.clip.xyz() / w;
    Some(ScreenVertex {
        x: (ndc.x * 0.5 + 0.5) * target.width() as f32,
        y: (0.5 - ndc.y * 0.5) * target.height() as f32,
        depth: ndc.z.clamp(0.0, 1.0),
        inv_w: 1.0 / w,
        world: vertex.world,
        normal: vertex.normal,
        albedo: vertex.albedo,
        intensity: vertex.intensity,
        uv_w: vertex.uv_w,
    })
}

#[inline]
fn edge(a: (f32, f32), b: (f32, f32), p: (f32, f32)) -> f32 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}

/// Fills one screen triangle, clamped to `rect`. Returns 1 if the triangle
/// reached the pixel loop, 0 if it was culled or degenerate.
#[allow(clippy::too_many_lines)]
fn raster_triangle(
    ctx: &DrawContext<'_>,
    s0: &ScreenVertex,
    s1: &ScreenVertex,
    s2: &ScreenVertex,
    material: &Material,
    depth_mode: DepthMode,
    rect: &TileRect,
) -> u32 {
    let area = edge((s0.x, s0.y), (s1.x, s1.y), (s2.x, s2.y));

    // Back-face rejection: positive area is clockwise in y-down screen
    // coordinates. Near-zero area is degenerate either way.
    let front = match ctx.winding {
        Winding::Clockwise => area > ctx.area_epsilon,
        Winding::CounterClockwise => area < -ctx.area_epsilon,
    };
    if !front {
        return 0;
    }

    // Normalize the orientation so the inside test is `edge >= 0` for all
    // three edges.
    let (v0, v1, v2, area) = if area > 0.0 {
        (*s0, *s1, *s2, area)
    } else {
        (*s0, *s2, *s1, -area)
    };
    let inv_area = 1.0 / area;

    // Bounding box, clamped against target and tile before any access.
    #[allow(clippy::cast_possible_truncation)]
    let min_x = (v0.x.min(v1.x).min(v2.x).floor() as i32).max(rect.left);
    #[allow(clippy::cast_possible_truncation)]
    let max_x = (v0.x.max(v1.x).max(v2.x).ceil() as i32).min(rect.right);
    #[allow(clippy::cast_possible_truncation)]
    let min_y = (v0.y.min(v1.y).min(v2.y).floor() as i32).max(rect.top);
    #[allow(clippy::cast_possible_truncation)]
    let max_y = (v0.y.max(v1.y).max(v2.y).ceil() as i32).min(rect.bottom);
    if min_x >= max_x || min_y >= max_y {
        return 0;
    }

    // Incremental edge functions: evaluate once at the first pixel center,
    // then walk with fixed per-step deltas.
    let p0 = (min_x as f32 + 0.5, min_y as f32 + 0.5);
    let mut row_e0 = edge((v1.x, v1.y), (v2.x, v2.y), p0);
    let mut row_e1 = edge((v2.x, v2.y), (v0.x, v0.y), p0);
    let mut row_e2 = edge((v0.x, v0.y), (v1.x, v1.y), p0);
    let step_x = (-(v2.y - v1.y), -(v0.y - v2.y), -(v1.y - v0.y));
    let step_y = (v2.x - v1.x, v0.x - v2.x, v1.x - v0.x);

    for y in min_y..max_y {
        let mut e0 = row_e0;
        let mut e1 = row_e1;
        let mut e2 = row_e2;
        for x in min_x..max_x {
            if e0 >= 0.0 && e1 >= 0.0 && e2 >= 0.0 {
                let w0 = e0 * inv_area;
                let w1 = e1 * inv_area;
                let w2 = e2 * inv_area;

                #[allow(clippy::cast_sign_loss)]
                let (px, py) = (x as u32, y as u32);

                let depth =
                    (w0 * v0.depth + w1 * v1.depth + w2 * v2.depth).clamp(0.0, 1.0);
                let pass = !depth_mode.tests() || depth < ctx.target.depth(px, py);
                if pass {
                    shade_pixel(
                        ctx, &v0, &v1, &v2, w0, w1, w2, depth, material, depth_mode, px, py,
                    );
                }
            }
            e0 += step_x.0;
            e1 += step_x.1;
            e2 += step_x.2;
        }
        row_e0 += step_y.0;
        row_e1 += step_y.1;
        row_e2 += step_y.2;
    }

    1
}

/// Interpolates attributes, applies the shading model, runs the pixel
/// shader, and writes color/depth per the depth mode.
#[allow(clippy::too_many_arguments)]
#[inline]
fn shade_pixel(
    ctx: &DrawContext<'_>,
    v0: &ScreenVertex,
    v1: &ScreenVertex,
    v2: &ScreenVertex,
    w0: f32,
    w1: f32,
    w2: f32,
    depth: f32,
    material: &Material,
    depth_mode: DepthMode,
    px: u32,
    py: u32,
) {
    let world = v0.world * w0 + v1.world * w1 + v2.world * w2;
    let normal = v0.normal * w0 + v1.normal * w1 + v2.normal * w2;
    let albedo = v0.albedo * w0 + v1.albedo * w1 + v2.albedo * w2;

    // Perspective-correct UV: both uv/w and 1/w are linear in screen space.
    let uv_w = v0.uv_w * w0 + v1.uv_w * w1 + v2.uv_w * w2;
    let inv_w = v0.inv_w * w0 + v1.inv_w * w1 + v2.inv_w * w2;
    let uv = if inv_w.abs() > EPS_W { uv_w / inv_w } else { Vec2::ZERO };

    let lit = match material.shading {
        Shading::Unlit => albedo,
        Shading::Gouraud => {
            let intensity = w0 * v0.intensity + w1 * v1.intensity + w2 * v2.intensity;
            scale_rgb(albedo, intensity)
        }
        Shading::Lambert => scale_rgb(albedo, ctx.lighting.intensity(normal.normalize_or_zero())),
    };

    let input = PixelInput {
        world_pos: world,
        normal,
        albedo,
        lit,
        uv,
        depth,
    };
    let output = run_shader(material, &input);
    if output.discard {
        return;
    }

    ctx.target.write_color(px, py, pack(output.color));
    if depth_mode.writes() {
        ctx.target.write_depth(px, py, depth);
    }
}

#[inline]
fn scale_rgb(color: Vec4, factor: f32) -> Vec4 {
    Vec4::new(color.x * factor, color.y * factor, color.z * factor, color.w)
}

#[inline]
fn run_shader(material: &Material, input: &PixelInput) -> PixelOutput {
    match material.shader {
        PixelShader::Flat => PixelOutput::color(input.lit),
        PixelShader::Textured => match &material.texture {
            Some(texture) => PixelOutput::color(input.lit * texture.sample(input.uv)),
            None => PixelOutput::color(input.lit),
        },
        PixelShader::Custom { run, data } => run(input, data),
    }
}
