//! # Materials, Shading, and the Pixel-Shader Contract
//!
//! The per-pixel hot path dispatches on plain values - an enum for the
//! shading model and a tagged variant (function pointer + small inline
//! payload) for the pixel shader. No trait objects, no vtable indirection
//! per pixel.

use std::sync::Arc;

use glam::{Vec2, Vec3, Vec4};

use crate::texture::Texture;

/// Shading model applied before the pixel shader runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Shading {
    /// Albedo passthrough.
    #[default]
    Unlit,
    /// Per-vertex Lambert, interpolated across the triangle.
    Gouraud,
    /// Per-pixel Lambert on the interpolated normal.
    Lambert,
}

/// Depth-test / depth-write combination for a draw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DepthMode {
    /// Neither test nor write.
    None,
    /// Test against the depth buffer, never write it.
    Read,
    /// Write unconditionally, never test.
    Write,
    /// Test, and write on pass.
    #[default]
    ReadWrite,
}

impl DepthMode {
    /// Whether this mode reads the depth buffer.
    #[inline]
    #[must_use]
    pub const fn tests(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    /// Whether this mode writes the depth buffer.
    #[inline]
    #[must_use]
    pub const fn writes(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

/// Interpolated inputs handed to the pixel shader for one covered pixel.
#[derive(Clone, Copy, Debug)]
pub struct PixelInput {
    /// Interpolated world-space position.
    pub world_pos: Vec3,
    /// Interpolated world-space normal (not renormalized).
    pub normal: Vec3,
    /// Unlit albedo: vertex color x material color.
    pub albedo: Vec4,
    /// Albedo with the shading model applied.
    pub lit: Vec4,
    /// Perspective-correct texture coordinates.
    pub uv: Vec2,
    /// Interpolated depth in [0, 1].
    pub depth: f32,
}

/// Pixel shader result: a color, or a request to drop the fragment.
#[derive(Clone, Copy, Debug)]
pub struct PixelOutput {
    /// Output color (normalized RGBA).
    pub color: Vec4,
    /// When set, the fragment is dropped: no color or depth write happens.
    pub discard: bool,
}

impl PixelOutput {
    /// A kept fragment with the given color.
    #[inline]
    #[must_use]
    pub const fn color(color: Vec4) -> Self {
        Self {
            color,
            discard: false,
        }
    }

    /// A dropped fragment.
    #[inline]
    #[must_use]
    pub const fn discarded() -> Self {
        Self {
            color: Vec4::ZERO,
            discard: true,
        }
    }
}

/// Custom pixel-shader entry point: interpolated inputs plus the shader's
/// inline payload.
pub type PixelShaderFn = fn(&PixelInput, [f32; 4]) -> PixelOutput;

/// Per-pixel shader selection.
///
/// A closed set of variants instead of a trait object: `Flat` and `Textured`
/// are the built-ins, `Custom` carries a function pointer and a small inline
/// payload for everything else.
#[derive(Clone, Copy, Debug, Default)]
pub enum PixelShader {
    /// Lit color passthrough.
    #[default]
    Flat,
    /// Lit color modulated by the material texture.
    Textured,
    /// User-provided function pointer with four floats of payload.
    Custom {
        /// The shader function.
        run: PixelShaderFn,
        /// Inline payload forwarded on every invocation.
        data: [f32; 4],
    },
}

/// Material descriptor referenced by entities and passed to `draw_mesh`.
pub struct Material {
    /// Shading model.
    pub shading: Shading,
    /// Base color multiplied into every vertex color.
    pub color: Vec4,
    /// Optional texture for the `Textured` shader.
    pub texture: Option<Arc<Texture>>,
    /// Pixel shader selection.
    pub shader: PixelShader,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            shading: Shading::Unlit,
            color: Vec4::ONE,
            texture: None,
            shader: PixelShader::Flat,
        }
    }
}

/// Directional light plus ambient term, consumed by Gouraud and Lambert
/// shading.
#[derive(Clone, Copy, Debug)]
pub struct Lighting {
    /// Direction the light travels (normalized at construction).
    pub direction: Vec3,
    /// Ambient floor added to the Lambert product.
    pub ambient: f32,
}

impl Lighting {
    /// Builds a lighting rig, normalizing the direction.
    #[must_use]
    pub fn new(direction: Vec3, ambient: f32) -> Self {
        Self {
            direction: direction.normalize_or_zero(),
            ambient,
        }
    }

    /// Lambert intensity for a surface normal:
    /// `max(0, normal . -direction) + ambient`.
    #[inline]
    #[must_use]
    pub fn intensity(&self, normal: Vec3) -> f32 {
        normal.dot(-self.direction).max(0.0) + self.ambient
    }
}

impl Default for Lighting {
    fn default() -> Self {
        Self::new(Vec3::new(-0.4, -1.0, -0.3), 0.25)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_mode_flags() {
        assert!(!DepthMode::None.tests() && !DepthMode::None.writes());
        assert!(DepthMode::Read.tests() && !DepthMode::Read.writes());
        assert!(!DepthMode::Write.tests() && DepthMode::Write.writes());
        assert!(DepthMode::ReadWrite.tests() && DepthMode::ReadWrite.writes());
    }

    #[test]
    fn test_lambert_intensity_clamps_at_grazing() {
        let light = Lighting::new(Vec3::NEG_Y, 0.1);
        // Surface facing straight up is fully lit; facing down gets ambient.
        assert!((light.intensity(Vec3::Y) - 1.1).abs() < 1e-6);
        assert!((light.intensity(Vec3::NEG_Y) - 0.1).abs() < 1e-6);
    }
}
