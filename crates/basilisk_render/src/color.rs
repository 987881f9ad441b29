//! # Packed Color Helpers
//!
//! The color buffer stores `0xAARRGGBB` u32 pixels. Shading math runs in
//! normalized f32 and packs at the last moment.

use glam::Vec4;

/// Packed ARGB color, `0xAARRGGBB`.
pub type Color = u32;

/// Packs a normalized RGBA vector into `0xAARRGGBB`, clamping each channel.
#[inline]
#[must_use]
pub fn pack(color: Vec4) -> Color {
    // Round, don't truncate: interpolated weights that sum to 1.0 minus an
    // ulp must still produce a full channel.
    let c = (color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        ((c.w as u32) << 24) | ((c.x as u32) << 16) | ((c.y as u32) << 8) | (c.z as u32)
    }
}

/// Unpacks `0xAARRGGBB` into a normalized RGBA vector.
#[inline]
#[must_use]
pub fn unpack(color: Color) -> Vec4 {
    Vec4::new(
        ((color >> 16) & 0xFF) as f32,
        ((color >> 8) & 0xFF) as f32,
        (color & 0xFF) as f32,
        ((color >> 24) & 0xFF) as f32,
    ) / 255.0
}

/// Additively blends `add` (normalized RGB, pre-scaled by intensity) onto a
/// packed pixel with per-channel saturation. Alpha is left opaque.
#[inline]
#[must_use]
pub fn blend_add(dst: Color, add: glam::Vec3) -> Color {
    let a = (add.clamp(glam::Vec3::ZERO, glam::Vec3::ONE) * 255.0).round().as_uvec3();
    let r = ((dst >> 16) & 0xFF).saturating_add(a.x).min(255);
    let g = ((dst >> 8) & 0xFF).saturating_add(a.y).min(255);
    let b = (dst & 0xFF).saturating_add(a.z).min(255);
    0xFF00_0000 | (r << 16) | (g << 8) | b
}

/// Alpha-blends a normalized RGBA source over a packed destination pixel.
/// The result is written opaque.
#[inline]
#[must_use]
pub fn blend_alpha(dst: Color, src: Vec4) -> Color {
    let a = src.w.clamp(0.0, 1.0);
    let base = unpack(dst);
    let rgb = glam::Vec3::new(src.x, src.y, src.z) * a
        + glam::Vec3::new(base.x, base.y, base.z) * (1.0 - a);
    pack(rgb.extend(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack_roundtrip() {
        let color = Vec4::new(0.5, 0.25, 1.0, 1.0);
        let packed = pack(color);
        let restored = unpack(packed);
        assert!((restored - color).abs().max_element() < 1.0 / 255.0 + 1e-6);
    }

    #[test]
    fn test_pack_clamps() {
        assert_eq!(pack(Vec4::new(2.0, -1.0, 0.0, 1.0)), 0xFFFF_0000);
    }

    #[test]
    fn test_blend_alpha_mixes() {
        let dst = pack(Vec4::new(0.0, 0.0, 0.0, 1.0));
        let out = blend_alpha(dst, Vec4::new(1.0, 1.0, 1.0, 0.5));
        let mixed = unpack(out);
        assert!((mixed.x - 0.5).abs() < 2.0 / 255.0);
    }

    #[test]
    fn test_blend_add_saturates() {
        let dst = pack(Vec4::new(0.9, 0.9, 0.9, 1.0));
        let out = blend_add(dst, glam::Vec3::splat(0.5));
        assert_eq!(out, 0xFFFF_FFFF);
    }
}
