//! # Screen-Space Sprites
//!
//! The UI layer: pooled rectangles drawn serially after the 3D phases, with
//! plain alpha blending and optional texturing. No depth interaction.

use std::sync::Arc;

use basilisk_core::{PoolHeader, Poolable};
use basilisk_render::{blend_alpha, TargetView, Texture};
use glam::{Vec2, Vec4};

/// A pooled screen-space sprite.
pub struct Sprite {
    header: PoolHeader,
    /// Top-left corner in pixels.
    pub position: Vec2,
    /// Size in pixels.
    pub size: Vec2,
    /// Tint (and fill color when untextured), normalized RGBA.
    pub color: Vec4,
    /// Optional texture, sampled across the sprite rectangle.
    pub texture: Option<Arc<Texture>>,
}

impl Sprite {
    /// Creates an untextured sprite.
    #[must_use]
    pub fn new(position: Vec2, size: Vec2, color: Vec4) -> Self {
        Self {
            header: PoolHeader::new(),
            position,
            size,
            color,
            texture: None,
        }
    }

    /// Draws the sprite, clamped to the target. Runs on the orchestrator
    /// thread after every parallel phase has finished.
    pub fn draw(&self, target: &TargetView<'_>) {
        #[allow(clippy::cast_possible_truncation)]
        let left = self.position.x.floor() as i32;
        #[allow(clippy::cast_possible_truncation)]
        let top = self.position.y.floor() as i32;
        #[allow(clippy::cast_possible_truncation)]
        let right = (self.position.x + self.size.x).ceil() as i32;
        #[allow(clippy::cast_possible_truncation)]
        let bottom = (self.position.y + self.size.y).ceil() as i32;

        let x0 = left.max(0);
        let y0 = top.max(0);
        let x1 = right.min(target.width() as i32);
        let y1 = bottom.min(target.height() as i32);
        if x0 >= x1 || y0 >= y1 || self.size.x <= 0.0 || self.size.y <= 0.0 {
            return;
        }

        for y in y0..y1 {
            for x in x0..x1 {
                let src = match &self.texture {
                    Some(texture) => {
                        let uv = Vec2::new(
                            (x as f32 + 0.5 - self.position.x) / self.size.x,
                            (y as f32 + 0.5 - self.position.y) / self.size.y,
                        );
                        texture.sample(uv) * self.color
                    }
                    None => self.color,
                };
                if src.w <= 0.0 {
                    continue;
                }
                #[allow(clippy::cast_sign_loss)]
                let (px, py) = (x as u32, y as u32);
                target.write_color(px, py, blend_alpha(target.color(px, py), src));
            }
        }
    }
}

impl Poolable for Sprite {
    fn header(&self) -> &PoolHeader {
        &self.header
    }
    fn header_mut(&mut self) -> &mut PoolHeader {
        &mut self.header
    }
}
