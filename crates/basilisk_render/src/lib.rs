//! # BASILISK Render Pipeline
//!
//! Software rendering on general-purpose cores:
//! - A frustum-clipping, edge-function triangle rasterizer with a pluggable
//!   per-pixel shader
//! - A structure-of-arrays particle system with tile-binning counting sort
//!   and additive compositing
//! - A color+depth render target shared across workers through tile
//!   ownership, not locks
//!
//! ## Architecture Rules
//!
//! 1. **No allocation per triangle or per particle** - clip scratch lives on
//!    the stack, particle storage is fixed at startup
//! 2. **Degrade by omission** - degenerate triangles, behind-camera
//!    particles, and full buffers drop work silently, never panic
//! 3. **Tile rectangles are the synchronization** - every write is bounded
//!    by the claimed tile before the first pixel is touched

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod camera;
pub mod color;
pub mod effects;
pub mod material;
pub mod mesh;
pub mod raster;
pub mod target;
pub mod texture;

pub use camera::{Camera, Frustum};
pub use color::{blend_add, blend_alpha, pack, unpack, Color};
pub use effects::{Emitter, EmitterMode, ParticleParams, Particles, SpawnParams};
pub use material::{
    DepthMode, Lighting, Material, PixelInput, PixelOutput, PixelShader, Shading,
};
pub use mesh::{Mesh, Vertex};
pub use raster::{draw_mesh, DrawContext, DEFAULT_AREA_EPSILON};
pub use target::{RenderTarget, TargetView};
pub use texture::Texture;
