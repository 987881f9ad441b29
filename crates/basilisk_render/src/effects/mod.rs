//! # Particle Effects
//!
//! A structure-of-arrays particle store driven through distinct frame
//! phases: serial emission and aging, parallel physics over index ranges,
//! parallel tile binning, a serial counting sort by tile, and parallel
//! per-tile additive compositing.
//!
//! ## Design Philosophy
//!
//! - Every per-particle field lives in its own contiguous array, indexed in
//!   parallel - bulk passes stream cache lines, they do not chase pointers
//! - Death is a swap-remove: particle identity and array order are *not*
//!   stable across frames, and nothing here depends on them being stable
//! - Spawn randomness comes from a per-particle-index Wang hash; there is
//!   no shared RNG state for threads to contend on

mod emitter;
mod particles;

pub use emitter::{Emitter, EmitterMode, SpawnParams};
pub use particles::{BounceBounds, ParticleParams, Particles, ParticlesView, INVALID_TILE};
