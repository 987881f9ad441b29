//! # BASILISK
//!
//! A real-time 3D rendering engine that rasterizes textured, lit triangle
//! meshes and particle effects entirely on general-purpose cores.
//!
//! The engine is an explicit context object - there is no global singleton.
//! The application owns an [`Engine`], feeds its pools, and calls
//! [`Engine::frame`] once per frame; presentation (blitting the finished
//! color buffer to a window) stays with the application.
//!
//! ## Frame Sequence
//!
//! ```text
//! reset -> entity physics -> FSM update -> particle emit/age
//!       -> particle physics        (parallel, barrier 1)
//!       -> purge pools -> depth sort -> clip/tile-assign -> clear
//!       -> render entities         (parallel, barrier 2)
//!       -> particle tile binning   (parallel, barrier 3)
//!       -> prefix sum + scatter
//!       -> particle compositing    (parallel, barrier 4)
//!       -> UI sprites -> stats
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod bounds;
pub mod engine;
pub mod entity;
pub mod fsm;
pub mod offscreen;
pub mod sprite;

pub use bounds::{Aabb, Obb, Sphere};
pub use engine::{Engine, EngineError};
pub use entity::Entity;
pub use fsm::{State, StateMachine, Transition};
pub use offscreen::OffscreenTarget;
pub use sprite::Sprite;

// The pieces applications touch alongside the engine.
pub use basilisk_core::{
    EngineConfig, FrameStats, Pool, PoolHandle, PoolHeader, Poolable, Winding,
};
pub use basilisk_render::{
    Camera, DepthMode, Emitter, EmitterMode, Lighting, Material, Mesh, ParticleParams,
    PixelInput, PixelOutput, PixelShader, Shading, SpawnParams, Texture, Vertex,
};
