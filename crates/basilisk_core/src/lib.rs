//! # BASILISK Core Engine
//!
//! The machinery underneath the tile-parallel renderer:
//! - Deferred-mutation object pools (create/destroy around parallel phases)
//! - A static tile grid partitioning the render target into units of work
//! - N persistent worker threads behind a repeatable fork-join barrier
//!
//! ## Architecture Rules
//!
//! 1. **No heap allocations in hot paths** - Pools and grids pre-allocate
//! 2. **Pools mutate only between phases** - Dense arrays never change shape
//!    while a parallel job iterates them
//! 3. **Tiles own their pixels** - The spatial partition is the only
//!    synchronization the frame buffers ever need
//!
//! ## Example
//!
//! ```rust,ignore
//! use basilisk_core::{JobSystem, TileGrid};
//!
//! let jobs = JobSystem::new(8);
//! let grid = TileGrid::new(1280, 720, jobs.thread_count());
//! jobs.dispatch(grid.tile_count(), &|tile| {
//!     // exclusive access to grid.tile(tile)'s pixel rectangle
//! });
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod jobs;
pub mod pool;
pub mod stats;
pub mod tile;

pub use config::{EngineConfig, Winding};
pub use error::{ConfigError, CoreResult};
pub use jobs::JobSystem;
pub use pool::{Pool, PoolHandle, PoolHeader, Poolable};
pub use stats::FrameStats;
pub use tile::{Tile, TileGrid, TileRect, MAX_THREADS};
