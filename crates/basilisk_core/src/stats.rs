//! # Frame Statistics
//!
//! Per-frame counters and phase timings exposed to the application. Numbers
//! only; rendering them (HUD, logs) is the caller's business.

/// Statistics for one completed frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameStats {
    /// Frame number.
    pub frame: u64,
    /// Worker thread count.
    pub threads: usize,
    /// Tile count.
    pub tiles: usize,
    /// Triangles rasterized this frame (post-clip, post-cull), summed over
    /// tiles.
    pub triangles_drawn: u32,
    /// Entities culled away by the frustum this frame.
    pub entities_clipped: u32,
    /// Entities that reached at least one tile this frame.
    pub entities_drawn: u32,
    /// Alive particles after this frame's update.
    pub particles_alive: usize,
    /// Entity physics + FSM + particle update time in microseconds.
    pub update_us: u64,
    /// Pool purge + sort + entity clip/tile-assign time in microseconds.
    pub prepare_us: u64,
    /// Entity render phase time in microseconds.
    pub raster_us: u64,
    /// Particle binning + sort + compositing time in microseconds.
    pub particles_us: u64,
    /// Total frame time in microseconds.
    pub total_us: u64,
}
