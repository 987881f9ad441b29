//! # Pooled Offscreen Targets
//!
//! Render-to-texture surfaces managed by the same deferred-mutation pool as
//! every other engine object, so acquiring and releasing one mid-frame is
//! safe around the parallel phases.

use basilisk_core::{PoolHeader, Poolable};
use basilisk_render::RenderTarget;

/// A pooled offscreen color+depth surface.
pub struct OffscreenTarget {
    header: PoolHeader,
    /// The surface itself.
    pub target: RenderTarget,
}

impl OffscreenTarget {
    /// Allocates an offscreen surface.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            header: PoolHeader::new(),
            target: RenderTarget::new(width, height),
        }
    }
}

impl Poolable for OffscreenTarget {
    fn header(&self) -> &PoolHeader {
        &self.header
    }
    fn header_mut(&mut self) -> &mut PoolHeader {
        &mut self.header
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basilisk_core::Pool;

    #[test]
    fn test_offscreen_targets_pool_like_everything_else() {
        let mut pool: Pool<OffscreenTarget> = Pool::with_capacity(4);
        let handle = pool.create(OffscreenTarget::new(64, 32)).unwrap();
        pool.purge();
        assert_eq!(pool.len(), 1);
        let surface = pool.get(handle).unwrap();
        assert_eq!(surface.target.width(), 64);
        pool.release(handle);
        pool.purge();
        assert!(pool.is_empty());
    }
}
