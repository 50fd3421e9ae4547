//! Rendered tiles held by the tile cache.

use super::{InfoLayer, TileKey};
use crate::geometry::ScreenTransform;
use crate::pool::{PooledTarget, RenderTarget};
use std::time::Duration;

/// A finished tile: the render target holding its pixels plus the data
/// needed to composite it.
///
/// The tile owns its render target. The target goes back to the pool when
/// the tile is released, which happens on eviction, replacement, removal or
/// when the cache is cleared.
#[derive(Debug)]
pub struct CachedTile {
    key: TileKey,
    target: PooledTarget,
    info_layer: InfoLayer,
    transform: ScreenTransform,
    duration: Duration,
}

impl CachedTile {
    pub fn new(
        key: TileKey,
        target: PooledTarget,
        info_layer: InfoLayer,
        transform: ScreenTransform,
        duration: Duration,
    ) -> Self {
        Self {
            key,
            target,
            info_layer,
            transform,
            duration,
        }
    }

    pub fn key(&self) -> &TileKey {
        &self.key
    }

    /// The render target holding the tile's pixels.
    pub fn target(&self) -> &dyn RenderTarget {
        self.target.get()
    }

    /// Identifier of the render target, stable while the tile is cached.
    pub fn target_id(&self) -> usize {
        self.target.id()
    }

    pub fn info_layer(&self) -> &InfoLayer {
        &self.info_layer
    }

    /// Mapping from the tile's geographic rectangle to target pixels.
    pub fn transform(&self) -> &ScreenTransform {
        &self.transform
    }

    /// Time the drawing routine took for this tile.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Return the render target to its pool.
    pub fn release(self) {
        self.target.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{GeoRect, PixelRect};
    use crate::pool::{MemoryTarget, RenderTargetPool};

    #[test]
    fn test_release_returns_target() {
        let pool = RenderTargetPool::new(vec![Box::new(MemoryTarget::new(7, 16, 16))]);
        let target = pool.acquire(false).item().unwrap();
        let key = TileKey::new(GeoRect::new(0.0, 0.0, 1.0, 1.0), 3);
        let transform = ScreenTransform::from_rect(*key.rect(), PixelRect::new(1, 1, 15, 15));

        let mut layer = InfoLayer::new();
        layer.add("summit", 4.0, 4.0, 1);
        let tile = CachedTile::new(key, target, layer, transform, Duration::from_millis(5));

        assert_eq!(tile.key(), &key);
        assert_eq!(tile.target_id(), 7);
        assert_eq!(tile.target().size(), (16, 16));
        assert_eq!(tile.info_layer().len(), 1);
        assert_eq!(tile.duration(), Duration::from_millis(5));
        assert_eq!(pool.outstanding(), 1);

        tile.release();
        assert_eq!(pool.outstanding(), 0);
    }
}
