//! In-memory cache of rendered tiles.
//!
//! Tiles are kept until they are evicted to make room, reclaimed for their
//! render target, or dropped on memory pressure. Nothing is persisted.

mod stats;
mod tile_cache;

pub use stats::CacheStats;
pub use tile_cache::{Reservation, TileCache, TileCacheGuard};
