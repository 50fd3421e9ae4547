//! Tiles: keys, viewport decomposition and rendered tile records.
//!
//! ```text
//! viewport ──Tiler::cover──▶ [TileKey] ──render──▶ CachedTile
//!                                                  ├─ PooledTarget (pixels)
//!                                                  ├─ InfoLayer    (labels)
//!                                                  └─ ScreenTransform
//! ```

mod cached;
mod info_layer;
mod key;
mod tiler;

pub use cached::CachedTile;
pub use info_layer::{InfoElement, InfoLayer};
pub use key::TileKey;
pub use tiler::{Tiler, DEFAULT_WORLD, MAX_TILE_SCALE};
