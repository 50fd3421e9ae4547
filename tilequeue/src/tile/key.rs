//! Tile cache key.
//!
//! A [`TileKey`] identifies one rendered tile by the geographic rectangle it
//! covers and the draw scale the features were styled for.

use crate::geometry::GeoRect;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Key identifying a tile in the cache and in render commands.
///
/// Two keys are equal only when the rectangle coordinates match bit for bit
/// and the draw scale is the same. Keys produced by the [`Tiler`] for the
/// same grid cell are therefore always equal.
///
/// # Example
///
/// ```
/// use tilequeue::geometry::GeoRect;
/// use tilequeue::tile::TileKey;
///
/// let key = TileKey::new(GeoRect::new(0.0, 0.0, 45.0, 45.0), 12);
/// assert_eq!(key.draw_scale(), 12);
/// assert_eq!(key, TileKey::new(GeoRect::new(0.0, 0.0, 45.0, 45.0), 12));
/// assert_ne!(key, TileKey::new(GeoRect::new(0.0, 0.0, 45.0, 45.0), 13));
/// ```
///
/// [`Tiler`]: crate::tile::Tiler
#[derive(Debug, Clone, Copy)]
pub struct TileKey {
    /// Geographic area covered by the tile
    rect: GeoRect,
    /// Style scale used when drawing features
    draw_scale: u8,
}

impl TileKey {
    /// Create a new tile key.
    pub fn new(rect: GeoRect, draw_scale: u8) -> Self {
        Self { rect, draw_scale }
    }

    /// Get the geographic rectangle.
    pub fn rect(&self) -> &GeoRect {
        &self.rect
    }

    /// Get the draw scale.
    pub fn draw_scale(&self) -> u8 {
        self.draw_scale
    }

    /// Returns true if the key describes a renderable area.
    pub fn is_valid(&self) -> bool {
        self.rect.is_valid()
    }
}

impl PartialEq for TileKey {
    fn eq(&self, other: &Self) -> bool {
        self.draw_scale == other.draw_scale && self.rect.to_bits() == other.rect.to_bits()
    }
}

impl Eq for TileKey {}

impl Hash for TileKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rect.to_bits().hash(state);
        self.draw_scale.hash(state);
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.rect, self.draw_scale)
    }
}
