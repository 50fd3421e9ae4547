//! Viewport decomposition into grid tiles.
//!
//! The world rectangle is split into `2^tile_scale` columns and rows. A
//! viewport is covered by every grid cell it intersects, ordered so that the
//! cells nearest the viewport centre come first; the render queue is FIFO, so
//! this ordering is what makes the middle of the screen appear first.

use crate::geometry::GeoRect;
use crate::tile::TileKey;

/// Highest supported tile scale (2^24 cells per side).
pub const MAX_TILE_SCALE: u8 = 24;

/// Default world extent: the square projected map used by the viewer.
pub const DEFAULT_WORLD: (f64, f64, f64, f64) = (-180.0, -180.0, 180.0, 180.0);

/// Splits viewports into fixed-size grid tiles.
#[derive(Debug, Clone, Copy)]
pub struct Tiler {
    world: GeoRect,
}

impl Default for Tiler {
    fn default() -> Self {
        let (min_x, min_y, max_x, max_y) = DEFAULT_WORLD;
        Self::new(GeoRect::new(min_x, min_y, max_x, max_y))
    }
}

impl Tiler {
    /// Create a tiler over the given world rectangle.
    ///
    /// # Panics
    ///
    /// Panics if `world` is not a valid rectangle.
    pub fn new(world: GeoRect) -> Self {
        assert!(world.is_valid(), "tiler world rectangle must be valid");
        Self { world }
    }

    pub fn world(&self) -> &GeoRect {
        &self.world
    }

    /// Geographic rectangle of grid cell `(col, row)` at `tile_scale`.
    ///
    /// Rows count downward from the top of the world.
    pub fn cell_rect(&self, col: u32, row: u32, tile_scale: u8) -> GeoRect {
        let cells = cells_per_side(tile_scale) as f64;
        let w = self.world.width() / cells;
        let h = self.world.height() / cells;
        let min_x = self.world.min_x() + col as f64 * w;
        let max_y = self.world.max_y() - row as f64 * h;
        GeoRect::new(min_x, max_y - h, min_x + w, max_y)
    }

    /// Choose the tile scale whose tiles best match `tile_px` on screen.
    ///
    /// `viewport_px` is the on-screen width of `viewport` in pixels.
    pub fn tile_scale_for(&self, viewport: &GeoRect, viewport_px: u32, tile_px: u32) -> u8 {
        if viewport_px == 0 || tile_px == 0 || !viewport.is_valid() {
            return 0;
        }
        let tile_geo_width = viewport.width() * tile_px as f64 / viewport_px as f64;
        let ratio = self.world.width() / tile_geo_width;
        if ratio <= 1.0 {
            return 0;
        }
        (ratio.log2().round() as i64).clamp(0, MAX_TILE_SCALE as i64) as u8
    }

    /// Tiles covering `viewport` at `tile_scale`, nearest to the centre first.
    ///
    /// Returns an empty list when the viewport lies outside the world or is
    /// not a valid rectangle.
    pub fn cover(&self, viewport: &GeoRect, tile_scale: u8, draw_scale: u8) -> Vec<TileKey> {
        let tile_scale = tile_scale.min(MAX_TILE_SCALE);
        if !viewport.is_valid() || !viewport.intersects(&self.world) {
            return Vec::new();
        }

        let cells = cells_per_side(tile_scale);
        let w = self.world.width() / cells as f64;
        let h = self.world.height() / cells as f64;

        let last = cells as i64 - 1;
        let col_of = |x: f64| {
            let col = ((x - self.world.min_x()) / w).floor() as i64;
            col.clamp(0, last)
        };
        let row_of = |y: f64| {
            let row = ((self.world.max_y() - y) / h).floor() as i64;
            row.clamp(0, last)
        };

        let (cx, cy) = viewport.center();

        // Edges that only touch a neighbouring cell must not pull it in
        let mut first_col = col_of(viewport.min_x());
        let mut last_col = col_of(viewport.max_x() - w * 1e-9);
        let mut first_row = row_of(viewport.max_y() - h * 1e-9);
        let mut last_row = row_of(viewport.min_y() + h * 1e-9);

        // A sliver thinner than the nudge crosses its own edges
        if last_col < first_col {
            first_col = col_of(cx);
            last_col = first_col;
        }
        if last_row < first_row {
            first_row = row_of(cy);
            last_row = first_row;
        }

        let mut cells_found = Vec::new();
        for row in first_row..=last_row {
            for col in first_col..=last_col {
                let rect = self.cell_rect(col as u32, row as u32, tile_scale);
                let (tx, ty) = rect.center();
                let dist = (tx - cx).powi(2) + (ty - cy).powi(2);
                cells_found.push((dist, row, col, rect));
            }
        }

        cells_found.sort_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then(a.1.cmp(&b.1))
                .then(a.2.cmp(&b.2))
        });

        cells_found
            .into_iter()
            .map(|(_, _, _, rect)| TileKey::new(rect, draw_scale))
            .collect()
    }
}

fn cells_per_side(tile_scale: u8) -> u32 {
    1u32 << tile_scale.min(MAX_TILE_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unit_tiler() -> Tiler {
        Tiler::new(GeoRect::new(0.0, 0.0, 16.0, 16.0))
    }

    #[test]
    fn test_cell_rect_layout() {
        let tiler = unit_tiler();
        // Scale 2 -> 4x4 cells of size 4
        assert_eq!(tiler.cell_rect(0, 0, 2), GeoRect::new(0.0, 12.0, 4.0, 16.0));
        assert_eq!(tiler.cell_rect(3, 3, 2), GeoRect::new(12.0, 0.0, 16.0, 4.0));
    }

    #[test]
    fn test_cover_single_cell() {
        let tiler = unit_tiler();
        let tiles = tiler.cover(&GeoRect::new(1.0, 13.0, 3.0, 15.0), 2, 9);
        assert_eq!(tiles.len(), 1);
        assert_eq!(*tiles[0].rect(), GeoRect::new(0.0, 12.0, 4.0, 16.0));
        assert_eq!(tiles[0].draw_scale(), 9);
    }

    #[test]
    fn test_cover_sliver_on_cell_edge() {
        let tiler = unit_tiler();

        let tall = tiler.cover(&GeoRect::new(1.0, 0.0, 1.0 + 1e-12, 1.0), 4, 0);
        assert_eq!(tall.len(), 1);
        assert_eq!(*tall[0].rect(), GeoRect::new(1.0, 0.0, 2.0, 1.0));

        let wide = tiler.cover(&GeoRect::new(0.0, 1.0, 1.0, 1.0 + 1e-12), 4, 0);
        assert_eq!(wide.len(), 1);
        assert_eq!(*wide[0].rect(), GeoRect::new(0.0, 1.0, 1.0, 2.0));
    }

    #[test]
    fn test_cover_exact_cell_does_not_spill() {
        let tiler = unit_tiler();
        let tiles = tiler.cover(&GeoRect::new(4.0, 4.0, 8.0, 8.0), 2, 0);
        assert_eq!(tiles.len(), 1);
        assert_eq!(*tiles[0].rect(), GeoRect::new(4.0, 4.0, 8.0, 8.0));
    }

    #[test]
    fn test_cover_orders_centre_first() {
        let tiler = unit_tiler();
        // Viewport centred on cell (1, 1) at scale 2, spilling into neighbours
        let tiles = tiler.cover(&GeoRect::new(3.0, 7.0, 7.0, 11.0), 2, 0);
        assert_eq!(tiles.len(), 4);
        // The viewport centre (5, 9) lies in column 1, row 1
        assert_eq!(*tiles[0].rect(), GeoRect::new(4.0, 8.0, 8.0, 12.0));
    }

    #[test]
    fn test_cover_clamps_to_world() {
        let tiler = unit_tiler();
        let tiles = tiler.cover(&GeoRect::new(-100.0, -100.0, 100.0, 100.0), 1, 0);
        assert_eq!(tiles.len(), 4);
    }

    #[test]
    fn test_cover_outside_world_is_empty() {
        let tiler = unit_tiler();
        assert!(tiler.cover(&GeoRect::new(20.0, 20.0, 30.0, 30.0), 3, 0).is_empty());
        assert!(tiler.cover(&GeoRect::new(5.0, 5.0, 5.0, 9.0), 3, 0).is_empty());
    }

    #[test]
    fn test_tile_scale_for() {
        let tiler = unit_tiler();
        // Viewport shows a quarter of the world on 512px: 256px tiles are 1/8 of the world
        let scale = tiler.tile_scale_for(&GeoRect::new(0.0, 0.0, 4.0, 4.0), 512, 256);
        assert_eq!(scale, 3);
        assert_eq!(tiler.tile_scale_for(&GeoRect::new(0.0, 0.0, 16.0, 16.0), 256, 256), 0);
        assert_eq!(tiler.tile_scale_for(&GeoRect::new(0.0, 0.0, 16.0, 16.0), 0, 256), 0);
    }

    #[test]
    #[should_panic(expected = "tiler world rectangle must be valid")]
    fn test_invalid_world_panics() {
        Tiler::new(GeoRect::new(0.0, 0.0, 0.0, 1.0));
    }

    proptest! {
        #[test]
        fn prop_cover_tiles_intersect_viewport(
            x in 0.0f64..15.0,
            y in 0.0f64..15.0,
            w in 0.01f64..8.0,
            h in 0.01f64..8.0,
            scale in 0u8..6,
        ) {
            let tiler = unit_tiler();
            let viewport = GeoRect::new(x, y, x + w, y + h);
            let tiles = tiler.cover(&viewport, scale, 0);
            prop_assert!(!tiles.is_empty());
            for tile in &tiles {
                prop_assert!(tile.rect().intersects(&viewport));
            }
            let unique: std::collections::HashSet<_> = tiles.iter().collect();
            prop_assert_eq!(unique.len(), tiles.len());
        }
    }
}
