//! Geographic and pixel geometry used to place tiles on render targets.
//!
//! Geographic coordinates use a y-up convention; pixel coordinates use the
//! usual y-down screen convention. [`ScreenTransform`] converts between the two.

use std::fmt;
use thiserror::Error;

/// Errors raised by the checked geometry constructors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// A coordinate was NaN or infinite.
    #[error("Non-finite coordinate in rectangle ({min_x}, {min_y}, {max_x}, {max_y})")]
    NonFinite {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },

    /// The rectangle has zero or negative extent on at least one axis.
    #[error("Degenerate rectangle: width={width}, height={height}")]
    Degenerate { width: f64, height: f64 },
}

/// Axis-aligned geographic rectangle.
///
/// Negative zero is folded into positive zero on construction so that two
/// rectangles describing the same area compare equal bit for bit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoRect {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl GeoRect {
    /// Create a rectangle from its corners without validation.
    ///
    /// Use [`GeoRect::try_new`] when the input comes from outside the crate.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x + 0.0,
            min_y: min_y + 0.0,
            max_x: max_x + 0.0,
            max_y: max_y + 0.0,
        }
    }

    /// Create a rectangle, rejecting non-finite or degenerate input.
    pub fn try_new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self, GeometryError> {
        let rect = Self::new(min_x, min_y, max_x, max_y);
        rect.validate()?;
        Ok(rect)
    }

    /// Check that the rectangle is finite and non-degenerate.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let finite = [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(GeometryError::NonFinite {
                min_x: self.min_x,
                min_y: self.min_y,
                max_x: self.max_x,
                max_y: self.max_y,
            });
        }
        if self.min_x >= self.max_x || self.min_y >= self.max_y {
            return Err(GeometryError::Degenerate {
                width: self.width(),
                height: self.height(),
            });
        }
        Ok(())
    }

    /// Returns true if the rectangle is finite and has positive area.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Centre point as `(x, y)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Grow the rectangle by `dx` on the left and right and `dy` on the top and bottom.
    pub fn inflate(&self, dx: f64, dy: f64) -> Self {
        Self::new(
            self.min_x - dx,
            self.min_y - dy,
            self.max_x + dx,
            self.max_y + dy,
        )
    }

    /// Returns true if the two rectangles overlap with positive area.
    pub fn intersects(&self, other: &GeoRect) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }

    /// Returns true if `other` lies entirely inside this rectangle.
    pub fn contains_rect(&self, other: &GeoRect) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && other.max_x <= self.max_x
            && other.max_y <= self.max_y
    }

    /// Raw bit patterns of the four coordinates, used for exact key equality.
    pub(crate) fn to_bits(self) -> [u64; 4] {
        [
            self.min_x.to_bits(),
            self.min_y.to_bits(),
            self.max_x.to_bits(),
            self.max_y.to_bits(),
        ]
    }
}

impl fmt::Display for GeoRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.6}, {:.6} .. {:.6}, {:.6}]",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

/// Integer pixel rectangle on a render target. `max` bounds are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl PixelRect {
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Rectangle covering a whole `width` x `height` surface.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    /// Shrink the rectangle by `border` pixels on every side.
    pub fn shrink(&self, border: i32) -> Self {
        Self::new(
            self.min_x + border,
            self.min_y + border,
            self.max_x - border,
            self.max_y - border,
        )
    }

    pub fn width(&self) -> i32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y
    }

    /// Returns true if the pixel at `(x, y)` lies inside the rectangle.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x < self.max_x && y >= self.min_y && y < self.max_y
    }
}

/// Mapping between a geographic rectangle and a pixel rectangle.
///
/// The geographic rectangle fills the pixel rectangle exactly; the y axis is
/// flipped so that `geo.max_y` lands on `pixel.min_y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenTransform {
    geo: GeoRect,
    pixel: PixelRect,
}

impl ScreenTransform {
    /// Build the transform that shows `geo` inside `pixel`.
    pub fn from_rect(geo: GeoRect, pixel: PixelRect) -> Self {
        Self { geo, pixel }
    }

    pub fn geo_rect(&self) -> &GeoRect {
        &self.geo
    }

    pub fn pixel_rect(&self) -> &PixelRect {
        &self.pixel
    }

    /// Pixels per geographic unit along x and y.
    pub fn scale(&self) -> (f64, f64) {
        (
            self.pixel.width() as f64 / self.geo.width(),
            self.pixel.height() as f64 / self.geo.height(),
        )
    }

    /// Convert a geographic point into (fractional) pixel coordinates.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let (sx, sy) = self.scale();
        (
            self.pixel.min_x as f64 + (x - self.geo.min_x) * sx,
            self.pixel.min_y as f64 + (self.geo.max_y - y) * sy,
        )
    }

    /// Convert a (fractional) pixel position into geographic coordinates.
    pub fn pixel_to_geo(&self, px: f64, py: f64) -> (f64, f64) {
        let (sx, sy) = self.scale();
        (
            self.geo.min_x + (px - self.pixel.min_x as f64) / sx,
            self.geo.max_y - (py - self.pixel.min_y as f64) / sy,
        )
    }

    /// Geographic rectangle covered by the pixel rectangle grown by `margin_px`.
    ///
    /// Drawing routines use this to fetch features that sit just outside the
    /// tile but whose symbols or labels bleed into it.
    pub fn inflated_geo_rect(&self, margin_px: f64) -> GeoRect {
        let (x0, y0) = self.pixel_to_geo(
            self.pixel.min_x as f64 - margin_px,
            self.pixel.max_y as f64 + margin_px,
        );
        let (x1, y1) = self.pixel_to_geo(
            self.pixel.max_x as f64 + margin_px,
            self.pixel.min_y as f64 - margin_px,
        );
        GeoRect::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }
}
