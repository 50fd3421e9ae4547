//! Render target handles.

use crate::geometry::PixelRect;
use crate::render::Rgba;
use std::any::Any;
use std::fmt;

/// A reusable surface that one tile is drawn into.
///
/// Real targets wrap hardware textures owned by the host; the queue only
/// moves them between the pool, the workers and the cache. Drawing routines
/// that know the concrete type reach it through [`RenderTarget::as_any_mut`].
pub trait RenderTarget: Send + Sync + fmt::Debug {
    /// Stable identifier, unique within a pool.
    fn id(&self) -> usize;

    /// Surface size in pixels as `(width, height)`.
    fn size(&self) -> (u32, u32);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// CPU-side RGBA8 render target.
///
/// Used by the software render context, tests and the bench command.
#[derive(Clone, PartialEq, Eq)]
pub struct MemoryTarget {
    id: usize,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl MemoryTarget {
    /// Create a transparent target.
    pub fn new(id: usize, width: u32, height: u32) -> Self {
        Self {
            id,
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Fill the whole surface with `color`.
    pub fn clear(&mut self, color: Rgba) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&color.to_array());
        }
    }

    /// Fill the part of `rect` that lies on the surface with `color`.
    pub fn fill_rect(&mut self, rect: &PixelRect, color: Rgba) {
        let x0 = rect.min_x.clamp(0, self.width as i32) as usize;
        let x1 = rect.max_x.clamp(0, self.width as i32) as usize;
        let y0 = rect.min_y.clamp(0, self.height as i32) as usize;
        let y1 = rect.max_y.clamp(0, self.height as i32) as usize;
        let rgba = color.to_array();
        for y in y0..y1 {
            let row = y * self.width as usize;
            for x in x0..x1 {
                let offset = (row + x) * 4;
                self.pixels[offset..offset + 4].copy_from_slice(&rgba);
            }
        }
    }

    /// Colour of the pixel at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.pixels[offset..offset + 4];
        Some(Rgba::new(px[0], px[1], px[2], px[3]))
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

impl RenderTarget for MemoryTarget {
    fn id(&self) -> usize {
        self.id
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl fmt::Debug for MemoryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTarget")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}
