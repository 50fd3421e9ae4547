//! Drawing callback interface.

use crate::geometry::{GeoRect, ScreenTransform};
use crate::pool::{MemoryTarget, RenderTarget};
use crate::tile::InfoLayer;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything a drawing routine may touch while it renders one tile.
pub struct PaintContext<'a> {
    target: &'a mut dyn RenderTarget,
    info_layer: &'a mut InfoLayer,
    cancel: &'a CancellationToken,
    worker: usize,
    visual_scale: f64,
}

impl<'a> PaintContext<'a> {
    pub fn new(
        target: &'a mut dyn RenderTarget,
        info_layer: &'a mut InfoLayer,
        cancel: &'a CancellationToken,
        worker: usize,
        visual_scale: f64,
    ) -> Self {
        Self {
            target,
            info_layer,
            cancel,
            worker,
            visual_scale,
        }
    }

    pub fn target(&self) -> &dyn RenderTarget {
        &*self.target
    }

    pub fn target_mut(&mut self) -> &mut dyn RenderTarget {
        &mut *self.target
    }

    /// The target as a [`MemoryTarget`], if that is what the pool holds.
    pub fn memory_target(&mut self) -> Option<&mut MemoryTarget> {
        self.target.as_any_mut().downcast_mut::<MemoryTarget>()
    }

    /// Overlay layer stored with the tile on commit.
    pub fn info_layer(&mut self) -> &mut InfoLayer {
        &mut *self.info_layer
    }

    /// Long-running routines must poll this and return early once it is set.
    /// Whatever was drawn is then thrown away.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        self.cancel
    }

    /// Index of the worker thread running the routine.
    pub fn worker(&self) -> usize {
        self.worker
    }

    /// Display density multiplier (2.0 on a high-DPI screen).
    pub fn visual_scale(&self) -> f64 {
        self.visual_scale
    }
}

/// Draws the contents of one tile.
///
/// Called on a worker thread with the target already cleared to the
/// background colour. `transform` maps the tile rectangle to target pixels;
/// `visible` is the tile rectangle grown by the symbol margin and is the area
/// whose features should be drawn.
///
/// Any `Fn` closure with the same parameters implements this trait.
pub trait TileRenderer: Send + Sync {
    fn render(
        &self,
        paint: &mut PaintContext<'_>,
        transform: &ScreenTransform,
        visible: &GeoRect,
        draw_scale: u8,
    );
}

impl<F> TileRenderer for F
where
    F: Fn(&mut PaintContext<'_>, &ScreenTransform, &GeoRect, u8) + Send + Sync,
{
    fn render(
        &self,
        paint: &mut PaintContext<'_>,
        transform: &ScreenTransform,
        visible: &GeoRect,
        draw_scale: u8,
    ) {
        self(paint, transform, visible, draw_scale)
    }
}

/// Wrap a closure as a shared [`TileRenderer`].
pub fn renderer_fn<F>(f: F) -> Arc<dyn TileRenderer>
where
    F: Fn(&mut PaintContext<'_>, &ScreenTransform, &GeoRect, u8) + Send + Sync + 'static,
{
    Arc::new(f)
}
