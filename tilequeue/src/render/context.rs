//! Per-thread rendering contexts.
//!
//! Each worker thread owns one context for the lifetime of the render queue.
//! On real hardware the context wraps a GPU context bound to that thread;
//! the queue only needs the hooks below, all of which default to no-ops.

use crate::geometry::PixelRect;
use crate::pool::{MemoryTarget, RenderTarget};
use crate::render::Rgba;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Hooks a worker calls around each tile and on lifecycle changes.
pub trait RenderContext: Send + Sync {
    /// Bind the context to the calling worker thread. Called once at start-up.
    fn make_current(&self) {}

    /// Prepare `target` for drawing: clear it to transparent and fill `clip`
    /// with `background`, leaving a transparent border around the tile.
    fn begin_frame(&self, _target: &mut dyn RenderTarget, _clip: &PixelRect, _background: Rgba) {}

    /// Flush drawing commands for `target`.
    fn end_frame(&self, _target: &mut dyn RenderTarget) {}

    /// The worker thread is exiting.
    fn end_thread_drawing(&self) {}

    /// The application moved to the background; stop touching the hardware.
    fn enter_background(&self) {}

    fn enter_foreground(&self) {}

    /// Free cached hardware resources.
    fn memory_warning(&self) {}
}

/// Context that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullContext;

impl RenderContext for NullContext {}

/// CPU context for [`MemoryTarget`]s.
///
/// Frames on other target types are counted but left untouched.
#[derive(Debug, Default)]
pub struct SoftwareContext {
    frames: AtomicU64,
    memory_warnings: AtomicU64,
    background: AtomicBool,
    finished: AtomicBool,
}

impl SoftwareContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames begun.
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn memory_warnings(&self) -> u64 {
        self.memory_warnings.load(Ordering::Relaxed)
    }

    /// True between `enter_background` and `enter_foreground`.
    pub fn is_background(&self) -> bool {
        self.background.load(Ordering::Acquire)
    }

    /// True once the owning worker has exited.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}

impl RenderContext for SoftwareContext {
    fn make_current(&self) {
        self.finished.store(false, Ordering::Release);
    }

    fn begin_frame(&self, target: &mut dyn RenderTarget, clip: &PixelRect, background: Rgba) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        if let Some(memory) = target.as_any_mut().downcast_mut::<MemoryTarget>() {
            memory.clear(Rgba::TRANSPARENT);
            memory.fill_rect(clip, background);
        }
    }

    fn end_thread_drawing(&self) {
        self.finished.store(true, Ordering::Release);
    }

    fn enter_background(&self) {
        self.background.store(true, Ordering::Release);
    }

    fn enter_foreground(&self) {
        self.background.store(false, Ordering::Release);
    }

    fn memory_warning(&self) {
        self.memory_warnings.fetch_add(1, Ordering::Relaxed);
    }
}
