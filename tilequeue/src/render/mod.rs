//! Rendering interfaces: drawing callbacks and per-thread contexts.
//!
//! The queue never draws anything itself. A [`TileRenderer`] fills the
//! render target; a [`RenderContext`] wraps whatever hardware state the
//! worker thread needs around that.

mod color;
mod context;
mod paint;

pub use color::{ColorParseError, Rgba};
pub use context::{NullContext, RenderContext, SoftwareContext};
pub use paint::{renderer_fn, PaintContext, TileRenderer};
