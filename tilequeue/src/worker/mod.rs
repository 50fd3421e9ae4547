//! Render worker threads.
//!
//! Each worker owns one [`RenderContext`](crate::render::RenderContext) and
//! loops over the shared command queue. Workers never hold the cache lock
//! while a drawing routine runs.

mod gate;
mod routine;
mod slot;

pub use gate::SuspendGate;
pub use routine::{Outcome, RenderWorker, WorkerSettings, TILE_BORDER_PX};
pub use slot::{WorkerSlot, WorkerState};
