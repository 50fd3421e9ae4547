//! Render queue coordinator and its observer-facing types.

mod config;
mod error;
mod listener;
mod render_queue;
mod stats;

pub use config::RenderQueueConfig;
pub use error::RenderQueueError;
pub use listener::{InvalidateListener, ListenerList};
pub use render_queue::RenderQueue;
pub use stats::{RenderStats, RenderStatsSnapshot};
