//! Render queue lifecycle errors.

use thiserror::Error;

/// Errors from starting a [`RenderQueue`](super::RenderQueue).
///
/// Nothing that happens to individual commands is an error: stale,
/// duplicate and cancelled commands are counted in the render stats.
#[derive(Debug, Error)]
pub enum RenderQueueError {
    #[error("render queue is already running")]
    AlreadyRunning,

    #[error("at least one render context is required")]
    NoContexts,

    #[error("visual scale must be finite and > 0, got {0}")]
    InvalidVisualScale(f64),

    #[error("failed to spawn render worker: {0}")]
    Spawn(#[from] std::io::Error),
}
