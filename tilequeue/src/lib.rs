//! tilequeue - Concurrent map tile render queue
//!
//! This library schedules map tile renders across a fixed set of worker
//! threads, keeps finished tiles in a bounded cache, and drops work that a
//! newer viewport request has made obsolete.
//!
//! # High-Level API
//!
//! The [`coordinator`] module provides the queue the host drives:
//!
//! ```ignore
//! use tilequeue::coordinator::{RenderQueue, RenderQueueConfig};
//! use tilequeue::tile::Tiler;
//!
//! let queue = RenderQueue::new(RenderQueueConfig::new());
//! queue.start(contexts, pool, 1.0)?;
//!
//! // Every viewport change supersedes the previous one
//! let tiler = Tiler::default();
//! queue.request_viewport(renderer, &tiler, &viewport, 6, 6);
//! ```

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod geometry;
pub mod log;
pub mod logging;
pub mod pool;
pub mod queue;
pub mod render;
pub mod tile;
pub mod worker;

/// Version of the tilequeue library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
