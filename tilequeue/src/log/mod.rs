//! Logging interface for code running on render worker threads.
//!
//! Worker loops take an `Arc<dyn Logger>` instead of calling `tracing`
//! directly, so tests can swap in a [`MemoryLogger`] and inspect what the
//! workers reported, or a [`NoOpLogger`] to keep benches quiet.
//!
//! - [`Logger`]: the interface, with one method per level
//! - [`TracingLogger`]: forwards to `tracing`
//! - [`NoOpLogger`]: discards everything
//! - [`MemoryLogger`]: records entries in memory
//!
//! ```
//! use tilequeue::log::{Logger, MemoryLogger, LogLevel};
//! use tilequeue::{log_debug, log_trace};
//! use std::sync::Arc;
//!
//! let memory = Arc::new(MemoryLogger::new());
//! let logger: Arc<dyn Logger> = memory.clone();
//!
//! log_debug!(logger, "worker {} started", 0);
//! log_trace!(logger, "discarded stale command");
//!
//! assert_eq!(memory.count_at(LogLevel::Debug), 1);
//! assert!(memory.contains("stale"));
//! ```

mod memory;
mod noop;
mod tracing_adapter;
mod r#trait;

pub use memory::{LogEntry, MemoryLogger};
pub use noop::NoOpLogger;
pub use r#trait::{LogLevel, Logger};
pub use tracing_adapter::TracingLogger;
