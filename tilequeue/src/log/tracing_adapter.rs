//! Adapter forwarding [`Logger`] calls to `tracing`.

use crate::log::{LogLevel, Logger};
use std::fmt::Arguments;

/// Logger that emits `tracing` events.
///
/// Each event carries a `component` field so worker output can be filtered
/// apart from coordinator output in the log file.
///
/// ```ignore
/// use tilequeue::log::{Logger, TracingLogger};
/// use std::sync::Arc;
///
/// // Assumes logging::init_logging has installed a subscriber
/// let logger: Arc<dyn Logger> = Arc::new(TracingLogger::with_component("worker"));
/// tilequeue::log_info!(logger, "render worker ready");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TracingLogger {
    component: &'static str,
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl TracingLogger {
    pub fn new() -> Self {
        Self::with_component("tilequeue")
    }

    pub fn with_component(component: &'static str) -> Self {
        Self { component }
    }

    pub fn component(&self) -> &'static str {
        self.component
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        let component = self.component;
        match level {
            LogLevel::Trace => tracing::trace!(component, "{}", args),
            LogLevel::Debug => tracing::debug!(component, "{}", args),
            LogLevel::Info => tracing::info!(component, "{}", args),
            LogLevel::Warn => tracing::warn!(component, "{}", args),
            LogLevel::Error => tracing::error!(component, "{}", args),
        }
    }
}
