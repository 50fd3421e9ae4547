//! CLI runner for common setup.
//!
//! Encapsulates config loading and logging initialization so each command
//! handler starts from the same state.

use crate::error::CliError;
use std::path::Path;
use tilequeue::config::ConfigFile;
use tilequeue::logging::{default_log_file, init_logging, LoggingGuard};
use tracing::info;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Keeps the file writer alive while the runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Load the config file (defaults if missing) and start logging.
    ///
    /// Log output goes to the configured file; with `debug_mode` it is also
    /// echoed to stdout at debug level.
    pub fn with_debug(debug_mode: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let log_path = &config.logging.file;
        let log_dir = log_path.parent().unwrap_or_else(|| Path::new("."));
        let log_file = log_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| default_log_file().to_string());

        let logging_guard = init_logging(log_dir, &log_file, debug_mode, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("tilequeue v{}", tilequeue::VERSION);
        info!(command, log_file = %self.config.logging.file.display(), "CLI started");
    }
}
