//! Logging setup for tilequeue binaries.
//!
//! - Writes to `<log_dir>/tilequeue.log`, truncated at the start of each session
//! - Optionally mirrors to stdout
//! - Honours `RUST_LOG`; otherwise `info`, or `debug` for tilequeue modules
//!   when debug output is requested

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the background log writer alive. Dropping it flushes the file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Create `log_dir` if needed and truncate `log_file` inside it.
pub fn prepare_log_file(log_dir: &Path, log_file: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join(log_file);
    fs::write(&log_path, "")?;
    Ok(log_path)
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(debug: bool) -> &'static str {
    if debug {
        "info,tilequeue=debug,tilequeue_cli=debug"
    } else {
        "info"
    }
}

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or the log file
/// cannot be truncated.
pub fn init_logging(
    log_dir: &Path,
    log_file: &str,
    stdout: bool,
    debug: bool,
) -> Result<LoggingGuard, io::Error> {
    prepare_log_file(log_dir, log_file)?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_thread_names(true)
        .with_span_events(FmtSpan::CLOSE);

    let stdout_layer = stdout.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stdout)
            .with_ansi(true)
            .compact()
    });

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Default log file name.
pub fn default_log_file() -> &'static str {
    "tilequeue.log"
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_names() {
        assert_eq!(default_log_file(), "tilequeue.log");
        assert_eq!(default_filter(false), "info");
        assert!(default_filter(true).contains("tilequeue=debug"));
    }

    #[test]
    fn test_prepare_creates_nested_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("deep").join("logs");

        let path = prepare_log_file(&dir, "test.log").unwrap();

        assert!(dir.exists());
        assert_eq!(path, dir.join("test.log"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_prepare_truncates_previous_session() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("test.log"), "old session").unwrap();

        let path = prepare_log_file(temp.path(), "test.log").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "");
    }

    #[test]
    fn test_prepare_fails_when_directory_is_a_file() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        assert!(prepare_log_file(&blocker, "test.log").is_err());
    }

    #[test]
    fn test_guard_holds_worker() {
        use tracing_appender::non_blocking::NonBlocking;

        let (writer, guard) = NonBlocking::new(std::io::sink());
        drop(writer);
        let _logging_guard = LoggingGuard { _file_guard: guard };
    }

    // init_logging installs a process-wide subscriber and is exercised by
    // the CLI rather than by unit tests.
}
