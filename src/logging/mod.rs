//! Tracing subscriber initialization.
//!
//! The terminal viewer owns stdout, so logs go to a file instead. Users can
//! follow them with `tail -f` in a separate terminal.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Why the file logger could not be installed.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log file's directory could not be created.
    #[error("cannot create log directory {path:?}: {source}")]
    DirectoryCreation {
        /// Directory that was requested.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The path does not end in a UTF-8 file name.
    #[error("log path has no usable file name: {0:?}")]
    InvalidPath(PathBuf),

    /// The path has no parent to hold the file.
    #[error("log path has no parent directory: {0:?}")]
    NoParentDirectory(PathBuf),

    /// Another global subscriber was installed first.
    #[error("a global tracing subscriber is already installed")]
    SubscriberAlreadySet,
}

/// Installs the global subscriber, appending to `log_path` without ANSI
/// colors. The filter comes from [`env_filter`].
///
/// # Errors
/// Fails if the path has no file name, the directory cannot be created, or
/// a global subscriber is already installed.
pub fn init(log_path: &Path) -> Result<(), LoggingError> {
    let file_name = log_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| LoggingError::InvalidPath(log_path.to_path_buf()))?;

    let dir = log_path
        .parent()
        .ok_or_else(|| LoggingError::NoParentDirectory(log_path.to_path_buf()))?;

    if !dir.as_os_str().is_empty() {
        std::fs::create_dir_all(dir).map_err(|source| LoggingError::DirectoryCreation {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let appender = tracing_appender::rolling::never(dir, file_name);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(appender)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|_| LoggingError::SubscriberAlreadySet)
}

/// `RUST_LOG` filter, falling back to [`DEFAULT_FILTER`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SenderId;
    use crate::view_state::{CacheConfig, CellMeasurer, LayoutContext, LayoutEngine, LayoutStyle};
    use serial_test::serial;
    use std::fs;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    /// In-memory writer for scoped subscribers.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    #[serial(tracing_init)]
    fn init_creates_log_directory_if_missing() {
        let dir = std::env::temp_dir().join("chatlayout_test_logs_create");
        let _ = fs::remove_dir_all(&dir);

        // Directory creation happens before the subscriber is installed.
        let _ = init(&dir.join("viewer.log"));

        assert!(dir.is_dir(), "missing {}", dir.display());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    #[serial(tracing_init)]
    fn init_rejects_path_without_file_name() {
        let result = init(Path::new("/"));
        assert!(matches!(result, Err(LoggingError::InvalidPath(_))));
    }

    #[test]
    #[serial(tracing_init)]
    fn second_init_reports_subscriber_already_set() {
        let test_dir = std::env::temp_dir().join("chatlayout_test_logs_twice");
        let log_file = test_dir.join("twice.log");

        let _ = init(&log_file);
        let second = init(&log_file);

        assert!(matches!(second, Err(LoggingError::SubscriberAlreadySet)));
        let _ = fs::remove_dir_all(&test_dir);
    }

    #[test]
    fn engine_logs_context_rollover_at_info() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("info"))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut engine = LayoutEngine::new(
                CellMeasurer,
                SenderId::new("me").unwrap(),
                LayoutContext::new(80, LayoutStyle::default()).unwrap(),
                CacheConfig::default(),
            );
            engine.on_container_resized(100).unwrap();
        });

        let output = captured.contents();
        assert!(output.contains("Layout context changed"), "got: {output}");
        assert!(output.contains("width=100"), "got: {output}");
    }
}
