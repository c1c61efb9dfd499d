//! Logging bootstrap for the fleetmon daemon.
//!
//! The daemon logs to two sinks at once: an ANSI stdout stream for
//! operators tailing the process, and a plain-text file under the log
//! directory for after-the-fact diagnosis of collector gaps and command
//! traffic. On startup the previous session's file is rotated to
//! `<name>.old` rather than truncated, so the run that preceded a crash
//! is still readable.
//!
//! Verbosity comes from `RUST_LOG`, defaulting to `info`.

use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Suffix given to the rotated previous log.
const ROTATED_SUFFIX: &str = "old";

/// Default log directory, relative to the working directory.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "fleetmon.log";

/// Startup failures of the logging system.
#[derive(Debug, thiserror::Error)]
pub enum LogInitError {
    #[error("cannot create log directory {}: {source}", dir.display())]
    CreateDir {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot rotate previous log {}: {source}", path.display())]
    Rotate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Where and how the daemon logs.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Directory holding the log file; created if missing.
    pub directory: PathBuf,
    /// File name within the directory.
    pub file_name: String,
    /// Keep the previous session's log as `<file_name>.old`.
    pub rotate_previous: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_LOG_DIR),
            file_name: DEFAULT_LOG_FILE.to_string(),
            rotate_previous: true,
        }
    }
}

impl LogOptions {
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Install the global subscriber for this process.
    ///
    /// Returns a [`LogGuard`] that must outlive all logging; dropping it
    /// flushes the file writer. Fails only on filesystem problems with the
    /// log directory, which the daemon treats as fatal at startup.
    pub fn init(self) -> Result<LogGuard, LogInitError> {
        let path = prepare_log_file(&self)?;

        let file_appender = tracing_appender::rolling::never(&self.directory, &self.file_name);
        let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false),
            )
            .with(tracing_subscriber::fmt::layer().with_writer(io::stdout))
            .init();

        Ok(LogGuard {
            path,
            _file_guard: file_guard,
        })
    }
}

/// Keeps the non-blocking file writer alive for the process lifetime.
pub struct LogGuard {
    path: PathBuf,
    _file_guard: WorkerGuard,
}

impl LogGuard {
    /// Path of the active log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Create the log directory and rotate or drop the previous session's log.
///
/// Split out from [`LogOptions::init`] so the filesystem behaviour is
/// testable without installing a global subscriber.
fn prepare_log_file(options: &LogOptions) -> Result<PathBuf, LogInitError> {
    std::fs::create_dir_all(&options.directory).map_err(|source| LogInitError::CreateDir {
        dir: options.directory.clone(),
        source,
    })?;

    let path = options.directory.join(&options.file_name);
    if path.exists() {
        let outcome = if options.rotate_previous {
            std::fs::rename(&path, rotated_path(&path))
        } else {
            std::fs::remove_file(&path)
        };
        outcome.map_err(|source| LogInitError::Rotate {
            path: path.clone(),
            source,
        })?;
    }

    Ok(path)
}

/// Rotated-log path for a given active log path: `<path>.old`.
fn rotated_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(ROTATED_SUFFIX);
    PathBuf::from(name)
}
