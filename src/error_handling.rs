//! Error type definitions.
//!
//! One thiserror enum per subsystem, mirroring the pipeline's failure
//! taxonomy: configuration problems degrade, per-unit I/O problems skip the
//! unit, line-level problems discard the line, and only journal invocation
//! or state persistence failures abort a pass.

use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Error types for the log source. Only the fatal ones surface here;
/// per-file stat/open failures are logged and skipped inside the source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The external journal command could not be started at all.
    #[error("failed to invoke journalctl: {0}")]
    JournalSpawn(#[source] std::io::Error),

    /// journalctl started but its stdout pipe was not available.
    #[error("journalctl produced no stdout pipe")]
    JournalNoStdout,
}

/// Error types for resume-position persistence.
#[derive(Error, Debug)]
pub enum StateError {
    /// The state file could not be written. Fatal for the pass: continuing
    /// without a durable position would re-process or skip data next run.
    #[error("failed to write state file {path}: {source}")]
    Write {
        /// State file path
        path: std::path::PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Error types for the CSV sink.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The sink file could not be opened or created.
    #[error("failed to open CSV sink {path}: {source}")]
    Open {
        /// Sink path
        path: std::path::PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A row or the header could not be appended.
    #[error("failed to append to CSV sink: {0}")]
    Write(#[from] csv::Error),

    /// Buffered rows could not be flushed to disk.
    #[error("failed to flush CSV sink: {0}")]
    Flush(#[from] std::io::Error),
}
