//! Log line sources.
//!
//! Two backends share one contract: pull lines with `next_line()` until
//! exhaustion, then ask `new_position()` for the resume point to persist.
//! The pipeline never branches on which backend it is driving.

mod file;
mod journal;

use std::path::Path;
use std::process::Command;

use log::{debug, info, warn};

pub use file::FileSource;
pub use journal::JournalSource;

use crate::config::SourceKind;
use crate::error_handling::SourceError;

pub enum LogSource {
    File(FileSource),
    Journal(JournalSource),
}

impl LogSource {
    /// Opens the configured source, resuming from `position`.
    pub fn open(
        kind: SourceKind,
        maillog: &Path,
        journald_unit: &str,
        position: u64,
    ) -> Result<Self, SourceError> {
        let kind = match kind {
            SourceKind::Auto => detect_log_source(journald_unit),
            explicit => explicit,
        };
        match kind {
            SourceKind::Journal => Ok(Self::Journal(JournalSource::spawn(
                journald_unit,
                position,
            )?)),
            _ => Ok(Self::File(FileSource::open(maillog, position))),
        }
    }

    /// Next log line, already stripped of its trailing newline. `None` once
    /// the source is exhausted.
    pub fn next_line(&mut self) -> Option<String> {
        match self {
            Self::File(source) => source.next_line(),
            Self::Journal(source) => source.next_line(),
        }
    }

    /// Resume position to persist for the next pass. Only meaningful after
    /// `next_line` has returned `None`.
    pub fn new_position(&mut self) -> u64 {
        match self {
            Self::File(source) => source.new_position(),
            Self::Journal(source) => source.new_position(),
        }
    }

    pub fn files_scanned(&self) -> u64 {
        match self {
            Self::File(source) => source.files_scanned(),
            Self::Journal(_) => 0,
        }
    }
}

/// Probes for a usable journald before falling back to plain log files.
/// Journald wins only when journalctl runs and already holds at least one
/// record for the unit.
pub fn detect_log_source(unit: &str) -> SourceKind {
    debug!("detecting available log source");

    let version = Command::new("journalctl").arg("--version").output();
    match version {
        Ok(output) if output.status.success() => {}
        Ok(_) => {
            info!("journalctl not usable, using file-backed source");
            return SourceKind::File;
        }
        Err(_) => {
            info!("journalctl not found, using file-backed source");
            return SourceKind::File;
        }
    }

    let probe = Command::new("journalctl")
        .args(["-u", unit, "--lines=1", "--no-pager", "--quiet"])
        .output();
    match probe {
        Ok(output) if output.status.success() && !output.stdout.is_empty() => {
            info!("found journald records for {unit}, using journald");
            SourceKind::Journal
        }
        Ok(_) => {
            info!("no journald records for {unit}, using file-backed source");
            SourceKind::File
        }
        Err(err) => {
            warn!("journald probe failed ({err}), using file-backed source");
            SourceKind::File
        }
    }
}
