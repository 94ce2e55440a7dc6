//! Resume-position persistence.
//!
//! One text file holding one decimal integer. For the file-backed source the
//! value is a byte offset into the active log; for the journal-backed source
//! it is a Unix timestamp in seconds.

use std::path::Path;

use log::warn;

use crate::error_handling::StateError;

/// Reads the stored resume position, falling back to 0 (restart from the
/// beginning) when the file is missing, unreadable, or not a valid integer.
pub fn read_state(path: &Path) -> u64 {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            warn!(
                "state file {} unreadable ({}), starting from position 0",
                path.display(),
                err
            );
            return 0;
        }
    };

    match content.trim().parse::<u64>() {
        Ok(offset) => offset,
        Err(_) => {
            warn!(
                "state file {} holds invalid content {:?}, starting from position 0",
                path.display(),
                content.trim()
            );
            0
        }
    }
}

/// Persists the resume position. A failure here is fatal for the pass since
/// losing it would make the next run re-emit every row.
pub fn write_state(path: &Path, position: u64) -> Result<(), StateError> {
    std::fs::write(path, position.to_string()).map_err(|source| StateError::Write {
        path: path.to_path_buf(),
        source,
    })
}
