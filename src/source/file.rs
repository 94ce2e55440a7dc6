//! File-backed log source with rotation awareness.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use log::{debug, error, info};

/// Reads rotated siblings (oldest first, always from byte 0) and then the
/// active log file from the resume offset. Only the active file moves the
/// resume position.
pub struct FileSource {
    active_path: PathBuf,
    queue: VecDeque<PathBuf>,
    current: Option<OpenFile>,
    resume_offset: u64,
    position: u64,
    files_scanned: u64,
}

struct OpenFile {
    path: PathBuf,
    reader: Box<dyn BufRead>,
    // true only for the plain active file, whose byte offset is the
    // resume position of the next pass
    tracks_position: bool,
}

impl FileSource {
    /// Never fails outright: per-file stat/open problems are logged when the
    /// file is reached and the file skipped.
    pub fn open(maillog: &Path, resume_offset: u64) -> Self {
        // A non-zero offset means earlier passes already consumed the
        // rotated siblings, so only the active file is left to read.
        let mut queue: VecDeque<PathBuf> = if resume_offset == 0 {
            rotated_siblings(maillog).into()
        } else {
            VecDeque::new()
        };
        queue.push_back(maillog.to_path_buf());

        Self {
            active_path: maillog.to_path_buf(),
            queue,
            current: None,
            resume_offset,
            position: resume_offset,
            files_scanned: 0,
        }
    }

    pub fn next_line(&mut self) -> Option<String> {
        loop {
            if self.current.is_none() {
                let path = self.queue.pop_front()?;
                match self.open_file(&path) {
                    Some(open) => self.current = Some(open),
                    None => continue,
                }
            }

            let open = self.current.as_mut()?;
            let mut line = String::new();
            match open.reader.read_line(&mut line) {
                Ok(0) => {
                    self.current = None;
                }
                Ok(n) => {
                    if open.tracks_position {
                        self.position += n as u64;
                    }
                    while line.ends_with('\n') || line.ends_with('\r') {
                        line.pop();
                    }
                    return Some(line);
                }
                Err(err) => {
                    error!("error reading {}: {err}", open.path.display());
                    self.current = None;
                }
            }
        }
    }

    pub fn new_position(&self) -> u64 {
        self.position
    }

    pub fn files_scanned(&self) -> u64 {
        self.files_scanned
    }

    fn open_file(&mut self, path: &Path) -> Option<OpenFile> {
        let size = match std::fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(err) => {
                error!("could not stat {}: {err}", path.display());
                return None;
            }
        };

        let is_active = path == self.active_path;
        let is_gzipped = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".gz"));

        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) => {
                error!("could not open {}: {err}", path.display());
                return None;
            }
        };

        info!("processing log file {}", path.display());
        self.files_scanned += 1;

        if is_gzipped {
            // Compressed streams cannot be seeked, so gzip members are read
            // in full and never move the resume position.
            return Some(OpenFile {
                path: path.to_path_buf(),
                reader: Box::new(BufReader::new(GzDecoder::new(file))),
                tracks_position: false,
            });
        }

        if is_active {
            let mut start = self.resume_offset;
            if size < start {
                info!(
                    "rotation detected for {}, resetting offset {start} -> 0",
                    path.display()
                );
                start = 0;
            }
            let mut file = file;
            if let Err(err) = file.seek(SeekFrom::Start(start)) {
                error!("could not seek {}: {err}", path.display());
                return None;
            }
            debug!(
                "incremental read of {} from offset {start}",
                path.display()
            );
            self.position = start;
            return Some(OpenFile {
                path: path.to_path_buf(),
                reader: Box::new(BufReader::new(file)),
                tracks_position: true,
            });
        }

        debug!("reading rotated file {} from the beginning", path.display());
        Some(OpenFile {
            path: path.to_path_buf(),
            reader: Box::new(BufReader::new(file)),
            tracks_position: false,
        })
    }
}

/// Rotated siblings of the active log, `<name>.*` in the same directory,
/// ordered oldest first (higher rotation numbers are older).
fn rotated_siblings(maillog: &Path) -> Vec<PathBuf> {
    let parent = match maillog.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
        Some(parent) => parent,
        None => return Vec::new(),
    };
    let name = match maillog.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return Vec::new(),
    };
    let prefix = format!("{name}.");

    let entries = match std::fs::read_dir(parent) {
        Ok(entries) => entries,
        Err(err) => {
            error!("could not list {}: {err}", parent.display());
            return Vec::new();
        }
    };

    let mut siblings: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix))
        })
        .collect();

    siblings.sort_by_key(|path| {
        let suffix_num = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(&prefix))
            .and_then(|s| s.split('.').next())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);
        (std::cmp::Reverse(suffix_num), path.clone())
    });
    siblings
}
