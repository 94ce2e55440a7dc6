//! Append-only semicolon-separated CSV output.

use std::fs::OpenOptions;
use std::path::Path;

use csv::{Writer, WriterBuilder};
use log::info;

use crate::config::CSV_HEADER;
use crate::error_handling::SinkError;
use crate::models::LogRecord;

/// Appends enriched records to a CSV file, writing the header exactly once
/// over the lifetime of the file.
pub struct CsvSink {
    writer: Writer<std::fs::File>,
}

impl CsvSink {
    /// Opens `path` for appending, creating it (and the header row) if it
    /// does not exist yet. An existing file never gets a second header.
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        let needs_header = match std::fs::metadata(path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| SinkError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        let mut writer = WriterBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            info!("creating CSV output file {}", path.display());
            writer.write_record(CSV_HEADER)?;
        }

        Ok(Self { writer })
    }

    pub fn append(&mut self, record: &LogRecord) -> Result<(), SinkError> {
        self.writer.write_record(record.as_row())?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ip: &str, user: &str) -> LogRecord {
        LogRecord {
            server: "mx1".into(),
            date: "15/03/2024 10:00".into(),
            ip: ip.into(),
            user: user.into(),
            hostname: "null".into(),
            reverse_dns_status: "Timeout".into(),
            country_code: "N/A".into(),
            asn: "N/A".into(),
            aso: "N/A".into(),
        }
    }

    #[test]
    fn new_file_gets_header_then_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut sink = CsvSink::open(&path).unwrap();
        sink.append(&record("1.1.1.1", "alice")).unwrap();
        sink.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "server;date;ip;user;hostname;reverse_dns_status;country_code;asn;aso"
        );
        assert_eq!(
            lines.next().unwrap(),
            "mx1;15/03/2024 10:00;1.1.1.1;alice;null;Timeout;N/A;N/A;N/A"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn reopening_appends_without_a_second_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        {
            let mut sink = CsvSink::open(&path).unwrap();
            sink.append(&record("1.1.1.1", "alice")).unwrap();
            sink.flush().unwrap();
        }
        {
            let mut sink = CsvSink::open(&path).unwrap();
            sink.append(&record("2.2.2.2", "bob")).unwrap();
            sink.flush().unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let headers = content
            .lines()
            .filter(|l| l.starts_with("server;"))
            .count();
        assert_eq!(headers, 1);
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn empty_preexisting_file_still_gets_a_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "").unwrap();

        let mut sink = CsvSink::open(&path).unwrap();
        sink.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("server;date;ip"));
    }
}
