//! Journald-backed log source.
//!
//! Runs `journalctl --output=json` for the configured unit and re-renders
//! every record as a syslog-style line, so downstream parsing is identical
//! for both source backends.

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, ChildStdout, Command, Stdio};

use chrono::{Local, TimeZone, Utc};
use log::{error, info, warn};
use serde_json::Value;

use crate::error_handling::SourceError;

pub struct JournalSource {
    child: Child,
    stdout: BufReader<ChildStdout>,
    latest_timestamp: Option<u64>,
    exhausted: bool,
}

impl JournalSource {
    /// Spawns journalctl for `unit`. A non-zero `position` (Unix seconds)
    /// bounds the query with `--since`.
    pub fn spawn(unit: &str, position: u64) -> Result<Self, SourceError> {
        let mut cmd = Command::new("journalctl");
        cmd.args(["-u", unit, "--output=json", "--no-pager"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if position > 0 {
            if let Some(since) = Local.timestamp_opt(position as i64, 0).single() {
                cmd.arg("--since")
                    .arg(since.format("%Y-%m-%dT%H:%M:%S").to_string());
            }
        }

        info!("reading journald unit {unit} from position {position}");
        let mut child = cmd.spawn().map_err(SourceError::JournalSpawn)?;
        let stdout = child.stdout.take().ok_or(SourceError::JournalNoStdout)?;

        Ok(Self {
            child,
            stdout: BufReader::new(stdout),
            latest_timestamp: None,
            exhausted: false,
        })
    }

    pub fn next_line(&mut self) -> Option<String> {
        if self.exhausted {
            return None;
        }
        loop {
            let mut raw = String::new();
            match self.stdout.read_line(&mut raw) {
                Ok(0) => {
                    self.finish();
                    return None;
                }
                Ok(_) => {}
                Err(err) => {
                    error!("error reading journalctl output: {err}");
                    self.finish();
                    return None;
                }
            }

            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }

            let entry: Value = match serde_json::from_str(raw) {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("skipping malformed journald record: {err}");
                    continue;
                }
            };

            if let Some(line) = render_syslog_line(&entry) {
                if let Some(ts) = realtime_seconds(&entry) {
                    self.latest_timestamp = Some(ts);
                }
                return Some(line);
            }
        }
    }

    /// Latest record timestamp seen, or the wall clock when the query
    /// produced nothing.
    pub fn new_position(&mut self) -> u64 {
        match self.latest_timestamp {
            Some(ts) => ts,
            None => Utc::now().timestamp().max(0) as u64,
        }
    }

    fn finish(&mut self) {
        self.exhausted = true;
        let mut stderr_output = String::new();
        if let Some(mut stderr) = self.child.stderr.take() {
            let _ = stderr.read_to_string(&mut stderr_output);
        }
        match self.child.wait() {
            Ok(status) if !status.success() => {
                error!(
                    "journalctl exited with {status}: {}",
                    stderr_output.trim()
                );
            }
            Ok(_) => {}
            Err(err) => error!("failed to wait for journalctl: {err}"),
        }
    }
}

fn realtime_seconds(entry: &Value) -> Option<u64> {
    entry
        .get("__REALTIME_TIMESTAMP")
        .and_then(Value::as_str)
        .and_then(|us| us.parse::<u64>().ok())
        .map(|us| us / 1_000_000)
}

/// Renders one journald record as `MMM DD HH:MM:SS host proc[pid]: message`.
fn render_syslog_line(entry: &Value) -> Option<String> {
    let timestamp = match realtime_seconds(entry)
        .and_then(|secs| Local.timestamp_opt(secs as i64, 0).single())
    {
        Some(ts) => ts,
        None => Local::now(),
    };
    let timestamp_str = timestamp.format("%b %d %H:%M:%S");

    let hostname = entry
        .get("_HOSTNAME")
        .and_then(Value::as_str)
        .unwrap_or("localhost");
    let process = entry
        .get("SYSLOG_IDENTIFIER")
        .and_then(Value::as_str)
        .or_else(|| entry.get("_COMM").and_then(Value::as_str))
        .unwrap_or("unknown");
    let message = entry.get("MESSAGE").and_then(Value::as_str)?;

    let pid_str = entry
        .get("_PID")
        .and_then(Value::as_str)
        .filter(|pid| !pid.is_empty())
        .map(|pid| format!("[{pid}]"))
        .unwrap_or_default();

    Some(format!(
        "{timestamp_str} {hostname} {process}{pid_str}: {message}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_a_full_record_as_syslog() {
        let entry = json!({
            "__REALTIME_TIMESTAMP": "1710496800000000",
            "_HOSTNAME": "mx1",
            "SYSLOG_IDENTIFIER": "postfix/smtpd",
            "_PID": "4242",
            "MESSAGE": "client=unknown[1.2.3.4], sasl_username=user"
        });
        let line = render_syslog_line(&entry).unwrap();
        assert!(line.contains(" mx1 postfix/smtpd[4242]: client=unknown[1.2.3.4]"));
        // The rendered prefix must satisfy the syslog header grammar.
        assert!(crate::parser::parse_line(&line, 2024).is_some());
    }

    #[test]
    fn falls_back_to_comm_when_identifier_is_absent() {
        let entry = json!({
            "__REALTIME_TIMESTAMP": "1710496800000000",
            "_HOSTNAME": "mx1",
            "_COMM": "smtpd",
            "MESSAGE": "hello"
        });
        let line = render_syslog_line(&entry).unwrap();
        assert!(line.contains(" mx1 smtpd: hello"));
    }

    #[test]
    fn record_without_message_is_dropped() {
        let entry = json!({
            "__REALTIME_TIMESTAMP": "1710496800000000",
            "_HOSTNAME": "mx1"
        });
        assert!(render_syslog_line(&entry).is_none());
    }

    #[test]
    fn realtime_timestamp_converts_microseconds_to_seconds() {
        let entry = json!({ "__REALTIME_TIMESTAMP": "1710496800123456" });
        assert_eq!(realtime_seconds(&entry), Some(1710496800));
    }
}
