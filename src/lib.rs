//! maillog_sentinel library: SASL authentication-failure extraction.
//!
//! Reads a Postfix mail log (rotating files or the systemd journal), extracts
//! failed SASL authentication attempts, enriches each event with reverse DNS
//! and IP geolocation data, and appends one row per event to a
//! semicolon-separated CSV file. A state file holds the resume position so
//! repeated runs never emit duplicate rows.
//!
//! # Example
//!
//! ```no_run
//! use maillog_sentinel::{run_extraction, Config};
//! use clap::Parser;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::parse_from(["maillog_sentinel", "--maillog", "/var/log/mail.log"]);
//! let report = run_extraction(config).await?;
//! println!("{} events from {} lines", report.events_extracted, report.lines_read);
//! # Ok(())
//! # }
//! ```

pub mod config;
mod dns_cache;
mod error_handling;
pub mod geoip;
pub mod initialization;
mod models;
mod parser;
mod pipeline;
mod sink;
mod source;
mod state;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel, SourceKind};
pub use geoip::{GeoIpInfo, GeoIpManager};
pub use models::ExtractionReport;
pub use run::{run_extraction, run_lookup, run_update, RunReport};

// Internal run module (contains the pass orchestration)
mod run {
    use anyhow::{Context, Result};
    use chrono::{Datelike, Local};
    use std::path::PathBuf;

    use crate::config::Config;
    use crate::dns_cache::ReverseDnsCache;
    use crate::geoip::GeoIpManager;
    use crate::initialization::init_resolver;
    use crate::pipeline::run_pass;
    use crate::sink::CsvSink;
    use crate::source::LogSource;
    use crate::state::{read_state, write_state};

    /// Results of one extraction run.
    #[derive(Debug, Clone)]
    pub struct RunReport {
        /// Lines pulled from the source
        pub lines_read: u64,
        /// Authentication-failure events written to the CSV
        pub events_extracted: u64,
        /// Log files visited (0 for the journal-backed source)
        pub files_scanned: u64,
        /// Persisted resume position for the next run
        pub position: u64,
        /// Path of the CSV output file
        pub csv_path: PathBuf,
        /// Elapsed time in seconds
        pub elapsed_seconds: f64,
    }

    /// Runs one extraction pass with the provided configuration.
    ///
    /// This is the main entry point for the library: open the source at the
    /// stored resume position, extract and enrich every new authentication
    /// failure, append the rows, then persist the new position.
    ///
    /// # Errors
    ///
    /// Fails when the journal source cannot be spawned, the CSV sink cannot
    /// be opened or written, or the new resume position cannot be persisted.
    /// Missing geolocation databases and DNS failures degrade per event
    /// instead of failing the run.
    pub async fn run_extraction(config: Config) -> Result<RunReport> {
        let start_time = std::time::Instant::now();

        let resolver = init_resolver();
        let mut dns_cache = ReverseDnsCache::new(
            resolver,
            !config.no_dns_cache,
            config.dns_cache_size,
            config.dns_cache_ttl,
        );
        let geoip = GeoIpManager::from_config(&config);

        let position = read_state(&config.state_file);
        let mut source = LogSource::open(
            config.source,
            &config.maillog,
            &config.journald_unit,
            position,
        )
        .context("Failed to open log source")?;
        let mut sink = CsvSink::open(&config.output).context("Failed to open CSV output")?;

        let current_year = Local::now().year();
        let (report, new_position) = run_pass(
            &mut source,
            &mut dns_cache,
            Some(&geoip),
            &mut sink,
            current_year,
        )
        .await
        .context("Extraction pass failed")?;

        write_state(&config.state_file, new_position)
            .context("Failed to persist resume position")?;

        Ok(RunReport {
            lines_read: report.lines_read,
            events_extracted: report.events_extracted,
            files_scanned: report.files_scanned,
            position: new_position,
            csv_path: config.output.clone(),
            elapsed_seconds: start_time.elapsed().as_secs_f64(),
        })
    }

    /// Downloads and reloads both geolocation databases.
    ///
    /// Returns `false` when either database failed to refresh; the previous
    /// on-disk copy of a failed database stays in place.
    pub async fn run_update(config: &Config) -> bool {
        let mut geoip = GeoIpManager::from_config(config);
        geoip.update_databases().await
    }

    /// Looks up one IP address and prints the result as JSON to stdout.
    pub fn run_lookup(config: &Config, ip: &str) -> Result<()> {
        let geoip = GeoIpManager::from_config(config);
        let output = match geoip.lookup_ip_info(ip) {
            Some(info) => serde_json::to_string_pretty(&info)?,
            None => serde_json::to_string_pretty(&serde_json::json!({
                "error": format!("invalid IP address: {ip}"),
            }))?,
        };
        println!("{output}");
        Ok(())
    }
}
