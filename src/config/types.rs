//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument
//! parsing and configuration.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    DEFAULT_ASN_DB_URL, DEFAULT_COUNTRY_DB_URL, DEFAULT_CSV_PATH, DEFAULT_DATA_DIR,
    DEFAULT_DNS_CACHE_SIZE, DEFAULT_DNS_CACHE_TTL_SECS, DEFAULT_JOURNALD_UNIT,
    DEFAULT_MAILLOG_PATH, DEFAULT_STATE_FILE,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to
/// most verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Where log lines are pulled from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Probe for journalctl and fall back to files
    Auto,
    /// Rotating syslog files read at byte offsets
    File,
    /// systemd journal read through journalctl by timestamp
    Journal,
}

/// Command-line configuration for the extraction pipeline.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "maillog_sentinel",
    about = "Postfix SASL authentication-failure extraction and enrichment pipeline"
)]
pub struct Config {
    /// Active mail log file (file-backed source)
    #[arg(long, default_value = DEFAULT_MAILLOG_PATH)]
    pub maillog: PathBuf,

    /// Resume-position state file
    #[arg(long, default_value = DEFAULT_STATE_FILE)]
    pub state_file: PathBuf,

    /// CSV sink path (appended, never rewritten)
    #[arg(long, default_value = DEFAULT_CSV_PATH)]
    pub output: PathBuf,

    /// Log source selection
    #[arg(long, value_enum, default_value_t = SourceKind::Auto)]
    pub source: SourceKind,

    /// systemd unit queried by the journal-backed source
    #[arg(long, default_value = DEFAULT_JOURNALD_UNIT)]
    pub journald_unit: String,

    /// Directory holding the geolocation range databases
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Remote source for the country range database
    #[arg(long, default_value = DEFAULT_COUNTRY_DB_URL)]
    pub country_db_url: String,

    /// Remote source for the ASN range database
    #[arg(long, default_value = DEFAULT_ASN_DB_URL)]
    pub asn_db_url: String,

    /// Download/refresh both geolocation databases, then exit
    #[arg(long)]
    pub update: bool,

    /// Look up one IP address and print the result as JSON, then exit
    #[arg(long, value_name = "IP")]
    pub lookup: Option<String>,

    /// Disable the reverse-DNS cache (every lookup resolves directly)
    #[arg(long)]
    pub no_dns_cache: bool,

    /// Maximum number of reverse-DNS cache entries
    #[arg(long, default_value_t = DEFAULT_DNS_CACHE_SIZE)]
    pub dns_cache_size: usize,

    /// Reverse-DNS cache TTL in seconds
    #[arg(long, default_value_t = DEFAULT_DNS_CACHE_TTL_SECS)]
    pub dns_cache_ttl: u64,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl Config {
    /// Resolved path of the country range database.
    pub fn country_db_path(&self) -> PathBuf {
        self.data_dir
            .join(crate::config::constants::DEFAULT_COUNTRY_DB_FILENAME)
    }

    /// Resolved path of the ASN range database.
    pub fn asn_db_path(&self) -> PathBuf {
        self.data_dir
            .join(crate::config::constants::DEFAULT_ASN_DB_FILENAME)
    }
}
