//! Configuration constants.
//!
//! This module defines all configuration constants used throughout the
//! application: default paths, default database URLs, timeouts, and the
//! sink schema.

/// Default active mail log path (Debian-style Postfix syslog destination).
pub const DEFAULT_MAILLOG_PATH: &str = "/var/log/mail.log";

/// Default resume-position state file.
pub const DEFAULT_STATE_FILE: &str = "./state.offset";

/// Default CSV sink path.
pub const DEFAULT_CSV_PATH: &str = "./maillogsentinel.csv";

/// Default directory for the geolocation range databases.
pub const DEFAULT_DATA_DIR: &str = ".ipinfo";

/// Default filename for the country range database inside the data dir.
pub const DEFAULT_COUNTRY_DB_FILENAME: &str = "country_aside.csv";

/// Default filename for the ASN range database inside the data dir.
pub const DEFAULT_ASN_DB_FILENAME: &str = "ip2asn-lite.csv";

/// Default remote source for the IP-range-to-country database
/// (sapics/ip-location-db, integer-range CSV format).
pub const DEFAULT_COUNTRY_DB_URL: &str =
    "https://raw.githubusercontent.com/sapics/ip-location-db/main/asn-country/asn-country-ipv4-num.csv";

/// Default remote source for the IP-range-to-ASN database.
pub const DEFAULT_ASN_DB_URL: &str =
    "https://raw.githubusercontent.com/sapics/ip-location-db/refs/heads/main/asn/asn-ipv4-num.csv";

/// Default systemd unit queried by the journal-backed source.
pub const DEFAULT_JOURNALD_UNIT: &str = "postfix.service";

/// DNS query timeout in seconds.
/// Reverse lookups happen once per distinct client IP on the hot path, so
/// a short timeout keeps a broken resolver from stalling the whole pass.
pub const DNS_TIMEOUT_SECS: u64 = 5;

/// Default maximum number of entries held by the reverse-DNS cache.
pub const DEFAULT_DNS_CACHE_SIZE: usize = 128;

/// Default TTL for reverse-DNS cache entries, in seconds.
pub const DEFAULT_DNS_CACHE_TTL_SECS: u64 = 3600;

/// Download timeout for geolocation database refreshes, in seconds.
pub const GEOIP_DOWNLOAD_TIMEOUT_SECS: u64 = 120;

/// Column header of the CSV sink. Written once, when the file is created.
pub const CSV_HEADER: [&str; 9] = [
    "server",
    "date",
    "ip",
    "user",
    "hostname",
    "reverse_dns_status",
    "country_code",
    "asn",
    "aso",
];
