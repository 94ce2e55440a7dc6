//! IP geolocation and ASN lookup over integer-range CSV databases.
//!
//! Two independent databases are kept in memory: IP-range-to-country and
//! IP-range-to-ASN. Both are loaded once at construction, queried by binary
//! search, and replaced wholesale on refresh (never mutated in place), so a
//! reader observes either the old or the new table, never a partial one.

mod database;
mod types;
mod update;

// Re-export public API
pub use database::ip_to_int;
pub use types::GeoIpInfo;

use std::path::PathBuf;
use std::time::Duration;

use database::{load_range_db, search, DbKind};
use types::GeoRangeEntry;

use crate::config::{Config, GEOIP_DOWNLOAD_TIMEOUT_SECS};

/// Sentinel for fields no database could resolve.
pub const NOT_AVAILABLE: &str = "N/A";

/// In-memory holder of both range databases plus their refresh endpoints.
///
/// Constructed once at startup and passed by reference into the pipeline;
/// there is no ambient global state.
pub struct GeoIpManager {
    country_db_path: PathBuf,
    asn_db_path: PathBuf,
    country_db_url: String,
    asn_db_url: String,
    country: Vec<GeoRangeEntry>,
    asn: Vec<GeoRangeEntry>,
}

impl GeoIpManager {
    /// Loads both databases from disk. Missing files degrade to empty
    /// tables (every lookup misses) rather than failing.
    pub fn new(
        country_db_path: PathBuf,
        asn_db_path: PathBuf,
        country_db_url: String,
        asn_db_url: String,
    ) -> Self {
        let country = load_range_db(&country_db_path, DbKind::Country);
        let asn = load_range_db(&asn_db_path, DbKind::Asn);
        GeoIpManager {
            country_db_path,
            asn_db_path,
            country_db_url,
            asn_db_url,
            country,
            asn,
        }
    }

    /// Builds a manager from the CLI configuration.
    pub fn from_config(config: &Config) -> Self {
        GeoIpManager::new(
            config.country_db_path(),
            config.asn_db_path(),
            config.country_db_url.clone(),
            config.asn_db_url.clone(),
        )
    }

    /// Looks up combined country + ASN information for one IP address.
    ///
    /// Returns `None` only for an unparseable IP string; an IP outside all
    /// loaded ranges yields a `GeoIpInfo` with `"N/A"` fields.
    pub fn lookup_ip_info(&self, ip: &str) -> Option<GeoIpInfo> {
        let ip_int = ip_to_int(ip)?;

        let country_hit = search(&self.country, ip_int);
        let asn_hit = search(&self.asn, ip_int);

        if country_hit.is_some() && asn_hit.is_none() {
            log::debug!("IP {ip} found in country DB but not ASN DB");
        }
        if country_hit.is_none() && asn_hit.is_some() {
            log::debug!("IP {ip} found in ASN DB but not country DB");
        }

        Some(GeoIpInfo {
            ip: ip.to_string(),
            country_code: country_hit
                .and_then(|e| e.country.clone())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            asn: asn_hit
                .and_then(|e| e.asn.clone())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            aso: asn_hit
                .and_then(|e| e.aso.clone())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        })
    }

    /// Downloads and reloads both databases.
    ///
    /// The two databases succeed or fail independently; a failed download
    /// leaves the previous on-disk file in place and reloads it. Returns
    /// `true` only if both refreshes succeeded.
    pub async fn update_databases(&mut self) -> bool {
        log::info!("Starting database update process");

        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(GEOIP_DOWNLOAD_TIMEOUT_SECS))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                log::error!("Failed to build HTTP client for database update: {e}");
                return false;
            }
        };

        let country_ok =
            match update::download_database(&client, &self.country_db_url, &self.country_db_path)
                .await
            {
                Ok(()) => true,
                Err(e) => {
                    log::error!(
                        "Failed to update country database, existing data (if any) will be used: {e:#}"
                    );
                    false
                }
            };
        // Reload regardless: on failure this re-reads the previous file
        self.country = load_range_db(&self.country_db_path, DbKind::Country);

        let asn_ok =
            match update::download_database(&client, &self.asn_db_url, &self.asn_db_path).await {
                Ok(()) => true,
                Err(e) => {
                    log::error!(
                        "Failed to update ASN database, existing data (if any) will be used: {e:#}"
                    );
                    false
                }
            };
        self.asn = load_range_db(&self.asn_db_path, DbKind::Asn);

        country_ok && asn_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_db(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn manager(country: &tempfile::NamedTempFile, asn: &tempfile::NamedTempFile) -> GeoIpManager {
        GeoIpManager::new(
            country.path().to_path_buf(),
            asn.path().to_path_buf(),
            "http://unused.invalid/country.csv".into(),
            "http://unused.invalid/asn.csv".into(),
        )
    }

    #[test]
    fn combined_lookup_merges_both_databases() {
        // 1.1.1.1 == 16843009
        let country = temp_db("start,end,country\n16843008,16843010,C1\n");
        let asn = temp_db("start,end,asn,aso\n16843008,16843010,AS1,ISP1\n");
        let mgr = manager(&country, &asn);

        let info = mgr.lookup_ip_info("1.1.1.1").unwrap();
        assert_eq!(info.country_code, "C1");
        assert_eq!(info.asn, "AS1");
        assert_eq!(info.aso, "ISP1");
    }

    #[test]
    fn miss_degrades_to_not_available() {
        let country = temp_db("start,end,country\n1000,2000,US\n");
        let asn = temp_db("start,end,asn,aso\n");
        let mgr = manager(&country, &asn);

        let info = mgr.lookup_ip_info("8.8.8.8").unwrap();
        assert_eq!(info.country_code, NOT_AVAILABLE);
        assert_eq!(info.asn, NOT_AVAILABLE);
        assert_eq!(info.aso, NOT_AVAILABLE);
    }

    #[test]
    fn partial_hit_fills_only_matching_fields() {
        let country = temp_db("start,end,country\n16843008,16843010,C1\n");
        let asn = temp_db("start,end,asn,aso\n");
        let mgr = manager(&country, &asn);

        let info = mgr.lookup_ip_info("1.1.1.1").unwrap();
        assert_eq!(info.country_code, "C1");
        assert_eq!(info.asn, NOT_AVAILABLE);
        assert_eq!(info.aso, NOT_AVAILABLE);
    }

    #[test]
    fn invalid_ip_is_none() {
        let country = temp_db("start,end,country\n");
        let asn = temp_db("start,end,asn,aso\n");
        let mgr = manager(&country, &asn);
        assert!(mgr.lookup_ip_info("not-an-ip").is_none());
    }

    #[test]
    fn missing_files_yield_empty_manager() {
        let mgr = GeoIpManager::new(
            PathBuf::from("/nonexistent/country.csv"),
            PathBuf::from("/nonexistent/asn.csv"),
            String::new(),
            String::new(),
        );
        let info = mgr.lookup_ip_info("1.2.3.4").unwrap();
        assert_eq!(info.country_code, NOT_AVAILABLE);
    }
}
