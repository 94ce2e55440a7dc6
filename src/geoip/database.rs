//! Range database loading and point lookup.
//!
//! The geolocation sources are CSVs of inclusive integer IP ranges
//! (`start,end,country` or `start,end,asn,aso`). They are loaded into a
//! `Vec` sorted by range start and queried by binary search.

use std::net::IpAddr;
use std::path::Path;

use super::types::GeoRangeEntry;

/// Which of the two range databases a file is parsed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DbKind {
    /// 3-column `start,end,country_code`
    Country,
    /// 4-column `start,end,asn,aso`
    Asn,
}

impl DbKind {
    fn name(self) -> &'static str {
        match self {
            DbKind::Country => "country",
            DbKind::Asn => "ASN",
        }
    }

    fn min_columns(self) -> usize {
        match self {
            DbKind::Country => 3,
            DbKind::Asn => 4,
        }
    }
}

/// Converts an IP string (v4 or v6) to its integer representation.
///
/// IPv4 addresses occupy the low 32 bits, matching the integer encoding the
/// range CSVs use. Invalid strings yield `None` with a warning.
pub fn ip_to_int(ip: &str) -> Option<u128> {
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => Some(u128::from(u32::from(v4))),
        Ok(IpAddr::V6(v6)) => Some(u128::from(v6)),
        Err(_) => {
            log::warn!("Invalid IP address format: {ip}");
            None
        }
    }
}

/// Loads one range database from its CSV file, sorted by range start.
///
/// The first row is a header and is skipped. Malformed rows (wrong column
/// count, non-integer bounds) are skipped with a warning. A missing or
/// unreadable file yields an empty database so lookups simply miss.
pub(crate) fn load_range_db(path: &Path, kind: DbKind) -> Vec<GeoRangeEntry> {
    if !path.is_file() {
        log::warn!(
            "{} data file {} not found; database will be empty",
            kind.name(),
            path.display()
        );
        return Vec::new();
    }

    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            log::error!(
                "Error reading {} IP database from {}: {e}",
                kind.name(),
                path.display()
            );
            return Vec::new();
        }
    };

    // The published databases are comma-delimited, but locally maintained
    // copies are accepted with semicolons too. Sniff the header line.
    let delimiter = match raw.lines().next() {
        Some(header) if header.contains(';') && !header.contains(',') => b';',
        _ => b',',
    };

    log::info!("Loading {} database from {}", kind.name(), path.display());

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(raw.as_bytes());

    let mut db = Vec::new();
    for (row_num, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                log::warn!(
                    "Skipping unreadable row {} in {}: {e}",
                    row_num + 1,
                    path.display()
                );
                continue;
            }
        };

        if record.len() < kind.min_columns() {
            log::warn!(
                "Skipping malformed {} row {} in {}: expected at least {} columns, got {}",
                kind.name(),
                row_num + 1,
                path.display(),
                kind.min_columns(),
                record.len()
            );
            continue;
        }

        let bounds = record[0]
            .trim()
            .parse::<u128>()
            .and_then(|start| record[1].trim().parse::<u128>().map(|end| (start, end)));
        let (start_ip, end_ip) = match bounds {
            Ok(bounds) => bounds,
            Err(e) => {
                log::warn!(
                    "Skipping row {} in {}: invalid integer IP bound: {e}",
                    row_num + 1,
                    path.display()
                );
                continue;
            }
        };

        let entry = match kind {
            DbKind::Country => GeoRangeEntry {
                start_ip,
                end_ip,
                country: Some(record[2].trim().to_string()),
                asn: None,
                aso: None,
            },
            DbKind::Asn => GeoRangeEntry {
                start_ip,
                end_ip,
                country: None,
                asn: Some(record[2].trim().to_string()),
                aso: Some(record[3].trim().to_string()),
            },
        };
        db.push(entry);
    }

    db.sort_by_key(|entry| entry.start_ip);
    log::info!(
        "Loaded {} IP ranges for {} from {}",
        db.len(),
        kind.name(),
        path.display()
    );
    db
}

/// Binary search for the range containing `ip_int`.
///
/// The slice must be sorted ascending by `start_ip`. The window narrows by
/// comparing the query against the midpoint's bounds and returns on
/// containment; an IP outside all ranges is a miss, not an error.
pub(crate) fn search(db: &[GeoRangeEntry], ip_int: u128) -> Option<&GeoRangeEntry> {
    let mut low = 0usize;
    let mut high = db.len();
    while low < high {
        let mid = (low + high) / 2;
        let entry = &db[mid];
        if ip_int < entry.start_ip {
            high = mid;
        } else if ip_int > entry.end_ip {
            low = mid + 1;
        } else {
            return Some(entry);
        }
    }
    None
}
