//! GeoIP result types.

use serde::Serialize;

/// Combined geolocation answer for one IP address.
///
/// Every field that could not be resolved carries the literal `"N/A"`, so a
/// record can always be written to the sink without special-casing misses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeoIpInfo {
    /// The queried IP address, as given
    pub ip: String,
    /// ISO country code, or "N/A"
    pub country_code: String,
    /// Autonomous system number, or "N/A"
    pub asn: String,
    /// Autonomous system organization name, or "N/A"
    pub aso: String,
}

/// One loaded IP range row.
///
/// Rows from the country database carry `country`; rows from the ASN
/// database carry `asn`/`aso`. Bounds are inclusive integer IP values
/// (IPv4 mapped into the low 32 bits of the `u128` space).
#[derive(Debug, Clone)]
pub(crate) struct GeoRangeEntry {
    pub start_ip: u128,
    pub end_ip: u128,
    pub country: Option<String>,
    pub asn: Option<String>,
    pub aso: Option<String>,
}
