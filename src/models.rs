/// One enriched authentication-failure event, in output column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub server: String,
    pub date: String,
    pub ip: String,
    pub user: String,
    pub hostname: String,
    pub reverse_dns_status: String,
    pub country_code: String,
    pub asn: String,
    pub aso: String,
}

impl LogRecord {
    pub fn as_row(&self) -> [&str; 9] {
        [
            &self.server,
            &self.date,
            &self.ip,
            &self.user,
            &self.hostname,
            &self.reverse_dns_status,
            &self.country_code,
            &self.asn,
            &self.aso,
        ]
    }
}

/// Fields extracted from a raw log line before any enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    pub server: String,
    pub date: String,
    pub ip: String,
    pub user: String,
}

/// Counters for one extraction pass, reported to the operator at exit.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractionReport {
    pub lines_read: u64,
    pub events_extracted: u64,
    pub files_scanned: u64,
}
