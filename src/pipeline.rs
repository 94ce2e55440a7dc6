//! Extraction pass orchestration.
//!
//! One pass pulls lines from the source, extracts SASL authentication
//! failures, enriches them with reverse DNS and geo data, and appends one
//! CSV row per event. Lines are handled strictly in order, one at a time.

use log::debug;

use crate::dns_cache::ReverseDnsCache;
use crate::geoip::{GeoIpManager, NOT_AVAILABLE};
use crate::models::{ExtractionReport, LogRecord, ParsedEntry};
use crate::parser::{parse_line, sanitize_field};
use crate::sink::CsvSink;
use crate::source::LogSource;

use crate::error_handling::SinkError;

/// Runs a single extraction pass over `source`.
///
/// Returns the pass counters and the resume position to persist. The sink is
/// flushed before the position is reported, so a persisted position always
/// covers rows already on disk.
pub async fn run_pass(
    source: &mut LogSource,
    dns_cache: &mut ReverseDnsCache,
    geoip: Option<&GeoIpManager>,
    sink: &mut CsvSink,
    current_year: i32,
) -> Result<(ExtractionReport, u64), SinkError> {
    let mut report = ExtractionReport::default();

    while let Some(line) = source.next_line() {
        report.lines_read += 1;

        let Some(entry) = parse_line(&line, current_year) else {
            continue;
        };

        let record = enrich(entry, dns_cache, geoip).await;
        sink.append(&record)?;
        report.events_extracted += 1;
    }

    sink.flush()?;
    report.files_scanned = source.files_scanned();

    let position = source.new_position();
    debug!(
        "pass complete: {} lines, {} events, new position {position}",
        report.lines_read, report.events_extracted
    );
    Ok((report, position))
}

async fn enrich(
    entry: ParsedEntry,
    dns_cache: &mut ReverseDnsCache,
    geoip: Option<&GeoIpManager>,
) -> LogRecord {
    let (hostname, dns_error) = dns_cache.lookup(&entry.ip).await;

    let (hostname, reverse_dns_status) = match (hostname, dns_error) {
        (Some(name), _) => (sanitize_field(&name), "OK".to_string()),
        (None, Some(error)) => ("null".to_string(), sanitize_field(&error)),
        (None, None) => ("null".to_string(), "Failed (Unknown)".to_string()),
    };

    let (country_code, asn, aso) = match geoip.and_then(|g| g.lookup_ip_info(&entry.ip)) {
        Some(info) => (info.country_code, info.asn, info.aso),
        None => (
            NOT_AVAILABLE.to_string(),
            NOT_AVAILABLE.to_string(),
            NOT_AVAILABLE.to_string(),
        ),
    };

    LogRecord {
        server: entry.server,
        date: entry.date,
        ip: entry.ip,
        user: entry.user,
        hostname,
        reverse_dns_status,
        country_code,
        asn,
        aso,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initialization::init_resolver;
    use crate::source::FileSource;
    use std::path::Path;

    const SAMPLE_LINE: &str = "Mar 15 10:00:00 server1 postfix/submission/smtpd[100]: \
         client=unknown[1.1.1.1], sasl_method=PLAIN, sasl_username=user1@example.com";

    fn geo_fixture(dir: &Path) -> GeoIpManager {
        // 1.1.1.1 == 16843009
        let country = dir.join("country.csv");
        let asn = dir.join("asn.csv");
        std::fs::write(&country, "start;end;country\n16843008;16843010;C1\n").unwrap();
        std::fs::write(&asn, "start;end;asn;aso\n16843008;16843010;AS1;ISP1\n").unwrap();
        GeoIpManager::new(country, asn, String::new(), String::new())
    }

    fn primed_cache() -> ReverseDnsCache {
        let mut cache = ReverseDnsCache::new(init_resolver(), true, 8, 3600);
        cache.prime("1.1.1.1", Some("host1.com"), None);
        cache
    }

    #[tokio::test]
    async fn emits_the_fully_enriched_row() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("mail.log");
        std::fs::write(&log, format!("{SAMPLE_LINE}\n")).unwrap();

        let geoip = geo_fixture(dir.path());
        let mut dns_cache = primed_cache();
        let mut sink = CsvSink::open(&dir.path().join("out.csv")).unwrap();
        let mut source = LogSource::File(FileSource::open(&log, 0));

        let (report, position) =
            run_pass(&mut source, &mut dns_cache, Some(&geoip), &mut sink, 2024)
                .await
                .unwrap();

        assert_eq!(report.lines_read, 1);
        assert_eq!(report.events_extracted, 1);
        assert_eq!(position, SAMPLE_LINE.len() as u64 + 1);

        let content = std::fs::read_to_string(dir.path().join("out.csv")).unwrap();
        assert_eq!(
            content.lines().nth(1).unwrap(),
            "server1;15/03/2024 10:00;1.1.1.1;user1@example.com;host1.com;OK;C1;AS1;ISP1"
        );
    }

    #[tokio::test]
    async fn dns_failure_writes_null_hostname_and_the_error_tag() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("mail.log");
        let line = SAMPLE_LINE.replace("1.1.1.1", "2.2.2.2");
        std::fs::write(&log, format!("{line}\n")).unwrap();

        let mut dns_cache = ReverseDnsCache::new(init_resolver(), true, 8, 3600);
        dns_cache.prime("2.2.2.2", None, Some("Timeout"));
        let mut sink = CsvSink::open(&dir.path().join("out.csv")).unwrap();
        let mut source = LogSource::File(FileSource::open(&log, 0));

        run_pass(&mut source, &mut dns_cache, None, &mut sink, 2024)
            .await
            .unwrap();

        let content = std::fs::read_to_string(dir.path().join("out.csv")).unwrap();
        assert_eq!(
            content.lines().nth(1).unwrap(),
            "server1;15/03/2024 10:00;2.2.2.2;user1@example.com;null;Timeout;N/A;N/A;N/A"
        );
    }

    #[tokio::test]
    async fn non_matching_lines_are_counted_but_not_emitted() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("mail.log");
        std::fs::write(
            &log,
            "Mar 15 10:00:00 server1 postfix/qmgr[7]: removed\nnoise without header\n",
        )
        .unwrap();

        let mut dns_cache = ReverseDnsCache::new(init_resolver(), true, 8, 3600);
        let mut sink = CsvSink::open(&dir.path().join("out.csv")).unwrap();
        let mut source = LogSource::File(FileSource::open(&log, 0));

        let (report, _) = run_pass(&mut source, &mut dns_cache, None, &mut sink, 2024)
            .await
            .unwrap();

        assert_eq!(report.lines_read, 2);
        assert_eq!(report.events_extracted, 0);
        let content = std::fs::read_to_string(dir.path().join("out.csv")).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[tokio::test]
    async fn rerunning_from_the_new_position_adds_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("mail.log");
        std::fs::write(&log, format!("{SAMPLE_LINE}\n")).unwrap();
        let out = dir.path().join("out.csv");

        let mut dns_cache = primed_cache();

        let mut sink = CsvSink::open(&out).unwrap();
        let mut source = LogSource::File(FileSource::open(&log, 0));
        let (_, position) = run_pass(&mut source, &mut dns_cache, None, &mut sink, 2024)
            .await
            .unwrap();
        drop(sink);

        let mut sink = CsvSink::open(&out).unwrap();
        let mut source = LogSource::File(FileSource::open(&log, position));
        let (report, new_position) = run_pass(&mut source, &mut dns_cache, None, &mut sink, 2024)
            .await
            .unwrap();

        assert_eq!(report.events_extracted, 0);
        assert_eq!(new_position, position);
        let content = std::fs::read_to_string(&out).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
