//! Extraction of SASL authentication failures from syslog-format mail log lines.

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::ParsedEntry;

/// Syslog header: abbreviated month, day, HH:MM:SS, hostname.
static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<month>\w{3})\s+(?P<day>\d{1,2})\s+(?P<time>\d{2}:\d{2}:\d{2})\s+(?P<server>\S+)")
        .unwrap()
});

/// Client IPv4 followed (non-greedily) by the attempted SASL username.
static SASL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<ip>\d{1,3}(?:\.\d{1,3}){3}).*?sasl_username=(?P<user>[^,]+)").unwrap()
});

fn month_number(abbr: &str) -> Option<u32> {
    match abbr {
        "Jan" => Some(1),
        "Feb" => Some(2),
        "Mar" => Some(3),
        "Apr" => Some(4),
        "May" => Some(5),
        "Jun" => Some(6),
        "Jul" => Some(7),
        "Aug" => Some(8),
        "Sep" => Some(9),
        "Oct" => Some(10),
        "Nov" => Some(11),
        "Dec" => Some(12),
        _ => None,
    }
}

/// Replaces embedded line breaks so a field cannot span CSV rows.
pub fn sanitize_field(value: &str) -> String {
    value.replace('\n', " ").replace('\r', " ")
}

/// Parses one log line into its pre-enrichment fields.
///
/// Returns `None` for lines that are not SASL authentication failures.
/// `current_year` fills in the year the syslog timestamp omits.
pub fn parse_line(line: &str, current_year: i32) -> Option<ParsedEntry> {
    let header = HEADER_RE.captures(line)?;
    let header_end = header.get(0)?.end();

    // The SASL pattern is only searched past the header so an IP-looking
    // hostname cannot be mistaken for the client address.
    let message = &line[header_end..];
    let sasl = SASL_RE.captures(message)?;

    let month_abbr = &header["month"];
    let mon = match month_number(month_abbr) {
        Some(m) => m,
        None => {
            warn!("invalid month abbreviation in log line: {}", line.trim());
            return None;
        }
    };
    let day: u32 = match header["day"].parse() {
        Ok(d) => d,
        Err(_) => {
            warn!("invalid day in log line: {}", line.trim());
            return None;
        }
    };
    let hhmm = &header["time"][..5];
    let date = format!("{day:02}/{mon:02}/{current_year} {hhmm}");

    Some(ParsedEntry {
        server: header["server"].to_string(),
        date,
        ip: sasl["ip"].to_string(),
        user: sanitize_field(sasl["user"].trim()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_sasl_failure_line() {
        let line = "Mar 15 10:00:00 server1 postfix/submission/smtpd[100]: \
                    client=unknown[1.1.1.1], sasl_method=PLAIN, sasl_username=user1@example.com";
        let entry = parse_line(line, 2024).unwrap();
        assert_eq!(entry.server, "server1");
        assert_eq!(entry.date, "15/03/2024 10:00");
        assert_eq!(entry.ip, "1.1.1.1");
        assert_eq!(entry.user, "user1@example.com");
    }

    #[test]
    fn single_digit_day_is_zero_padded() {
        let line = "Jan  1 12:00:00 server postfix/smtpd[123]: \
                    client=unknown[1.2.3.4], sasl_username=user";
        let entry = parse_line(line, 2025).unwrap();
        assert_eq!(entry.date, "01/01/2025 12:00");
    }

    #[test]
    fn line_without_sasl_username_is_skipped() {
        let line = "Oct  2 12:34:56 mail postfix/smtpd[12345]: \
                    client=example.com[192.0.2.1], sasl_method=PLAIN";
        assert!(parse_line(line, 2024).is_none());
    }

    #[test]
    fn line_without_syslog_header_is_skipped() {
        let line = "completely unrelated text sasl_username=user";
        assert!(parse_line(line, 2024).is_none());
    }

    #[test]
    fn invalid_month_abbreviation_is_skipped() {
        let line = "Xxx  1 12:00:00 server postfix/smtpd[123]: \
                    client=unknown[1.2.3.4], sasl_username=user";
        assert!(parse_line(line, 2024).is_none());
    }

    #[test]
    fn username_is_trimmed_and_flattened() {
        let line = "Jan  1 12:00:00 server postfix/smtpd[123]: \
                    client=unknown[1.2.3.4], sasl_username=user\nname";
        let entry = parse_line(line, 2024).unwrap();
        assert_eq!(entry.user, "user name");
    }

    #[test]
    fn username_stops_at_comma() {
        let line = "Jan  1 12:00:00 server postfix/smtpd[123]: \
                    client=unknown[1.2.3.4], sasl_username=user@host, sasl_sender=<>";
        let entry = parse_line(line, 2024).unwrap();
        assert_eq!(entry.user, "user@host");
    }

    #[test]
    fn seconds_are_dropped_from_the_timestamp() {
        let line = "Dec 31 23:59:59 edge postfix/smtpd[1]: \
                    client=unknown[10.0.0.1], sasl_username=root";
        let entry = parse_line(line, 2023).unwrap();
        assert_eq!(entry.date, "31/12/2023 23:59");
    }
}
