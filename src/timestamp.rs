use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use thiserror::Error;

/// The timestamp text of a header line could not be interpreted.
///
/// Never fatal: [`FileInfo::set_timestr`](crate::FileInfo::set_timestr)
/// keeps the verbatim text and leaves the parsed stamp unset.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unparseable date string {0:?}")]
pub struct DateUnparseable(pub String);

// Timestamp styles emitted by diff generators, most specific first.
// GNU diff -u writes ISO with nanoseconds and a numeric zone; older tools
// write ISO without a zone; diff -c traditionally writes ctime format.
const ZONED_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f %z", "%Y-%m-%d %H:%M:%S %z"];
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%a %b %e %H:%M:%S %Y",
];

/// Given timestamp text like "2019-11-20 06:16:08.000000000 +0100", return
/// the parsed timestamp. Zone-less text is taken as UTC.
pub fn parse(timestr: &str) -> Result<DateTime<FixedOffset>, DateUnparseable> {
    let timestr = timestr.trim();
    for format in ZONED_FORMATS {
        if let Ok(stamp) = DateTime::parse_from_str(timestr, format) {
            return Ok(stamp);
        }
    }
    if let Ok(stamp) = DateTime::parse_from_rfc2822(timestr) {
        return Ok(stamp);
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(timestr, format) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }
    Err(DateUnparseable(timestr.to_string()))
}

/// The Unix epoch, used as the stamp of a nonexistent (`/dev/null`) side.
pub fn epoch() -> DateTime<FixedOffset> {
    DateTime::<Utc>::UNIX_EPOCH.fixed_offset()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_iso_with_zone() {
        let stamp = parse("2019-11-20 06:16:08.000000000 +0100").unwrap();
        assert_eq!(stamp.offset().local_minus_utc(), 3600);
        assert_eq!(stamp.hour(), 6);
    }

    #[test]
    fn test_parse_iso_without_zone() {
        let stamp = parse("2020-01-01 00:00:00").unwrap();
        assert_eq!(stamp, parse("2020-01-01 00:00:00 +0000").unwrap());
    }

    #[test]
    fn test_parse_ctime() {
        assert!(parse("Sat Feb 12 12:12:12 2000").is_ok());
    }

    #[test]
    fn test_parse_failure_is_reported() {
        assert_eq!(
            parse("not a date"),
            Err(DateUnparseable("not a date".to_string()))
        );
    }

    #[test]
    fn test_epoch() {
        assert_eq!(epoch().timestamp(), 0);
    }
}
