//! Recipe version stamps

use time::OffsetDateTime;

/// `YYDDD.HHMM` from the UTC date and time, e.g. `24061.0905`
pub fn version_stamp(at: OffsetDateTime) -> String {
    let at = at.to_offset(time::UtcOffset::UTC);
    format!(
        "{:02}{:03}.{:02}{:02}",
        at.year().rem_euclid(100),
        at.ordinal(),
        at.hour(),
        at.minute()
    )
}

/// Milliseconds since the Unix epoch
pub fn epoch_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

/// A well-formed stamp: five digits, a dot, four digits
pub fn is_version_stamp(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes[5] == b'.'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 5 || b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_stamp_pads_fields() {
        assert_eq!(version_stamp(datetime!(2024-03-01 09:05 UTC)), "24061.0905");
        assert_eq!(version_stamp(datetime!(2009-01-01 00:00 UTC)), "09001.0000");
        assert_eq!(version_stamp(datetime!(2023-12-31 23:59 UTC)), "23365.2359");
    }

    #[test]
    fn test_stamp_uses_utc() {
        assert_eq!(
            version_stamp(datetime!(2024-01-01 01:30 +02:00)),
            "23365.2330"
        );
    }

    #[test]
    fn test_epoch_millis() {
        assert_eq!(epoch_millis(datetime!(1970-01-01 00:00:01.5 UTC)), 1500);
    }

    #[test]
    fn test_is_version_stamp() {
        assert!(is_version_stamp("24061.0905"));
        assert!(!is_version_stamp("2461.0905"));
        assert!(!is_version_stamp("24061-0905"));
    }
}
