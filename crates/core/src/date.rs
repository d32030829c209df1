use crate::error::{Error, Result};
use chrono::{DateTime, Datelike, FixedOffset};

/// Abbreviated month names, Brazilian Portuguese
const MONTHS_PT_BR: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

/// Parse a CMS publication timestamp.
///
/// Accepts RFC 3339 as well as the `+0000` offsets Prismic emits.
pub fn parse_publication_date(iso: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = iso.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .or_else(|_| DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%z"))
        .or_else(|_| DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map_err(|e| Error::InvalidData(format!("Invalid publication date '{}': {}", iso, e)))
}

/// Format an ISO timestamp as `dd MMM yyyy` (e.g. "25 mar 2021").
///
/// The calendar date is taken in the offset carried by the timestamp.
/// Input that is already formatted is rejected rather than reformatted.
pub fn format_publication_date(iso: &str) -> Result<String> {
    let date = parse_publication_date(iso)?;
    Ok(format!(
        "{:02} {} {}",
        date.day(),
        MONTHS_PT_BR[date.month0() as usize],
        date.year()
    ))
}

/// Display form of an optional publication date.
///
/// Missing dates render empty, unparseable ones render as given.
pub fn display_date(iso: Option<&str>) -> String {
    match iso {
        None => String::new(),
        Some(raw) => format_publication_date(raw).unwrap_or_else(|_| raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_prismic_timestamp() {
        assert_eq!(
            format_publication_date("2021-03-25T19:27:35+0000").unwrap(),
            "25 mar 2021"
        );
    }

    #[test]
    fn test_format_rfc3339() {
        assert_eq!(
            format_publication_date("2021-02-01T10:00:00+00:00").unwrap(),
            "01 fev 2021"
        );
        assert_eq!(
            format_publication_date("2020-12-31T23:59:59Z").unwrap(),
            "31 dez 2020"
        );
    }

    #[test]
    fn test_format_uses_embedded_offset() {
        // 02:00 at -03:00 is still the 1st locally
        assert_eq!(
            format_publication_date("2021-05-01T02:00:00-03:00").unwrap(),
            "01 mai 2021"
        );
    }

    #[test]
    fn test_all_months() {
        let expected = [
            "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
        ];
        for (i, month) in expected.iter().enumerate() {
            let iso = format!("2021-{:02}-15T12:00:00+0000", i + 1);
            assert_eq!(
                format_publication_date(&iso).unwrap(),
                format!("15 {} 2021", month)
            );
        }
    }

    #[test]
    fn test_reformatting_is_rejected() {
        let once = format_publication_date("2021-03-25T19:27:35+0000").unwrap();
        let twice = format_publication_date(&once);
        assert!(twice.is_err());
        assert!(twice.unwrap_err().to_string().contains("25 mar 2021"));
    }

    #[test]
    fn test_display_date_fallbacks() {
        assert_eq!(display_date(None), "");
        assert_eq!(display_date(Some("not a date")), "not a date");
        assert_eq!(
            display_date(Some("2021-03-25T19:27:35+0000")),
            "25 mar 2021"
        );
    }

    #[test]
    fn test_display_date_does_not_touch_input() {
        let stored = String::from("2021-03-25T19:27:35+0000");
        let first = display_date(Some(&stored));
        let second = display_date(Some(&stored));
        assert_eq!(first, second);
        assert_eq!(stored, "2021-03-25T19:27:35+0000");
    }
}
