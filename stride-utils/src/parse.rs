use chrono::{DateTime, NaiveDate};

/// Interpret common truthy spellings (`1`, `true`, `yes`, `on`), case-insensitively.
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Parse an ISO `YYYY-MM-DD` date, also accepting a full RFC 3339 timestamp.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }

    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|timestamp| timestamp.date_naive())
}

/// Parse a pace written as `m:ss` (or plain seconds) into seconds.
pub fn parse_pace_seconds(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    match trimmed.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes = minutes.trim().parse::<i32>().ok()?;
            let seconds = seconds.trim().parse::<i32>().ok()?;
            if minutes < 0 || !(0..60).contains(&seconds) {
                return None;
            }
            minutes.checked_mul(60)?.checked_add(seconds)
        }
        None => trimmed.parse::<i32>().ok().filter(|value| *value >= 0),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{parse_flag, parse_iso_date, parse_pace_seconds};

    #[test]
    fn flags_accept_truthy_spellings() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("1"));
        assert!(parse_flag("on"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("maybe"));
    }

    #[test]
    fn parses_dates_and_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2025, 2, 14);
        assert_eq!(parse_iso_date("2025-02-14"), expected);
        assert_eq!(parse_iso_date("2025-02-14T07:30:00Z"), expected);
        assert_eq!(parse_iso_date("14/02/2025"), None);
        assert_eq!(parse_iso_date("  "), None);
    }

    #[test]
    fn parses_paces() {
        assert_eq!(parse_pace_seconds("5:30"), Some(330));
        assert_eq!(parse_pace_seconds(" 4:05 "), Some(245));
        assert_eq!(parse_pace_seconds("300"), Some(300));
        assert_eq!(parse_pace_seconds("5:75"), None);
        assert_eq!(parse_pace_seconds("fast"), None);
    }
}
