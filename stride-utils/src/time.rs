use chrono::{Datelike, Days, NaiveDate, Utc};

/// Current calendar date in UTC.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// First day of the month containing `date`.
pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// `date` minus `days`, saturating at the earliest representable date.
pub fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

/// Inclusive `[start, end]` range of the trailing `days` ending on `end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn trailing(end: NaiveDate, days: u64) -> Self {
        Self {
            start: days_before(end, days),
            end,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{DateWindow, days_before, start_of_month};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_start_resets_day() {
        assert_eq!(start_of_month(date(2025, 3, 17)), date(2025, 3, 1));
        assert_eq!(start_of_month(date(2025, 3, 1)), date(2025, 3, 1));
    }

    #[test]
    fn days_before_crosses_month_boundaries() {
        assert_eq!(days_before(date(2025, 3, 3), 7), date(2025, 2, 24));
        assert_eq!(days_before(date(2024, 3, 1), 365), date(2023, 3, 2));
    }

    #[test]
    fn trailing_window_is_inclusive() {
        let window = DateWindow::trailing(date(2025, 1, 10), 7);
        assert!(window.contains(date(2025, 1, 3)));
        assert!(window.contains(date(2025, 1, 10)));
        assert!(!window.contains(date(2025, 1, 2)));
        assert!(!window.contains(date(2025, 1, 11)));
    }
}
