use chrono::{DateTime, NaiveDate, Utc};

/// Whole days between an ISO timestamp or date and `now`; `None` if unparsable.
pub fn days_since(raw: &str, now: DateTime<Utc>) -> Option<i64> {
    let then = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d")
                .ok()?
                .and_hms_opt(0, 0, 0)
                .map(|naive| naive.and_utc())
        })?;
    Some(now.signed_duration_since(then).num_days().max(0))
}

pub fn format_days_ago(days: i64) -> String {
    match days {
        i64::MIN..=0 => "today".to_string(),
        1 => "1 day ago".to_string(),
        n => format!("{n} days ago"),
    }
}

/// Compact tenure: `5d`, `3mo`, `1y 2mo`.
pub fn format_tenure(days: u32) -> String {
    let years = days / 365;
    let months = (days % 365) / 30;
    match (years, months) {
        (0, 0) => format!("{days}d"),
        (0, m) => format!("{m}mo"),
        (y, 0) => format!("{y}y"),
        (y, m) => format!("{y}y {m}mo"),
    }
}

/// `"updated 3 days ago"` style caption for a snapshot date.
pub fn snapshot_caption(date: Option<&str>, now: DateTime<Utc>) -> String {
    match date.and_then(|date| days_since(date, now)) {
        Some(days) => format!("snapshot {}", format_days_ago(days)),
        None => "snapshot date unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{days_since, format_days_ago, format_tenure, snapshot_caption};

    #[test]
    fn days_since_accepts_timestamps_and_dates() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(days_since("2026-03-07T08:00:00Z", now), Some(3));
        assert_eq!(days_since("2026-03-01", now), Some(9));
        assert_eq!(days_since("yesterday", now), None);
    }

    #[test]
    fn future_dates_clamp_to_today() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(days_since("2026-03-12", now), Some(0));
        assert_eq!(format_days_ago(0), "today");
    }

    #[test]
    fn days_ago_pluralises() {
        assert_eq!(format_days_ago(1), "1 day ago");
        assert_eq!(format_days_ago(14), "14 days ago");
    }

    #[test]
    fn tenure_rolls_up_into_months_and_years() {
        assert_eq!(format_tenure(5), "5d");
        assert_eq!(format_tenure(45), "1mo");
        assert_eq!(format_tenure(365), "1y");
        assert_eq!(format_tenure(430), "1y 2mo");
    }

    #[test]
    fn caption_handles_missing_date() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(snapshot_caption(None, now), "snapshot date unknown");
        assert_eq!(snapshot_caption(Some("2026-03-09"), now), "snapshot 1 day ago");
    }
}
