use chrono::{Datelike, NaiveDate};

// Two-digit years first: `%Y` would happily read "20" as year 20.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%y", "%m/%d/%Y"];

/// Days between 0001-01-01 (CE day 1) and the Unix epoch.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Parse a calendar date in any of the accepted layouts.
///
/// A trailing time component (`"2020-01-22 00:00:00"`, `"2020-01-22T00:00:00"`)
/// is ignored.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let date_part = s
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or(s);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Calendar date → Arrow `Date32` (days since 1970-01-01).
pub fn to_date32(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

/// Arrow `Date32` → calendar date.
pub fn from_date32(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + EPOCH_DAYS_FROM_CE)
}

/// Render a `Date32` value as `YYYY-MM-DD`.
pub fn format_date32(days: i32) -> String {
    match from_date32(days) {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => days.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_all_layouts() {
        let want = NaiveDate::from_ymd_opt(2020, 1, 22).unwrap();
        for raw in [
            "2020-01-22",
            "2020/01/22",
            "01/22/2020",
            "1/22/20",
            "2020-01-22 00:00:00",
            "2020-01-22T13:45:00",
        ] {
            assert_eq!(parse_date(raw), Some(want), "{raw}");
        }
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2020-13-40"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn date32_matches_unix_epoch() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(to_date32(epoch), 0);
        let d = NaiveDate::from_ymd_opt(2020, 7, 27).unwrap();
        assert_eq!(from_date32(to_date32(d)), Some(d));
        assert_eq!(format_date32(to_date32(d)), "2020-07-27");
    }
}
