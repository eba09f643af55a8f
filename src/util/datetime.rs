use chrono::{Datelike, Months, NaiveDate};

/// 民國紀年與西元紀年的差距
const ROC_YEAR_OFFSET: i32 = 1911;

/// Convert ROC year to Gregorian year, `None` on overflow.
pub fn to_gregorian_year(year: i32) -> Option<i32> {
    year.checked_add(ROC_YEAR_OFFSET)
}

/// Parse a date string in the format of ROC calendar
/// and return it as a NaiveDate in the Gregorian calendar.
///
/// 接受 "113/02/05" 或 "113-02-05"，任何一段無法解析時回傳 None。
pub fn parse_taiwan_date(date_str: &str) -> Option<NaiveDate> {
    let split_date: Vec<&str> = date_str.trim().split(['/', '-']).collect();
    if split_date.len() != 3 {
        return None;
    }

    let year = to_gregorian_year(parse_date_part::<i32>(split_date[0])?)?;
    let month = parse_date_part::<u32>(split_date[1])?;
    let day = parse_date_part::<u32>(split_date[2])?;

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Try to parse a string as a date part and return it as an Option.
fn parse_date_part<T: std::str::FromStr>(date_part_str: &str) -> Option<T> {
    date_part_str.trim().parse::<T>().ok()
}

/// 將證交所的民國日期 ("113/02/05") 轉成 ISO 格式 ("2024-02-05")。
///
/// 不含 `/` 的字串視為已是西元格式，原樣回傳；
/// 無法解析的日期同樣原樣回傳，不會失敗。
///
/// ```text
/// assert_eq!(convert_date("113/02/05"), "2024-02-05");
/// assert_eq!(convert_date("2024-02-05"), "2024-02-05");
/// ```
pub fn convert_date(date_str: &str) -> String {
    if !date_str.contains('/') {
        return date_str.to_string();
    }

    let parts: Vec<&str> = date_str.split('/').collect();
    if parts.len() != 3 {
        return date_str.to_string();
    }

    match parse_taiwan_date(date_str) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => date_str.to_string(),
    }
}

/// 回傳包含 `today` 所在月份在內、最近 `months` 個月的每月 1 號，由舊到新。
pub fn recent_month_starts(today: NaiveDate, months: u32) -> Vec<NaiveDate> {
    let Some(this_month) = today.with_day(1) else {
        return Vec::new();
    };

    let mut result: Vec<NaiveDate> = (0..months)
        .filter_map(|i| this_month.checked_sub_months(Months::new(i)))
        .collect();
    result.reverse();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_date() {
        assert_eq!(convert_date("113/02/05"), "2024-02-05");
        assert_eq!(convert_date("99/12/31"), "2010-12-31");
        assert_eq!(convert_date("113/2/5"), "2024-02-05");
    }

    #[test]
    fn test_convert_date_passthrough() {
        assert_eq!(convert_date("2024-02-05"), "2024-02-05");
        assert_eq!(convert_date(""), "");
    }

    #[test]
    fn test_convert_date_malformed() {
        assert_eq!(convert_date("not-a-date"), "not-a-date");
        assert_eq!(convert_date("abc/02/05"), "abc/02/05");
        assert_eq!(convert_date("113/02"), "113/02");
        assert_eq!(convert_date("113/02/05/01"), "113/02/05/01");
        assert_eq!(convert_date("113/02/30"), "113/02/30");
        assert_eq!(convert_date("2147483647/01/01"), "2147483647/01/01");
        assert_eq!(convert_date("-2147483648/01/01"), "-2147483648/01/01");
    }

    #[test]
    fn test_parse_taiwan_date() {
        assert_eq!(
            parse_taiwan_date("113-02-05"),
            NaiveDate::from_ymd_opt(2024, 2, 5)
        );
        assert_eq!(parse_taiwan_date("113/13/01"), None);
        assert_eq!(parse_taiwan_date("113"), None);
    }

    #[test]
    fn test_roc_year() {
        assert_eq!(to_gregorian_year(113), Some(2024));
        assert_eq!(to_gregorian_year(i32::MAX), None);
    }

    #[test]
    fn test_recent_month_starts() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 17).unwrap();
        let months = recent_month_starts(today, 3);
        assert_eq!(
            months,
            vec![
                NaiveDate::from_ymd_opt(2023, 12, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            ]
        );
        assert!(recent_month_starts(today, 0).is_empty());
    }
}
