//! 日历特征

use crate::types::CalendarFields;
use chrono::{DateTime, Datelike, Utc};

const DAY_NAMES: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// 根据发布时间计算日历特征，时间缺失时全部缺失
pub fn calendar_fields(created: Option<DateTime<Utc>>) -> Option<CalendarFields> {
    let ts = created?;
    let date = ts.date_naive();
    let day_of_week = date.weekday().num_days_from_monday();
    let next_day = date.succ_opt();

    Some(CalendarFields {
        year: date.year(),
        month: date.month(),
        day: date.day(),
        day_of_week,
        week_of_year: date.iso_week().week(),
        quarter: (date.month() - 1) / 3 + 1,
        day_name: DAY_NAMES[day_of_week as usize].to_string(),
        month_name: MONTH_NAMES[date.month0() as usize].to_string(),
        is_weekend: day_of_week >= 5,
        is_month_start: date.day() == 1,
        is_month_end: next_day.map_or(true, |d| d.month() != date.month()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_missing_created_yields_no_fields() {
        assert_eq!(calendar_fields(None), None);
    }

    #[test]
    fn test_weekend_and_month_end() {
        // 2024-03-31 是周日，第一季度最后一天
        let ts = Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 0).unwrap();
        let fields = calendar_fields(Some(ts)).unwrap();

        assert_eq!(fields.year, 2024);
        assert_eq!(fields.month, 3);
        assert_eq!(fields.day, 31);
        assert_eq!(fields.day_of_week, 6);
        assert_eq!(fields.day_name, "Sunday");
        assert_eq!(fields.month_name, "March");
        assert_eq!(fields.quarter, 1);
        assert_eq!(fields.week_of_year, 13);
        assert!(fields.is_weekend);
        assert!(fields.is_month_end);
        assert!(!fields.is_month_start);
    }

    #[test]
    fn test_iso_week_at_year_boundary() {
        // 2021-01-01 属于 2020 年的第 53 周
        let ts = Utc.with_ymd_and_hms(2021, 1, 1, 8, 0, 0).unwrap();
        let fields = calendar_fields(Some(ts)).unwrap();

        assert_eq!(fields.week_of_year, 53);
        assert_eq!(fields.day_of_week, 4);
        assert_eq!(fields.quarter, 1);
        assert!(fields.is_month_start);
        assert!(!fields.is_weekend);
    }
}
