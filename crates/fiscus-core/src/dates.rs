//! Calendar-month helpers.
//!
//! Ledger aggregation and installment expansion both work in whole calendar
//! months, so the month arithmetic lives here once.

use chrono::{Datelike, NaiveDate};

/// Portuguese month names, 1-indexed via `month_name_pt`.
const MONTHS_PT: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Number of days in the given month.
#[must_use]
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_y, next_m) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_y, next_m, 1)
        .and_then(|d| d.pred_opt())
        .map_or(28, |d| d.day())
}

/// First and last day of the given month.
///
/// Returns `None` for out-of-range year/month values.
#[must_use]
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))?;
    Some((first, last))
}

/// Add `n` calendar months, clamping the day to the target month's length.
///
/// `2025-01-31 + 1 month = 2025-02-28`.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn add_months(date: NaiveDate, n: u32) -> NaiveDate {
    let total = date.month0() + n;
    let year = date.year() + (total / 12) as i32;
    let month = total % 12 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(date)
}

/// pt-BR month name for a 1-based month number.
#[must_use]
pub fn month_name_pt(month: u32) -> &'static str {
    MONTHS_PT.get(month.saturating_sub(1) as usize).copied().unwrap_or("?")
}

/// `dd/mm/yyyy` formatting used across prompts and source citations.
#[must_use]
pub fn format_date_br(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn days_in_regular_months() {
        assert_eq!(days_in_month(2025, 1), 31);
        assert_eq!(days_in_month(2025, 4), 30);
        assert_eq!(days_in_month(2025, 2), 28);
    }

    #[test]
    fn days_in_leap_february() {
        assert_eq!(days_in_month(2024, 2), 29);
    }

    #[test]
    fn month_bounds_cover_whole_month() {
        let (first, last) = month_bounds(2025, 3).unwrap();
        assert_eq!(first, d(2025, 3, 1));
        assert_eq!(last, d(2025, 3, 31));
    }

    #[test]
    fn month_bounds_invalid_month() {
        assert!(month_bounds(2025, 13).is_none());
    }

    #[test]
    fn add_months_simple() {
        assert_eq!(add_months(d(2025, 3, 1), 1), d(2025, 4, 1));
        assert_eq!(add_months(d(2025, 3, 1), 2), d(2025, 5, 1));
    }

    #[test]
    fn add_months_across_year() {
        assert_eq!(add_months(d(2025, 11, 15), 3), d(2026, 2, 15));
    }

    #[test]
    fn add_months_clamps_day() {
        assert_eq!(add_months(d(2025, 1, 31), 1), d(2025, 2, 28));
        assert_eq!(add_months(d(2024, 1, 31), 1), d(2024, 2, 29));
        assert_eq!(add_months(d(2025, 1, 31), 2), d(2025, 3, 31));
    }

    #[test]
    fn add_zero_months_is_identity() {
        assert_eq!(add_months(d(2025, 6, 10), 0), d(2025, 6, 10));
    }

    #[test]
    fn month_names() {
        assert_eq!(month_name_pt(1), "Janeiro");
        assert_eq!(month_name_pt(12), "Dezembro");
        assert_eq!(month_name_pt(0), "?");
        assert_eq!(month_name_pt(13), "?");
    }

    #[test]
    fn br_date_format() {
        assert_eq!(format_date_br(d(2025, 3, 7)), "07/03/2025");
    }
}
