//! Date stamps shown on the pages

use chrono::{Local, NaiveDate};

/// `d.m.yyyy`, as the German locale prints a short date
pub fn date_stamp(date: NaiveDate) -> String {
    date.format("%-d.%-m.%Y").to_string()
}

/// `yyyy-mm-dd`, the value format of `<input type=date>`
pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_stamp_has_no_padding() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(date_stamp(date), "7.3.2026");
        assert_eq!(iso_date(date), "2026-03-07");
    }

    #[test]
    fn test_date_stamp_two_digit_parts() {
        let date = NaiveDate::from_ymd_opt(2026, 12, 24).unwrap();
        assert_eq!(date_stamp(date), "24.12.2026");
    }
}
