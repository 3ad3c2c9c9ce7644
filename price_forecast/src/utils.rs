//! Utility functions for the price_forecast crate

use crate::error::{ForecastError, Result};
use chrono::{Days, NaiveDate};

/// `count` consecutive calendar days after `last_date`.
///
/// Weekends and holidays are not skipped.
pub fn future_dates(last_date: NaiveDate, count: usize) -> Result<Vec<NaiveDate>> {
    (1..=count as u64)
        .map(|offset| {
            last_date.checked_add_days(Days::new(offset)).ok_or_else(|| {
                ForecastError::DataError(format!(
                    "Date {} plus {} days is out of range",
                    last_date, offset
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_future_dates_cross_month_end() {
        let last = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        let dates = future_dates(last, 3).unwrap();

        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            ]
        );
    }

    #[test]
    fn test_future_dates_empty() {
        let last = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(future_dates(last, 0).unwrap().is_empty());
    }
}
