//! Synthetic frames shared by the integration tests
#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use price_forecast::{DailyBar, TimeSeriesFrame};

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// Bars with close rising 1, 2, ..., rows and open = high = low = close.
///
/// Volume rises by 10 a day so no column has zero variance.
pub fn linear_bars(rows: usize) -> Vec<DailyBar> {
    (0..rows)
        .map(|i| {
            let price = (i + 1) as f64;
            DailyBar {
                date: start_date() + Days::new(i as u64),
                open: price,
                high: price,
                low: price,
                close: price,
                volume: 1000.0 + 10.0 * i as f64,
            }
        })
        .collect()
}

pub fn linear_frame(rows: usize) -> TimeSeriesFrame {
    TimeSeriesFrame::from_bars(&linear_bars(rows)).unwrap()
}

/// Oscillating closes around a slow trend
pub fn wave_frame(rows: usize) -> TimeSeriesFrame {
    let bars: Vec<DailyBar> = (0..rows)
        .map(|i| {
            let t = i as f64;
            let close = 50.0 + 0.1 * t + 5.0 * (t / 4.0).sin();
            DailyBar {
                date: start_date() + Days::new(i as u64),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000.0 + 50.0 * (t / 3.0).cos(),
            }
        })
        .collect();
    TimeSeriesFrame::from_bars(&bars).unwrap()
}
