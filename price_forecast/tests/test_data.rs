mod common;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use price_forecast::{DataLoader, FeatureSpec, ForecastError};
use std::io::Write;
use tempfile::NamedTempFile;

fn csv_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

#[test]
fn test_data_loader_from_csv() {
    let file = csv_file(&[
        "date,open,high,low,close,volume",
        "2023-01-02,100.0,105.0,98.0,103.0,1000",
        "2023-01-03,103.0,107.0,101.0,106.0,1200",
        "2023-01-04,106.0,110.0,104.0,108.0,1500",
    ]);

    let frame = DataLoader::from_csv(file.path()).unwrap();

    assert_eq!(frame.len(), 3);
    assert_eq!(frame.date_column(), "date");
    assert_eq!(
        frame.last_date().unwrap(),
        NaiveDate::from_ymd_opt(2023, 1, 4).unwrap()
    );
    assert_eq!(frame.column("close").unwrap(), vec![103.0, 106.0, 108.0]);
    // integer volume is read as f64
    assert_eq!(frame.last_value("volume").unwrap(), 1500.0);
}

#[test]
fn test_timestamp_dates_are_truncated_to_days() {
    let file = csv_file(&[
        "Date,Close",
        "2024-01-02 00:00:00-05:00,10.5",
        "2024-01-03 00:00:00-05:00,11.0",
    ]);

    let frame = DataLoader::from_csv(file.path()).unwrap();
    assert_eq!(frame.date_column(), "Date");
    assert_eq!(
        frame.dates()[0],
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    );
}

#[test]
fn test_dates_must_increase() {
    let file = csv_file(&[
        "date,close",
        "2023-01-03,103.0",
        "2023-01-02,106.0",
    ]);

    let result = DataLoader::from_csv(file.path());
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn test_missing_file() {
    let result = DataLoader::from_csv("nonexistent_file.csv");
    assert!(matches!(result, Err(ForecastError::IoError(_))));
}

#[test]
fn test_from_bars_columns() {
    let frame = common::linear_frame(10);

    assert_eq!(
        frame.column_names(),
        vec!["open", "high", "low", "close", "volume"]
    );
    assert_eq!(frame.dates()[0], common::start_date());
    assert_eq!(frame.last_value("close").unwrap(), 10.0);
}

#[test]
fn test_unknown_column() {
    let frame = common::linear_frame(5);
    assert!(matches!(
        frame.column("adj_close"),
        Err(ForecastError::DataError(_))
    ));

    let spec = FeatureSpec::new(["close", "adj_close"]).unwrap();
    assert!(frame.feature_matrix(&spec).is_err());
}

#[test]
fn test_feature_matrix_follows_spec_order() {
    let frame = common::linear_frame(4);
    let spec = FeatureSpec::with_target("close", ["volume", "close"]).unwrap();

    let matrix = frame.feature_matrix(&spec).unwrap();
    assert_eq!(matrix.dim(), (4, 2));
    assert_eq!(matrix[[3, 0]], 4.0);
    assert_eq!(matrix[[3, 1]], 1030.0);
}

#[test]
fn test_drop_incomplete_rows() {
    let frame = common::linear_frame(6);
    let values = vec![f64::NAN, f64::NAN, 1.0, 2.0, 3.0, 4.0];
    let frame = frame.with_column("signal", values).unwrap();
    let spec = FeatureSpec::new(["close", "signal"]).unwrap();

    assert!(frame.feature_matrix(&spec).is_err());

    let complete = frame.drop_incomplete_rows(&spec).unwrap();
    assert_eq!(complete.len(), 4);
    assert_eq!(complete.dates()[0], frame.dates()[2]);
    assert_eq!(complete.column("close").unwrap(), vec![3.0, 4.0, 5.0, 6.0]);
}

#[test]
fn test_slice_and_tail() {
    let frame = common::linear_frame(10);

    let middle = frame.slice(2, Some(5)).unwrap();
    assert_eq!(middle.column("close").unwrap(), vec![3.0, 4.0, 5.0]);

    let tail = frame.tail(3).unwrap();
    assert_eq!(tail.len(), 3);
    assert_eq!(tail.last_date().unwrap(), frame.last_date().unwrap());

    assert!(frame.slice(5, Some(11)).is_err());
}
