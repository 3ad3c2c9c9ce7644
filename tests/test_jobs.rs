use chrono::{Days, NaiveDate};
use pretty_assertions::assert_eq;
use price_forecast::{
    DailyBar, DataLoader, ErrorKind, LayerConfig, ModelConfig, TimeSeriesFrame,
};
use std::fs;
use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use stock_forecaster::{ForecastJob, JobOutcome, ModelSlot};
use tempfile::NamedTempFile;

fn rising_frame(rows: usize) -> TimeSeriesFrame {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let bars: Vec<DailyBar> = (0..rows)
        .map(|i| {
            let price = 20.0 + 0.5 * i as f64 + (i as f64 / 3.0).sin();
            DailyBar {
                date: start + Days::new(i as u64),
                open: price - 0.2,
                high: price + 0.4,
                low: price - 0.4,
                close: price,
                volume: 5000.0 + 25.0 * i as f64,
            }
        })
        .collect();
    TimeSeriesFrame::from_bars(&bars).unwrap()
}

fn quick_config() -> ModelConfig {
    ModelConfig {
        lookback: 6,
        horizon: 2,
        forecast_period: 4,
        layers: vec![LayerConfig::gru(6, false)],
        epochs: 2,
        seed: Some(11),
        ..ModelConfig::default()
    }
}

#[test]
fn test_job_completes() {
    let frame = rising_frame(60);
    let last_close = frame.last_value("close").unwrap();

    let run = ForecastJob::spawn(frame, quick_config())
        .wait()
        .into_result()
        .unwrap();

    assert_eq!(run.forecast.len(), 4);
    assert!((run.forecast.values()[0] - last_close).abs() < 1e-9);
    assert_eq!(run.artifacts.model().history().epochs(), 2);
}

#[test]
fn test_job_reports_insufficient_data() {
    let outcome = ForecastJob::spawn(rising_frame(7), quick_config()).wait();

    match outcome {
        JobOutcome::Failed(err) => assert_eq!(err.kind(), ErrorKind::InsufficientData),
        JobOutcome::Completed(_) => panic!("expected the job to fail"),
    }
}

#[test]
fn test_job_reports_configuration_error() {
    let config = ModelConfig {
        epochs: 0,
        ..quick_config()
    };
    let outcome = ForecastJob::spawn(rising_frame(60), config).wait();

    assert!(!outcome.is_completed());
    assert_eq!(
        outcome.into_result().unwrap_err().kind(),
        ErrorKind::Configuration
    );
}

#[test]
fn test_forecast_job_reuses_artifacts() {
    let frame = rising_frame(60);
    let trained = ForecastJob::spawn(frame.clone(), quick_config())
        .wait()
        .into_result()
        .unwrap();

    let run = ForecastJob::spawn_forecast(trained.artifacts.clone(), frame, 3)
        .wait()
        .into_result()
        .unwrap();

    assert!(Arc::ptr_eq(&run.artifacts, &trained.artifacts));
    assert_eq!(run.forecast.len(), 3);
    // same model, same scaler, same input: the shared prefix matches
    assert_eq!(run.forecast.dates()[0], trained.forecast.dates()[0]);
}

#[test]
fn test_try_outcome_polls_until_done() {
    let mut handle = ForecastJob::spawn(rising_frame(60), quick_config());

    let mut outcome = None;
    for _ in 0..600 {
        if handle.is_finished() {
            outcome = handle.try_outcome();
            break;
        }
        thread::sleep(Duration::from_millis(50));
    }

    assert!(outcome.expect("job did not finish in time").is_completed());
    assert!(handle.try_outcome().is_none());
}

#[test]
fn test_dropped_handle_detaches() {
    drop(ForecastJob::spawn(rising_frame(60), quick_config()));
}

#[test]
fn test_model_slot() {
    let slot = ModelSlot::new();
    assert!(slot.is_empty());

    let run = ForecastJob::spawn(rising_frame(60), quick_config())
        .wait()
        .into_result()
        .unwrap();

    assert!(slot.set(run.artifacts.clone()).is_none());
    let stored = slot.get().unwrap();
    assert!(Arc::ptr_eq(&stored, &run.artifacts));

    let cleared = slot.clear().unwrap();
    assert!(Arc::ptr_eq(&cleared, &run.artifacts));
    assert!(slot.is_empty());
    // readers keep their handle after the slot is cleared
    assert_eq!(stored.lookback(), 6);
}

#[test]
fn test_csv_in_csv_out() {
    let mut input = NamedTempFile::new().unwrap();
    writeln!(input, "date,open,high,low,close,volume").unwrap();
    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    for i in 0..60u64 {
        let close = 20.0 + 0.5 * i as f64 + (i as f64 / 3.0).sin();
        writeln!(
            input,
            "{},{},{},{},{},{}",
            start + Days::new(i),
            close - 0.2,
            close + 0.4,
            close - 0.4,
            close,
            5000 + 25 * i
        )
        .unwrap();
    }

    let frame = DataLoader::from_csv(input.path()).unwrap();
    let last_date = frame.last_date().unwrap();
    let run = ForecastJob::spawn(frame, quick_config())
        .wait()
        .into_result()
        .unwrap();

    let output = NamedTempFile::new().unwrap();
    run.forecast
        .without_join_point()
        .write_csv(output.reopen().unwrap())
        .unwrap();

    let text = fs::read_to_string(output.path()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "date,close");
    let first_date = (last_date + Days::new(2)).to_string();
    assert!(lines[1].starts_with(&first_date));
}
