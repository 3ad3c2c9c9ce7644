mod common;

use approx::assert_relative_eq;
use chrono::Days;
use pretty_assertions::assert_eq;
use price_forecast::{
    train_and_forecast, ErrorKind, FeatureSpec, Indicator, LayerConfig, ModelConfig,
};
use rstest::rstest;

#[rstest]
#[case(Indicator::Sma { period: 10 }, 9)]
#[case(Indicator::Ema { period: 10 }, 0)]
#[case(Indicator::Rsi { period: 14 }, 14)]
fn test_warm_up_rows(#[case] indicator: Indicator, #[case] warm_up: usize) {
    let frame = common::wave_frame(40).with_indicator(&indicator).unwrap();
    let values = frame.column(&indicator.column_name()).unwrap();

    assert_eq!(values.len(), 40);
    assert_eq!(values.iter().take_while(|v| v.is_nan()).count(), warm_up);
    assert!(values[warm_up..].iter().all(|v| v.is_finite()));
}

#[test]
fn test_sma_of_linear_closes() {
    let frame = common::linear_frame(8)
        .with_indicator(&Indicator::Sma { period: 3 })
        .unwrap();
    let sma = frame.column("SMA_3").unwrap();

    // mean of 6, 7, 8
    assert_relative_eq!(sma[7], 7.0);
}

#[test]
fn test_rsi_stays_in_range() {
    let frame = common::wave_frame(80)
        .with_indicator(&Indicator::Rsi { period: 14 })
        .unwrap();
    let rsi = frame.column("RSI_14").unwrap();
    assert!(rsi[14..].iter().all(|v| (0.0..=100.0).contains(v)));
}

#[test]
fn test_indicators_added_in_order() {
    let indicators = Indicator::available();
    let frame = common::wave_frame(70).with_indicators(&indicators).unwrap();

    assert_eq!(
        frame.column_names(),
        vec!["open", "high", "low", "close", "volume", "SMA_50", "EMA_10", "RSI_14"]
    );

    let spec = FeatureSpec::new(["close", "SMA_50", "EMA_10", "RSI_14"]).unwrap();
    let complete = frame.drop_incomplete_rows(&spec).unwrap();
    // SMA_50 has the longest warm-up
    assert_eq!(complete.len(), 21);
}

#[test]
fn test_training_with_indicator_columns() {
    let frame = common::wave_frame(120);
    let config = ModelConfig {
        training_columns: vec![
            "close".to_string(),
            "volume".to_string(),
            "SMA_10".to_string(),
            "RSI_14".to_string(),
        ],
        indicators: vec![Indicator::Sma { period: 10 }, Indicator::Rsi { period: 14 }],
        lookback: 8,
        horizon: 1,
        forecast_period: 5,
        layers: vec![LayerConfig::lstm(8, false)],
        epochs: 3,
        seed: Some(1),
        ..ModelConfig::default()
    };

    let (artifacts, result) = train_and_forecast(&frame, &config).unwrap();

    assert_eq!(artifacts.scaler().columns().len(), 4);
    assert_eq!(result.len(), 5);
    assert_relative_eq!(
        result.values()[0],
        frame.last_value("close").unwrap(),
        epsilon = 1e-9
    );
    assert_eq!(
        result.dates()[0],
        frame.last_date().unwrap() + Days::new(1)
    );
}

#[test]
fn test_indicator_column_without_indicator() {
    let frame = common::wave_frame(60);
    let config = ModelConfig {
        training_columns: vec!["close".to_string(), "EMA_10".to_string()],
        ..ModelConfig::default()
    };

    let err = train_and_forecast(&frame, &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Data);
}
