use pretty_assertions::assert_eq;
use price_forecast::{
    ErrorKind, Indicator, LayerConfig, LayerKind, LossKind, ModelConfig, OptimizerKind,
};
use std::io::Write;
use tempfile::NamedTempFile;

const DIALOG_JSON: &str = r#"{
    "training_cols": ["open", "close", "volume"],
    "target_variable": "close",
    "epochs": 12,
    "step_past": 20,
    "step_future": 5,
    "dropout": 0.1,
    "optimizer": "RMSprop",
    "loss": "mean_absolute_error",
    "layer_config": [
        {"neuron_spinbox": 32, "type_combobox": "GRU", "rseq": true},
        {"neuron_spinbox": 8, "type_combobox": "SimpleRNN", "rseq": false}
    ],
    "indicators": [{"kind": "RSI"}]
}"#;

#[test]
fn test_dialog_field_names() {
    let config = ModelConfig::from_json_str(DIALOG_JSON).unwrap();

    assert_eq!(config.lookback, 20);
    assert_eq!(config.horizon, 5);
    assert_eq!(config.epochs, 12);
    assert_eq!(config.optimizer, OptimizerKind::RmsProp);
    assert_eq!(config.loss, LossKind::Mae);
    assert_eq!(
        config.layers,
        vec![
            LayerConfig::new(LayerKind::Gru, 32, true),
            LayerConfig::new(LayerKind::SimpleRnn, 8, false),
        ]
    );
    assert_eq!(config.indicators, vec![Indicator::Rsi { period: 14 }]);
    // unspecified fields fall back to defaults
    assert_eq!(config.forecast_period, 15);
    assert_eq!(config.batch_size, 16);
}

#[test]
fn test_target_moves_to_front() {
    let config = ModelConfig::from_json_str(DIALOG_JSON).unwrap();
    let spec = config.feature_spec().unwrap();

    assert_eq!(spec.columns(), &["close", "open", "volume"]);
}

#[test]
fn test_round_trip_through_file() {
    let config = ModelConfig {
        seed: Some(9),
        indicators: Indicator::available(),
        ..ModelConfig::default()
    };

    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", config.to_json_string().unwrap()).unwrap();

    let loaded = ModelConfig::from_json_file(file.path()).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_empty_object_is_default() {
    let config = ModelConfig::from_json_str("{}").unwrap();
    assert_eq!(config, ModelConfig::default());
}

#[test]
fn test_unknown_optimizer() {
    let err = ModelConfig::from_json_str(r#"{"optimizer": "lbfgs"}"#).unwrap_err();
    assert!(err.to_string().contains("lbfgs"));
}

#[test]
fn test_invalid_layer_stack() {
    let json = r#"{"layers": [{"units": 16, "kind": "LSTM", "return_sequences": true}]}"#;
    let err = ModelConfig::from_json_str(json).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_zero_lookback() {
    let err = ModelConfig::from_json_str(r#"{"step_past": 0}"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_indicator_period_must_be_positive() {
    let err = ModelConfig::from_json_str(r#"{"indicators": [{"kind": "SMA", "period": 0}]}"#)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_missing_file() {
    let err = ModelConfig::from_json_file("no_such_config.json").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}
