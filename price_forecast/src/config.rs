//! Model configuration loaded from JSON

use crate::error::{ForecastError, Result};
use crate::features::FeatureSpec;
use crate::indicators::Indicator;
use crate::loss::LossKind;
use crate::models::{LayerConfig, NetworkConfig};
use crate::optim::OptimizerKind;
use crate::trainer::TrainingOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything needed to train a model and produce a forecast.
///
/// Missing fields take their defaults. `step_past`, `step_future`,
/// `training_cols` and `layer_config` are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Columns fed to the network; the target is moved to the front
    #[serde(alias = "training_cols")]
    pub training_columns: Vec<String>,
    /// Column being forecast
    pub target_variable: String,
    pub epochs: usize,
    /// Steps of history per window
    #[serde(alias = "step_past")]
    pub lookback: usize,
    /// Steps between the end of a window and its target
    #[serde(alias = "step_future")]
    pub horizon: usize,
    pub dropout: f64,
    pub optimizer: OptimizerKind,
    pub loss: LossKind,
    #[serde(alias = "layer_config")]
    pub layers: Vec<LayerConfig>,
    /// Number of forecast rows
    pub forecast_period: usize,
    /// Indicator columns added to the frame before training and forecasting
    pub indicators: Vec<Indicator>,
    pub batch_size: usize,
    pub validation_split: f64,
    pub learning_rate: Option<f64>,
    pub gradient_clip: Option<f64>,
    pub seed: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let network = NetworkConfig::default();
        let training = TrainingOptions::default();
        Self {
            training_columns: ["open", "high", "low", "close", "volume"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            target_variable: "close".to_string(),
            epochs: training.epochs,
            lookback: 16,
            horizon: 4,
            dropout: network.dropout,
            optimizer: network.optimizer,
            loss: network.loss,
            layers: network.layers,
            forecast_period: 15,
            indicators: Vec::new(),
            batch_size: training.batch_size,
            validation_split: training.validation_split,
            learning_rate: training.learning_rate,
            gradient_clip: training.gradient_clip,
            seed: training.seed,
        }
    }
}

impl ModelConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ModelConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.feature_spec()?;
        self.network_config().validate()?;
        self.training_options().validate()?;

        for (name, value) in [
            ("Lookback", self.lookback),
            ("Horizon", self.horizon),
            ("Forecast period", self.forecast_period),
        ] {
            if value == 0 {
                return Err(ForecastError::ConfigurationError(format!(
                    "{} must be positive",
                    name
                )));
            }
        }

        if let Some(indicator) = self.indicators.iter().find(|i| i.period() == 0) {
            return Err(ForecastError::ConfigurationError(format!(
                "Indicator {:?} must have a positive period",
                indicator
            )));
        }

        Ok(())
    }

    /// Training columns with the target at index 0
    pub fn feature_spec(&self) -> Result<FeatureSpec> {
        FeatureSpec::with_target(&self.target_variable, self.training_columns.iter().cloned())
    }

    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            layers: self.layers.clone(),
            dropout: self.dropout,
            optimizer: self.optimizer,
            loss: self.loss,
        }
    }

    pub fn training_options(&self) -> TrainingOptions {
        TrainingOptions {
            epochs: self.epochs,
            batch_size: self.batch_size,
            validation_split: self.validation_split,
            learning_rate: self.learning_rate,
            gradient_clip: self.gradient_clip,
            seed: self.seed,
        }
    }
}
