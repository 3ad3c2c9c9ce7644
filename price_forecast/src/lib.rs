//! # Price Forecast
//!
//! Short-horizon price forecasting for daily OHLCV series with a configurable
//! recurrent neural network.
//!
//! ## Pipeline
//!
//! - **Feature scaling**: per-column standardization, fit once on the training
//!   frame and reused unchanged for forecasting ([`Scaler`])
//! - **Windowing**: overlapping `lookback`-step windows paired with the target
//!   value `horizon` steps later ([`build_windows`])
//! - **Training**: stacked LSTM/GRU/SimpleRNN layers, dropout and a dense
//!   head fitted with backpropagation through time ([`train`])
//! - **Forecasting**: predictions for the most recent windows mapped back to
//!   price units, dated from the day after the last row and shifted to join
//!   the last known value ([`forecast`])
//!
//! Technical indicators (SMA, EMA, RSI) can be added as extra training
//! columns through [`Indicator`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use price_forecast::config::ModelConfig;
//! use price_forecast::data::DataLoader;
//! use price_forecast::pipeline::train_artifacts;
//!
//! # fn main() -> price_forecast::Result<()> {
//! // Load data
//! let frame = DataLoader::from_csv("prices.csv")?;
//!
//! // Train with the default two-layer LSTM
//! let config = ModelConfig::default();
//! let artifacts = train_artifacts(&frame, &config)?;
//!
//! // Forecast the next 15 days
//! let result = artifacts.forecast(&frame, config.forecast_period)?;
//! for point in result.without_join_point().points() {
//!     println!("{} {:.2}", point.date, point.value);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod forecast;
pub mod indicators;
pub mod loss;
pub mod models;
pub mod optim;
pub mod pipeline;
pub mod scaler;
pub mod trainer;
pub mod utils;
pub mod window;

// Re-export commonly used types
pub use crate::config::ModelConfig;
pub use crate::data::{DailyBar, DataLoader, TimeSeriesFrame};
pub use crate::error::{ErrorKind, ForecastError, Result};
pub use crate::features::FeatureSpec;
pub use crate::forecast::{forecast, ForecastPoint, ForecastResult};
pub use crate::indicators::Indicator;
pub use crate::loss::LossKind;
pub use crate::models::{LayerConfig, LayerKind, NetworkConfig};
pub use crate::optim::OptimizerKind;
pub use crate::pipeline::{train_and_forecast, train_artifacts, TrainedArtifacts};
pub use crate::scaler::Scaler;
pub use crate::trainer::{train, SequencePredictor, TrainedModel, TrainingHistory, TrainingOptions};
pub use crate::window::{build_forecast_windows, build_windows, WindowSet};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
