//! Train-then-forecast pipeline driven by a [`ModelConfig`]

use crate::config::ModelConfig;
use crate::data::TimeSeriesFrame;
use crate::error::Result;
use crate::features::FeatureSpec;
use crate::forecast::{forecast, ForecastResult};
use crate::indicators::Indicator;
use crate::scaler::Scaler;
use crate::trainer::{train, TrainedModel};
use crate::window::build_windows;
use tracing::info;

/// Output of a training run: the fitted model together with the scaler,
/// feature layout and window geometry it was trained with.
///
/// Immutable once built, so it can be shared (e.g. behind an `Arc`) by
/// concurrent forecasts.
#[derive(Debug, Clone)]
pub struct TrainedArtifacts {
    model: TrainedModel,
    scaler: Scaler,
    features: FeatureSpec,
    indicators: Vec<Indicator>,
    lookback: usize,
    horizon: usize,
}

impl TrainedArtifacts {
    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn features(&self) -> &FeatureSpec {
        &self.features
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Forecast `forecast_period` steps past the end of `frame`.
    ///
    /// The same indicators are added as during training and warm-up rows are
    /// dropped; the stored scaler is reused as is.
    pub fn forecast(&self, frame: &TimeSeriesFrame, forecast_period: usize) -> Result<ForecastResult> {
        let prepared = prepare_frame(frame, &self.indicators, &self.features)?;
        forecast(
            &prepared,
            &self.features,
            &self.model,
            &self.scaler,
            self.lookback,
            self.horizon,
            forecast_period,
        )
    }
}

fn prepare_frame(
    frame: &TimeSeriesFrame,
    indicators: &[Indicator],
    features: &FeatureSpec,
) -> Result<TimeSeriesFrame> {
    if indicators.is_empty() {
        return Ok(frame.clone());
    }
    frame.with_indicators(indicators)?.drop_incomplete_rows(features)
}

/// Fit a scaler and a network on `frame` as described by `config`
pub fn train_artifacts(frame: &TimeSeriesFrame, config: &ModelConfig) -> Result<TrainedArtifacts> {
    config.validate()?;
    let features = config.feature_spec()?;

    let prepared = prepare_frame(frame, &config.indicators, &features)?;
    let scaler = Scaler::fit(&prepared, &features)?;
    let scaled = scaler.transform(&prepared)?;
    let windows = build_windows(scaled.view(), config.lookback, config.horizon)?;

    info!(
        rows = prepared.len(),
        features = %features.columns().join(","),
        windows = windows.len(),
        "prepared training data"
    );

    let model = train(&windows, &config.network_config(), &config.training_options())?;

    Ok(TrainedArtifacts {
        model,
        scaler,
        features,
        indicators: config.indicators.clone(),
        lookback: config.lookback,
        horizon: config.horizon,
    })
}

/// Train on `frame` and forecast `config.forecast_period` steps past its end
pub fn train_and_forecast(frame: &TimeSeriesFrame, config: &ModelConfig) -> Result<(TrainedArtifacts, ForecastResult)> {
    let artifacts = train_artifacts(frame, config)?;
    let result = artifacts.forecast(frame, config.forecast_period)?;
    Ok((artifacts, result))
}
