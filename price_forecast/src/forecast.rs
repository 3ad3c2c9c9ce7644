//! Turning model output back into a dated forecast in original units

use crate::data::{date_to_days, TimeSeriesFrame};
use crate::error::{ForecastError, Result};
use crate::features::FeatureSpec;
use crate::scaler::Scaler;
use crate::trainer::SequencePredictor;
use crate::utils::future_dates;
use crate::window::build_forecast_windows;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::debug;

/// One forecast step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Dated forecast values, ascending by date, continuous with the last
/// historical value of the target column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    target: String,
    points: Vec<ForecastPoint>,
    offset: f64,
}

impl ForecastResult {
    /// Name of the forecast column
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Continuity offset that was added to every raw prediction
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Drop the first point.
    ///
    /// After the continuity offset the first value equals the last known
    /// value, so displays that append the forecast to the history drop it.
    pub fn without_join_point(mut self) -> Self {
        if !self.points.is_empty() {
            self.points.remove(0);
        }
        self
    }

    /// `date` and target-named value columns
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let days: Vec<i32> = self.points.iter().map(|p| date_to_days(p.date)).collect();
        let df = DataFrame::new(vec![
            Series::new("date", days).cast(&DataType::Date)?,
            Series::new(&self.target, self.values()),
        ])?;
        Ok(df)
    }

    /// Write `date,<target>` rows with a header line
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["date", self.target.as_str()])?;
        for point in &self.points {
            csv_writer.write_record([point.date.to_string(), point.value.to_string()])?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

/// Forecast `forecast_period` steps past the end of `frame`.
///
/// The frame is scaled with the fitted `scaler` (never refit), the last
/// `forecast_period` windows are predicted, predictions are mapped back to
/// target units and dated `D+1..=D+n` from the last frame date `D`. Every
/// value is then shifted so the first one equals the last known target value.
pub fn forecast<M>(
    frame: &TimeSeriesFrame,
    feature_spec: &FeatureSpec,
    model: &M,
    scaler: &Scaler,
    lookback: usize,
    horizon: usize,
    forecast_period: usize,
) -> Result<ForecastResult>
where
    M: SequencePredictor + ?Sized,
{
    if forecast_period == 0 {
        return Err(ForecastError::ConfigurationError(
            "Forecast period must be positive".to_string(),
        ));
    }
    if scaler.columns() != feature_spec {
        return Err(ForecastError::ConfigurationError(format!(
            "Scaler was fit on [{}] but the feature spec is [{}]",
            scaler.columns().columns().join(", "),
            feature_spec.columns().join(", ")
        )));
    }

    let scaled = scaler.transform(frame)?;
    let windows = build_forecast_windows(scaled.view(), lookback, horizon, forecast_period)?;

    let predictions = model.predict(&windows)?;
    if predictions.len() != forecast_period {
        return Err(ForecastError::ComputationError(format!(
            "Model returned {} predictions for {} windows",
            predictions.len(),
            forecast_period
        )));
    }
    if let Some(bad) = predictions.iter().find(|p| !p.is_finite()) {
        return Err(ForecastError::ComputationError(format!(
            "Model produced a non-finite prediction ({})",
            bad
        )));
    }

    let y_pred_future = scaler.inverse_transform_target(&predictions.to_vec())?;
    let dates = future_dates(frame.last_date()?, forecast_period)?;

    let target = feature_spec.target();
    let last_known = frame.last_value(target)?;
    let offset = last_known - y_pred_future[0];
    debug!(target, last_known, offset, "continuity offset");

    let points = dates
        .into_iter()
        .zip(y_pred_future)
        .map(|(date, value)| ForecastPoint {
            date,
            value: value + offset,
        })
        .collect();

    Ok(ForecastResult {
        target: target.to_string(),
        points,
        offset,
    })
}
