//! Per-column standardization (zero mean, unit variance)

use crate::data::TimeSeriesFrame;
use crate::error::{ForecastError, Result};
use crate::features::FeatureSpec;
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::debug;

/// Fitted per-column mean and population standard deviation.
///
/// A scaler is fit once on the training frame and is immutable afterwards;
/// forecasting reuses the same value instead of refitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    columns: FeatureSpec,
    means: Vec<f64>,
    std_devs: Vec<f64>,
}

impl Scaler {
    /// Fit on the spec's columns of `frame`
    pub fn fit(frame: &TimeSeriesFrame, spec: &FeatureSpec) -> Result<Self> {
        let matrix = frame.feature_matrix(spec)?;
        Self::fit_matrix(matrix.view(), spec.clone())
    }

    /// Fit on a rows x columns matrix whose columns are named by `columns`
    pub fn fit_matrix(matrix: ArrayView2<f64>, columns: FeatureSpec) -> Result<Self> {
        if matrix.ncols() != columns.len() {
            return Err(ForecastError::ConfigurationError(format!(
                "Matrix has {} columns, spec names {}",
                matrix.ncols(),
                columns.len()
            )));
        }
        if matrix.nrows() == 0 {
            return Err(ForecastError::InsufficientData(
                "Cannot fit a scaler on an empty frame".to_string(),
            ));
        }

        let mut means = Vec::with_capacity(columns.len());
        let mut std_devs = Vec::with_capacity(columns.len());

        for (column, name) in matrix.axis_iter(Axis(1)).zip(columns.columns()) {
            let mean = column.iter().mean();
            let std_dev = column.iter().population_std_dev();
            check_std_dev(name, std_dev)?;

            debug!(column = %name, mean, std_dev, "fitted scaler column");
            means.push(mean);
            std_devs.push(std_dev);
        }

        Ok(Self {
            columns,
            means,
            std_devs,
        })
    }

    /// Columns this scaler was fit on, in order
    pub fn columns(&self) -> &FeatureSpec {
        &self.columns
    }

    /// Per-column means
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Per-column standard deviations
    pub fn std_devs(&self) -> &[f64] {
        &self.std_devs
    }

    /// Scale the fitted columns of `frame`
    pub fn transform(&self, frame: &TimeSeriesFrame) -> Result<Array2<f64>> {
        let matrix = frame.feature_matrix(&self.columns)?;
        self.transform_matrix(matrix.view())
    }

    /// Scale a rows x columns matrix laid out like the fitted columns
    pub fn transform_matrix(&self, matrix: ArrayView2<f64>) -> Result<Array2<f64>> {
        self.check_width(matrix.ncols())?;

        let mut scaled = matrix.to_owned();
        for (j, mut column) in scaled.axis_iter_mut(Axis(1)).enumerate() {
            let (mean, std_dev) = (self.means[j], self.std_devs[j]);
            check_std_dev(&self.columns.columns()[j], std_dev)?;
            column.mapv_inplace(|x| (x - mean) / std_dev);
        }
        Ok(scaled)
    }

    /// Undo the scaling; `matrix` must have exactly one column per fitted column
    pub fn inverse_transform(&self, matrix: ArrayView2<f64>) -> Result<Array2<f64>> {
        self.check_width(matrix.ncols())?;

        let mut unscaled = matrix.to_owned();
        for (j, mut column) in unscaled.axis_iter_mut(Axis(1)).enumerate() {
            let (mean, std_dev) = (self.means[j], self.std_devs[j]);
            column.mapv_inplace(|x| x * std_dev + mean);
        }
        Ok(unscaled)
    }

    /// Recover target values (feature 0) from scaled predictions.
    ///
    /// Each prediction is repeated across every column slot, the repeated
    /// matrix is inverse-transformed, and only column 0 is kept. The other
    /// slots only satisfy the inverse transform's expected width.
    pub fn inverse_transform_target(&self, predictions: &[f64]) -> Result<Vec<f64>> {
        let width = self.columns.len();
        let repeated = Array2::from_shape_fn((predictions.len(), width), |(i, _)| predictions[i]);
        let unscaled = self.inverse_transform(repeated.view())?;
        Ok(unscaled.column(0).to_vec())
    }

    fn check_width(&self, ncols: usize) -> Result<()> {
        if ncols != self.columns.len() {
            return Err(ForecastError::ConfigurationError(format!(
                "Expected {} columns ({}), got {}",
                self.columns.len(),
                self.columns.columns().join(", "),
                ncols
            )));
        }
        Ok(())
    }
}

fn check_std_dev(column: &str, std_dev: f64) -> Result<()> {
    if std_dev == 0.0 || !std_dev.is_finite() {
        return Err(ForecastError::NumericDegeneracy(format!(
            "Column '{}' has zero or undefined variance (std dev {}); scaling would divide by zero",
            column, std_dev
        )));
    }
    Ok(())
}
