//! Sliding-window construction over a scaled feature matrix

use crate::error::{ForecastError, Result};
use ndarray::{s, Array1, Array3, ArrayView2, Axis};
use tracing::debug;

/// Paired input windows and scalar targets.
///
/// `windows` has shape `(n, lookback, features)`, `targets` has length `n`.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSet {
    windows: Array3<f64>,
    targets: Array1<f64>,
}

impl WindowSet {
    /// Pair windows with targets; the leading dimensions must agree
    pub fn new(windows: Array3<f64>, targets: Array1<f64>) -> Result<Self> {
        if windows.len_of(Axis(0)) != targets.len() {
            return Err(ForecastError::ConfigurationError(format!(
                "{} windows paired with {} targets",
                windows.len_of(Axis(0)),
                targets.len()
            )));
        }
        Ok(Self { windows, targets })
    }

    /// Input windows, `(n, lookback, features)`
    pub fn windows(&self) -> &Array3<f64> {
        &self.windows
    }

    /// Scaled target values, one per window
    pub fn targets(&self) -> &Array1<f64> {
        &self.targets
    }

    /// Number of window/target pairs
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Steps per window
    pub fn lookback(&self) -> usize {
        self.windows.len_of(Axis(1))
    }

    /// Feature vector length
    pub fn n_features(&self) -> usize {
        self.windows.len_of(Axis(2))
    }

    /// Split off the trailing `fraction` of pairs as a validation set.
    ///
    /// Returns `(train, validation)`. The held-out count is
    /// `floor(len * fraction)`, so small sets may get no validation pairs.
    pub fn split_validation(&self, fraction: f64) -> Result<(WindowSet, WindowSet)> {
        if !(0.0..1.0).contains(&fraction) {
            return Err(ForecastError::ConfigurationError(format!(
                "Validation split must be in [0, 1), got {}",
                fraction
            )));
        }

        let held_out = (self.len() as f64 * fraction).floor() as usize;
        let split_at = self.len() - held_out;

        let train = WindowSet {
            windows: self.windows.slice(s![..split_at, .., ..]).to_owned(),
            targets: self.targets.slice(s![..split_at]).to_owned(),
        };
        let validation = WindowSet {
            windows: self.windows.slice(s![split_at.., .., ..]).to_owned(),
            targets: self.targets.slice(s![split_at..]).to_owned(),
        };
        Ok((train, validation))
    }

    /// Gather the pairs at `indices`, in the given order
    pub fn select(&self, indices: &[usize]) -> WindowSet {
        WindowSet {
            windows: self.windows.select(Axis(0), indices),
            targets: self.targets.select(Axis(0), indices),
        }
    }
}

fn check_steps(lookback: usize, horizon: usize) -> Result<()> {
    if lookback == 0 {
        return Err(ForecastError::ConfigurationError(
            "Lookback must be positive".to_string(),
        ));
    }
    if horizon == 0 {
        return Err(ForecastError::ConfigurationError(
            "Horizon must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Number of window/target pairs a matrix of `rows` rows yields
pub fn window_count(rows: usize, lookback: usize, horizon: usize) -> usize {
    (rows + 1).saturating_sub(lookback + horizon)
}

/// Slide a `lookback`-row window over `scaled` with stride 1.
///
/// For each `i` in `lookback..=rows - horizon` the window is rows
/// `i - lookback..i` and the target is column 0 of row `i + horizon - 1`.
/// A matrix shorter than `lookback + horizon` yields an empty set.
pub fn build_windows(scaled: ArrayView2<f64>, lookback: usize, horizon: usize) -> Result<WindowSet> {
    check_steps(lookback, horizon)?;
    if scaled.ncols() == 0 {
        return Err(ForecastError::ConfigurationError(
            "Scaled matrix has no feature columns".to_string(),
        ));
    }

    let rows = scaled.nrows();
    let n_features = scaled.ncols();
    let count = window_count(rows, lookback, horizon);

    let mut windows = Array3::zeros((count, lookback, n_features));
    let mut targets = Array1::zeros(count);

    for (k, i) in (lookback..lookback + count).enumerate() {
        windows
            .index_axis_mut(Axis(0), k)
            .assign(&scaled.slice(s![i - lookback..i, ..]));
        targets[k] = scaled[[i + horizon - 1, 0]];
    }

    debug!(rows, lookback, horizon, windows = count, "built windows");
    Ok(WindowSet { windows, targets })
}

/// The last `forecast_period` windows of `scaled`, oldest first.
///
/// Only the tail of the matrix needed for those windows is sliced.
pub fn build_forecast_windows(
    scaled: ArrayView2<f64>,
    lookback: usize,
    horizon: usize,
    forecast_period: usize,
) -> Result<Array3<f64>> {
    check_steps(lookback, horizon)?;
    if forecast_period == 0 {
        return Err(ForecastError::ConfigurationError(
            "Forecast period must be positive".to_string(),
        ));
    }

    let rows = scaled.nrows();
    if rows < lookback + horizon {
        return Err(ForecastError::InsufficientData(format!(
            "Need at least {} rows (lookback {} + horizon {}) to forecast, got {}",
            lookback + horizon,
            lookback,
            horizon,
            rows
        )));
    }

    let available = window_count(rows, lookback, horizon);
    if forecast_period > available {
        return Err(ForecastError::ConfigurationError(format!(
            "Forecast period {} exceeds the {} windows derivable from {} rows",
            forecast_period, available, rows
        )));
    }

    let tail_rows = forecast_period + lookback + horizon - 1;
    let tail = scaled.slice(s![rows - tail_rows.., ..]);
    let set = build_windows(tail, lookback, horizon)?;
    Ok(set.windows)
}
