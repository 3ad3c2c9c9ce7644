//! Regression losses over a batch of scalar predictions

use crate::error::{ForecastError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transition point between the quadratic and linear parts of the Huber loss
const HUBER_DELTA: f64 = 1.0;

/// Loss selected by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LossKind {
    /// Mean squared error
    #[default]
    Mse,
    /// Mean absolute error
    Mae,
    /// Huber loss with delta 1
    Huber,
}

impl LossKind {
    pub fn name(&self) -> &'static str {
        match self {
            LossKind::Mse => "mse",
            LossKind::Mae => "mae",
            LossKind::Huber => "huber",
        }
    }

    /// Mean loss over the batch
    pub fn value(&self, predictions: &Array1<f64>, targets: &Array1<f64>) -> f64 {
        if predictions.is_empty() {
            return 0.0;
        }

        let total: f64 = predictions
            .iter()
            .zip(targets.iter())
            .map(|(p, t)| {
                let e = p - t;
                match self {
                    LossKind::Mse => e * e,
                    LossKind::Mae => e.abs(),
                    LossKind::Huber if e.abs() <= HUBER_DELTA => 0.5 * e * e,
                    LossKind::Huber => HUBER_DELTA * (e.abs() - 0.5 * HUBER_DELTA),
                }
            })
            .sum();
        total / predictions.len() as f64
    }

    /// Derivative of [`LossKind::value`] with respect to each prediction
    pub fn gradient(&self, predictions: &Array1<f64>, targets: &Array1<f64>) -> Array1<f64> {
        let n = predictions.len().max(1) as f64;
        let mut grad = predictions - targets;
        grad.mapv_inplace(|e| {
            let d = match self {
                LossKind::Mse => 2.0 * e,
                LossKind::Mae if e == 0.0 => 0.0,
                LossKind::Mae => e.signum(),
                LossKind::Huber => e.clamp(-HUBER_DELTA, HUBER_DELTA),
            };
            d / n
        });
        grad
    }
}

impl fmt::Display for LossKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LossKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mse" | "mean_squared_error" => Ok(LossKind::Mse),
            "mae" | "mean_absolute_error" => Ok(LossKind::Mae),
            "huber" | "huber_loss" => Ok(LossKind::Huber),
            _ => Err(ForecastError::ConfigurationError(format!(
                "Unknown loss '{}', expected mse, mae or huber",
                s
            ))),
        }
    }
}

impl TryFrom<String> for LossKind {
    type Error = ForecastError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<LossKind> for String {
    fn from(kind: LossKind) -> Self {
        kind.name().to_string()
    }
}
