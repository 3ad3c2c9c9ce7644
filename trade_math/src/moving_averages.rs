//! Moving average calculation implementations
//!
//! Contains implementations of the moving averages used as extra model
//! features:
//! - Simple Moving Average (SMA)
//! - Exponential Moving Average (EMA)
//!
//! Each calculator is streaming (`update` one value at a time); the `sma` and
//! `ema` helpers run a calculator over a whole column and return a series of
//! the same length, with `NaN` wherever the calculator is still warming up.

use crate::{MathError, Result};
use std::collections::VecDeque;

/// Simple Moving Average (SMA) implementation
#[derive(Debug, Clone)]
pub struct SimpleMovingAverage {
    period: usize,
    values: VecDeque<f64>,
    sum: f64,
}

impl SimpleMovingAverage {
    /// Create a new Simple Moving Average with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            period,
            values: VecDeque::with_capacity(period),
            sum: 0.0,
        })
    }

    /// Update the SMA with a new value
    pub fn update(&mut self, value: f64) {
        self.values.push_back(value);
        self.sum += value;

        if self.values.len() > self.period {
            if let Some(old_value) = self.values.pop_front() {
                self.sum -= old_value;
            }
        }
    }

    /// Get the current SMA value
    pub fn value(&self) -> Result<f64> {
        if self.values.len() < self.period {
            return Err(MathError::InsufficientData(format!(
                "Not enough data for SMA calculation. Need {} values, have {}.",
                self.period,
                self.values.len()
            )));
        }

        Ok(self.sum / self.period as f64)
    }

    /// Get the current period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Reset the SMA, clearing all values
    pub fn reset(&mut self) {
        self.values.clear();
        self.sum = 0.0;
    }
}

/// Exponential Moving Average (EMA) implementation
///
/// Uses the span convention `multiplier = 2 / (period + 1)` and is seeded with
/// the first observed value, so a value is available from the first update.
#[derive(Debug, Clone)]
pub struct ExponentialMovingAverage {
    period: usize,
    multiplier: f64,
    current_ema: Option<f64>,
}

impl ExponentialMovingAverage {
    /// Create a new Exponential Moving Average with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            period,
            multiplier: 2.0 / (period as f64 + 1.0),
            current_ema: None,
        })
    }

    /// Update the EMA with a new value
    pub fn update(&mut self, value: f64) {
        self.current_ema = Some(match self.current_ema {
            None => value,
            // EMA = (Close - EMA(previous)) * multiplier + EMA(previous)
            Some(current) => (value - current) * self.multiplier + current,
        });
    }

    /// Get the current EMA value
    pub fn value(&self) -> Result<f64> {
        self.current_ema.ok_or_else(|| {
            MathError::InsufficientData("EMA has not received any values".to_string())
        })
    }

    /// Get the current period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Reset the EMA, clearing all values
    pub fn reset(&mut self) {
        self.current_ema = None;
    }
}

/// Rolling simple moving average over `values`, aligned with the input.
///
/// The first `period - 1` entries are `NaN`.
pub fn sma(values: &[f64], period: usize) -> Result<Vec<f64>> {
    let mut average = SimpleMovingAverage::new(period)?;
    Ok(values
        .iter()
        .map(|&value| {
            average.update(value);
            average.value().unwrap_or(f64::NAN)
        })
        .collect())
}

/// Exponential moving average over `values`, aligned with the input.
pub fn ema(values: &[f64], period: usize) -> Result<Vec<f64>> {
    let mut average = ExponentialMovingAverage::new(period)?;
    Ok(values
        .iter()
        .map(|&value| {
            average.update(value);
            average.value().unwrap_or(f64::NAN)
        })
        .collect())
}
