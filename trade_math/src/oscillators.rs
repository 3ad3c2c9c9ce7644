//! Oscillator indicator implementations
//!
//! Contains the Relative Strength Index (RSI).

use crate::{MathError, Result};

/// Relative Strength Index (RSI) implementation
///
/// Gains and losses are smoothed with a bias-adjusted exponential average
/// (`alpha = 1 / period`). A value is available once `period` price changes
/// have been observed.
#[derive(Debug, Clone)]
pub struct RelativeStrengthIndex {
    period: usize,
    decay: f64,
    previous_price: Option<f64>,
    weighted_gains: f64,
    weighted_losses: f64,
    weight_sum: f64,
    changes_seen: usize,
}

impl RelativeStrengthIndex {
    /// Create a new RSI with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            period,
            decay: 1.0 - 1.0 / period as f64,
            previous_price: None,
            weighted_gains: 0.0,
            weighted_losses: 0.0,
            weight_sum: 0.0,
            changes_seen: 0,
        })
    }

    /// Update the RSI with a new price value
    pub fn update(&mut self, price: f64) {
        if let Some(prev_price) = self.previous_price {
            let change = price - prev_price;
            let gain = change.max(0.0);
            let loss = (-change).max(0.0);

            self.weighted_gains = gain + self.decay * self.weighted_gains;
            self.weighted_losses = loss + self.decay * self.weighted_losses;
            self.weight_sum = 1.0 + self.decay * self.weight_sum;
            self.changes_seen += 1;
        }

        self.previous_price = Some(price);
    }

    /// Get the current RSI value (0-100)
    pub fn value(&self) -> Result<f64> {
        if self.changes_seen < self.period {
            return Err(MathError::InsufficientData(format!(
                "Not enough data for RSI calculation. Need {} values, have {}.",
                self.period + 1,
                self.changes_seen + usize::from(self.previous_price.is_some())
            )));
        }

        let avg_gain = self.weighted_gains / self.weight_sum;
        let avg_loss = self.weighted_losses / self.weight_sum;

        if avg_loss == 0.0 {
            return Ok(100.0); // If no losses, RSI is 100
        }

        let rs = avg_gain / avg_loss;
        Ok(100.0 - (100.0 / (1.0 + rs)))
    }

    /// Get the current period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Reset the RSI, clearing all values
    pub fn reset(&mut self) {
        self.previous_price = None;
        self.weighted_gains = 0.0;
        self.weighted_losses = 0.0;
        self.weight_sum = 0.0;
        self.changes_seen = 0;
    }
}

/// RSI over `prices`, aligned with the input.
///
/// The first `period` entries are `NaN`.
pub fn rsi(prices: &[f64], period: usize) -> Result<Vec<f64>> {
    let mut indicator = RelativeStrengthIndex::new(period)?;
    Ok(prices
        .iter()
        .map(|&price| {
            indicator.update(price);
            indicator.value().unwrap_or(f64::NAN)
        })
        .collect())
}
