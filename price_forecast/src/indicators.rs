//! Technical indicators usable as extra training columns

use crate::data::TimeSeriesFrame;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Column every indicator is computed from
pub const SOURCE_COLUMN: &str = "close";

fn default_sma_period() -> usize {
    50
}

fn default_ema_period() -> usize {
    10
}

fn default_rsi_period() -> usize {
    14
}

/// Indicator with its parameters.
///
/// Each produces one column aligned with the frame, `NaN` while it warms up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "UPPERCASE")]
pub enum Indicator {
    /// Simple moving average of the close
    Sma {
        #[serde(default = "default_sma_period")]
        period: usize,
    },
    /// Exponential moving average of the close, `alpha = 2 / (period + 1)`
    Ema {
        #[serde(default = "default_ema_period")]
        period: usize,
    },
    /// Relative strength index of the close
    Rsi {
        #[serde(default = "default_rsi_period")]
        period: usize,
    },
}

impl Indicator {
    /// Every indicator kind with its default parameters
    pub fn available() -> Vec<Indicator> {
        vec![
            Indicator::Sma {
                period: default_sma_period(),
            },
            Indicator::Ema {
                period: default_ema_period(),
            },
            Indicator::Rsi {
                period: default_rsi_period(),
            },
        ]
    }

    pub fn period(&self) -> usize {
        match *self {
            Indicator::Sma { period } | Indicator::Ema { period } | Indicator::Rsi { period } => {
                period
            }
        }
    }

    /// Column name, e.g. `SMA_50`
    pub fn column_name(&self) -> String {
        let prefix = match self {
            Indicator::Sma { .. } => "SMA",
            Indicator::Ema { .. } => "EMA",
            Indicator::Rsi { .. } => "RSI",
        };
        format!("{}_{}", prefix, self.period())
    }

    /// Compute the indicator over the frame's close column
    pub fn compute(&self, frame: &TimeSeriesFrame) -> Result<Vec<f64>> {
        let close = frame.column(SOURCE_COLUMN)?;
        let values = match *self {
            Indicator::Sma { period } => trade_math::sma(&close, period)?,
            Indicator::Ema { period } => trade_math::ema(&close, period)?,
            Indicator::Rsi { period } => trade_math::rsi(&close, period)?,
        };
        Ok(values)
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.column_name())
    }
}

impl TimeSeriesFrame {
    /// Return a new frame with `indicator` added under its column name
    pub fn with_indicator(&self, indicator: &Indicator) -> Result<Self> {
        let values = indicator.compute(self)?;
        let warm_up = values.iter().take_while(|v| v.is_nan()).count();
        debug!(indicator = %indicator, warm_up, "computed indicator");
        self.with_column(&indicator.column_name(), values)
    }

    /// Apply several indicators in order
    pub fn with_indicators(&self, indicators: &[Indicator]) -> Result<Self> {
        indicators
            .iter()
            .try_fold(self.clone(), |frame, indicator| frame.with_indicator(indicator))
    }
}
