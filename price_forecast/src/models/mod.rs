//! Stacked recurrent sequence-to-one regression networks

use crate::error::{ForecastError, Result};
use crate::loss::LossKind;
use crate::optim::OptimizerKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod dense;
mod gru;
mod lstm;
mod network;
mod recurrent;
mod simple_rnn;

pub(crate) use network::RecurrentNetwork;

/// Recurrent layer type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LayerKind {
    /// Long short-term memory
    Lstm,
    /// Gated recurrent unit
    Gru,
    /// Fully connected recurrence with tanh activation
    SimpleRnn,
}

impl LayerKind {
    /// Name as used by Keras layer classes
    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Lstm => "LSTM",
            LayerKind::Gru => "GRU",
            LayerKind::SimpleRnn => "SimpleRNN",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LayerKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "lstm" => Ok(LayerKind::Lstm),
            "gru" => Ok(LayerKind::Gru),
            "simplernn" | "simple_rnn" | "rnn" => Ok(LayerKind::SimpleRnn),
            _ => Err(ForecastError::ConfigurationError(format!(
                "Unknown layer kind '{}', expected LSTM, GRU or SimpleRNN",
                s
            ))),
        }
    }
}

impl TryFrom<String> for LayerKind {
    type Error = ForecastError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<LayerKind> for String {
    fn from(kind: LayerKind) -> Self {
        kind.name().to_string()
    }
}

/// One recurrent layer in the stack.
///
/// The aliases match the field names of the model-configuration dialog's
/// JSON export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Hidden units
    #[serde(alias = "neuron_spinbox")]
    pub units: usize,
    /// Layer type
    #[serde(alias = "type_combobox")]
    pub kind: LayerKind,
    /// Emit the hidden state at every step instead of only the last one
    #[serde(alias = "rseq")]
    pub return_sequences: bool,
}

impl LayerConfig {
    pub fn new(kind: LayerKind, units: usize, return_sequences: bool) -> Self {
        Self {
            units,
            kind,
            return_sequences,
        }
    }

    pub fn lstm(units: usize, return_sequences: bool) -> Self {
        Self::new(LayerKind::Lstm, units, return_sequences)
    }

    pub fn gru(units: usize, return_sequences: bool) -> Self {
        Self::new(LayerKind::Gru, units, return_sequences)
    }

    pub fn simple_rnn(units: usize, return_sequences: bool) -> Self {
        Self::new(LayerKind::SimpleRnn, units, return_sequences)
    }
}

/// Network architecture: recurrent stack, dropout, dense projection to one
/// scalar, plus the optimizer and loss used to fit it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub layers: Vec<LayerConfig>,
    pub dropout: f64,
    pub optimizer: OptimizerKind,
    pub loss: LossKind,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            layers: vec![LayerConfig::lstm(64, true), LayerConfig::lstm(32, false)],
            dropout: 0.2,
            optimizer: OptimizerKind::Adam,
            loss: LossKind::Mse,
        }
    }
}

impl NetworkConfig {
    /// Check the stack shape and dropout range.
    ///
    /// Each layer feeding another one must return sequences, and the last
    /// layer must return a single vector for the dense head.
    pub fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(ForecastError::ConfigurationError(
                "At least one recurrent layer is required".to_string(),
            ));
        }

        let last = self.layers.len() - 1;
        for (index, layer) in self.layers.iter().enumerate() {
            if layer.units == 0 {
                return Err(ForecastError::ConfigurationError(format!(
                    "Layer {} ({}) must have a positive unit count",
                    index, layer.kind
                )));
            }
            if index == last && layer.return_sequences {
                return Err(ForecastError::ConfigurationError(format!(
                    "Last layer ({}) must not return sequences",
                    layer.kind
                )));
            }
            if index < last && !layer.return_sequences {
                return Err(ForecastError::ConfigurationError(format!(
                    "Layer {} ({}) feeds another recurrent layer and must return sequences",
                    index, layer.kind
                )));
            }
        }

        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ForecastError::ConfigurationError(format!(
                "Dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_kind_parses_keras_names() {
        assert_eq!("LSTM".parse::<LayerKind>().unwrap(), LayerKind::Lstm);
        assert_eq!("gru".parse::<LayerKind>().unwrap(), LayerKind::Gru);
        assert_eq!(
            "SimpleRNN".parse::<LayerKind>().unwrap(),
            LayerKind::SimpleRnn
        );
        assert!("Conv1D".parse::<LayerKind>().is_err());
    }

    #[test]
    fn test_layer_config_accepts_dialog_fields() {
        let layer: LayerConfig =
            serde_json::from_str(r#"{"neuron_spinbox": 50, "type_combobox": "GRU", "rseq": false}"#)
                .unwrap();
        assert_eq!(layer, LayerConfig::gru(50, false));
    }

    #[test]
    fn test_validate_stack_shape() {
        assert!(NetworkConfig::default().validate().is_ok());

        let mut config = NetworkConfig::default();
        config.layers = vec![LayerConfig::lstm(8, true)];
        assert!(config.validate().is_err());

        config.layers = vec![LayerConfig::lstm(8, false), LayerConfig::lstm(8, false)];
        assert!(config.validate().is_err());

        config.layers = vec![LayerConfig::lstm(0, false)];
        assert!(config.validate().is_err());

        config.layers.clear();
        assert!(config.validate().is_err());
    }
}
