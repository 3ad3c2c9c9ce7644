//! Gradient-descent optimizers
//!
//! Update rules follow the Keras defaults:
//!
//! ```text
//! sgd:      p -= lr * g
//! rmsprop:  v = rho * v + (1 - rho) * g^2;        p -= lr * g / (sqrt(v) + eps)
//! adagrad:  v += g^2;                              p -= lr * g / (sqrt(v) + eps)
//! adam:     m = b1 * m + (1 - b1) * g
//!           v = b2 * v + (1 - b2) * g^2
//!           p -= lr * (m / (1 - b1^t)) / (sqrt(v / (1 - b2^t)) + eps)
//! ```

use crate::error::{ForecastError, Result};
use ndarray::{Array, Dimension};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const EPSILON: f64 = 1e-7;
const ADAM_BETA1: f64 = 0.9;
const ADAM_BETA2: f64 = 0.999;
const RMSPROP_RHO: f64 = 0.9;
const ADAGRAD_INITIAL_ACCUMULATOR: f64 = 0.1;

/// Optimizer selected by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OptimizerKind {
    #[default]
    Adam,
    Sgd,
    RmsProp,
    Adagrad,
}

impl OptimizerKind {
    pub fn name(&self) -> &'static str {
        match self {
            OptimizerKind::Adam => "adam",
            OptimizerKind::Sgd => "sgd",
            OptimizerKind::RmsProp => "rmsprop",
            OptimizerKind::Adagrad => "adagrad",
        }
    }

    /// Learning rate used when none is configured
    pub fn default_learning_rate(&self) -> f64 {
        match self {
            OptimizerKind::Sgd => 0.01,
            OptimizerKind::Adam | OptimizerKind::RmsProp | OptimizerKind::Adagrad => 0.001,
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OptimizerKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "adam" => Ok(OptimizerKind::Adam),
            "sgd" => Ok(OptimizerKind::Sgd),
            "rmsprop" => Ok(OptimizerKind::RmsProp),
            "adagrad" => Ok(OptimizerKind::Adagrad),
            _ => Err(ForecastError::ConfigurationError(format!(
                "Unknown optimizer '{}', expected adam, sgd, rmsprop or adagrad",
                s
            ))),
        }
    }
}

impl TryFrom<String> for OptimizerKind {
    type Error = ForecastError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<OptimizerKind> for String {
    fn from(kind: OptimizerKind) -> Self {
        kind.name().to_string()
    }
}

/// Per-parameter moment estimates, allocated on first update
#[derive(Debug, Clone, Default)]
struct SlotState {
    m: Vec<f64>,
    v: Vec<f64>,
}

/// Optimizer state for one training run.
///
/// Parameters are addressed by a stable slot index; call [`Optimizer::begin_step`]
/// once per batch before updating the slots.
#[derive(Debug, Clone)]
pub struct Optimizer {
    kind: OptimizerKind,
    learning_rate: f64,
    t: u64,
    slots: Vec<SlotState>,
}

impl Optimizer {
    pub fn new(kind: OptimizerKind, learning_rate: Option<f64>) -> Result<Self> {
        let learning_rate = learning_rate.unwrap_or_else(|| kind.default_learning_rate());
        if !(learning_rate > 0.0 && learning_rate.is_finite()) {
            return Err(ForecastError::ConfigurationError(format!(
                "Learning rate must be positive, got {}",
                learning_rate
            )));
        }

        Ok(Self {
            kind,
            learning_rate,
            t: 0,
            slots: Vec::new(),
        })
    }

    pub fn kind(&self) -> OptimizerKind {
        self.kind
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Number of completed steps
    pub fn timestep(&self) -> u64 {
        self.t
    }

    /// Advance the timestep used for Adam's bias correction
    pub fn begin_step(&mut self) {
        self.t += 1;
    }

    /// Apply `grad` to `param` using the state kept for `slot`
    pub fn update<D: Dimension>(&mut self, slot: usize, param: &mut Array<f64, D>, grad: &Array<f64, D>) {
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, SlotState::default);
        }
        let state = &mut self.slots[slot];
        if state.m.len() != param.len() {
            let initial = match self.kind {
                OptimizerKind::Adagrad => ADAGRAD_INITIAL_ACCUMULATOR,
                _ => 0.0,
            };
            state.m = vec![0.0; param.len()];
            state.v = vec![initial; param.len()];
        }

        let lr = self.learning_rate;
        let t = self.t.max(1) as i32;
        let values = param.iter_mut().zip(grad.iter());
        let moments = state.m.iter_mut().zip(state.v.iter_mut());

        match self.kind {
            OptimizerKind::Sgd => {
                for (p, g) in values {
                    *p -= lr * g;
                }
            }
            OptimizerKind::RmsProp => {
                for ((p, g), (_, v)) in values.zip(moments) {
                    *v = RMSPROP_RHO * *v + (1.0 - RMSPROP_RHO) * g * g;
                    *p -= lr * g / (v.sqrt() + EPSILON);
                }
            }
            OptimizerKind::Adagrad => {
                for ((p, g), (_, v)) in values.zip(moments) {
                    *v += g * g;
                    *p -= lr * g / (v.sqrt() + EPSILON);
                }
            }
            OptimizerKind::Adam => {
                let bias_correction1 = 1.0 - ADAM_BETA1.powi(t);
                let bias_correction2 = 1.0 - ADAM_BETA2.powi(t);
                for ((p, g), (m, v)) in values.zip(moments) {
                    *m = ADAM_BETA1 * *m + (1.0 - ADAM_BETA1) * g;
                    *v = ADAM_BETA2 * *v + (1.0 - ADAM_BETA2) * g * g;
                    let m_hat = *m / bias_correction1;
                    let v_hat = *v / bias_correction2;
                    *p -= lr * m_hat / (v_hat.sqrt() + EPSILON);
                }
            }
        }
    }
}
