//! Fitting a recurrent network on windowed training data

use crate::error::{ForecastError, Result};
use crate::models::{NetworkConfig, RecurrentNetwork};
use crate::optim::Optimizer;
use crate::window::WindowSet;
use ndarray::{Array1, Array3};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Batch/epoch policy for [`train`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOptions {
    pub epochs: usize,
    pub batch_size: usize,
    /// Trailing fraction of windows held out for validation
    pub validation_split: f64,
    /// Overrides the optimizer's default learning rate
    pub learning_rate: Option<f64>,
    /// Maximum global gradient norm per batch
    pub gradient_clip: Option<f64>,
    /// Seed for weight initialisation, shuffling and dropout
    pub seed: Option<u64>,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            epochs: 5,
            batch_size: 16,
            validation_split: 0.1,
            learning_rate: None,
            gradient_clip: Some(1.0),
            seed: None,
        }
    }
}

impl TrainingOptions {
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(ForecastError::ConfigurationError(
                "Epochs must be positive".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ForecastError::ConfigurationError(
                "Batch size must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(ForecastError::ConfigurationError(format!(
                "Validation split must be in [0, 1), got {}",
                self.validation_split
            )));
        }
        if let Some(clip) = self.gradient_clip {
            if clip.is_nan() || clip <= 0.0 {
                return Err(ForecastError::ConfigurationError(format!(
                    "Gradient clip must be positive, got {}",
                    clip
                )));
            }
        }
        Ok(())
    }
}

/// Per-epoch training and validation loss
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub loss: Vec<f64>,
    /// Empty when no windows were held out
    pub val_loss: Vec<f64>,
}

impl TrainingHistory {
    pub fn epochs(&self) -> usize {
        self.loss.len()
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.loss.last().copied()
    }
}

/// Anything that maps a batch of windows to one scaled prediction each
pub trait SequencePredictor {
    /// Predict one value per window of `windows`, `(n, lookback, features)`.
    ///
    /// Must not change any state: two calls on the same input give the same
    /// output.
    fn predict(&self, windows: &Array3<f64>) -> Result<Array1<f64>>;
}

/// A fitted network. Immutable; prediction borrows it read-only.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    network: RecurrentNetwork,
    config: NetworkConfig,
    history: TrainingHistory,
}

impl TrainedModel {
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn history(&self) -> &TrainingHistory {
        &self.history
    }

    /// Feature count the network was built for
    pub fn n_features(&self) -> usize {
        self.network.n_features()
    }
}

impl SequencePredictor for TrainedModel {
    fn predict(&self, windows: &Array3<f64>) -> Result<Array1<f64>> {
        self.network.predict(windows)
    }
}

/// Fit a network on `windows`.
///
/// Configuration is checked before anything else. The trailing
/// `validation_split` of the windows is held out and scored after every
/// epoch; the rest is shuffled into mini-batches each epoch.
pub fn train(
    windows: &WindowSet,
    config: &NetworkConfig,
    options: &TrainingOptions,
) -> Result<TrainedModel> {
    config.validate()?;
    options.validate()?;
    let mut optimizer = Optimizer::new(config.optimizer, options.learning_rate)?;

    if windows.is_empty() {
        return Err(ForecastError::InsufficientData(
            "No training windows; the frame is shorter than lookback + horizon".to_string(),
        ));
    }

    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let (train_set, validation) = windows.split_validation(options.validation_split)?;
    let validation = if validation.is_empty() {
        if options.validation_split > 0.0 {
            warn!(
                windows = windows.len(),
                split = options.validation_split,
                "too few windows to hold out a validation set, skipping validation"
            );
        }
        None
    } else {
        Some(validation)
    };

    let mut network = RecurrentNetwork::new(config, windows.n_features(), &mut rng)?;
    info!(
        layers = %network.describe(),
        train = train_set.len(),
        validation = validation.as_ref().map_or(0, WindowSet::len),
        optimizer = %config.optimizer,
        loss = %config.loss,
        "training network"
    );

    let mut history = TrainingHistory::default();
    let mut order: Vec<usize> = (0..train_set.len()).collect();

    for epoch in 1..=options.epochs {
        order.shuffle(&mut rng);
        let mut weighted_loss = 0.0;

        for indices in order.chunks(options.batch_size) {
            let batch = train_set.select(indices);
            let pass = network.forward_train(batch.windows(), &mut rng)?;

            let batch_loss = config.loss.value(pass.output(), batch.targets());
            if !batch_loss.is_finite() {
                return Err(ForecastError::NumericDegeneracy(format!(
                    "Training loss became {} in epoch {}",
                    batch_loss, epoch
                )));
            }

            let d_output = config.loss.gradient(pass.output(), batch.targets());
            let mut grads = network.backward(&pass, &d_output);
            if let Some(max_norm) = options.gradient_clip {
                grads.clip_global_norm(max_norm);
            }
            network.apply_gradients(&grads, &mut optimizer);

            weighted_loss += batch_loss * batch.len() as f64;
        }

        let loss = weighted_loss / train_set.len() as f64;
        history.loss.push(loss);

        match &validation {
            Some(validation) => {
                let predictions = network.predict(validation.windows())?;
                let val_loss = config.loss.value(&predictions, validation.targets());
                if !val_loss.is_finite() {
                    return Err(ForecastError::NumericDegeneracy(format!(
                        "Validation loss became {} in epoch {}",
                        val_loss, epoch
                    )));
                }
                history.val_loss.push(val_loss);
                info!(epoch, epochs = options.epochs, loss, val_loss, "epoch complete");
            }
            None => info!(epoch, epochs = options.epochs, loss, "epoch complete"),
        }
    }

    debug!(steps = optimizer.timestep(), "training finished");

    Ok(TrainedModel {
        network,
        config: config.clone(),
        history,
    })
}
