//! Recurrent stack, dropout and dense head wired together

use super::dense::Dense;
use super::recurrent::{LayerCache, RecurrentLayer, RecurrentWeights};
use super::NetworkConfig;
use crate::error::{ForecastError, Result};
use crate::optim::Optimizer;
use ndarray::{Array1, Array2, Array3, Axis};
use rand::Rng;

/// Trainable network mapping `(batch, lookback, features)` windows to one
/// scalar per window
#[derive(Debug, Clone)]
pub(crate) struct RecurrentNetwork {
    layers: Vec<RecurrentLayer>,
    head: Dense,
    dropout: f64,
    n_features: usize,
}

/// Everything the backward pass needs from one training forward pass
pub(crate) struct ForwardPass {
    caches: Vec<LayerCache>,
    steps: usize,
    /// Last hidden state after dropout, input to the head
    features: Array2<f64>,
    /// Inverted-dropout mask, absent when dropout is zero
    mask: Option<Array2<f64>>,
    output: Array1<f64>,
}

impl ForwardPass {
    pub(crate) fn output(&self) -> &Array1<f64> {
        &self.output
    }
}

/// Gradients laid out like the network's parameters
pub(crate) struct Gradients {
    layers: Vec<RecurrentWeights>,
    head: Dense,
}

impl Gradients {
    pub(crate) fn global_norm(&self) -> f64 {
        let squared: f64 = self.layers.iter().map(RecurrentWeights::squared_norm).sum();
        (squared + self.head.squared_norm()).sqrt()
    }

    /// Rescale so the global norm is at most `max_norm`
    pub(crate) fn clip_global_norm(&mut self, max_norm: f64) {
        let norm = self.global_norm();
        if norm > max_norm && norm.is_finite() {
            let factor = max_norm / norm;
            for layer in &mut self.layers {
                layer.scale(factor);
            }
            self.head.scale(factor);
        }
    }
}

impl RecurrentNetwork {
    /// Build a network for windows with `n_features` columns.
    ///
    /// `config` is expected to have been validated.
    pub(crate) fn new<R: Rng + ?Sized>(
        config: &NetworkConfig,
        n_features: usize,
        rng: &mut R,
    ) -> Result<Self> {
        if n_features == 0 {
            return Err(ForecastError::ConfigurationError(
                "Windows must have at least one feature".to_string(),
            ));
        }

        let mut layers = Vec::with_capacity(config.layers.len());
        let mut input_size = n_features;
        for layer in &config.layers {
            layers.push(RecurrentLayer::new(layer.clone(), input_size, rng));
            input_size = layer.units;
        }

        Ok(Self {
            layers,
            head: Dense::new(input_size, rng),
            dropout: config.dropout,
            n_features,
        })
    }

    pub(crate) fn n_features(&self) -> usize {
        self.n_features
    }

    fn check_windows(&self, windows: &Array3<f64>) -> Result<()> {
        let (_, steps, features) = windows.dim();
        if features != self.n_features {
            return Err(ForecastError::ComputationError(format!(
                "Network expects {} features per step, windows have {}",
                self.n_features, features
            )));
        }
        if steps == 0 {
            return Err(ForecastError::ComputationError(
                "Windows have no time steps".to_string(),
            ));
        }
        Ok(())
    }

    /// Run the recurrent stack, returning the last layer's final hidden
    /// state and the per-layer caches
    fn encode(&self, windows: &Array3<f64>) -> (Array2<f64>, Vec<LayerCache>) {
        let mut sequence: Vec<Array2<f64>> = windows
            .axis_iter(Axis(1))
            .map(|step| step.to_owned())
            .collect();
        let mut caches = Vec::with_capacity(self.layers.len());

        for layer in &self.layers {
            let (hidden, cache) = layer.forward(&sequence);
            caches.push(cache);
            sequence = hidden;
        }

        let last = sequence.pop().unwrap_or_else(|| Array2::zeros((windows.len_of(Axis(0)), 0)));
        (last, caches)
    }

    /// Inference: no dropout, no state kept
    pub(crate) fn predict(&self, windows: &Array3<f64>) -> Result<Array1<f64>> {
        self.check_windows(windows)?;
        if windows.len_of(Axis(0)) == 0 {
            return Ok(Array1::zeros(0));
        }

        let (last, _) = self.encode(windows);
        Ok(self.head.forward(&last))
    }

    /// Training forward pass with dropout drawn from `rng`
    pub(crate) fn forward_train<R: Rng + ?Sized>(
        &self,
        windows: &Array3<f64>,
        rng: &mut R,
    ) -> Result<ForwardPass> {
        self.check_windows(windows)?;

        let (last, caches) = self.encode(windows);
        let (features, mask) = if self.dropout > 0.0 {
            let keep = 1.0 - self.dropout;
            let mask = Array2::from_shape_fn(last.raw_dim(), |_| {
                if rng.gen::<f64>() < keep {
                    1.0 / keep
                } else {
                    0.0
                }
            });
            (&last * &mask, Some(mask))
        } else {
            (last, None)
        };

        let output = self.head.forward(&features);
        Ok(ForwardPass {
            caches,
            steps: windows.len_of(Axis(1)),
            features,
            mask,
            output,
        })
    }

    /// Backpropagation through time for `d_output`, the loss gradient with
    /// respect to each output in `pass`
    pub(crate) fn backward(&self, pass: &ForwardPass, d_output: &Array1<f64>) -> Gradients {
        let (d_features, head) = self.head.backward(&pass.features, d_output);
        let d_last = match &pass.mask {
            Some(mask) => d_features * mask,
            None => d_features,
        };

        // the top layer only emits its final state
        let mut d_hidden = vec![Array2::zeros(d_last.raw_dim()); pass.steps];
        if let Some(slot) = d_hidden.last_mut() {
            *slot = d_last;
        }

        let mut layers = Vec::with_capacity(self.layers.len());
        for (layer, cache) in self.layers.iter().zip(&pass.caches).rev() {
            let (d_inputs, grads) = layer.backward(cache, &d_hidden);
            layers.push(grads);
            d_hidden = d_inputs;
        }
        layers.reverse();

        Gradients { layers, head }
    }

    /// Apply one optimizer step. Slots are numbered in parameter order so
    /// each tensor keeps its own optimizer state across steps.
    pub(crate) fn apply_gradients(&mut self, grads: &Gradients, optimizer: &mut Optimizer) {
        optimizer.begin_step();

        let mut slot = 0;
        for (layer, grad) in self.layers.iter_mut().zip(&grads.layers) {
            let weights = layer.weights_mut();
            optimizer.update(slot, &mut weights.w, &grad.w);
            optimizer.update(slot + 1, &mut weights.u, &grad.u);
            optimizer.update(slot + 2, &mut weights.b, &grad.b);
            slot += 3;
        }
        optimizer.update(slot, &mut self.head.w, &grads.head.w);
        optimizer.update(slot + 1, &mut self.head.b, &grads.head.b);
    }

    /// Layer kinds and widths, for logging
    pub(crate) fn describe(&self) -> String {
        self.layers
            .iter()
            .map(|layer| format!("{}({})", layer.config().kind, layer.config().units))
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::LossKind;
    use crate::models::LayerConfig;
    use crate::optim::OptimizerKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config(dropout: f64) -> NetworkConfig {
        NetworkConfig {
            layers: vec![LayerConfig::gru(4, true), LayerConfig::lstm(3, false)],
            dropout,
            optimizer: OptimizerKind::Adam,
            loss: LossKind::Mse,
        }
    }

    fn windows(batch: usize) -> Array3<f64> {
        Array3::from_shape_fn((batch, 5, 2), |(b, t, f)| ((b + t) as f64 * 0.1) - f as f64 * 0.3)
    }

    #[test]
    fn test_stacked_input_gradient_matches_finite_differences() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut network = RecurrentNetwork::new(&config(0.0), 2, &mut rng).unwrap();
        let x = windows(2);
        let targets = Array1::from(vec![0.5, -0.25]);
        let loss = LossKind::Mse;

        let pass = network.forward_train(&x, &mut rng).unwrap();
        let grads = network.backward(&pass, &loss.gradient(pass.output(), &targets));

        // perturb one weight in the bottom (GRU) layer
        let analytic = grads.layers[0].w[[1, 1]];
        let eps = 1e-6;
        let original = network.layers[0].weights_mut().w[[1, 1]];

        network.layers[0].weights_mut().w[[1, 1]] = original + eps;
        let plus = loss.value(&network.predict(&x).unwrap(), &targets);
        network.layers[0].weights_mut().w[[1, 1]] = original - eps;
        let minus = loss.value(&network.predict(&x).unwrap(), &targets);

        let numeric = (plus - minus) / (2.0 * eps);
        assert!((numeric - analytic).abs() < 1e-6, "{} vs {}", numeric, analytic);
    }

    #[test]
    fn test_predict_is_pure() {
        let mut rng = StdRng::seed_from_u64(3);
        let network = RecurrentNetwork::new(&config(0.5), 2, &mut rng).unwrap();
        let x = windows(4);

        let first = network.predict(&x).unwrap();
        let second = network.predict(&x).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn test_feature_mismatch_is_computation_error() {
        let mut rng = StdRng::seed_from_u64(3);
        let network = RecurrentNetwork::new(&config(0.0), 3, &mut rng).unwrap();
        let result = network.predict(&windows(1));
        assert!(matches!(result, Err(ForecastError::ComputationError(_))));
    }

    #[test]
    fn test_clip_global_norm() {
        let mut rng = StdRng::seed_from_u64(5);
        let network = RecurrentNetwork::new(&config(0.0), 2, &mut rng).unwrap();
        let x = windows(3);
        let pass = network.forward_train(&x, &mut rng).unwrap();
        let mut grads = network.backward(&pass, &Array1::from_elem(3, 100.0));

        grads.clip_global_norm(1.0);
        assert!((grads.global_norm() - 1.0).abs() < 1e-9);
    }
}
