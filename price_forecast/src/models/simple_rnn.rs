//! Fully connected recurrence, `h' = tanh(x·Wᵀ + h·Uᵀ + b)`

use super::recurrent::{tanh_grad, RecurrentCell, RecurrentWeights};
use ndarray::Array2;

pub(crate) struct SimpleRnn;

pub(crate) struct SimpleRnnCache {
    x: Array2<f64>,
    h_prev: Array2<f64>,
    h: Array2<f64>,
}

impl RecurrentCell for SimpleRnn {
    const GATES: usize = 1;

    type State = Array2<f64>;
    type Cache = SimpleRnnCache;

    fn zero_state(batch: usize, units: usize) -> Array2<f64> {
        Array2::zeros((batch, units))
    }

    fn step(
        weights: &RecurrentWeights,
        x: &Array2<f64>,
        h_prev: &Array2<f64>,
    ) -> (Array2<f64>, SimpleRnnCache) {
        let h = weights.pre_activation(x, h_prev).mapv(f64::tanh);
        let cache = SimpleRnnCache {
            x: x.clone(),
            h_prev: h_prev.clone(),
            h: h.clone(),
        };
        (h, cache)
    }

    fn step_backward(
        weights: &RecurrentWeights,
        cache: &SimpleRnnCache,
        dh: &Array2<f64>,
        grads: &mut RecurrentWeights,
    ) -> (Array2<f64>, Array2<f64>) {
        let da = dh * &tanh_grad(&cache.h);
        grads.accumulate(weights, &da, &cache.x, &cache.h_prev)
    }
}
