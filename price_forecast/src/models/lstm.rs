//! LSTM cell
//!
//! Gate blocks are stacked input, forget, candidate, output:
//!
//! ```text
//! i = σ(z_i)  f = σ(z_f)  g = tanh(z_g)  o = σ(z_o)
//! c = f ⊙ c_prev + i ⊙ g
//! h = o ⊙ tanh(c)
//! ```

use super::recurrent::{
    gate, sigmoid, sigmoid_grad, stack_gates, tanh_grad, HiddenState, RecurrentCell,
    RecurrentWeights,
};
use ndarray::Array2;

pub(crate) struct Lstm;

/// Hidden and cell state, each `(batch, units)`
#[derive(Debug, Clone)]
pub(crate) struct LstmState {
    h: Array2<f64>,
    c: Array2<f64>,
}

impl HiddenState for LstmState {
    fn hidden(&self) -> &Array2<f64> {
        &self.h
    }

    fn hidden_mut(&mut self) -> &mut Array2<f64> {
        &mut self.h
    }
}

pub(crate) struct LstmCache {
    x: Array2<f64>,
    h_prev: Array2<f64>,
    c_prev: Array2<f64>,
    i: Array2<f64>,
    f: Array2<f64>,
    g: Array2<f64>,
    o: Array2<f64>,
    tanh_c: Array2<f64>,
}

impl RecurrentCell for Lstm {
    const GATES: usize = 4;

    type State = LstmState;
    type Cache = LstmCache;

    fn zero_state(batch: usize, units: usize) -> LstmState {
        LstmState {
            h: Array2::zeros((batch, units)),
            c: Array2::zeros((batch, units)),
        }
    }

    fn step(weights: &RecurrentWeights, x: &Array2<f64>, state: &LstmState) -> (LstmState, LstmCache) {
        let units = weights.units();
        let z = weights.pre_activation(x, &state.h);

        let i = sigmoid(gate(&z, 0, units));
        let f = sigmoid(gate(&z, 1, units));
        let g = gate(&z, 2, units).mapv(f64::tanh);
        let o = sigmoid(gate(&z, 3, units));

        let c = &f * &state.c + &i * &g;
        let tanh_c = c.mapv(f64::tanh);
        let h = &o * &tanh_c;

        let cache = LstmCache {
            x: x.clone(),
            h_prev: state.h.clone(),
            c_prev: state.c.clone(),
            i,
            f,
            g,
            o,
            tanh_c,
        };
        (LstmState { h, c }, cache)
    }

    fn step_backward(
        weights: &RecurrentWeights,
        cache: &LstmCache,
        d_state: &LstmState,
        grads: &mut RecurrentWeights,
    ) -> (Array2<f64>, LstmState) {
        let dh = &d_state.h;
        let dc = &d_state.c + &(dh * &cache.o * tanh_grad(&cache.tanh_c));

        let dz_i = &dc * &cache.g * sigmoid_grad(&cache.i);
        let dz_f = &dc * &cache.c_prev * sigmoid_grad(&cache.f);
        let dz_g = &dc * &cache.i * tanh_grad(&cache.g);
        let dz_o = dh * &cache.tanh_c * sigmoid_grad(&cache.o);
        let dz = stack_gates(&[&dz_i, &dz_f, &dz_g, &dz_o]);

        let (dx, dh_prev) = grads.accumulate(weights, &dz, &cache.x, &cache.h_prev);
        let dc_prev = dc * &cache.f;

        (dx, LstmState { h: dh_prev, c: dc_prev })
    }
}
