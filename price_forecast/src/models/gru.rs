//! GRU cell
//!
//! Gate blocks are stacked update, reset, candidate. The reset gate is
//! applied to the previous state before the recurrent product:
//!
//! ```text
//! z = σ(x·W_zᵀ + h·U_zᵀ + b_z)
//! r = σ(x·W_rᵀ + h·U_rᵀ + b_r)
//! n = tanh(x·W_nᵀ + (r ⊙ h)·U_nᵀ + b_n)
//! h' = z ⊙ h + (1 - z) ⊙ n
//! ```

use super::recurrent::{
    gate, sigmoid, sigmoid_grad, stack_gates, tanh_grad, RecurrentCell, RecurrentWeights,
};
use ndarray::{s, Array2, Axis};

pub(crate) struct Gru;

pub(crate) struct GruCache {
    x: Array2<f64>,
    h_prev: Array2<f64>,
    z: Array2<f64>,
    r: Array2<f64>,
    n: Array2<f64>,
    reset_h: Array2<f64>,
}

impl RecurrentCell for Gru {
    const GATES: usize = 3;

    type State = Array2<f64>;
    type Cache = GruCache;

    fn zero_state(batch: usize, units: usize) -> Array2<f64> {
        Array2::zeros((batch, units))
    }

    fn step(weights: &RecurrentWeights, x: &Array2<f64>, h_prev: &Array2<f64>) -> (Array2<f64>, GruCache) {
        let units = weights.units();
        let xw = x.dot(&weights.w.t()) + &weights.b;
        let hu = h_prev.dot(&weights.u.slice(s![..2 * units, ..]).t());

        let z = sigmoid((&gate(&xw, 0, units) + &gate(&hu, 0, units)).view());
        let r = sigmoid((&gate(&xw, 1, units) + &gate(&hu, 1, units)).view());

        let reset_h = &r * h_prev;
        let u_n = weights.u.slice(s![2 * units.., ..]);
        let n = (&gate(&xw, 2, units) + &reset_h.dot(&u_n.t())).mapv(f64::tanh);

        let h = &z * h_prev + &(z.mapv(|v| 1.0 - v) * &n);

        let cache = GruCache {
            x: x.clone(),
            h_prev: h_prev.clone(),
            z,
            r,
            n,
            reset_h,
        };
        (h, cache)
    }

    fn step_backward(
        weights: &RecurrentWeights,
        cache: &GruCache,
        dh: &Array2<f64>,
        grads: &mut RecurrentWeights,
    ) -> (Array2<f64>, Array2<f64>) {
        let units = weights.units();
        let u_zr = weights.u.slice(s![..2 * units, ..]);
        let u_n = weights.u.slice(s![2 * units.., ..]);

        let da_z = dh * &(&cache.h_prev - &cache.n) * sigmoid_grad(&cache.z);
        let da_n = dh * &cache.z.mapv(|v| 1.0 - v) * tanh_grad(&cache.n);

        let d_reset_h = da_n.dot(&u_n);
        let da_r = &d_reset_h * &cache.h_prev * sigmoid_grad(&cache.r);

        let da = stack_gates(&[&da_z, &da_r, &da_n]);
        let da_zr = da.slice(s![.., ..2 * units]);

        grads.w.scaled_add(1.0, &da.t().dot(&cache.x));
        grads.b.scaled_add(1.0, &da.sum_axis(Axis(0)));
        grads
            .u
            .slice_mut(s![..2 * units, ..])
            .scaled_add(1.0, &da_zr.t().dot(&cache.h_prev));
        grads
            .u
            .slice_mut(s![2 * units.., ..])
            .scaled_add(1.0, &da_n.t().dot(&cache.reset_h));

        let dx = da.dot(&weights.w);
        let dh_prev = dh * &cache.z + &d_reset_h * &cache.r + da_zr.dot(&u_zr);

        (dx, dh_prev)
    }
}
