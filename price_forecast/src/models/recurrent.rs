//! Fused recurrent weights and the time-step loop shared by every cell type

use super::gru::Gru;
use super::lstm::Lstm;
use super::simple_rnn::SimpleRnn;
use super::{LayerConfig, LayerKind};
use ndarray::{s, Array1, Array2, ArrayView2, Axis};
use rand::Rng;
use rand_distr::{Distribution, Uniform};

/// Input, recurrent and bias weights with the gate blocks stacked along rows.
///
/// `w` is `(gates * units, input)`, `u` is `(gates * units, units)` and `b`
/// has `gates * units` entries.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecurrentWeights {
    pub(crate) w: Array2<f64>,
    pub(crate) u: Array2<f64>,
    pub(crate) b: Array1<f64>,
}

impl RecurrentWeights {
    /// Glorot-uniform kernels and zero bias
    pub(crate) fn glorot<R: Rng + ?Sized>(
        input: usize,
        units: usize,
        gates: usize,
        rng: &mut R,
    ) -> Self {
        let rows = gates * units;
        Self {
            w: glorot_uniform(rows, input, rng),
            u: glorot_uniform(rows, units, rng),
            b: Array1::zeros(rows),
        }
    }

    pub(crate) fn zeros_like(&self) -> Self {
        Self {
            w: Array2::zeros(self.w.raw_dim()),
            u: Array2::zeros(self.u.raw_dim()),
            b: Array1::zeros(self.b.raw_dim()),
        }
    }

    pub(crate) fn units(&self) -> usize {
        self.u.ncols()
    }

    /// `x·Wᵀ + h·Uᵀ + b` for a batch
    pub(crate) fn pre_activation(&self, x: &Array2<f64>, h: &Array2<f64>) -> Array2<f64> {
        x.dot(&self.w.t()) + h.dot(&self.u.t()) + &self.b
    }

    /// Accumulate gradients for gate pre-activation gradients `dz` of a
    /// fully fused cell and return `(dx, dh_prev)`
    pub(crate) fn accumulate(
        &mut self,
        weights: &RecurrentWeights,
        dz: &Array2<f64>,
        x: &Array2<f64>,
        h_prev: &Array2<f64>,
    ) -> (Array2<f64>, Array2<f64>) {
        self.w.scaled_add(1.0, &dz.t().dot(x));
        self.u.scaled_add(1.0, &dz.t().dot(h_prev));
        self.b.scaled_add(1.0, &dz.sum_axis(Axis(0)));
        (dz.dot(&weights.w), dz.dot(&weights.u))
    }

    pub(crate) fn squared_norm(&self) -> f64 {
        [&self.w, &self.u]
            .iter()
            .flat_map(|m| m.iter())
            .chain(self.b.iter())
            .map(|g| g * g)
            .sum()
    }

    pub(crate) fn scale(&mut self, factor: f64) {
        self.w *= factor;
        self.u *= factor;
        self.b *= factor;
    }
}

fn glorot_uniform<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Array2<f64> {
    let limit = (6.0 / (rows + cols) as f64).sqrt();
    let dist = Uniform::new_inclusive(-limit, limit);
    Array2::from_shape_fn((rows, cols), |_| dist.sample(rng))
}

pub(crate) fn sigmoid(z: ArrayView2<f64>) -> Array2<f64> {
    z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}

/// Derivative of the sigmoid given its output
pub(crate) fn sigmoid_grad(s: &Array2<f64>) -> Array2<f64> {
    s.mapv(|v| v * (1.0 - v))
}

/// Derivative of tanh given its output
pub(crate) fn tanh_grad(t: &Array2<f64>) -> Array2<f64> {
    t.mapv(|v| 1.0 - v * v)
}

/// Columns `[gate * units, (gate + 1) * units)` of a fused pre-activation
pub(crate) fn gate(z: &Array2<f64>, gate: usize, units: usize) -> ArrayView2<'_, f64> {
    z.slice(s![.., gate * units..(gate + 1) * units])
}

/// Place equally sized per-gate blocks side by side
pub(crate) fn stack_gates(blocks: &[&Array2<f64>]) -> Array2<f64> {
    let (batch, units) = blocks.first().map_or((0, 0), |b| b.dim());
    let mut stacked = Array2::zeros((batch, units * blocks.len()));
    for (k, block) in blocks.iter().enumerate() {
        stacked
            .slice_mut(s![.., k * units..(k + 1) * units])
            .assign(*block);
    }
    stacked
}

/// Recurrent state whose hidden component receives gradients from above
pub(crate) trait HiddenState {
    fn hidden(&self) -> &Array2<f64>;
    fn hidden_mut(&mut self) -> &mut Array2<f64>;
}

impl HiddenState for Array2<f64> {
    fn hidden(&self) -> &Array2<f64> {
        self
    }

    fn hidden_mut(&mut self) -> &mut Array2<f64> {
        self
    }
}

/// One step of a recurrent cell over a batch
pub(crate) trait RecurrentCell {
    /// Gate blocks stacked in the fused weights
    const GATES: usize;

    /// Carried state; also used for its gradient
    type State: HiddenState;
    /// Values saved by `step` for `step_backward`
    type Cache;

    fn zero_state(batch: usize, units: usize) -> Self::State;

    fn step(
        weights: &RecurrentWeights,
        x: &Array2<f64>,
        state: &Self::State,
    ) -> (Self::State, Self::Cache);

    /// Backpropagate one step given the gradient flowing into its output
    /// state. Returns `(dx, d_state_prev)`.
    fn step_backward(
        weights: &RecurrentWeights,
        cache: &Self::Cache,
        d_state: &Self::State,
        grads: &mut RecurrentWeights,
    ) -> (Array2<f64>, Self::State);
}

fn run_forward<C: RecurrentCell>(
    weights: &RecurrentWeights,
    inputs: &[Array2<f64>],
) -> (Vec<Array2<f64>>, Vec<C::Cache>) {
    let batch = inputs.first().map_or(0, |x| x.nrows());
    let mut state = C::zero_state(batch, weights.units());
    let mut hidden = Vec::with_capacity(inputs.len());
    let mut caches = Vec::with_capacity(inputs.len());

    for x in inputs {
        let (next, cache) = C::step(weights, x, &state);
        hidden.push(next.hidden().clone());
        caches.push(cache);
        state = next;
    }

    (hidden, caches)
}

fn run_backward<C: RecurrentCell>(
    weights: &RecurrentWeights,
    caches: &[C::Cache],
    d_hidden: &[Array2<f64>],
) -> (Vec<Array2<f64>>, RecurrentWeights) {
    let batch = d_hidden.first().map_or(0, |d| d.nrows());
    let mut grads = weights.zeros_like();
    let mut d_state = C::zero_state(batch, weights.units());
    let mut d_inputs = Vec::with_capacity(caches.len());

    for (cache, d_out) in caches.iter().zip(d_hidden).rev() {
        *d_state.hidden_mut() += d_out;
        let (dx, d_prev) = C::step_backward(weights, cache, &d_state, &mut grads);
        d_inputs.push(dx);
        d_state = d_prev;
    }

    d_inputs.reverse();
    (d_inputs, grads)
}

/// Saved forward values for one layer over a whole sequence
pub(crate) enum LayerCache {
    Lstm(Vec<<Lstm as RecurrentCell>::Cache>),
    Gru(Vec<<Gru as RecurrentCell>::Cache>),
    SimpleRnn(Vec<<SimpleRnn as RecurrentCell>::Cache>),
}

/// A recurrent layer: configuration plus its weights
#[derive(Debug, Clone)]
pub(crate) struct RecurrentLayer {
    config: LayerConfig,
    weights: RecurrentWeights,
}

impl RecurrentLayer {
    pub(crate) fn new<R: Rng + ?Sized>(config: LayerConfig, input_size: usize, rng: &mut R) -> Self {
        let units = config.units;
        let weights = match config.kind {
            LayerKind::Lstm => {
                let mut weights = RecurrentWeights::glorot(input_size, units, Lstm::GATES, rng);
                // forget gate bias starts at one
                weights.b.slice_mut(s![units..2 * units]).fill(1.0);
                weights
            }
            LayerKind::Gru => RecurrentWeights::glorot(input_size, units, Gru::GATES, rng),
            LayerKind::SimpleRnn => {
                RecurrentWeights::glorot(input_size, units, SimpleRnn::GATES, rng)
            }
        };

        Self { config, weights }
    }

    pub(crate) fn config(&self) -> &LayerConfig {
        &self.config
    }

    pub(crate) fn weights_mut(&mut self) -> &mut RecurrentWeights {
        &mut self.weights
    }

    /// Hidden state at every step, plus what backpropagation needs
    pub(crate) fn forward(&self, inputs: &[Array2<f64>]) -> (Vec<Array2<f64>>, LayerCache) {
        match self.config.kind {
            LayerKind::Lstm => {
                let (hidden, caches) = run_forward::<Lstm>(&self.weights, inputs);
                (hidden, LayerCache::Lstm(caches))
            }
            LayerKind::Gru => {
                let (hidden, caches) = run_forward::<Gru>(&self.weights, inputs);
                (hidden, LayerCache::Gru(caches))
            }
            LayerKind::SimpleRnn => {
                let (hidden, caches) = run_forward::<SimpleRnn>(&self.weights, inputs);
                (hidden, LayerCache::SimpleRnn(caches))
            }
        }
    }

    /// Gradients w.r.t. each step's input and the layer weights, given the
    /// gradient w.r.t. each step's hidden output
    pub(crate) fn backward(
        &self,
        cache: &LayerCache,
        d_hidden: &[Array2<f64>],
    ) -> (Vec<Array2<f64>>, RecurrentWeights) {
        match cache {
            LayerCache::Lstm(caches) => run_backward::<Lstm>(&self.weights, caches, d_hidden),
            LayerCache::Gru(caches) => run_backward::<Gru>(&self.weights, caches, d_hidden),
            LayerCache::SimpleRnn(caches) => {
                run_backward::<SimpleRnn>(&self.weights, caches, d_hidden)
            }
        }
    }
}
