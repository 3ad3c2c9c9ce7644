//! Linear projection from the last hidden state to one scalar

use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand_distr::{Distribution, Uniform};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Dense {
    /// `(inputs, 1)`
    pub(crate) w: Array2<f64>,
    /// Single output bias
    pub(crate) b: Array1<f64>,
}

impl Dense {
    pub(crate) fn new<R: Rng + ?Sized>(inputs: usize, rng: &mut R) -> Self {
        let limit = (6.0 / (inputs + 1) as f64).sqrt();
        let dist = Uniform::new_inclusive(-limit, limit);
        Self {
            w: Array2::from_shape_fn((inputs, 1), |_| dist.sample(rng)),
            b: Array1::zeros(1),
        }
    }

    /// `(batch, inputs)` to `batch` outputs
    pub(crate) fn forward(&self, x: &Array2<f64>) -> Array1<f64> {
        x.dot(&self.w).index_axis_move(Axis(1), 0) + self.b[0]
    }

    /// Returns the input gradient and the weight gradients
    pub(crate) fn backward(&self, x: &Array2<f64>, d_out: &Array1<f64>) -> (Array2<f64>, Dense) {
        let d_col = d_out.view().insert_axis(Axis(1));
        let grads = Dense {
            w: x.t().dot(&d_col),
            b: Array1::from_elem(1, d_out.sum()),
        };
        (d_col.dot(&self.w.t()), grads)
    }

    pub(crate) fn squared_norm(&self) -> f64 {
        self.w.iter().chain(self.b.iter()).map(|g| g * g).sum()
    }

    pub(crate) fn scale(&mut self, factor: f64) {
        self.w *= factor;
        self.b *= factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_backward_shapes_and_bias_gradient() {
        let dense = Dense {
            w: array![[2.0], [-1.0]],
            b: array![0.5],
        };
        let x = array![[1.0, 1.0], [3.0, 0.0]];

        assert_eq!(dense.forward(&x), array![1.5, 6.5]);

        let (dx, grads) = dense.backward(&x, &array![1.0, 2.0]);
        assert_eq!(dx, array![[2.0, -1.0], [4.0, -2.0]]);
        assert_eq!(grads.w, array![[7.0], [1.0]]);
        assert_eq!(grads.b, array![3.0]);
    }
}
