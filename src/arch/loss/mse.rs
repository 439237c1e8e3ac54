use ndarray::{Array1, ArrayView1};

use super::LossFn;

/// Mean squared error loss function.
///
/// `loss_prime` returns the plain difference `y_pred - y`: the `2 / n` factor of the true
/// derivative is folded into the learning rate.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mse;

impl Mse {
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for Mse {
    fn loss(&self, y_pred: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
        (&y_pred - &y)
            .mapv(|x| x.powi(2))
            .mean()
            .unwrap_or_default()
    }

    fn loss_prime(&self, y_pred: ArrayView1<f64>, y: ArrayView1<f64>) -> Array1<f64> {
        &y_pred - &y
    }
}
