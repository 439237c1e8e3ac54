use std::fmt::{self, Display};

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};
use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

use super::{ForwardCache, Gradients, Role};
use crate::{MlErr, Result, arch::activations::ActFn};

/// A fully connected layer: an affine transform followed by an elementwise activation.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    weights: Array2<f64>,
    biases: Array1<f64>,
    act_fn: ActFn,
    role: Role,
}

impl Layer {
    /// Creates a new randomly initialized `Layer`.
    ///
    /// Rectifier layers (`Relu`, `LeakyRelu`) draw their parameters from a Kaiming normal
    /// distribution, every other activation from a uniform distribution over `[-1, 1)`.
    ///
    /// # Arguments
    /// * `dim` - The input and output sizes of the layer, in that order.
    /// * `act_fn` - The activation applied after the affine transform.
    /// * `role` - Whether this is a hidden or the output layer.
    /// * `rng` - The random number generator used for initialization.
    ///
    /// # Errors
    /// `MlErr::Config` if any of the dimensions is zero.
    pub fn new<R>(dim: (usize, usize), act_fn: ActFn, role: Role, rng: &mut R) -> Result<Self>
    where
        R: Rng + ?Sized,
    {
        let (dim_in, dim_out) = dim;
        if dim_in == 0 || dim_out == 0 {
            return Err(MlErr::config(format!(
                "layer dimensions must be positive, got {dim_in}x{dim_out}"
            )));
        }

        let (weights, biases) = match act_fn {
            ActFn::Relu | ActFn::LeakyRelu => {
                let std_dev = (2. / dim_in as f64).sqrt();
                let normal =
                    Normal::new(0.0_f64, std_dev).map_err(|e| MlErr::config(e.to_string()))?;
                sample_params(&normal, dim, rng)
            }
            ActFn::Identity | ActFn::Sigmoid | ActFn::Tanh => {
                let uniform =
                    Uniform::new(-1.0_f64, 1.0).map_err(|e| MlErr::config(e.to_string()))?;
                sample_params(&uniform, dim, rng)
            }
        };

        Ok(Self {
            weights,
            biases,
            act_fn,
            role,
        })
    }

    /// Creates a `Layer` from explicit parameters.
    ///
    /// # Arguments
    /// * `weights` - A `[out_dim, in_dim]` matrix.
    /// * `biases` - A vector of length `out_dim`.
    /// * `act_fn` - The activation applied after the affine transform.
    /// * `role` - Whether this is a hidden or the output layer.
    ///
    /// # Errors
    /// `MlErr::Config` if the weight matrix is empty, `MlErr::ShapeMismatch` if the biases don't
    /// match its rows.
    pub fn from_params(
        weights: Array2<f64>,
        biases: Array1<f64>,
        act_fn: ActFn,
        role: Role,
    ) -> Result<Self> {
        let (dim_out, dim_in) = weights.dim();
        if dim_in == 0 || dim_out == 0 {
            return Err(MlErr::config(format!(
                "layer dimensions must be positive, got {dim_in}x{dim_out}"
            )));
        }

        MlErr::check_len("biases", biases.len(), dim_out)?;

        Ok(Self {
            weights,
            biases,
            act_fn,
            role,
        })
    }

    /// Returns the input and output sizes of this layer.
    pub fn dim(&self) -> (usize, usize) {
        (self.in_dim(), self.out_dim())
    }

    pub fn in_dim(&self) -> usize {
        self.weights.ncols()
    }

    pub fn out_dim(&self) -> usize {
        self.weights.nrows()
    }

    /// Returns the amount of scalar parameters this layer has.
    pub fn size(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    pub fn weights(&self) -> ArrayView2<'_, f64> {
        self.weights.view()
    }

    pub fn biases(&self) -> ArrayView1<'_, f64> {
        self.biases.view()
    }

    pub fn act_fn(&self) -> ActFn {
        self.act_fn
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Computes `a = f(W·x + b)`.
    ///
    /// # Returns
    /// The cache holding `x`, `z` and `a`, needed by `backward`.
    ///
    /// # Errors
    /// `MlErr::ShapeMismatch` if `x` isn't `in_dim` long.
    pub fn forward(&self, x: ArrayView1<f64>) -> Result<ForwardCache> {
        MlErr::check_len("layer input", x.len(), self.in_dim())?;

        let z = self.weights.dot(&x) + &self.biases;
        let act_fn = self.act_fn;
        let a = z.mapv(|v| act_fn.f(v));

        Ok(ForwardCache {
            x: x.to_owned(),
            z,
            a,
        })
    }

    /// Applies the chain rule to the error signal of this layer's output.
    ///
    /// # Arguments
    /// * `cache` - The cache returned by the forward pass the error refers to.
    /// * `d_a` - The derivative of the loss with respect to this layer's output.
    ///
    /// # Returns
    /// The gradients for this layer's parameters and the error signal for its input.
    ///
    /// # Errors
    /// `MlErr::ShapeMismatch` if `cache` or `d_a` weren't produced for a layer of this shape.
    pub fn backward(&self, cache: &ForwardCache, d_a: ArrayView1<f64>) -> Result<Gradients> {
        MlErr::check_len("cached input", cache.x.len(), self.in_dim())?;
        MlErr::check_len("cached pre-activation", cache.z.len(), self.out_dim())?;
        MlErr::check_len("output error", d_a.len(), self.out_dim())?;

        let act_fn = self.act_fn;
        let mut d_z = d_a.to_owned();
        Zip::from(&mut d_z)
            .and(&cache.z)
            .and(&cache.a)
            .for_each(|d, &z, &a| *d *= act_fn.df_cached(z, a));

        let d_w = outer(d_z.view(), cache.x.view());
        let d_x = self.weights.t().dot(&d_z);

        Ok(Gradients { d_x, d_w, d_b: d_z })
    }

    /// Takes a gradient descent step: `W -= lr * dW` and `b -= lr * db`.
    ///
    /// # Errors
    /// `MlErr::ShapeMismatch` if the gradients belong to a layer of another shape.
    pub fn apply_gradients(&mut self, grads: &Gradients, learning_rate: f64) -> Result<()> {
        if grads.d_w.dim() != self.weights.dim() {
            return Err(MlErr::ShapeMismatch {
                what: "weight gradient",
                got: grads.d_w.len(),
                expected: self.weights.len(),
            });
        }
        MlErr::check_len("bias gradient", grads.d_b.len(), self.biases.len())?;

        self.weights.scaled_add(-learning_rate, &grads.d_w);
        self.biases.scaled_add(-learning_rate, &grads.d_b);
        Ok(())
    }
}

/// Dumps the layer's shape and every unit's weights and bias, one unit per line.
impl Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (dim_in, dim_out) = self.dim();
        write!(f, "{dim_in} -> {dim_out}, {:?}, {:?}", self.act_fn, self.role)?;

        for (i, (row, bias)) in self.weights.outer_iter().zip(&self.biases).enumerate() {
            write!(f, "\n  unit {i}: weights [")?;
            for (j, w) in row.iter().enumerate() {
                if j > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{w}")?;
            }
            write!(f, "], bias {bias}")?;
        }

        Ok(())
    }
}

fn sample_params<D, R>(dist: &D, dim: (usize, usize), rng: &mut R) -> (Array2<f64>, Array1<f64>)
where
    D: Distribution<f64>,
    R: Rng + ?Sized,
{
    let (dim_in, dim_out) = dim;
    let weights = Array2::from_shape_simple_fn((dim_out, dim_in), || dist.sample(&mut *rng));
    let biases = Array1::from_shape_simple_fn(dim_out, || dist.sample(&mut *rng));
    (weights, biases)
}

/// The outer product `v ⊗ w`, a `[v.len(), w.len()]` matrix.
fn outer(v: ArrayView1<f64>, w: ArrayView1<f64>) -> Array2<f64> {
    let v = v.insert_axis(Axis(1));
    let w = w.insert_axis(Axis(0));
    v.dot(&w)
}

#[cfg(test)]
mod tests {
    use ndarray::{Array1, array};
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn display_dumps_every_unit() {
        let layer = layer(ActFn::Sigmoid);
        let expected = "3 -> 2, Sigmoid, Hidden\n  \
                        unit 0: weights [1, 2, 3], bias 0.5\n  \
                        unit 1: weights [-1, 0.5, 0], bias -1";

        assert_eq!(layer.to_string(), expected);
    }

    fn layer(act_fn: ActFn) -> Layer {
        let weights = array![[1., 2., 3.], [-1., 0.5, 0.]];
        let biases = array![0.5, -1.];
        Layer::from_params(weights, biases, act_fn, Role::Hidden).unwrap()
    }

    #[test]
    fn outer_product() {
        let a = array![1., 2., 3.];
        let expected = array![[1., 2., 3.], [2., 4., 6.], [3., 6., 9.]];
        assert_eq!(outer(a.view(), a.view()), expected);
    }

    #[test]
    fn random_init_has_the_requested_shape() {
        let mut rng = StdRng::seed_from_u64(42);

        for act_fn in ActFn::ALL {
            let layer = Layer::new((4, 3), act_fn, Role::Hidden, &mut rng).unwrap();
            assert_eq!(layer.dim(), (4, 3));
            assert_eq!(layer.weights().dim(), (3, 4));
            assert_eq!(layer.biases().len(), 3);
            assert_eq!(layer.size(), 15);
        }
    }

    #[test]
    fn uniform_init_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let layer = Layer::new((16, 16), ActFn::Sigmoid, Role::Output, &mut rng).unwrap();

        let weights = layer.weights();
        let biases = layer.biases();
        let all = weights.iter().chain(biases.iter());
        assert!(all.copied().all(|p| (-1. ..1.).contains(&p)));
    }

    #[test]
    fn seeded_init_is_reproducible() {
        let a = Layer::new((3, 2), ActFn::Relu, Role::Hidden, &mut StdRng::seed_from_u64(1));
        let b = Layer::new((3, 2), ActFn::Relu, Role::Hidden, &mut StdRng::seed_from_u64(1));
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[test]
    fn rejects_empty_dimensions() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = Layer::new((0, 3), ActFn::Relu, Role::Hidden, &mut rng).unwrap_err();
        assert!(matches!(err, MlErr::Config(_)));

        let err = Layer::from_params(array![[1., 2.]], array![1., 2.], ActFn::Relu, Role::Hidden)
            .unwrap_err();
        assert!(matches!(err, MlErr::ShapeMismatch { what: "biases", .. }));
    }

    #[test]
    fn forward_computes_affine_then_activation() {
        let layer = layer(ActFn::Relu);
        let cache = layer.forward(array![1., 1., 1.].view()).unwrap();

        assert_eq!(cache.pre_activation(), array![6.5, -1.5]);
        assert_eq!(cache.output(), array![6.5, 0.]);
        assert_eq!(cache.input(), array![1., 1., 1.]);
    }

    #[test]
    fn forward_rejects_wrong_input_width() {
        let layer = layer(ActFn::Identity);
        let err = layer.forward(array![1., 1.].view()).unwrap_err();
        assert!(matches!(
            err,
            MlErr::ShapeMismatch {
                what: "layer input",
                got: 2,
                expected: 3
            }
        ));
    }

    #[test]
    fn backward_applies_the_chain_rule() {
        let layer = layer(ActFn::Relu);
        let cache = layer.forward(array![1., 2., 3.].view()).unwrap();
        // z = [14.5, -1], so only the first unit lets the error through
        let grads = layer.backward(&cache, array![2., 5.].view()).unwrap();

        assert_eq!(grads.biases(), array![2., 0.]);
        assert_eq!(grads.weights(), array![[2., 4., 6.], [0., 0., 0.]]);
        assert_eq!(grads.input(), array![2., 4., 6.]);
        assert_eq!(grads.max_abs(), 6.);
    }

    #[test]
    fn backward_rejects_foreign_caches() {
        let layer = layer(ActFn::Identity);
        let other = Layer::from_params(
            Array2::zeros((2, 4)),
            Array1::zeros(2),
            ActFn::Identity,
            Role::Hidden,
        )
        .unwrap();

        let cache = other.forward(array![1., 2., 3., 4.].view()).unwrap();
        let err = layer.backward(&cache, array![1., 1.].view()).unwrap_err();
        assert!(matches!(err, MlErr::ShapeMismatch { what: "cached input", .. }));

        let cache = layer.forward(array![1., 2., 3.].view()).unwrap();
        let err = layer.backward(&cache, array![1.].view()).unwrap_err();
        assert!(matches!(err, MlErr::ShapeMismatch { what: "output error", .. }));
    }

    #[test]
    fn apply_gradients_steps_against_the_gradient() {
        let mut layer = layer(ActFn::Identity);
        let cache = layer.forward(array![1., 0., 0.].view()).unwrap();
        let grads = layer.backward(&cache, array![1., -2.].view()).unwrap();

        layer.apply_gradients(&grads, 0.5).unwrap();

        assert_eq!(layer.weights(), array![[0.5, 2., 3.], [0., 0.5, 0.]]);
        assert_eq!(layer.biases(), array![0., 0.]);
    }

    #[test]
    fn apply_gradients_rejects_other_shapes() {
        let mut layer = layer(ActFn::Identity);
        let other = Layer::from_params(
            Array2::zeros((3, 3)),
            Array1::zeros(3),
            ActFn::Identity,
            Role::Hidden,
        )
        .unwrap();
        let cache = other.forward(array![1., 2., 3.].view()).unwrap();
        let grads = other.backward(&cache, array![1., 1., 1.].view()).unwrap();

        let err = layer.apply_gradients(&grads, 0.1).unwrap_err();
        assert!(matches!(err, MlErr::ShapeMismatch { what: "weight gradient", .. }));
    }

    #[test]
    fn sigmoid_backward_matches_the_z_based_derivative() {
        let layer = layer(ActFn::Sigmoid);
        let cache = layer.forward(array![0.1, -0.2, 0.3].view()).unwrap();
        let grads = layer.backward(&cache, array![1., 1.].view()).unwrap();

        for (g, &z) in grads.biases().iter().zip(cache.pre_activation()) {
            assert!((g - ActFn::Sigmoid.df(z)).abs() < 1e-15);
        }
    }
}
