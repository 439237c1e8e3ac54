use std::{
    fmt::{self, Display},
    sync::atomic::{AtomicU64, Ordering},
};

use log::{debug, info};
use ndarray::{Array1, ArrayView1};
use rand::{SeedableRng, rngs::StdRng};

use super::{
    activations::ActFn,
    layers::{ForwardCache, Layer, Role},
    loss::{LossFn, Mse},
};
use crate::{
    MlErr, Result,
    dataset::Tensor,
    training::{SaturationMonitor, Trainer, TrainingConfig, check_learning_rate},
};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// The structural lifecycle of a `Network`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No layers yet.
    Unconfigured,
    /// Layers can still be appended.
    Configuring,
    /// The network has been used, only its parameters can change from now on.
    Frozen,
}

/// The per-layer caches of one forward pass through a `Network`.
///
/// A trace is tied to the parameters it was computed with: once any update is applied, older
/// traces are rejected by `Network::backward`.
#[derive(Debug, Clone)]
pub struct Trace {
    network: u64,
    version: u64,
    caches: Vec<ForwardCache>,
}

impl Trace {
    /// The network's prediction.
    pub fn output(&self) -> ArrayView1<'_, f64> {
        // SAFETY: a trace is only built by a forward pass over a non empty layer stack.
        self.caches.last().map(ForwardCache::output).unwrap()
    }

    pub fn caches(&self) -> &[ForwardCache] {
        &self.caches
    }

    pub fn into_output(mut self) -> Array1<f64> {
        // SAFETY: a trace is only built by a forward pass over a non empty layer stack.
        self.caches.pop().map(ForwardCache::into_output).unwrap()
    }
}

/// A feedforward network: information flows forward through its layers when computing an output
/// and backward when computing their gradients.
#[derive(Debug)]
pub struct Network {
    id: u64,
    input_width: usize,
    layers: Vec<Layer>,
    state: State,
    version: u64,
    rng: StdRng,
    monitor: SaturationMonitor,
}

impl Network {
    /// Creates a new empty `Network` whose layers will be initialized from OS entropy.
    ///
    /// # Arguments
    /// * `input_width` - The size of the samples the network will be fed with.
    ///
    /// # Errors
    /// `MlErr::Config` if `input_width` is zero or doesn't fit in 32 bits.
    pub fn new(input_width: usize) -> Result<Self> {
        Self::with_rng(input_width, StdRng::from_os_rng())
    }

    /// Same as `new`, but layer initialization is reproducible.
    pub fn with_seed(input_width: usize, seed: u64) -> Result<Self> {
        Self::with_rng(input_width, StdRng::seed_from_u64(seed))
    }

    fn with_rng(input_width: usize, rng: StdRng) -> Result<Self> {
        check_width("input width", input_width)?;

        Ok(Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            input_width,
            layers: Vec::new(),
            state: State::Unconfigured,
            version: 0,
            rng,
            monitor: SaturationMonitor::default(),
        })
    }

    /// Rebuilds a network from already initialized layers. An empty stack gives an unconfigured
    /// network.
    ///
    /// # Errors
    /// `MlErr::Config` if adjacent layers don't chain.
    pub(crate) fn from_layers(input_width: usize, layers: Vec<Layer>) -> Result<Self> {
        let mut network = Self::new(input_width)?;
        if layers.is_empty() {
            return Ok(network);
        }

        let mut width = input_width;
        for (i, layer) in layers.iter().enumerate() {
            if layer.in_dim() != width {
                return Err(MlErr::config(format!(
                    "layer {i}: input size ({}) does not match previous output size ({width})",
                    layer.in_dim()
                )));
            }
            width = layer.out_dim();
        }

        network.layers = layers;
        network.state = State::Configuring;
        Ok(network)
    }

    /// Appends a new randomly initialized layer fed by the current last layer.
    ///
    /// # Arguments
    /// * `out_dim` - The amount of units of the new layer.
    /// * `act_fn` - Its activation function.
    /// * `role` - Whether it's a hidden or the output layer.
    ///
    /// # Errors
    /// `MlErr::Config` if the network has already been used or `out_dim` is invalid.
    pub fn add_layer(&mut self, out_dim: usize, act_fn: ActFn, role: Role) -> Result<&mut Self> {
        if self.state == State::Frozen {
            return Err(MlErr::config(
                "cannot add layers once the network has been used",
            ));
        }
        check_width("layer output width", out_dim)?;

        let in_dim = self.output_width();
        let layer = Layer::new((in_dim, out_dim), act_fn, role, &mut self.rng)?;
        debug!(
            "added layer {}: {in_dim} -> {out_dim}, {act_fn:?}, {role:?}",
            self.layers.len()
        );

        self.layers.push(layer);
        self.state = State::Configuring;
        Ok(self)
    }

    pub fn input_width(&self) -> usize {
        self.input_width
    }

    /// The size of the network's predictions, or its input width while it has no layers.
    pub fn output_width(&self) -> usize {
        self.layers.last().map_or(self.input_width, Layer::out_dim)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_frozen(&self) -> bool {
        self.state == State::Frozen
    }

    /// Makes a forward pass through the network, freezing its topology.
    ///
    /// # Arguments
    /// * `inputs` - A vector of `input_width` values.
    ///
    /// # Returns
    /// The trace of the pass, needed by `backward`.
    ///
    /// # Errors
    /// `MlErr::Config` if the network has no layers, `MlErr::ShapeMismatch` on a wrong input width.
    pub fn forward(&mut self, inputs: ArrayView1<f64>) -> Result<Trace> {
        self.freeze()?;
        MlErr::check_len("network inputs", inputs.len(), self.input_width)?;

        let mut caches: Vec<ForwardCache> = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let cache = match caches.last() {
                Some(prev) => layer.forward(prev.output())?,
                None => layer.forward(inputs)?,
            };
            caches.push(cache);
        }

        Ok(Trace {
            network: self.id,
            version: self.version,
            caches,
        })
    }

    /// Backpropagates the error of a forward pass and updates every layer on the way.
    ///
    /// Each layer's gradients are applied right after they are computed, the error handed to the
    /// previous layer is computed with the weights as they were during the forward pass.
    ///
    /// # Arguments
    /// * `trace` - The trace returned by the latest `forward`.
    /// * `labels` - The expected output.
    /// * `learning_rate` - The length of the descent step.
    ///
    /// # Errors
    /// `MlErr::State` if the trace is stale or belongs to another network, `MlErr::ShapeMismatch`
    /// on a wrong label width and `MlErr::Config` on an invalid learning rate.
    pub fn backward(
        &mut self,
        trace: Trace,
        labels: ArrayView1<f64>,
        learning_rate: f64,
    ) -> Result<()> {
        check_learning_rate(learning_rate)?;

        if trace.network != self.id || trace.caches.len() != self.layers.len() {
            return Err(MlErr::State("the trace was not produced by this network"));
        }
        if trace.version != self.version {
            return Err(MlErr::State(
                "the trace was computed before the latest parameter update",
            ));
        }
        MlErr::check_len("labels", labels.len(), self.output_width())?;

        self.version += 1;

        let mut d = Mse.loss_prime(trace.output(), labels);
        let layers = self.layers.iter_mut().zip(&trace.caches);

        for (i, (layer, cache)) in layers.enumerate().rev() {
            let grads = layer.backward(cache, d.view())?;
            layer.apply_gradients(&grads, learning_rate)?;
            self.monitor.observe(i, learning_rate * grads.max_abs());
            d = grads.into_input();
        }

        Ok(())
    }

    /// Computes the network's prediction for a sample. Only the inputs' width is checked.
    ///
    /// # Errors
    /// The same as `forward`.
    pub fn activate(&mut self, sample: &Tensor) -> Result<Array1<f64>> {
        Ok(self.forward(sample.inputs())?.into_output())
    }

    /// Runs one stochastic gradient descent step over a single sample.
    ///
    /// # Returns
    /// The sample's loss measured before the update.
    ///
    /// # Errors
    /// `MlErr::ShapeMismatch` if the sample doesn't fit the network.
    pub fn backpropagate(&mut self, sample: &Tensor, learning_rate: f64) -> Result<f64> {
        check_learning_rate(learning_rate)?;
        self.freeze()?;
        sample.check_shape(self.input_width, self.output_width())?;

        let trace = self.forward(sample.inputs())?;
        let loss = Mse.loss(trace.output(), sample.labels());
        self.backward(trace, sample.labels(), learning_rate)?;
        Ok(loss)
    }

    /// Trains the network over `samples` as dictated by `config`.
    ///
    /// # Returns
    /// The mean loss of every epoch.
    pub fn train(&mut self, samples: &[Tensor], config: &TrainingConfig) -> Result<Vec<f64>> {
        Trainer::new(config.clone())?.train(self, samples)
    }

    /// Computes the mean over `samples` of each sample's mean squared error.
    ///
    /// # Errors
    /// `MlErr::ShapeMismatch` if any sample doesn't fit the network.
    pub fn evaluate(&mut self, samples: &[Tensor]) -> Result<f64> {
        self.freeze()?;
        self.check_samples(samples)?;

        if samples.is_empty() {
            return Ok(0.);
        }

        let mut total = 0.;
        for sample in samples {
            let trace = self.forward(sample.inputs())?;
            total += Mse.loss(trace.output(), sample.labels());
        }

        Ok(total / samples.len() as f64)
    }

    pub(crate) fn check_samples(&self, samples: &[Tensor]) -> Result<()> {
        let output_width = self.output_width();
        samples
            .iter()
            .try_for_each(|s| s.check_shape(self.input_width, output_width))
    }

    pub(crate) fn freeze(&mut self) -> Result<()> {
        match self.state {
            State::Frozen => Ok(()),
            State::Unconfigured => Err(MlErr::config("the network has no layers")),
            State::Configuring => {
                info!(
                    "freezing topology: {} layer(s), {} -> {}",
                    self.layers.len(),
                    self.input_width,
                    self.output_width()
                );
                self.state = State::Frozen;
                Ok(())
            }
        }
    }
}

impl Clone for Network {
    /// Clones get their own identity, traces of one are rejected by the other.
    fn clone(&self) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            input_width: self.input_width,
            layers: self.layers.clone(),
            state: self.state,
            version: self.version,
            rng: self.rng.clone(),
            monitor: self.monitor.clone(),
        }
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "network {} -> {}, {} layer(s), {:?}",
            self.input_width,
            self.output_width(),
            self.layers.len(),
            self.state
        )?;

        for (i, layer) in self.layers.iter().enumerate() {
            write!(f, "\nlayer {i}: {layer}")?;
        }

        Ok(())
    }
}

fn check_width(what: &str, width: usize) -> Result<()> {
    if width == 0 {
        return Err(MlErr::config(format!("{what} must be positive")));
    }
    if u32::try_from(width).is_err() {
        return Err(MlErr::config(format!("{what} ({width}) does not fit in 32 bits")));
    }

    Ok(())
}
