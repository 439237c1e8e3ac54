pub mod arch;
pub mod dataset;
pub mod error;
pub mod persistence;
pub mod training;

pub use arch::{
    Network, State, Trace,
    activations::ActFn,
    layers::{ForwardCache, Gradients, Layer, Role},
    loss::{LossFn, Mse},
};
pub use dataset::Tensor;
pub use error::{MlErr, Result};
pub use training::{Trainer, TrainingConfig};
