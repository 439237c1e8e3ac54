use serde::{Deserialize, Serialize};

const LEAKY_SLOPE: f64 = 0.01;

/// An elementwise activation function together with its derivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActFn {
    Identity,
    Relu,
    Sigmoid,
    Tanh,
    LeakyRelu,
}
use ActFn::*;

impl ActFn {
    /// Every variant, in tag order.
    pub const ALL: [ActFn; 5] = [Identity, Relu, Sigmoid, Tanh, LeakyRelu];

    pub fn f(&self, z: f64) -> f64 {
        match self {
            Identity => z,
            Relu => z.max(0.),
            Sigmoid => 1. / (1. + (-z).exp()),
            Tanh => z.tanh(),
            LeakyRelu => {
                if z > 0. {
                    z
                } else {
                    LEAKY_SLOPE * z
                }
            }
        }
    }

    /// The derivative evaluated at the pre-activation `z`.
    pub fn df(&self, z: f64) -> f64 {
        self.df_cached(z, self.f(z))
    }

    /// The derivative evaluated at the pre-activation `z`, given `a = f(z)` from the forward pass.
    ///
    /// Sigmoid and tanh have closed forms in terms of their output, so they use `a` and skip
    /// recomputing the exponential.
    pub fn df_cached(&self, z: f64, a: f64) -> f64 {
        match self {
            Identity => 1.,
            Relu => {
                if z > 0. {
                    1.
                } else {
                    0.
                }
            }
            Sigmoid => a * (1. - a),
            Tanh => 1. - a * a,
            LeakyRelu => {
                if z > 0. {
                    1.
                } else {
                    LEAKY_SLOPE
                }
            }
        }
    }

    /// The byte this activation is stored as.
    pub fn tag(&self) -> u8 {
        match self {
            Identity => 0,
            Relu => 1,
            Sigmoid => 2,
            Tanh => 3,
            LeakyRelu => 4,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }
}
