use ndarray::{Array1, ArrayView1};

use crate::{MlErr, Result};

/// A single training sample: one input vector and the labels expected for it.
///
/// This is not a general multi-dimensional array, only the fixed-width pair a network is fed with.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    inputs: Array1<f64>,
    labels: Array1<f64>,
}

impl Tensor {
    /// Creates a new `Tensor`.
    ///
    /// # Arguments
    /// * `inputs` - The values fed into the network's first layer.
    /// * `labels` - The values the network's last layer is expected to produce.
    ///
    /// # Returns
    /// A new `Tensor` instance.
    pub fn new<I, L>(inputs: I, labels: L) -> Self
    where
        I: Into<Array1<f64>>,
        L: Into<Array1<f64>>,
    {
        Self {
            inputs: inputs.into(),
            labels: labels.into(),
        }
    }

    pub fn inputs(&self) -> ArrayView1<'_, f64> {
        self.inputs.view()
    }

    pub fn labels(&self) -> ArrayView1<'_, f64> {
        self.labels.view()
    }

    pub fn input_len(&self) -> usize {
        self.inputs.len()
    }

    pub fn label_len(&self) -> usize {
        self.labels.len()
    }

    /// Checks this sample against a network's input and output widths.
    ///
    /// # Errors
    /// `MlErr::ShapeMismatch` naming the side that disagrees.
    pub(crate) fn check_shape(&self, input_width: usize, output_width: usize) -> Result<()> {
        MlErr::check_len("sample inputs", self.input_len(), input_width)?;
        MlErr::check_len("sample labels", self.label_len(), output_width)
    }
}
