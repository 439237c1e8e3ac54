use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// What a layer saw and produced during one forward pass.
///
/// It is handed back to the caller instead of being kept inside the layer, so a backward pass
/// can only ever use the values of the forward pass it was given.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardCache {
    pub(super) x: Array1<f64>,
    pub(super) z: Array1<f64>,
    pub(super) a: Array1<f64>,
}

impl ForwardCache {
    pub fn input(&self) -> ArrayView1<'_, f64> {
        self.x.view()
    }

    /// The weighted sums `W·x + b`.
    pub fn pre_activation(&self) -> ArrayView1<'_, f64> {
        self.z.view()
    }

    pub fn output(&self) -> ArrayView1<'_, f64> {
        self.a.view()
    }

    pub(crate) fn into_output(self) -> Array1<f64> {
        self.a
    }
}

/// The gradients computed by one layer's backward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    pub(super) d_x: Array1<f64>,
    pub(super) d_w: Array2<f64>,
    pub(super) d_b: Array1<f64>,
}

impl Gradients {
    /// The error signal for the previous layer, `Wᵗ·dZ`.
    pub fn input(&self) -> ArrayView1<'_, f64> {
        self.d_x.view()
    }

    pub fn weights(&self) -> ArrayView2<'_, f64> {
        self.d_w.view()
    }

    pub fn biases(&self) -> ArrayView1<'_, f64> {
        self.d_b.view()
    }

    /// The largest absolute parameter gradient.
    pub fn max_abs(&self) -> f64 {
        self.d_w
            .iter()
            .chain(&self.d_b)
            .fold(0., |acc: f64, g| acc.max(g.abs()))
    }

    pub(crate) fn into_input(self) -> Array1<f64> {
        self.d_x
    }
}
