use ndarray::{Array1, Array2};

use super::{FLOAT_SIZE, LAYER_HEADER_SIZE, WIDTH_SIZE, Width};
use crate::{
    MlErr, Result,
    arch::{
        Network,
        activations::ActFn,
        layers::{Layer, Role},
    },
};

/// A forward only reader over an encoded network.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        let left = self.remaining();
        if left < n {
            return Err(MlErr::corrupt(format!(
                "truncated input: {what} needs {n} byte(s) but only {left} are left"
            )));
        }

        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn byte(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    fn width(&mut self, what: &str) -> Result<usize> {
        let mut bytes = [0; WIDTH_SIZE];
        bytes.copy_from_slice(self.take(WIDTH_SIZE, what)?);
        Ok(Width::from_be_bytes(bytes) as usize)
    }

    fn floats(&mut self, n: usize, what: &str) -> Result<Vec<f64>> {
        let size = n
            .checked_mul(FLOAT_SIZE)
            .ok_or_else(|| MlErr::corrupt(format!("{what} size overflows")))?;

        let floats = self
            .take(size, what)?
            .chunks_exact(FLOAT_SIZE)
            .map(|chunk| {
                let mut bytes = [0; FLOAT_SIZE];
                bytes.copy_from_slice(chunk);
                f64::from_be_bytes(bytes)
            })
            .collect();

        Ok(floats)
    }
}

/// Rebuilds a network from the bytes produced by `encode`.
pub(super) fn decode(bytes: &[u8]) -> Result<Network> {
    let mut cursor = Cursor::new(bytes);

    let input_width = cursor.width("input width")?;
    if input_width == 0 {
        return Err(MlErr::corrupt("input width is zero"));
    }

    let nlayers = cursor.width("layer count")?;

    let mut layers = Vec::with_capacity(nlayers.min(cursor.remaining() / LAYER_HEADER_SIZE));
    let mut in_dim = input_width;

    for i in 0..nlayers {
        let out_dim = cursor.width("layer output width")?;
        if out_dim == 0 {
            return Err(MlErr::corrupt(format!("layer {i} has no units")));
        }

        let tag = cursor.byte("activation tag")?;
        let act_fn = ActFn::from_tag(tag)
            .ok_or_else(|| MlErr::corrupt(format!("layer {i}: unknown activation tag {tag}")))?;

        let tag = cursor.byte("role tag")?;
        let role = Role::from_tag(tag)
            .ok_or_else(|| MlErr::corrupt(format!("layer {i}: unknown role tag {tag}")))?;

        let nweights = out_dim
            .checked_mul(in_dim)
            .ok_or_else(|| MlErr::corrupt(format!("layer {i}: weight count overflows")))?;
        let weights = cursor.floats(nweights, "weights")?;
        let biases = cursor.floats(out_dim, "biases")?;

        let weights = Array2::from_shape_vec((out_dim, in_dim), weights)
            .map_err(|e| MlErr::corrupt(format!("layer {i}: {e}")))?;
        let layer = Layer::from_params(weights, Array1::from(biases), act_fn, role)
            .map_err(|e| MlErr::corrupt(format!("layer {i}: {e}")))?;

        layers.push(layer);
        in_dim = out_dim;
    }

    if cursor.remaining() != 0 {
        return Err(MlErr::corrupt(format!(
            "{} trailing byte(s) after the last layer",
            cursor.remaining()
        )));
    }

    Network::from_layers(input_width, layers).map_err(|e| MlErr::corrupt(e.to_string()))
}
