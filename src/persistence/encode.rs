use super::{FLOAT_SIZE, LAYER_HEADER_SIZE, NETWORK_HEADER_SIZE, Width};
use crate::arch::Network;

/// Serializes the network's topology and parameters.
///
/// Every width fits in a `Width` since `Network` refuses wider layers when building them.
pub(super) fn encode(network: &Network) -> Vec<u8> {
    let size = NETWORK_HEADER_SIZE
        + network
            .layers()
            .iter()
            .map(|layer| LAYER_HEADER_SIZE + layer.size() * FLOAT_SIZE)
            .sum::<usize>();

    let mut buf = Vec::with_capacity(size);
    put_width(&mut buf, network.input_width());
    put_width(&mut buf, network.layers().len());

    for layer in network.layers() {
        put_width(&mut buf, layer.out_dim());
        buf.push(layer.act_fn().tag());
        buf.push(layer.role().tag());

        // logical iteration order is row-major whatever the memory layout
        for w in layer.weights() {
            buf.extend_from_slice(&w.to_be_bytes());
        }
        for b in layer.biases() {
            buf.extend_from_slice(&b.to_be_bytes());
        }
    }

    buf
}

fn put_width(buf: &mut Vec<u8>, width: usize) {
    buf.extend_from_slice(&(width as Width).to_be_bytes());
}
