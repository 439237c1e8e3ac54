//! Binary snapshots of a network's topology and parameters.
//!
//! Layout, big-endian:
//!
//! ```text
//! input width: u32 | layer count: u32 | layer*
//! layer: out_dim: u32 | activation tag: u8 | role tag: u8
//!        | weights: out_dim * in_dim f64, row-major | biases: out_dim f64
//! ```
//!
//! Each layer's `in_dim` is the previous layer's `out_dim`, or the input width for the first one.

mod decode;
mod encode;

use std::{
    fs::{self, File},
    io::{BufWriter, Read, Write},
    path::Path,
};

use log::{debug, info};

use crate::{Result, arch::Network};

type Width = u32;
const WIDTH_SIZE: usize = size_of::<Width>();
const FLOAT_SIZE: usize = size_of::<f64>();
const NETWORK_HEADER_SIZE: usize = 2 * WIDTH_SIZE;
const LAYER_HEADER_SIZE: usize = WIDTH_SIZE + 2;

impl Network {
    /// Serializes this network's topology and parameters.
    pub fn save(&self) -> Vec<u8> {
        let bytes = encode::encode(self);
        debug!(
            "encoded {} layer(s) into {} byte(s)",
            self.layers().len(),
            bytes.len()
        );
        bytes
    }

    /// Rebuilds a network saved with `save`.
    ///
    /// The returned network hasn't been used yet, so it is not frozen. A snapshot without layers
    /// gives back an unconfigured network.
    ///
    /// # Errors
    /// `MlErr::CorruptFormat` on truncated input, unknown tags, empty widths or trailing bytes.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let network = decode::decode(bytes)?;
        debug!(
            "decoded {} layer(s) from {} byte(s)",
            network.layers().len(),
            bytes.len()
        );
        Ok(network)
    }

    /// Writes this network's snapshot to `writer`.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.save())?;
        writer.flush()?;
        Ok(())
    }

    /// Reads `reader` to its end and rebuilds the network it holds.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Self::load(&buf)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))?;
        info!("network saved to {}", path.display());
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let network = Self::load(&fs::read(path)?)?;
        info!("network loaded from {}", path.display());
        Ok(network)
    }
}
