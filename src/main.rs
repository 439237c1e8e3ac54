use std::{env, fs, path::PathBuf};

use anyhow::{Context, Result};
use log::info;
use rand::{Rng, SeedableRng, rngs::StdRng};
use synaption::{ActFn, Network, Role, Tensor, TrainingConfig};

const DEFAULT_MODEL_PATH: &str = "model.bin";
const DEFAULT_EPOCHS: usize = 200;
const DEFAULT_LEARNING_RATE: f64 = 0.1;
const SAMPLES: usize = 20;
const SAMPLES_SEED: u64 = 7;

fn main() -> Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let config = match args.next() {
        Some(path) => read_config(&path)?,
        None => TrainingConfig::new(DEFAULT_EPOCHS, DEFAULT_LEARNING_RATE),
    };
    let model_path = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string()));

    let mut network = Network::new(3)?;
    network
        .add_layer(3, ActFn::Relu, Role::Hidden)?
        .add_layer(3, ActFn::Relu, Role::Hidden)?
        .add_layer(2, ActFn::Sigmoid, Role::Output)?;

    let samples = samples(SAMPLES, SAMPLES_SEED);
    info!("loss before training: {}", network.evaluate(&samples)?);
    info!("{network}");

    network
        .train(&samples, &config)
        .context("failed to train the network")?;
    info!("loss after training: {}", network.evaluate(&samples)?);
    info!("{network}");

    network
        .save_to_file(&model_path)
        .with_context(|| format!("failed to save the model to {}", model_path.display()))?;

    Ok(())
}

fn read_config(path: &str) -> Result<TrainingConfig> {
    let raw = fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    let config = serde_json::from_str(&raw).with_context(|| format!("invalid config in {path}"))?;
    Ok(config)
}

/// Points of the `[-1, 1)` cube labeled by the sign of their first coordinate and of the sum of
/// the other two.
fn samples(n: usize, seed: u64) -> Vec<Tensor> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..n)
        .map(|_| {
            let x: [f64; 3] = [
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            ];
            let y = [
                f64::from(u8::from(x[0] > 0.)),
                f64::from(u8::from(x[1] + x[2] > 0.)),
            ];
            Tensor::new(x.to_vec(), y.to_vec())
        })
        .collect()
}
