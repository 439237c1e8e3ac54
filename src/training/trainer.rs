use log::{debug, info};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use super::TrainingConfig;
use crate::{Result, arch::Network, dataset::Tensor};

/// Drives repeated forward, backward and update cycles over a set of samples.
///
/// The learning rate is applied per sample: every sample updates the network as soon as its
/// gradients are known, nothing is accumulated across a batch or an epoch.
#[derive(Debug)]
pub struct Trainer {
    config: TrainingConfig,
    rng: Option<StdRng>,
}

impl Trainer {
    /// Creates a new `Trainer`.
    ///
    /// # Errors
    /// `MlErr::Config` if the configuration is invalid.
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        let rng = config.shuffle_seed.map(StdRng::seed_from_u64);

        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Performs the configured amount of epochs over `samples`.
    ///
    /// Every sample is checked against the network before the first update, so a sample of the
    /// wrong shape aborts the whole call and leaves the parameters untouched.
    ///
    /// # Returns
    /// The loss of each epoch. Since the actual loss would require forwarding every sample again
    /// at the end of the epoch, it is approximated by the mean of the losses measured right before
    /// each sample's update.
    ///
    /// # Errors
    /// `MlErr::ShapeMismatch` if any sample doesn't fit the network, `MlErr::Config` if the
    /// network has no layers.
    pub fn train(&mut self, network: &mut Network, samples: &[Tensor]) -> Result<Vec<f64>> {
        network.freeze()?;
        network.check_samples(samples)?;

        let TrainingConfig {
            epochs,
            learning_rate,
            ..
        } = self.config;

        info!(
            "training on {} sample(s) for {epochs} epoch(s), learning rate {learning_rate}",
            samples.len()
        );

        let mut order: Vec<usize> = (0..samples.len()).collect();
        let mut losses = Vec::with_capacity(epochs);

        for epoch in 1..=epochs {
            if let Some(rng) = &mut self.rng {
                order.shuffle(rng);
            }

            let mut total = 0.;
            for &i in &order {
                total += network.backpropagate(&samples[i], learning_rate)?;
            }

            let loss = if samples.is_empty() {
                0.
            } else {
                total / samples.len() as f64
            };

            debug!("epoch {epoch}/{epochs}: loss {loss}");
            losses.push(loss);
        }

        info!(
            "training finished, last epoch loss {}",
            losses.last().copied().unwrap_or_default()
        );

        Ok(losses)
    }
}
