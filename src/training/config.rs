use serde::{Deserialize, Serialize};

use crate::{MlErr, Result};

/// How a `Trainer` runs. Supplied per training call, never persisted along with the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    /// Reshuffle the samples every epoch from a generator seeded with this value. Samples are
    /// visited in insertion order when unset.
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
}

impl TrainingConfig {
    /// Creates a new `TrainingConfig` that visits samples in insertion order.
    ///
    /// # Arguments
    /// * `epochs` - The amount of full passes over the samples.
    /// * `learning_rate` - The length of each descent step.
    pub fn new(epochs: usize, learning_rate: f64) -> Self {
        Self {
            epochs,
            learning_rate,
            shuffle_seed: None,
        }
    }

    pub fn with_shuffle(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    /// # Errors
    /// `MlErr::Config` if there are no epochs or the learning rate isn't a positive number.
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(MlErr::config("epochs must be greater than 0"));
        }

        check_learning_rate(self.learning_rate)
    }
}

pub(crate) fn check_learning_rate(learning_rate: f64) -> Result<()> {
    if !(learning_rate.is_finite() && learning_rate > 0.) {
        return Err(MlErr::config(format!(
            "learning rate must be a positive number, got {learning_rate}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation() {
        assert!(TrainingConfig::new(200, 0.1).validate().is_ok());
        assert!(TrainingConfig::new(0, 0.1).validate().is_err());
        assert!(TrainingConfig::new(1, 0.).validate().is_err());
        assert!(TrainingConfig::new(1, -1.).validate().is_err());
        assert!(TrainingConfig::new(1, f64::NAN).validate().is_err());
    }

    #[test]
    fn deserializes_without_a_seed() {
        let config: TrainingConfig =
            serde_json::from_str(r#"{ "epochs": 200, "learning_rate": 0.1 }"#).unwrap();
        assert_eq!(config, TrainingConfig::new(200, 0.1));

        let config: TrainingConfig =
            serde_json::from_str(r#"{ "epochs": 5, "learning_rate": 1.0, "shuffle_seed": 7 }"#)
                .unwrap();
        assert_eq!(config, TrainingConfig::new(5, 1.).with_shuffle(7));
    }
}
