mod config;
mod saturation;
mod trainer;

pub use config::TrainingConfig;
pub(crate) use config::check_learning_rate;
pub(crate) use saturation::SaturationMonitor;
pub use trainer::Trainer;
