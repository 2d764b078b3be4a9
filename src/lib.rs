pub mod config;
pub mod datasets;
pub mod models;
pub mod train;
pub mod utils;

pub use config::ExperimentConfig;
pub use train::{EpochReport, TrainParams, Trainer};
