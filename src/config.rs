use anyhow::{ensure, Result};

use crate::datasets::MiniGcParams;
use crate::models::GcnVariant;
use crate::train::TrainParams;

/// Everything the MiniGC experiment needs, with the defaults of the reference run.
///
/// The test split draws graphs twice as large as the training split, so the
/// reported accuracy measures generalisation to unseen sizes.
#[derive(Clone, Debug, PartialEq)]
pub struct ExperimentConfig {
    pub num_examples: usize,
    pub min_num_nodes: usize,
    pub max_num_nodes: usize,
    pub train_fraction: f64,
    pub hidden_dim: usize,
    pub variant: GcnVariant,
    pub seed: u64,
    pub train: TrainParams,
}
impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            num_examples: 2000,
            min_num_nodes: 32,
            max_num_nodes: 64,
            train_fraction: 0.8,
            hidden_dim: 256,
            variant: GcnVariant::Shallow,
            seed: 0,
            train: TrainParams::default(),
        }
    }
}
impl ExperimentConfig {
    pub fn num_train_examples(&self) -> usize {
        (self.num_examples as f64 * self.train_fraction) as usize
    }
    pub fn num_test_examples(&self) -> usize {
        self.num_examples - self.num_train_examples()
    }
    pub fn train_params(&self) -> MiniGcParams {
        MiniGcParams::new(
            self.num_train_examples(),
            self.min_num_nodes,
            self.max_num_nodes,
            self.seed,
        )
    }
    pub fn test_params(&self) -> MiniGcParams {
        MiniGcParams::new(
            self.num_test_examples(),
            self.min_num_nodes * 2,
            self.max_num_nodes * 2,
            self.seed,
        )
    }
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.train_fraction),
            "train_fraction must lie in [0, 1], got {}",
            self.train_fraction
        );
        ensure!(self.train.batch_size > 0, "batch_size must be positive");
        self.train_params().validate()?;
        self.test_params().validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_split() -> Result<()> {
        let config = ExperimentConfig::default();
        config.validate()?;
        assert_eq!(config.num_train_examples(), 1600);
        assert_eq!(config.num_test_examples(), 400);

        let train = config.train_params();
        assert_eq!((train.min_num_nodes, train.max_num_nodes), (32, 64));
        let test = config.test_params();
        assert_eq!((test.min_num_nodes, test.max_num_nodes), (64, 128));
        assert_eq!(train.num_graphs + test.num_graphs, config.num_examples);
        Ok(())
    }

    #[test]
    fn rejects_bad_fraction() {
        let config = ExperimentConfig {
            train_fraction: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
