use anyhow::{ensure, Result};
use candle_core::Device;
use candle_nn::{loss, AdamW, Optimizer, ParamsAdamW};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{rngs::StdRng, SeedableRng};

use crate::datasets::{GraphDataset, MiniBatchLoader};
use crate::models::GraphClassifier;
use crate::utils::count_correct;

#[derive(Clone, Debug, PartialEq)]
pub struct TrainParams {
    /// The loop runs `epochs + 1` times, epochs `0..=epochs`.
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub report_every: usize,
    /// Seeds the per-epoch shuffling of both splits.
    pub seed: u64,
    pub show_progress: bool,
}
impl Default for TrainParams {
    fn default() -> Self {
        Self {
            epochs: 100,
            batch_size: 16,
            learning_rate: 1e-3,
            report_every: 5,
            seed: 0,
            show_progress: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EpochReport {
    pub epoch: usize,
    /// Loss of the last training batch of the epoch, not an epoch mean.
    pub loss: f32,
    pub num_correct: usize,
    pub num_tests: usize,
}
impl EpochReport {
    /// Test accuracy in percent.
    pub fn test_accuracy(&self) -> f64 {
        self.num_correct as f64 / self.num_tests as f64 * 100.0
    }
}
impl std::fmt::Display for EpochReport {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "In epoch {}, training loss: {:.4}, test accuracy: {:?}%",
            self.epoch,
            self.loss,
            self.test_accuracy()
        )
    }
}

pub struct Trainer<'a> {
    params: TrainParams,
    device: &'a Device,
    rng: StdRng,
}
impl<'a> Trainer<'a> {
    pub fn new(params: TrainParams, device: &'a Device) -> Self {
        let rng = StdRng::seed_from_u64(params.seed);
        Self {
            params,
            device,
            rng,
        }
    }
    pub fn params(&self) -> &TrainParams {
        &self.params
    }
    pub fn optimizer<M: GraphClassifier>(&self, model: &M) -> Result<AdamW> {
        let optimizer = AdamW::new(
            model.parameters(),
            ParamsAdamW {
                lr: self.params.learning_rate,
                weight_decay: 0.0,
                ..Default::default()
            },
        )?;
        Ok(optimizer)
    }

    /// One pass over `dataset` in shuffled mini batches; returns the last batch's loss.
    pub fn train_epoch<M, T>(&mut self, model: &M, optimizer: &mut AdamW, dataset: &T) -> Result<f32>
    where
        M: GraphClassifier,
        T: GraphDataset,
    {
        ensure!(!dataset.is_empty(), "training split is empty");
        ensure!(self.params.batch_size > 0, "batch_size must be positive");
        let loader =
            MiniBatchLoader::new(dataset, self.params.batch_size, self.device).shuffle(&mut self.rng);
        let mut last_loss = 0.0;
        for batch in loader {
            let batch = batch?;
            let logits = model.forward_t(&batch, true)?;
            let loss = loss::cross_entropy(&logits, &batch.labels)?;
            optimizer.backward_step(&loss)?;
            last_loss = loss.to_scalar::<f32>()?;
        }
        Ok(last_loss)
    }

    /// Returns `(num_correct, num_tests)` over `dataset`.
    pub fn evaluate<M, T>(&mut self, model: &M, dataset: &T) -> Result<(usize, usize)>
    where
        M: GraphClassifier,
        T: GraphDataset,
    {
        ensure!(!dataset.is_empty(), "test split is empty");
        ensure!(self.params.batch_size > 0, "batch_size must be positive");
        let loader =
            MiniBatchLoader::new(dataset, self.params.batch_size, self.device).shuffle(&mut self.rng);
        let mut num_correct = 0;
        let mut num_tests = 0;
        for batch in loader {
            let batch = batch?;
            let logits = model.forward_t(&batch, false)?.detach();
            num_correct += count_correct(&logits, &batch.labels)?;
            num_tests += batch.num_graphs();
        }
        Ok((num_correct, num_tests))
    }

    /// Cross entropy averaged over every graph of `dataset`, in dataset order
    /// and without updating the model.
    pub fn mean_loss<M, T>(&self, model: &M, dataset: &T) -> Result<f32>
    where
        M: GraphClassifier,
        T: GraphDataset,
    {
        ensure!(!dataset.is_empty(), "dataset is empty");
        ensure!(self.params.batch_size > 0, "batch_size must be positive");
        let mut total = 0.0;
        for batch in MiniBatchLoader::new(dataset, self.params.batch_size, self.device) {
            let batch = batch?;
            let logits = model.forward_t(&batch, false)?.detach();
            let loss = loss::cross_entropy(&logits, &batch.labels)?.to_scalar::<f32>()?;
            total += loss * batch.num_graphs() as f32;
        }
        Ok(total / dataset.len() as f32)
    }

    /// Trains for `epochs + 1` epochs, evaluating after each one and handing
    /// every `report_every`-th epoch to `on_report`.
    pub fn fit<M, T, F>(
        &mut self,
        model: &M,
        train_set: &T,
        test_set: &T,
        mut on_report: F,
    ) -> Result<Vec<EpochReport>>
    where
        M: GraphClassifier,
        T: GraphDataset,
        F: FnMut(&EpochReport),
    {
        ensure!(self.params.report_every > 0, "report_every must be positive");
        ensure!(self.params.batch_size > 0, "batch_size must be positive");
        let mut optimizer = self.optimizer(model)?;

        let pbar = if self.params.show_progress {
            let pbar = ProgressBar::new(self.params.epochs as u64 + 1);
            pbar.set_style(
                ProgressStyle::default_bar()
                    .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} epochs ({eta})")?
                    .progress_chars("#>-"),
            );
            pbar.set_message(format!(
                "Training on {} graphs, testing on {}",
                train_set.len(),
                test_set.len()
            ));
            pbar
        } else {
            ProgressBar::hidden()
        };

        let mut reports = Vec::new();
        for epoch in 0..=self.params.epochs {
            let loss = self.train_epoch(model, &mut optimizer, train_set)?;
            let (num_correct, num_tests) = self.evaluate(model, test_set)?;
            log::debug!(
                "epoch={} loss={:.6} correct={}/{}",
                epoch,
                loss,
                num_correct,
                num_tests
            );
            pbar.inc(1);

            if epoch % self.params.report_every == 0 {
                let report = EpochReport {
                    epoch,
                    loss,
                    num_correct,
                    num_tests,
                };
                log::info!("{}", report);
                pbar.suspend(|| on_report(&report));
                reports.push(report);
            }
        }
        pbar.finish_and_clear();
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::{MiniGcDataset, MiniGcParams};
    use crate::models::{GcnClassifier, GcnVariant};

    #[test]
    fn report_line_format() {
        let report = EpochReport {
            epoch: 5,
            loss: 1.234567,
            num_correct: 3,
            num_tests: 8,
        };
        assert_eq!(
            report.to_string(),
            "In epoch 5, training loss: 1.2346, test accuracy: 37.5%"
        );
    }

    #[test]
    fn integral_accuracy_keeps_decimal_point() {
        let report = EpochReport {
            epoch: 0,
            loss: 2.0,
            num_correct: 4,
            num_tests: 8,
        };
        assert_eq!(
            report.to_string(),
            "In epoch 0, training loss: 2.0000, test accuracy: 50.0%"
        );
    }

    #[test]
    fn zero_batch_size_is_an_error() -> Result<()> {
        let device = Device::Cpu;
        let dataset = MiniGcDataset::new(MiniGcParams::new(8, 8, 12, 0))?;
        let model = GcnClassifier::from_variant(GcnVariant::Shallow, 4, 8, &device)?;
        let params = TrainParams {
            batch_size: 0,
            ..Default::default()
        };
        let mut trainer = Trainer::new(params, &device);
        assert!(trainer.fit(&model, &dataset, &dataset, |_| {}).is_err());
        assert!(trainer.mean_loss(&model, &dataset).is_err());
        assert!(trainer.evaluate(&model, &dataset).is_err());
        Ok(())
    }

    #[test]
    fn reports_every_few_epochs() -> Result<()> {
        let device = Device::Cpu;
        let train_set = MiniGcDataset::new(MiniGcParams::new(24, 8, 12, 0))?;
        let test_set = MiniGcDataset::new(MiniGcParams::new(9, 16, 24, 0))?;
        let model = GcnClassifier::from_variant(GcnVariant::Shallow, 8, train_set.num_classes(), &device)?;

        let params = TrainParams {
            epochs: 4,
            batch_size: 8,
            report_every: 2,
            ..Default::default()
        };
        let mut printed = Vec::new();
        let reports = Trainer::new(params, &device).fit(&model, &train_set, &test_set, |r| {
            printed.push(r.epoch)
        })?;

        assert_eq!(printed, vec![0, 2, 4]);
        assert_eq!(reports.len(), 3);
        for report in &reports {
            assert_eq!(report.num_tests, 9);
            assert!(report.loss.is_finite());
            assert!((0.0..=100.0).contains(&report.test_accuracy()));
        }
        Ok(())
    }

    #[test]
    fn empty_splits_fail_fast() -> Result<()> {
        let device = Device::Cpu;
        let train_set = MiniGcDataset::new(MiniGcParams::new(8, 8, 12, 0))?;
        let empty = MiniGcDataset::new(MiniGcParams::new(0, 8, 12, 0))?;
        let model = GcnClassifier::from_variant(GcnVariant::Shallow, 4, 8, &device)?;

        let mut trainer = Trainer::new(TrainParams::default(), &device);
        assert!(trainer.evaluate(&model, &empty).is_err());
        let mut optimizer = trainer.optimizer(&model)?;
        assert!(trainer.train_epoch(&model, &mut optimizer, &empty).is_err());
        assert!(trainer.train_epoch(&model, &mut optimizer, &train_set).is_ok());
        Ok(())
    }
}
