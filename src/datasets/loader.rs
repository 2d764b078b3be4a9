use candle_core::{Device, Result};
use rand::{seq::SliceRandom, Rng};

use super::{collate, GraphBatch, GraphDataset};

/// Iterates over a dataset in mini batches of `batch_size` graphs.
/// The last batch is kept even when it is smaller.
pub struct MiniBatchLoader<'a, T> {
    dataset: &'a T,
    device: &'a Device,
    batch_size: usize,
    order: Vec<usize>,
    position: usize,
}
impl<'a, T: GraphDataset> MiniBatchLoader<'a, T> {
    pub fn new(dataset: &'a T, batch_size: usize, device: &'a Device) -> Self {
        assert!(batch_size > 0);
        Self {
            dataset,
            device,
            batch_size,
            order: (0..dataset.len()).collect(),
            position: 0,
        }
    }
    /// Permutes the visiting order with the given generator.
    pub fn shuffle<R: Rng + ?Sized>(mut self, rng: &mut R) -> Self {
        self.order.shuffle(rng);
        self
    }
    pub fn order(&self) -> &[usize] {
        &self.order
    }
    pub fn num_batches(&self) -> usize {
        self.order.len().div_ceil(self.batch_size)
    }
}

impl<'a, T: GraphDataset> Iterator for MiniBatchLoader<'a, T> {
    type Item = Result<GraphBatch>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.order.len() {
            return None;
        }
        let end = (self.position + self.batch_size).min(self.order.len());
        let samples: Vec<_> = self.order[self.position..end]
            .iter()
            .map(|&idx| self.dataset.get(idx))
            .collect();
        self.position = end;
        Some(collate(&samples, self.device))
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::datasets::{MiniGcDataset, MiniGcParams};

    #[test]
    fn batches_cover_dataset_once() -> anyhow::Result<()> {
        let dataset = MiniGcDataset::new(MiniGcParams::new(37, 8, 16, 0))?;
        let device = Device::Cpu;
        let loader =
            MiniBatchLoader::new(&dataset, 16, &device).shuffle(&mut StdRng::seed_from_u64(1));
        assert_eq!(loader.num_batches(), 3);

        let mut seen = loader.order().to_vec();
        seen.sort_unstable();
        assert_eq!(seen, (0..37).collect::<Vec<_>>());

        let sizes = loader
            .map(|batch| batch.map(|b| b.num_graphs()))
            .collect::<Result<Vec<_>>>()?;
        assert_eq!(sizes, vec![16, 16, 5]);
        Ok(())
    }

    #[test]
    fn shuffle_is_reproducible() -> anyhow::Result<()> {
        let dataset = MiniGcDataset::new(MiniGcParams::new(40, 8, 16, 0))?;
        let device = Device::Cpu;
        let order = |seed| {
            MiniBatchLoader::new(&dataset, 8, &device)
                .shuffle(&mut StdRng::seed_from_u64(seed))
                .order()
                .to_vec()
        };
        assert_eq!(order(3), order(3));
        assert_ne!(order(3), order(4));
        Ok(())
    }
}
