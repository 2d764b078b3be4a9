use candle_core::{Result, Tensor, Var};

use crate::datasets::GraphBatch;

/// Node-level layer: maps node features to node features along `edge_index`.
pub trait GnnModule {
    fn forward_t(&self, xs: &Tensor, edge_index: &Tensor, train: bool) -> Result<Tensor>;
    fn forward(&self, xs: &Tensor, edge_index: &Tensor) -> Result<Tensor> {
        self.forward_t(xs, edge_index, false)
    }
}

/// Graph-level model: maps a batch of `B` graphs to `(B, num_classes)` logits.
pub trait GraphClassifier {
    fn forward_t(&self, batch: &GraphBatch, train: bool) -> Result<Tensor>;
    fn forward(&self, batch: &GraphBatch) -> Result<Tensor> {
        self.forward_t(batch, false)
    }
    fn num_classes(&self) -> usize;
    fn parameters(&self) -> Vec<Var>;
}
