use super::Graph;

/// An indexable collection of labelled graphs.
pub trait GraphDataset {
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn get(&self, idx: usize) -> (&Graph, u32);
    fn num_classes(&self) -> usize;
}
