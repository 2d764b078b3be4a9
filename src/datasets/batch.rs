use candle_core::{bail, Device, Result, Tensor};

use super::Graph;

/// Disjoint union of several graphs, ready for a forward pass.
#[derive(Debug, Clone)]
pub struct GraphBatch {
    /// `(2, num_edges)`: row 0 holds sources, row 1 targets, ids offset into the union.
    pub edge_index: Tensor,
    /// `(num_nodes,)`: index of the graph each node belongs to.
    pub node_graph: Tensor,
    pub labels: Tensor,
    graph_num_nodes: Vec<usize>,
    graph_num_edges: Vec<usize>,
}
impl GraphBatch {
    pub fn num_graphs(&self) -> usize {
        self.graph_num_nodes.len()
    }
    pub fn num_nodes(&self) -> usize {
        self.graph_num_nodes.iter().sum()
    }
    pub fn num_edges(&self) -> usize {
        self.graph_num_edges.iter().sum()
    }
    pub fn graph_num_nodes(&self) -> &[usize] {
        &self.graph_num_nodes
    }
    pub fn graph_num_edges(&self) -> &[usize] {
        &self.graph_num_edges
    }

    /// Splits the batch back into its graphs, undoing the node id offsets.
    pub fn unbatch(&self) -> Result<Vec<Graph>> {
        let edge_index = self.edge_index.to_vec2::<u32>()?;
        let (src, dst) = (&edge_index[0], &edge_index[1]);

        let mut graphs = Vec::with_capacity(self.num_graphs());
        let (mut node_offset, mut edge_offset) = (0, 0);
        for (&n, &e) in self.graph_num_nodes.iter().zip(&self.graph_num_edges) {
            let edges = edge_offset..edge_offset + e;
            let shift = |v: &u32| v - node_offset as u32;
            graphs.push(Graph::new(
                n,
                src[edges.clone()].iter().map(shift).collect(),
                dst[edges].iter().map(shift).collect(),
            ));
            node_offset += n;
            edge_offset += e;
        }
        Ok(graphs)
    }
}

/// Merges `(graph, label)` samples into one [`GraphBatch`], keeping their order.
pub fn collate(samples: &[(&Graph, u32)], device: &Device) -> Result<GraphBatch> {
    if samples.is_empty() {
        bail!("cannot collate an empty list of graphs");
    }
    let num_edges: usize = samples.iter().map(|(g, _)| g.num_edges()).sum();

    let mut src = Vec::with_capacity(num_edges);
    let mut dst = Vec::with_capacity(num_edges);
    let mut node_graph = Vec::new();
    let mut offset = 0u32;
    for (idx, (graph, _)) in samples.iter().enumerate() {
        src.extend(graph.src().iter().map(|u| u + offset));
        dst.extend(graph.dst().iter().map(|v| v + offset));
        node_graph.extend(std::iter::repeat(idx as u32).take(graph.num_nodes()));
        offset += graph.num_nodes() as u32;
    }
    src.extend(dst);

    Ok(GraphBatch {
        edge_index: Tensor::from_vec(src, (2, num_edges), device)?,
        node_graph: Tensor::from_vec(node_graph, offset as usize, device)?,
        labels: Tensor::from_iter(samples.iter().map(|&(_, y)| y), device)?,
        graph_num_nodes: samples.iter().map(|(g, _)| g.num_nodes()).collect(),
        graph_num_edges: samples.iter().map(|(g, _)| g.num_edges()).collect(),
    })
}
