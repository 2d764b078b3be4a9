use candle_core::{DType, IndexOp, Result, Tensor};
use candle_nn::{Init, Linear, VarBuilder};

//
// Linear layer with torch-equivalent initialisation
//
//   torch.nn.Linear is initialised by Uniform(-1/sqrt(fan_in), 1/sqrt(fan_in)).
//   see https://github.com/pytorch/pytorch/issues/57109
//
pub(crate) fn linear(in_dim: usize, out_dim: usize, vs: VarBuilder) -> Result<Linear> {
    let bound = 1.0 / (in_dim as f64).sqrt();
    let init_ws = Init::Uniform { lo: -bound, up: bound };
    let init_bs = Init::Uniform { lo: -bound, up: bound };
    let ws = vs.get_with_hints((out_dim, in_dim), "weight", init_ws)?;
    let bs = vs.get_with_hints(out_dim, "bias", init_bs)?;
    Ok(Linear::new(ws, Some(bs)))
}

fn count(index: &Tensor, num_nodes: usize) -> Result<Tensor> {
    let ones = Tensor::ones(index.dims1()?, DType::F32, index.device())?;
    Tensor::zeros(num_nodes, DType::F32, index.device())?.index_add(index, &ones, 0)
}

/// Number of edges entering each node, as `f32` of shape `(num_nodes,)`.
pub fn in_degree(edge_index: &Tensor, num_nodes: usize) -> Result<Tensor> {
    count(&edge_index.i((1, ..))?, num_nodes)
}

/// Number of edges leaving each node, as `f32` of shape `(num_nodes,)`.
pub fn out_degree(edge_index: &Tensor, num_nodes: usize) -> Result<Tensor> {
    count(&edge_index.i((0, ..))?, num_nodes)
}

/// `out[v] = sum over edges u -> v of edge_weight[e] * xs[u]`
pub fn weighted_sum_agg(xs: &Tensor, edge_index: &Tensor, edge_weight: &Tensor) -> Result<Tensor> {
    let messages = xs
        .i(&edge_index.i((0, ..))?)?
        .broadcast_mul(&edge_weight.unsqueeze(1)?)?;
    xs.zeros_like()?.index_add(&edge_index.i((1, ..))?, &messages, 0)
}

/// Averages node rows per graph; `node_graph[v]` names the graph of node `v`.
pub fn mean_nodes(xs: &Tensor, node_graph: &Tensor, graph_num_nodes: &[usize]) -> Result<Tensor> {
    let num_graphs = graph_num_nodes.len();
    let (_, dim) = xs.dims2()?;
    let sums = Tensor::zeros((num_graphs, dim), xs.dtype(), xs.device())?.index_add(
        node_graph,
        xs,
        0,
    )?;
    let counts = Tensor::from_iter(
        graph_num_nodes.iter().map(|&n| n.max(1) as f32),
        xs.device(),
    )?
    .reshape((num_graphs, 1))?
    .to_dtype(xs.dtype())?;
    sums.broadcast_div(&counts)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use candle_core::Device;

    use super::*;

    // 0 -> 1, 0 -> 2, 1 -> 2
    fn edge_index() -> Result<Tensor> {
        Tensor::new(&[[0u32, 0, 1], [1, 2, 2]], &Device::Cpu)
    }

    #[test]
    fn degrees() -> Result<()> {
        let edge_index = edge_index()?;
        assert_eq!(in_degree(&edge_index, 4)?.to_vec1::<f32>()?, [0., 1., 2., 0.]);
        assert_eq!(out_degree(&edge_index, 4)?.to_vec1::<f32>()?, [2., 1., 0., 0.]);
        Ok(())
    }

    #[test]
    fn weighted_sum() -> Result<()> {
        let xs = Tensor::new(&[[1f32], [10.], [100.]], &Device::Cpu)?;
        let weight = Tensor::new(&[1f32, 0.5, 2.], &Device::Cpu)?;
        let out = weighted_sum_agg(&xs, &edge_index()?, &weight)?;
        assert_eq!(out.to_vec2::<f32>()?, [[0.], [1.], [20.5]]);
        Ok(())
    }

    #[test]
    fn mean_per_graph() -> Result<()> {
        let xs = Tensor::new(&[[1f32, 2.], [3., 4.], [5., 6.], [7., 9.]], &Device::Cpu)?;
        let node_graph = Tensor::new(&[0u32, 0, 0, 1], &Device::Cpu)?;
        let out = mean_nodes(&xs, &node_graph, &[3, 1])?.to_vec2::<f32>()?;
        assert_relative_eq!(out[0][0], 3.0);
        assert_relative_eq!(out[0][1], 4.0);
        assert_relative_eq!(out[1][0], 7.0);
        assert_relative_eq!(out[1][1], 9.0);
        Ok(())
    }
}
