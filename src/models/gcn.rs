use candle_core::{bail, DType, Device, IndexOp, Result, Tensor, Var};
use candle_nn::{Activation, Dropout, Init, Linear, Module, VarBuilder, VarMap};

use super::{
    traits::{GnnModule, GraphClassifier},
    utils::{in_degree, linear, mean_nodes, out_degree, weighted_sum_agg},
};
use crate::datasets::GraphBatch;

/// Graph convolution with symmetric degree normalisation:
/// `out[v] = sum over u -> v of x[u] W / sqrt(deg_out(u) deg_in(v)) + b`.
pub struct GcnConv {
    weight: Tensor,
    bias: Tensor,
}
impl GcnConv {
    pub fn new(in_dim: usize, out_dim: usize, vs: VarBuilder) -> Result<Self> {
        // Xavier Uniform
        let bound = (6.0 / (in_dim + out_dim) as f64).sqrt();
        let weight = vs.get_with_hints(
            (in_dim, out_dim),
            "weight",
            Init::Uniform {
                lo: -bound,
                up: bound,
            },
        )?;
        let bias = vs.get_with_hints((1, out_dim), "bias", Init::Const(0.0))?;
        Ok(Self { weight, bias })
    }
}
impl GnnModule for GcnConv {
    fn forward_t(&self, xs: &Tensor, edge_index: &Tensor, _train: bool) -> Result<Tensor> {
        let num_nodes = xs.dim(0)?;
        let out_degree = out_degree(edge_index, num_nodes)?.maximum(1f32)?;
        let in_degree = in_degree(edge_index, num_nodes)?.maximum(1f32)?;
        let edge_weight = out_degree
            .i(&edge_index.i((0, ..))?)?
            .mul(&in_degree.i(&edge_index.i((1, ..))?)?)?
            .to_dtype(xs.dtype())?
            .powf(-0.5)?;
        let xs = xs.matmul(&self.weight)?;
        weighted_sum_agg(&xs, edge_index, &edge_weight)?.broadcast_add(&self.bias)
    }
}

/// The two network shapes of the MiniGC experiment.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum GcnVariant {
    /// two convolutions of width `hidden_dim`
    #[default]
    Shallow,
    /// four convolutions, widths `hidden_dim, hidden_dim, hidden_dim / 2, hidden_dim / 4`
    Deep,
}
impl GcnVariant {
    pub fn layer_sizes(self, input_dim: usize, hidden_dim: usize) -> Vec<usize> {
        match self {
            Self::Shallow => vec![input_dim, hidden_dim, hidden_dim],
            Self::Deep => vec![
                input_dim,
                hidden_dim,
                hidden_dim,
                hidden_dim / 2,
                hidden_dim / 4,
            ],
        }
    }
}

pub struct GcnParams {
    pub dropout_rate: f32,
    pub activation_fn: Activation,
}
impl Default for GcnParams {
    fn default() -> Self {
        Self {
            dropout_rate: 0.0,
            activation_fn: Activation::Relu,
        }
    }
}

/// Stacked [`GcnConv`]s over the in-degree feature, mean readout, linear head.
pub struct GcnClassifier {
    layers: Vec<GcnConv>,
    classifier: Linear,
    dropout: Dropout,
    activation_fn: Activation,
    num_classes: usize,
    varmap: VarMap,
}
impl GcnClassifier {
    /// Width of the initial node feature (the in-degree).
    pub const INPUT_DIM: usize = 1;

    pub fn with_params(
        layer_sizes: &[usize],
        num_classes: usize,
        params: GcnParams,
        device: &Device,
    ) -> Result<Self> {
        if layer_sizes.len() < 2 || layer_sizes[0] != Self::INPUT_DIM {
            bail!(
                "layer sizes must start with the input width {} and have at least one layer, got {:?}",
                Self::INPUT_DIM,
                layer_sizes
            );
        }
        if layer_sizes.contains(&0) || num_classes == 0 {
            bail!("zero-width layer in {:?} -> {}", layer_sizes, num_classes);
        }
        let varmap = VarMap::new();
        let vs = VarBuilder::from_varmap(&varmap, DType::F32, device);

        let mut layers = Vec::new();
        for (i, sizes) in layer_sizes.windows(2).enumerate() {
            layers.push(GcnConv::new(sizes[0], sizes[1], vs.pp(format!("conv{}", i)))?);
        }
        let hidden_dim = layer_sizes[layer_sizes.len() - 1];
        let classifier = linear(hidden_dim, num_classes, vs.pp("classifier"))?;
        Ok(Self {
            layers,
            classifier,
            dropout: Dropout::new(params.dropout_rate),
            activation_fn: params.activation_fn,
            num_classes,
            varmap,
        })
    }
    pub fn new(layer_sizes: &[usize], num_classes: usize, device: &Device) -> Result<Self> {
        Self::with_params(layer_sizes, num_classes, GcnParams::default(), device)
    }
    pub fn from_variant(
        variant: GcnVariant,
        hidden_dim: usize,
        num_classes: usize,
        device: &Device,
    ) -> Result<Self> {
        Self::new(
            &variant.layer_sizes(Self::INPUT_DIM, hidden_dim),
            num_classes,
            device,
        )
    }
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }
}
impl GraphClassifier for GcnClassifier {
    fn forward_t(&self, batch: &GraphBatch, train: bool) -> Result<Tensor> {
        let num_nodes = batch.num_nodes();
        let mut h = in_degree(&batch.edge_index, num_nodes)?.reshape((num_nodes, 1))?;
        for (idx, layer) in self.layers.iter().enumerate() {
            if idx > 0 {
                h = self.dropout.forward(&h, train)?;
            }
            h = layer.forward(&h, &batch.edge_index)?;
            h = self.activation_fn.forward(&h)?;
        }
        let h = mean_nodes(&h, &batch.node_graph, batch.graph_num_nodes())?;
        self.classifier.forward(&h)
    }
    fn num_classes(&self) -> usize {
        self.num_classes
    }
    fn parameters(&self) -> Vec<Var> {
        self.varmap.all_vars()
    }
}
