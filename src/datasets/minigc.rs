use anyhow::{ensure, Result};
use itertools::{iproduct, Itertools};
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{Graph, GraphDataset};

/// Topological families of the MiniGC benchmark. The discriminant is the class label.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GraphFamily {
    Cycle,
    Star,
    Wheel,
    Lollipop,
    Hypercube,
    Grid,
    Clique,
    CircularLadder,
}
impl GraphFamily {
    pub const ALL: [GraphFamily; 8] = [
        Self::Cycle,
        Self::Star,
        Self::Wheel,
        Self::Lollipop,
        Self::Hypercube,
        Self::Grid,
        Self::Clique,
        Self::CircularLadder,
    ];
    pub fn label(self) -> u32 {
        self as u32
    }
    pub fn from_label(label: u32) -> Option<Self> {
        Self::ALL.get(label as usize).copied()
    }
}
impl std::fmt::Display for GraphFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Cycle => write!(f, "cycle"),
            Self::Star => write!(f, "star"),
            Self::Wheel => write!(f, "wheel"),
            Self::Lollipop => write!(f, "lollipop"),
            Self::Hypercube => write!(f, "hypercube"),
            Self::Grid => write!(f, "grid"),
            Self::Clique => write!(f, "clique"),
            Self::CircularLadder => write!(f, "circular_ladder"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MiniGcParams {
    pub num_graphs: usize,
    /// Inclusive bounds on the node count of every generated graph.
    pub min_num_nodes: usize,
    pub max_num_nodes: usize,
    pub seed: u64,
}
impl MiniGcParams {
    pub fn new(num_graphs: usize, min_num_nodes: usize, max_num_nodes: usize, seed: u64) -> Self {
        Self {
            num_graphs,
            min_num_nodes,
            max_num_nodes,
            seed,
        }
    }
    pub fn validate(&self) -> Result<()> {
        let (min, max) = (self.min_num_nodes, self.max_num_nodes);
        ensure!(min >= 6, "min_num_nodes must be at least 6, got {}", min);
        ensure!(min <= max, "empty node range [{}, {}]", min, max);
        ensure!(
            min % 2 == 0 || min < max,
            "node range [{}, {}] has no even size for circular ladders",
            min,
            max
        );
        ensure!(
            min.next_power_of_two() <= max,
            "node range [{}, {}] has no power of two for hypercubes",
            min,
            max
        );
        Ok(())
    }
}

/// Synthetic graph classification dataset: `num_graphs / 8` graphs of each
/// family, with circular ladders taking the remainder.
#[derive(Clone, Debug)]
pub struct MiniGcDataset {
    params: MiniGcParams,
    graphs: Vec<Graph>,
    labels: Vec<u32>,
}
impl MiniGcDataset {
    pub fn new(params: MiniGcParams) -> Result<Self> {
        params.validate()?;
        let mut generator = Generator {
            rng: StdRng::seed_from_u64(params.seed),
            min: params.min_num_nodes,
            max: params.max_num_nodes,
        };

        let per_family = params.num_graphs / GraphFamily::ALL.len();
        let mut graphs = Vec::with_capacity(params.num_graphs);
        let mut labels = Vec::with_capacity(params.num_graphs);
        for family in GraphFamily::ALL {
            let count = match family {
                GraphFamily::CircularLadder => params.num_graphs - graphs.len(),
                _ => per_family,
            };
            for _ in 0..count {
                graphs.push(generator.generate(family).with_self_loops());
                labels.push(family.label());
            }
        }
        log::debug!(
            "generated {} MiniGC graphs with {}..={} nodes (seed={})",
            graphs.len(),
            params.min_num_nodes,
            params.max_num_nodes,
            params.seed
        );
        Ok(Self {
            params,
            graphs,
            labels,
        })
    }
    pub fn params(&self) -> &MiniGcParams {
        &self.params
    }
    pub fn iter(&self) -> impl Iterator<Item = (&Graph, u32)> + '_ {
        self.graphs.iter().zip(self.labels.iter().copied())
    }
}
impl GraphDataset for MiniGcDataset {
    fn len(&self) -> usize {
        self.graphs.len()
    }
    fn get(&self, idx: usize) -> (&Graph, u32) {
        (&self.graphs[idx], self.labels[idx])
    }
    fn num_classes(&self) -> usize {
        GraphFamily::ALL.len()
    }
}

struct Generator {
    rng: StdRng,
    min: usize,
    max: usize,
}
impl Generator {
    fn num_nodes(&mut self) -> usize {
        self.rng.gen_range(self.min..=self.max)
    }
    fn generate(&mut self, family: GraphFamily) -> Graph {
        match family {
            GraphFamily::Cycle => cycle(self.num_nodes()),
            GraphFamily::Star => star(self.num_nodes()),
            GraphFamily::Wheel => wheel(self.num_nodes()),
            GraphFamily::Lollipop => {
                let n = self.num_nodes();
                let path_len = self.rng.gen_range(2..n / 2);
                lollipop(n - path_len, path_len)
            }
            GraphFamily::Hypercube => loop {
                let n = self.num_nodes();
                let dim = n.ilog2();
                if 1usize << dim >= self.min {
                    break hypercube(dim);
                }
            },
            GraphFamily::Grid => loop {
                let n = self.num_nodes();
                let rows = self.rng.gen_range(2..n / 2);
                let cols = n / rows;
                if rows * cols >= self.min {
                    break grid(rows, cols);
                }
            },
            GraphFamily::Clique => clique(self.num_nodes()),
            GraphFamily::CircularLadder => {
                let rungs = self.rng.gen_range((self.min + 1) / 2..=self.max / 2);
                circular_ladder(rungs)
            }
        }
    }
}

fn ring(nodes: std::ops::Range<usize>) -> impl Iterator<Item = (usize, usize)> {
    let first = nodes.start;
    nodes.chain(std::iter::once(first)).tuple_windows()
}

fn cycle(n: usize) -> Graph {
    Graph::from_undirected(n, ring(0..n))
}

fn star(n: usize) -> Graph {
    Graph::from_undirected(n, (1..n).map(|v| (0, v)))
}

fn wheel(n: usize) -> Graph {
    Graph::from_undirected(n, (1..n).map(|v| (0, v)).chain(ring(1..n)))
}

// clique on `0..m`, path on `m..m + path_len`, joined by `m - 1 -- m`
fn lollipop(m: usize, path_len: usize) -> Graph {
    let n = m + path_len;
    let edges = (0..m)
        .tuple_combinations()
        .chain(std::iter::once((m - 1, m)))
        .chain((m..n).tuple_windows());
    Graph::from_undirected(n, edges)
}

fn hypercube(dim: u32) -> Graph {
    let n = 1usize << dim;
    let edges = iproduct!(0..n, 0..dim)
        .map(|(v, bit)| (v, v ^ (1usize << bit)))
        .filter(|(v, w)| v < w);
    Graph::from_undirected(n, edges)
}

fn grid(rows: usize, cols: usize) -> Graph {
    let id = |r: usize, c: usize| r * cols + c;
    let horizontal = iproduct!(0..rows, 1..cols).map(|(r, c)| (id(r, c - 1), id(r, c)));
    let vertical = iproduct!(1..rows, 0..cols).map(|(r, c)| (id(r - 1, c), id(r, c)));
    Graph::from_undirected(rows * cols, horizontal.chain(vertical))
}

fn clique(n: usize) -> Graph {
    Graph::from_undirected(n, (0..n).tuple_combinations())
}

// two concentric rings of `rungs` nodes, `v -- v + rungs` between them
fn circular_ladder(rungs: usize) -> Graph {
    let edges = ring(0..rungs)
        .chain(ring(rungs..2 * rungs))
        .chain((0..rungs).map(|v| (v, v + rungs)));
    Graph::from_undirected(2 * rungs, edges)
}
