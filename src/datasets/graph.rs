/// Directed graph stored as an edge list.
///
/// Undirected graphs are represented by storing every edge in both
/// directions, the same way a message passing layer consumes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    num_nodes: usize,
    src: Vec<u32>,
    dst: Vec<u32>,
}
impl Graph {
    pub fn new(num_nodes: usize, src: Vec<u32>, dst: Vec<u32>) -> Self {
        assert_eq!(src.len(), dst.len());
        debug_assert!(src.iter().chain(&dst).all(|&v| (v as usize) < num_nodes));
        Self {
            num_nodes,
            src,
            dst,
        }
    }
    /// Builds a symmetric graph: `{u, v}` becomes `u -> v` and `v -> u`.
    pub fn from_undirected<I>(num_nodes: usize, edges: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut src = Vec::new();
        let mut dst = Vec::new();
        for (u, v) in edges {
            src.extend([u as u32, v as u32]);
            dst.extend([v as u32, u as u32]);
        }
        Self::new(num_nodes, src, dst)
    }
    /// Appends one `v -> v` edge per node.
    pub fn with_self_loops(mut self) -> Self {
        let nodes = 0..self.num_nodes as u32;
        self.src.extend(nodes.clone());
        self.dst.extend(nodes);
        self
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }
    pub fn num_edges(&self) -> usize {
        self.src.len()
    }
    pub fn src(&self) -> &[u32] {
        &self.src
    }
    pub fn dst(&self) -> &[u32] {
        &self.dst
    }
    pub fn edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.src.iter().copied().zip(self.dst.iter().copied())
    }

    pub fn in_degrees(&self) -> Vec<u32> {
        let mut degree = vec![0; self.num_nodes];
        for &v in &self.dst {
            degree[v as usize] += 1;
        }
        degree
    }
    pub fn out_degrees(&self) -> Vec<u32> {
        let mut degree = vec![0; self.num_nodes];
        for &u in &self.src {
            degree[u as usize] += 1;
        }
        degree
    }

    /// Renders the undirected view of the graph in Graphviz DOT.
    /// Self loops and the reverse copy of each edge are left out.
    pub fn to_dot(&self, title: &str) -> String {
        let mut out = format!(
            "graph {{\n    label=\"{}\";\n    labelloc=t;\n    node [shape=point];\n",
            title.replace('"', "\\\"")
        );
        for v in 0..self.num_nodes {
            out.push_str(&format!("    {};\n", v));
        }
        for (u, v) in self.edges().filter(|(u, v)| u < v) {
            out.push_str(&format!("    {} -- {};\n", u, v));
        }
        out.push_str("}\n");
        out
    }
}
impl std::fmt::Display for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Graph(num_nodes={}, num_edges={})",
            self.num_nodes,
            self.num_edges()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undirected_edges_are_stored_both_ways() {
        let g = Graph::from_undirected(3, [(0, 1), (1, 2)]);
        assert_eq!(g.num_edges(), 4);
        assert_eq!(g.in_degrees(), vec![1, 2, 1]);
        assert_eq!(g.in_degrees(), g.out_degrees());
    }

    #[test]
    fn self_loops_add_one_to_every_degree() {
        let g = Graph::from_undirected(3, [(0, 1), (1, 2)]).with_self_loops();
        assert_eq!(g.num_edges(), 7);
        assert_eq!(g.in_degrees(), vec![2, 3, 2]);
        assert_eq!(g.to_string(), "Graph(num_nodes=3, num_edges=7)");
    }

    #[test]
    fn dot_lists_each_undirected_edge_once() {
        let g = Graph::from_undirected(3, [(0, 1), (2, 1)]).with_self_loops();
        let dot = g.to_dot("Class: 0");
        assert!(dot.starts_with("graph {"));
        assert!(dot.contains("label=\"Class: 0\""));
        assert_eq!(dot.matches(" -- ").count(), 2);
        assert!(dot.contains("0 -- 1;"));
        assert!(dot.contains("1 -- 2;"));
    }

    #[test]
    fn dot_output_is_complete() {
        let g = Graph::from_undirected(2, [(0, 1)]).with_self_loops();
        assert_eq!(
            g.to_dot("say \"hi\""),
            "graph {\n    label=\"say \\\"hi\\\"\";\n    labelloc=t;\n    node [shape=point];\n    0;\n    1;\n    0 -- 1;\n}\n"
        );
    }
}
