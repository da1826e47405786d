use crate::engine::GraphDomainRef;

/// A directed graph over the nodes `0..num_nodes` of which only some nodes are active.
///
/// The structural algorithms work on such a snapshot rather than on a graph domain directly, so
/// that the graph can be rebuilt from integer successor variables as well.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticGraph {
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
    active: Vec<bool>,
}

impl StaticGraph {
    /// A graph without arcs in which every node is active.
    pub fn new(num_nodes: usize) -> StaticGraph {
        StaticGraph {
            successors: vec![vec![]; num_nodes],
            predecessors: vec![vec![]; num_nodes],
            active: vec![true; num_nodes],
        }
    }

    /// The envelope of a graph domain. An undirected edge becomes a pair of opposite arcs.
    pub fn from_envelope(graph: GraphDomainRef<'_>) -> StaticGraph {
        let mut result = StaticGraph::new(graph.num_nodes());
        for node in 0..graph.num_nodes() {
            result.active[node] = graph.envelope_contains_node(node);
            for successor in graph.envelope_successors(node) {
                result.add_arc(node, successor);
            }
        }
        result
    }

    /// The kernel of a graph domain; only the mandatory nodes are active.
    pub fn from_kernel(graph: GraphDomainRef<'_>) -> StaticGraph {
        let mut result = StaticGraph::new(graph.num_nodes());
        for node in 0..graph.num_nodes() {
            result.active[node] = graph.kernel_contains_node(node);
            for successor in graph.kernel_successors(node) {
                result.add_arc(node, successor);
            }
        }
        result
    }

    pub fn num_nodes(&self) -> usize {
        self.active.len()
    }

    pub fn is_active(&self, node: usize) -> bool {
        self.active[node]
    }

    pub fn set_active(&mut self, node: usize, active: bool) {
        self.active[node] = active;
    }

    pub fn active_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.num_nodes()).filter(|&node| self.active[node])
    }

    pub fn add_arc(&mut self, from: usize, to: usize) {
        self.successors[from].push(to);
        self.predecessors[to].push(from);
    }

    pub fn successors(&self, node: usize) -> &[usize] {
        &self.successors[node]
    }

    pub fn predecessors(&self, node: usize) -> &[usize] {
        &self.predecessors[node]
    }

    /// The graph with every arc reversed.
    pub fn reversed(&self) -> StaticGraph {
        StaticGraph {
            successors: self.predecessors.clone(),
            predecessors: self.successors.clone(),
            active: self.active.clone(),
        }
    }

    /// The neighbours of every node when the direction of the arcs is ignored, without loops or
    /// duplicates.
    pub(crate) fn undirected_neighbours(&self) -> Vec<Vec<usize>> {
        (0..self.num_nodes())
            .map(|node| {
                let mut neighbours = self.successors[node]
                    .iter()
                    .chain(self.predecessors[node].iter())
                    .copied()
                    .filter(|&neighbour| neighbour != node && self.active[neighbour])
                    .collect::<Vec<_>>();
                neighbours.sort_unstable();
                neighbours.dedup();
                neighbours
            })
            .collect()
    }
}
