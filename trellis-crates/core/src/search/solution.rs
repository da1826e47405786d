use crate::containers::KeyedVec;
use crate::engine::variables::DomainId;
use crate::engine::variables::GraphId;
use crate::engine::Assignments;

/// A snapshot of the values of all variables in a state where every variable is decided.
#[derive(Clone, Debug, Default)]
pub struct Solution {
    values: KeyedVec<DomainId, i32>,
    nodes: KeyedVec<GraphId, Vec<usize>>,
    arcs: KeyedVec<GraphId, Vec<(usize, usize)>>,
}

impl Solution {
    pub(crate) fn new(assignments: &Assignments) -> Solution {
        let values = assignments
            .domains()
            .map(|domain| assignments.lower_bound(domain))
            .collect();
        let nodes = assignments
            .graphs()
            .map(|graph| assignments.graph(graph).kernel_nodes().collect())
            .collect();
        let arcs = assignments
            .graphs()
            .map(|graph| {
                let domain = assignments.graph(graph);
                domain
                    .envelope_arcs()
                    .filter(|&(from, to)| domain.kernel_contains_arc(from, to))
                    .collect()
            })
            .collect();

        Solution { values, nodes, arcs }
    }

    pub fn value(&self, variable: DomainId) -> i32 {
        self.values[variable]
    }

    pub fn nodes(&self, graph: GraphId) -> &[usize] {
        &self.nodes[graph]
    }

    /// The arcs of the graph; an undirected edge is reported once, with `from <= to`.
    pub fn arcs(&self, graph: GraphId) -> &[(usize, usize)] {
        &self.arcs[graph]
    }
}
