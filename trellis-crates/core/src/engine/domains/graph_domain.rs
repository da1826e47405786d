use super::EmptyDomain;
use crate::engine::delta::GraphElement;
use crate::engine::notifications::DomainEvent;
use crate::engine::trailed::TrailedBitSet;
use crate::engine::trailed::TrailedInteger;
use crate::engine::trailed::TrailedValues;

/// Whether the arcs of a graph variable are oriented.
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GraphKind {
    #[default]
    Directed,
    /// Every arc `(i, j)` is also the arc `(j, i)`.
    Undirected,
}

/// The domain of a graph variable over the nodes `0..num_nodes`.
///
/// The envelope holds every node and arc which may still be part of the graph, the kernel every
/// node and arc which must be part of it. Every operation keeps the kernel inside the envelope:
/// enforcing an arc enforces its endpoints, and removing a node removes its incident arcs.
#[derive(Clone, Debug)]
pub(crate) struct GraphDomain {
    kind: GraphKind,
    envelope_nodes: TrailedBitSet,
    kernel_nodes: TrailedBitSet,
    envelope_order: TrailedInteger,
    kernel_order: TrailedInteger,
    envelope_successors: Box<[TrailedBitSet]>,
    kernel_successors: Box<[TrailedBitSet]>,
    /// Empty for undirected graphs, whose rows are symmetric.
    envelope_predecessors: Box<[TrailedBitSet]>,
    kernel_predecessors: Box<[TrailedBitSet]>,
}

impl GraphDomain {
    /// Creates a domain whose envelope holds every node and the given arcs, and whose kernel is
    /// empty.
    pub(crate) fn new(
        trailed_values: &mut TrailedValues,
        num_nodes: usize,
        kind: GraphKind,
        arcs: impl IntoIterator<Item = (usize, usize)>,
    ) -> GraphDomain {
        let rows = |count: usize, trailed_values: &mut TrailedValues| -> Box<[TrailedBitSet]> {
            (0..count)
                .map(|_| TrailedBitSet::new(trailed_values, num_nodes, false))
                .collect()
        };
        let num_predecessor_rows = match kind {
            GraphKind::Directed => num_nodes,
            GraphKind::Undirected => 0,
        };

        let domain = GraphDomain {
            kind,
            envelope_nodes: TrailedBitSet::new(trailed_values, num_nodes, true),
            kernel_nodes: TrailedBitSet::new(trailed_values, num_nodes, false),
            envelope_order: trailed_values.grow(num_nodes as i64),
            kernel_order: trailed_values.grow(0),
            envelope_successors: rows(num_nodes, &mut *trailed_values),
            kernel_successors: rows(num_nodes, &mut *trailed_values),
            envelope_predecessors: rows(num_predecessor_rows, &mut *trailed_values),
            kernel_predecessors: rows(num_predecessor_rows, &mut *trailed_values),
        };

        for (from, to) in arcs {
            if from < num_nodes && to < num_nodes {
                domain.insert_arc(
                    trailed_values,
                    &domain.envelope_successors,
                    &domain.envelope_predecessors,
                    from,
                    to,
                );
            }
        }

        domain
    }

    pub(crate) fn kind(&self) -> GraphKind {
        self.kind
    }

    pub(crate) fn num_nodes(&self) -> usize {
        self.envelope_nodes.capacity()
    }

    pub(crate) fn envelope_order(&self, trailed_values: &TrailedValues) -> usize {
        trailed_values.read(self.envelope_order) as usize
    }

    pub(crate) fn kernel_order(&self, trailed_values: &TrailedValues) -> usize {
        trailed_values.read(self.kernel_order) as usize
    }

    pub(crate) fn envelope_nodes(&self) -> &TrailedBitSet {
        &self.envelope_nodes
    }

    pub(crate) fn kernel_nodes(&self) -> &TrailedBitSet {
        &self.kernel_nodes
    }

    pub(crate) fn envelope_successors(&self, node: usize) -> &TrailedBitSet {
        &self.envelope_successors[node]
    }

    pub(crate) fn kernel_successors(&self, node: usize) -> &TrailedBitSet {
        &self.kernel_successors[node]
    }

    pub(crate) fn envelope_predecessors(&self, node: usize) -> &TrailedBitSet {
        match self.kind {
            GraphKind::Directed => &self.envelope_predecessors[node],
            GraphKind::Undirected => &self.envelope_successors[node],
        }
    }

    pub(crate) fn kernel_predecessors(&self, node: usize) -> &TrailedBitSet {
        match self.kind {
            GraphKind::Directed => &self.kernel_predecessors[node],
            GraphKind::Undirected => &self.kernel_successors[node],
        }
    }

    pub(crate) fn envelope_contains_arc(&self, trailed_values: &TrailedValues, from: usize, to: usize) -> bool {
        from < self.num_nodes() && self.envelope_successors[from].contains(trailed_values, to)
    }

    pub(crate) fn kernel_contains_arc(&self, trailed_values: &TrailedValues, from: usize, to: usize) -> bool {
        from < self.num_nodes() && self.kernel_successors[from].contains(trailed_values, to)
    }

    /// Whether every node and arc is decided.
    pub(crate) fn is_instantiated(&self, trailed_values: &TrailedValues) -> bool {
        self.envelope_order(trailed_values) == self.kernel_order(trailed_values)
            && (0..self.num_nodes()).all(|node| {
                self.envelope_successors[node].is_subset_of(trailed_values, &self.kernel_successors[node])
            })
    }

    fn insert_arc(
        &self,
        trailed_values: &mut TrailedValues,
        successors: &[TrailedBitSet],
        predecessors: &[TrailedBitSet],
        from: usize,
        to: usize,
    ) {
        let _ = successors[from].insert(trailed_values, to);
        match self.kind {
            GraphKind::Directed => {
                let _ = predecessors[to].insert(trailed_values, from);
            }
            GraphKind::Undirected => {
                let _ = successors[to].insert(trailed_values, from);
            }
        }
    }

    fn delete_arc(
        &self,
        trailed_values: &mut TrailedValues,
        successors: &[TrailedBitSet],
        predecessors: &[TrailedBitSet],
        from: usize,
        to: usize,
    ) {
        let _ = successors[from].remove(trailed_values, to);
        match self.kind {
            GraphKind::Directed => {
                let _ = predecessors[to].remove(trailed_values, from);
            }
            GraphKind::Undirected => {
                let _ = successors[to].remove(trailed_values, from);
            }
        }
    }

    pub(crate) fn remove_arc(
        &self,
        trailed_values: &mut TrailedValues,
        from: usize,
        to: usize,
        changes: &mut Vec<(DomainEvent, GraphElement)>,
    ) -> Result<bool, EmptyDomain> {
        if !self.envelope_contains_arc(trailed_values, from, to) {
            return Ok(false);
        }
        if self.kernel_contains_arc(trailed_values, from, to) {
            return Err(EmptyDomain);
        }

        self.delete_arc(
            trailed_values,
            &self.envelope_successors,
            &self.envelope_predecessors,
            from,
            to,
        );
        changes.push((DomainEvent::RemoveArc, GraphElement::Arc(from, to)));
        Ok(true)
    }

    pub(crate) fn remove_node(
        &self,
        trailed_values: &mut TrailedValues,
        node: usize,
        changes: &mut Vec<(DomainEvent, GraphElement)>,
    ) -> Result<bool, EmptyDomain> {
        if !self.envelope_nodes.contains(trailed_values, node) {
            return Ok(false);
        }
        if self.kernel_nodes.contains(trailed_values, node) {
            return Err(EmptyDomain);
        }

        let successors = self.envelope_successors[node]
            .iter(trailed_values)
            .collect::<Vec<_>>();
        for successor in successors {
            let _ = self.remove_arc(trailed_values, node, successor, changes)?;
        }
        let predecessors = self
            .envelope_predecessors(node)
            .iter(trailed_values)
            .collect::<Vec<_>>();
        for predecessor in predecessors {
            let _ = self.remove_arc(trailed_values, predecessor, node, changes)?;
        }

        let _ = self.envelope_nodes.remove(trailed_values, node);
        trailed_values.add_assign(self.envelope_order, -1);
        changes.push((DomainEvent::RemoveNode, GraphElement::Node(node)));
        Ok(true)
    }

    pub(crate) fn enforce_node(
        &self,
        trailed_values: &mut TrailedValues,
        node: usize,
        changes: &mut Vec<(DomainEvent, GraphElement)>,
    ) -> Result<bool, EmptyDomain> {
        if self.kernel_nodes.contains(trailed_values, node) {
            return Ok(false);
        }
        if !self.envelope_nodes.contains(trailed_values, node) {
            return Err(EmptyDomain);
        }

        let _ = self.kernel_nodes.insert(trailed_values, node);
        trailed_values.add_assign(self.kernel_order, 1);
        changes.push((DomainEvent::EnforceNode, GraphElement::Node(node)));
        Ok(true)
    }

    pub(crate) fn enforce_arc(
        &self,
        trailed_values: &mut TrailedValues,
        from: usize,
        to: usize,
        changes: &mut Vec<(DomainEvent, GraphElement)>,
    ) -> Result<bool, EmptyDomain> {
        if self.kernel_contains_arc(trailed_values, from, to) {
            return Ok(false);
        }
        if !self.envelope_contains_arc(trailed_values, from, to) {
            return Err(EmptyDomain);
        }

        let _ = self.enforce_node(trailed_values, from, changes)?;
        let _ = self.enforce_node(trailed_values, to, changes)?;
        self.insert_arc(
            trailed_values,
            &self.kernel_successors,
            &self.kernel_predecessors,
            from,
            to,
        );
        changes.push((DomainEvent::EnforceArc, GraphElement::Arc(from, to)));
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(trailed_values: &mut TrailedValues, kind: GraphKind) -> GraphDomain {
        GraphDomain::new(trailed_values, 3, kind, [(0, 1), (1, 2)])
    }

    #[test]
    fn enforcing_an_arc_enforces_its_endpoints() {
        let mut trailed_values = TrailedValues::default();
        let graph = path(&mut trailed_values, GraphKind::Directed);
        let mut changes = vec![];

        assert_eq!(Ok(true), graph.enforce_arc(&mut trailed_values, 0, 1, &mut changes));

        assert_eq!(2, graph.kernel_order(&trailed_values));
        assert_eq!(
            vec![
                (DomainEvent::EnforceNode, GraphElement::Node(0)),
                (DomainEvent::EnforceNode, GraphElement::Node(1)),
                (DomainEvent::EnforceArc, GraphElement::Arc(0, 1)),
            ],
            changes
        );
    }

    #[test]
    fn removing_a_node_removes_its_incident_arcs() {
        let mut trailed_values = TrailedValues::default();
        let graph = path(&mut trailed_values, GraphKind::Directed);
        let mut changes = vec![];

        assert_eq!(Ok(true), graph.remove_node(&mut trailed_values, 1, &mut changes));

        assert!(!graph.envelope_contains_arc(&trailed_values, 0, 1));
        assert!(!graph.envelope_contains_arc(&trailed_values, 1, 2));
        assert_eq!(2, graph.envelope_order(&trailed_values));
        assert_eq!(3, changes.len());
    }

    #[test]
    fn the_kernel_cannot_leave_the_envelope() {
        let mut trailed_values = TrailedValues::default();
        let graph = path(&mut trailed_values, GraphKind::Undirected);
        let mut changes = vec![];

        let _ = graph.enforce_arc(&mut trailed_values, 2, 1, &mut changes);

        assert!(graph.kernel_contains_arc(&trailed_values, 1, 2));
        assert_eq!(Err(EmptyDomain), graph.remove_arc(&mut trailed_values, 1, 2, &mut changes));
        assert_eq!(Err(EmptyDomain), graph.remove_node(&mut trailed_values, 2, &mut changes));
        assert_eq!(Err(EmptyDomain), graph.enforce_arc(&mut trailed_values, 0, 2, &mut changes));
    }

    #[test]
    fn instantiated_once_everything_is_decided() {
        let mut trailed_values = TrailedValues::default();
        let graph = path(&mut trailed_values, GraphKind::Directed);
        let mut changes = vec![];

        let _ = graph.enforce_arc(&mut trailed_values, 0, 1, &mut changes);
        assert!(!graph.is_instantiated(&trailed_values));

        let _ = graph.remove_node(&mut trailed_values, 2, &mut changes);
        assert!(graph.is_instantiated(&trailed_values));
    }
}
