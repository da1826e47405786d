use super::delta::Delta;
use super::delta::DeltaEntry;
use super::delta::GraphElement;
use super::delta::RemovedRange;
use super::domains::DomainChange;
use super::domains::GraphDomain;
use super::domains::GraphKind;
use super::domains::IntegerDomain;
use super::notifications::DomainEvent;
use super::notifications::EventSink;
use super::notifications::Notification;
use super::trailed::TrailedInteger;
use super::trailed::TrailedValues;
use super::variables::DomainId;
use super::variables::GraphId;
use super::variables::IntVar;
use crate::basic_types::Cause;
use crate::basic_types::Contradiction;
use crate::containers::KeyedVec;

/// Owns the domains of all variables together with their deltas and the backtrackable memory
/// they live in.
///
/// Every mutation goes through this structure, which records the change in the delta of the
/// variable and emits the corresponding event.
#[derive(Clone, Debug, Default)]
pub struct Assignments {
    trailed_values: TrailedValues,
    integer_domains: KeyedVec<DomainId, IntegerDomain>,
    integer_deltas: KeyedVec<DomainId, Delta<RemovedRange>>,
    graph_domains: KeyedVec<GraphId, GraphDomain>,
    graph_deltas: KeyedVec<GraphId, Delta<GraphElement>>,
    events: EventSink,
    graph_changes: Vec<(DomainEvent, GraphElement)>,
}

// Creation and world management.
impl Assignments {
    pub(crate) fn new_integer_domain(&mut self, lower_bound: i32, upper_bound: i32, enumerated: bool) -> DomainId {
        let domain = if enumerated {
            let values = (lower_bound..=upper_bound).collect::<Vec<_>>();
            IntegerDomain::enumerated(&mut self.trailed_values, &values)
        } else {
            IntegerDomain::interval(&mut self.trailed_values, lower_bound, upper_bound)
        };
        let _ = self.integer_deltas.push(Delta::default());
        self.integer_domains.push(domain)
    }

    pub(crate) fn new_sparse_domain(&mut self, values: &[i32]) -> DomainId {
        let domain = IntegerDomain::enumerated(&mut self.trailed_values, values);
        let _ = self.integer_deltas.push(Delta::default());
        self.integer_domains.push(domain)
    }

    pub(crate) fn new_graph_domain(
        &mut self,
        num_nodes: usize,
        kind: GraphKind,
        arcs: impl IntoIterator<Item = (usize, usize)>,
    ) -> GraphId {
        let domain = GraphDomain::new(&mut self.trailed_values, num_nodes, kind, arcs);
        let _ = self.graph_deltas.push(Delta::default());
        self.graph_domains.push(domain)
    }

    pub(crate) fn new_trailed_integer(&mut self, initial_value: i64) -> TrailedInteger {
        self.trailed_values.grow(initial_value)
    }

    pub(crate) fn read_trailed_integer(&self, cell: TrailedInteger) -> i64 {
        self.trailed_values.read(cell)
    }

    pub(crate) fn assign_trailed_integer(&mut self, cell: TrailedInteger, value: i64) {
        self.trailed_values.assign(cell, value)
    }

    pub fn num_domains(&self) -> usize {
        self.integer_domains.len()
    }

    pub fn num_graphs(&self) -> usize {
        self.graph_domains.len()
    }

    pub fn domains(&self) -> impl Iterator<Item = DomainId> + '_ {
        self.integer_domains.keys()
    }

    pub fn graphs(&self) -> impl Iterator<Item = GraphId> + '_ {
        self.graph_domains.keys()
    }

    /// The depth of the current world.
    pub fn world_index(&self) -> usize {
        self.trailed_values.world_index()
    }

    pub fn world_stamp(&self) -> u64 {
        self.trailed_values.world_stamp()
    }

    pub(crate) fn new_checkpoint(&mut self) {
        self.trailed_values.new_checkpoint();
    }

    pub(crate) fn restore_to(&mut self, world: usize) {
        self.trailed_values.synchronise(world);
        self.events.clear();
    }

    #[cfg(test)]
    pub(crate) fn drain_events(&mut self) -> impl Iterator<Item = Notification> + '_ {
        self.events.drain()
    }

    /// Moves the pending notifications into `buffer`, oldest first.
    pub(crate) fn take_events(&mut self, buffer: &mut Vec<Notification>) {
        buffer.extend(self.events.drain());
    }

    pub(crate) fn clear_events(&mut self) {
        self.events.clear()
    }

    pub(crate) fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub(crate) fn integer_delta(&self, domain: DomainId) -> &[DeltaEntry<RemovedRange>] {
        self.integer_deltas[domain].entries(self.world_stamp())
    }

    pub(crate) fn graph_delta(&self, graph: GraphId) -> &[DeltaEntry<GraphElement>] {
        self.graph_deltas[graph].entries(self.world_stamp())
    }
}

// Integer domains.
impl Assignments {
    pub(crate) fn domain_lower_bound(&self, domain: DomainId) -> i32 {
        self.integer_domains[domain].lower_bound(&self.trailed_values)
    }

    pub(crate) fn domain_upper_bound(&self, domain: DomainId) -> i32 {
        self.integer_domains[domain].upper_bound(&self.trailed_values)
    }

    pub(crate) fn domain_contains(&self, domain: DomainId, value: i32) -> bool {
        self.integer_domains[domain].contains(&self.trailed_values, value)
    }

    pub(crate) fn domain_size(&self, domain: DomainId) -> usize {
        self.integer_domains[domain].size(&self.trailed_values)
    }

    pub(crate) fn domain_next_value(&self, domain: DomainId, value: i32) -> Option<i32> {
        self.integer_domains[domain].next_value(&self.trailed_values, value)
    }

    pub(crate) fn domain_previous_value(&self, domain: DomainId, value: i32) -> Option<i32> {
        self.integer_domains[domain].previous_value(&self.trailed_values, value)
    }

    pub fn is_enumerated(&self, domain: DomainId) -> bool {
        self.integer_domains[domain].is_enumerated()
    }

    pub fn lower_bound(&self, variable: impl Into<IntVar>) -> i32 {
        variable.into().lower_bound(self)
    }

    pub fn upper_bound(&self, variable: impl Into<IntVar>) -> i32 {
        variable.into().upper_bound(self)
    }

    pub fn contains(&self, variable: impl Into<IntVar>, value: i32) -> bool {
        variable.into().contains(self, value)
    }

    pub fn size(&self, variable: impl Into<IntVar>) -> usize {
        variable.into().size(self)
    }

    pub fn is_fixed(&self, variable: impl Into<IntVar>) -> bool {
        variable.into().is_fixed(self)
    }

    pub fn fixed_value(&self, variable: impl Into<IntVar>) -> Option<i32> {
        variable.into().fixed_value(self)
    }

    pub fn iterate_domain(&self, variable: impl Into<IntVar>) -> impl Iterator<Item = i32> + '_ {
        variable.into().iterate_domain(self)
    }

    /// The smallest value of the domain which is larger than `value`.
    pub fn next_value(&self, variable: impl Into<IntVar>, value: i32) -> Option<i32> {
        variable.into().next_value(self, value)
    }

    /// The largest value of the domain which is smaller than `value`.
    pub fn previous_value(&self, variable: impl Into<IntVar>, value: i32) -> Option<i32> {
        variable.into().previous_value(self, value)
    }

    /// Raises the lower bound of `variable` to `value`.
    ///
    /// Returns whether the domain changed, or a [`Contradiction`] if no value would remain.
    pub fn update_lower_bound(
        &mut self,
        variable: impl Into<IntVar>,
        value: i32,
        cause: Cause,
    ) -> Result<bool, Contradiction> {
        variable.into().update_lower_bound(self, value, cause)
    }

    pub fn update_upper_bound(
        &mut self,
        variable: impl Into<IntVar>,
        value: i32,
        cause: Cause,
    ) -> Result<bool, Contradiction> {
        variable.into().update_upper_bound(self, value, cause)
    }

    pub fn remove_value(
        &mut self,
        variable: impl Into<IntVar>,
        value: i32,
        cause: Cause,
    ) -> Result<bool, Contradiction> {
        variable.into().remove_value(self, value, cause)
    }

    pub fn instantiate_to(
        &mut self,
        variable: impl Into<IntVar>,
        value: i32,
        cause: Cause,
    ) -> Result<bool, Contradiction> {
        variable.into().instantiate_to(self, value, cause)
    }

    fn record_integer_change(
        &mut self,
        domain: DomainId,
        change: Option<DomainChange>,
        cause: Cause,
    ) -> bool {
        let Some(change) = change else {
            return false;
        };

        let stamp = self.world_stamp();
        for removed in change.removed.into_iter().flatten() {
            self.integer_deltas[domain].push(
                stamp,
                DeltaEntry {
                    event: change.event,
                    payload: removed,
                    cause,
                },
            );
        }
        self.events.push(domain.into(), change.event, cause);
        true
    }

    pub(crate) fn tighten_domain_lower_bound(
        &mut self,
        domain: DomainId,
        value: i32,
        cause: Cause,
    ) -> Result<bool, Contradiction> {
        let change = self.integer_domains[domain]
            .set_lower_bound(&mut self.trailed_values, value)
            .map_err(|_| Contradiction::empty_domain(domain, cause))?;
        Ok(self.record_integer_change(domain, change, cause))
    }

    pub(crate) fn tighten_domain_upper_bound(
        &mut self,
        domain: DomainId,
        value: i32,
        cause: Cause,
    ) -> Result<bool, Contradiction> {
        let change = self.integer_domains[domain]
            .set_upper_bound(&mut self.trailed_values, value)
            .map_err(|_| Contradiction::empty_domain(domain, cause))?;
        Ok(self.record_integer_change(domain, change, cause))
    }

    pub(crate) fn remove_from_domain(
        &mut self,
        domain: DomainId,
        value: i32,
        cause: Cause,
    ) -> Result<bool, Contradiction> {
        let change = self.integer_domains[domain]
            .remove(&mut self.trailed_values, value)
            .map_err(|_| Contradiction::empty_domain(domain, cause))?;
        Ok(self.record_integer_change(domain, change, cause))
    }

    pub(crate) fn assign_domain(
        &mut self,
        domain: DomainId,
        value: i32,
        cause: Cause,
    ) -> Result<bool, Contradiction> {
        let change = self.integer_domains[domain]
            .assign(&mut self.trailed_values, value)
            .map_err(|_| Contradiction::empty_domain(domain, cause))?;
        Ok(self.record_integer_change(domain, change, cause))
    }

    /// Removes every value in `[lower, upper]`.
    pub(crate) fn remove_range_from_domain(
        &mut self,
        domain: DomainId,
        lower: i32,
        upper: i32,
        cause: Cause,
    ) -> Result<bool, Contradiction> {
        if lower > upper {
            return Ok(false);
        }

        let lower_bound = self.domain_lower_bound(domain);
        let upper_bound = self.domain_upper_bound(domain);
        if lower <= lower_bound {
            return self.tighten_domain_lower_bound(domain, upper.saturating_add(1), cause);
        }
        if upper >= upper_bound {
            return self.tighten_domain_upper_bound(domain, lower.saturating_sub(1), cause);
        }
        if !self.is_enumerated(domain) {
            return Ok(false);
        }

        let mut changed = false;
        let mut next = self.domain_next_value(domain, lower - 1);
        while let Some(value) = next.filter(|&value| value <= upper) {
            changed |= self.remove_from_domain(domain, value, cause)?;
            next = self.domain_next_value(domain, value);
        }
        Ok(changed)
    }
}

/// Read access to a graph domain.
#[derive(Clone, Copy, Debug)]
pub struct GraphDomainRef<'a> {
    domain: &'a GraphDomain,
    trailed_values: &'a TrailedValues,
}

impl<'a> GraphDomainRef<'a> {
    pub fn kind(&self) -> GraphKind {
        self.domain.kind()
    }

    pub fn is_directed(&self) -> bool {
        self.domain.kind() == GraphKind::Directed
    }

    pub fn num_nodes(&self) -> usize {
        self.domain.num_nodes()
    }

    pub fn envelope_order(&self) -> usize {
        self.domain.envelope_order(self.trailed_values)
    }

    pub fn kernel_order(&self) -> usize {
        self.domain.kernel_order(self.trailed_values)
    }

    pub fn envelope_contains_node(&self, node: usize) -> bool {
        self.domain.envelope_nodes().contains(self.trailed_values, node)
    }

    pub fn kernel_contains_node(&self, node: usize) -> bool {
        self.domain.kernel_nodes().contains(self.trailed_values, node)
    }

    pub fn envelope_contains_arc(&self, from: usize, to: usize) -> bool {
        self.domain.envelope_contains_arc(self.trailed_values, from, to)
    }

    pub fn kernel_contains_arc(&self, from: usize, to: usize) -> bool {
        self.domain.kernel_contains_arc(self.trailed_values, from, to)
    }

    pub fn envelope_nodes(&self) -> impl Iterator<Item = usize> + 'a {
        self.domain.envelope_nodes().iter(self.trailed_values)
    }

    pub fn kernel_nodes(&self) -> impl Iterator<Item = usize> + 'a {
        self.domain.kernel_nodes().iter(self.trailed_values)
    }

    pub fn envelope_successors(&self, node: usize) -> impl Iterator<Item = usize> + 'a {
        self.domain.envelope_successors(node).iter(self.trailed_values)
    }

    pub fn envelope_predecessors(&self, node: usize) -> impl Iterator<Item = usize> + 'a {
        self.domain.envelope_predecessors(node).iter(self.trailed_values)
    }

    pub fn kernel_successors(&self, node: usize) -> impl Iterator<Item = usize> + 'a {
        self.domain.kernel_successors(node).iter(self.trailed_values)
    }

    pub fn kernel_predecessors(&self, node: usize) -> impl Iterator<Item = usize> + 'a {
        self.domain.kernel_predecessors(node).iter(self.trailed_values)
    }

    /// The arcs of the envelope, each undirected edge reported once with `from <= to`.
    pub fn envelope_arcs(&self) -> impl Iterator<Item = (usize, usize)> + 'a {
        let domain = self.domain;
        let trailed_values = self.trailed_values;
        let undirected = domain.kind() == GraphKind::Undirected;
        (0..domain.num_nodes()).flat_map(move |from| {
            domain
                .envelope_successors(from)
                .iter(trailed_values)
                .filter(move |&to| !undirected || from <= to)
                .map(move |to| (from, to))
        })
    }

    pub fn is_instantiated(&self) -> bool {
        self.domain.is_instantiated(self.trailed_values)
    }
}

// Graph domains.
impl Assignments {
    pub fn graph(&self, graph: GraphId) -> GraphDomainRef<'_> {
        GraphDomainRef {
            domain: &self.graph_domains[graph],
            trailed_values: &self.trailed_values,
        }
    }

    fn record_graph_changes(&mut self, graph: GraphId, cause: Cause) {
        let stamp = self.world_stamp();
        for (event, element) in self.graph_changes.drain(..) {
            self.graph_deltas[graph].push(
                stamp,
                DeltaEntry {
                    event,
                    payload: element,
                    cause,
                },
            );
            self.events.push(graph.into(), event, cause);
        }
    }

    fn mutate_graph(
        &mut self,
        graph: GraphId,
        cause: Cause,
        mutation: impl FnOnce(
            &GraphDomain,
            &mut TrailedValues,
            &mut Vec<(DomainEvent, GraphElement)>,
        ) -> Result<bool, super::domains::EmptyDomain>,
    ) -> Result<bool, Contradiction> {
        let result = mutation(
            &self.graph_domains[graph],
            &mut self.trailed_values,
            &mut self.graph_changes,
        );
        // Partial changes are recorded as well; the world is restored after a contradiction.
        self.record_graph_changes(graph, cause);
        result.map_err(|_| Contradiction::empty_domain(graph, cause))
    }

    pub fn remove_node(&mut self, graph: GraphId, node: usize, cause: Cause) -> Result<bool, Contradiction> {
        self.mutate_graph(graph, cause, |domain, trailed_values, changes| {
            domain.remove_node(trailed_values, node, changes)
        })
    }

    pub fn remove_arc(
        &mut self,
        graph: GraphId,
        from: usize,
        to: usize,
        cause: Cause,
    ) -> Result<bool, Contradiction> {
        self.mutate_graph(graph, cause, |domain, trailed_values, changes| {
            domain.remove_arc(trailed_values, from, to, changes)
        })
    }

    pub fn enforce_node(&mut self, graph: GraphId, node: usize, cause: Cause) -> Result<bool, Contradiction> {
        self.mutate_graph(graph, cause, |domain, trailed_values, changes| {
            domain.enforce_node(trailed_values, node, changes)
        })
    }

    pub fn enforce_arc(
        &mut self,
        graph: GraphId,
        from: usize,
        to: usize,
        cause: Cause,
    ) -> Result<bool, Contradiction> {
        self.mutate_graph(graph, cause, |domain, trailed_values, changes| {
            domain.enforce_arc(trailed_values, from, to, changes)
        })
    }
}
