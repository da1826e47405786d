use enumset::EnumSet;

use super::LocalId;
use super::PropagatorId;
use crate::basic_types::Cause;
use crate::basic_types::Contradiction;
use crate::engine::notifications::DomainEvent;
use crate::engine::notifications::Request;
use crate::engine::notifications::Watchers;
use crate::engine::trailed::TrailedInteger;
use crate::engine::variables::GraphId;
use crate::engine::variables::IntVar;
use crate::engine::Assignments;
use crate::engine::GraphDomainRef;
use crate::engine::IntDeltaMonitor;
use crate::engine::GraphDeltaMonitor;
use crate::options::EngineOptions;

/// The view of the engine given to a propagator while it is being created.
///
/// Through this context the propagator subscribes to the events of its variables, creates the
/// monitors over their deltas and allocates backtrackable memory.
#[derive(Debug)]
pub struct PropagatorConstructorContext<'a> {
    pub(crate) assignments: &'a mut Assignments,
    pub(crate) watchers: &'a mut Watchers,
    pub(crate) options: &'a EngineOptions,
    pub(crate) propagator_id: PropagatorId,
}

impl PropagatorConstructorContext<'_> {
    pub fn assignments(&self) -> &Assignments {
        self.assignments
    }

    pub fn options(&self) -> &EngineOptions {
        self.options
    }

    pub fn propagator_id(&self) -> PropagatorId {
        self.propagator_id
    }

    pub fn cause(&self) -> Cause {
        Cause::Propagator(self.propagator_id)
    }

    /// Subscribe to `events` of an integer variable. The variable is identified by `local_id`
    /// when the propagator is woken.
    pub fn register(&mut self, variable: impl Into<IntVar>, events: EnumSet<DomainEvent>, local_id: LocalId) {
        let request = Request::new(self.propagator_id, local_id, events);
        self.watchers.watch_integer(variable.into(), request);
    }

    pub fn register_graph(&mut self, graph: GraphId, events: EnumSet<DomainEvent>, local_id: LocalId) {
        let request = Request::new(self.propagator_id, local_id, events);
        self.watchers.watch_graph(graph, request);
    }

    /// A monitor over the delta of `variable` which skips the changes made by this propagator.
    pub fn int_delta_monitor(&self, variable: impl Into<IntVar>) -> IntDeltaMonitor {
        IntDeltaMonitor::new(variable.into(), self.cause())
    }

    pub fn graph_delta_monitor(&self, graph: GraphId) -> GraphDeltaMonitor {
        GraphDeltaMonitor::new(graph, self.cause())
    }

    pub(crate) fn new_trailed_integer(&mut self, initial_value: i64) -> TrailedInteger {
        self.assignments.new_trailed_integer(initial_value)
    }
}

/// The view of the engine given to a propagator while it propagates.
///
/// Every modification made through this context is attributed to the propagator.
#[derive(Debug)]
pub struct PropagationContext<'a> {
    pub(crate) assignments: &'a mut Assignments,
    pub(crate) propagator_id: PropagatorId,
    pub(crate) passive: TrailedInteger,
}

impl<'a> PropagationContext<'a> {
    pub(crate) fn new(
        assignments: &'a mut Assignments,
        propagator_id: PropagatorId,
        passive: TrailedInteger,
    ) -> Self {
        PropagationContext {
            assignments,
            propagator_id,
            passive,
        }
    }

    pub fn reborrow(&mut self) -> PropagationContext<'_> {
        PropagationContext {
            assignments: self.assignments,
            propagator_id: self.propagator_id,
            passive: self.passive,
        }
    }

    pub fn assignments(&self) -> &Assignments {
        self.assignments
    }

    pub fn cause(&self) -> Cause {
        Cause::Propagator(self.propagator_id)
    }

    /// Marks the propagator as entailed for the rest of the current world. It is not woken
    /// again until the search backtracks out of this world.
    pub fn set_passive(&mut self) {
        self.assignments.assign_trailed_integer(self.passive, 1);
    }

    pub fn is_passive(&self) -> bool {
        self.assignments.read_trailed_integer(self.passive) != 0
    }

    pub(crate) fn read_trailed_integer(&self, cell: TrailedInteger) -> i64 {
        self.assignments.read_trailed_integer(cell)
    }

    pub(crate) fn assign_trailed_integer(&mut self, cell: TrailedInteger, value: i64) {
        self.assignments.assign_trailed_integer(cell, value)
    }

    pub fn lower_bound(&self, variable: impl Into<IntVar>) -> i32 {
        self.assignments.lower_bound(variable)
    }

    pub fn upper_bound(&self, variable: impl Into<IntVar>) -> i32 {
        self.assignments.upper_bound(variable)
    }

    pub fn contains(&self, variable: impl Into<IntVar>, value: i32) -> bool {
        self.assignments.contains(variable, value)
    }

    pub fn size(&self, variable: impl Into<IntVar>) -> usize {
        self.assignments.size(variable)
    }

    pub fn is_fixed(&self, variable: impl Into<IntVar>) -> bool {
        self.assignments.is_fixed(variable)
    }

    pub fn fixed_value(&self, variable: impl Into<IntVar>) -> Option<i32> {
        self.assignments.fixed_value(variable)
    }

    pub fn graph(&self, graph: GraphId) -> GraphDomainRef<'_> {
        self.assignments.graph(graph)
    }

    pub fn update_lower_bound(&mut self, variable: impl Into<IntVar>, value: i32) -> Result<bool, Contradiction> {
        let cause = self.cause();
        self.assignments.update_lower_bound(variable, value, cause)
    }

    pub fn update_upper_bound(&mut self, variable: impl Into<IntVar>, value: i32) -> Result<bool, Contradiction> {
        let cause = self.cause();
        self.assignments.update_upper_bound(variable, value, cause)
    }

    pub fn remove_value(&mut self, variable: impl Into<IntVar>, value: i32) -> Result<bool, Contradiction> {
        let cause = self.cause();
        self.assignments.remove_value(variable, value, cause)
    }

    pub fn instantiate_to(&mut self, variable: impl Into<IntVar>, value: i32) -> Result<bool, Contradiction> {
        let cause = self.cause();
        self.assignments.instantiate_to(variable, value, cause)
    }

    pub fn remove_node(&mut self, graph: GraphId, node: usize) -> Result<bool, Contradiction> {
        let cause = self.cause();
        self.assignments.remove_node(graph, node, cause)
    }

    pub fn remove_arc(&mut self, graph: GraphId, from: usize, to: usize) -> Result<bool, Contradiction> {
        let cause = self.cause();
        self.assignments.remove_arc(graph, from, to, cause)
    }

    pub fn enforce_node(&mut self, graph: GraphId, node: usize) -> Result<bool, Contradiction> {
        let cause = self.cause();
        self.assignments.enforce_node(graph, node, cause)
    }

    pub fn enforce_arc(&mut self, graph: GraphId, from: usize, to: usize) -> Result<bool, Contradiction> {
        let cause = self.cause();
        self.assignments.enforce_arc(graph, from, to, cause)
    }

    /// A [`Contradiction`] attributed to this propagator.
    pub fn contradiction(&self, message: &'static str) -> Contradiction {
        Contradiction::new(self.cause(), message)
    }
}
