use std::ops::Range;

use super::DeltaEntry;
use super::GraphElement;
use super::RemovedRange;
use crate::basic_types::Cause;
use crate::engine::notifications::DomainEvent;
use crate::engine::variables::GraphId;
use crate::engine::variables::IntVar;
use crate::engine::variables::ViewModifier;
use crate::engine::Assignments;

/// The consumption state of a monitor over one delta.
///
/// `[first, last)` is the consumed prefix and `[frozen_first, frozen_last)` the window which is
/// replayed between a freeze and the matching unfreeze.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct MonitorWindow {
    first: usize,
    last: usize,
    frozen_first: usize,
    frozen_last: usize,
    stamp: u64,
}

impl MonitorWindow {
    fn freeze(&mut self, delta_len: usize, stamp: u64) {
        if self.stamp != stamp {
            // The delta was cleared by a change of world; everything in it is new.
            self.first = 0;
            self.last = 0;
            self.stamp = stamp;
        }
        self.frozen_first = self.first;
        self.frozen_last = delta_len;
        self.last = delta_len;
    }

    fn unfreeze(&mut self, stamp: u64) {
        self.first = self.frozen_last;
        self.last = self.frozen_last;
        self.stamp = stamp;
    }

    fn frozen(&self) -> Range<usize> {
        self.frozen_first..self.frozen_last
    }
}

fn frozen_entries<'a, Payload>(
    entries: &'a [DeltaEntry<Payload>],
    window: &MonitorWindow,
    owner: Cause,
) -> impl Iterator<Item = &'a DeltaEntry<Payload>> {
    entries
        .get(window.frozen())
        .unwrap_or_default()
        .iter()
        .filter(move |entry| owner == Cause::Null || entry.cause != owner)
}

/// Replays the removals of an integer variable which were not caused by the owner of the
/// monitor.
#[derive(Clone, Copy, Debug)]
pub struct IntDeltaMonitor {
    variable: IntVar,
    owner: Cause,
    window: MonitorWindow,
}

impl IntDeltaMonitor {
    pub fn new(variable: IntVar, owner: Cause) -> Self {
        IntDeltaMonitor {
            variable,
            owner,
            window: MonitorWindow::default(),
        }
    }

    pub fn variable(&self) -> IntVar {
        self.variable
    }

    pub fn freeze(&mut self, assignments: &Assignments) {
        let delta_len = assignments.integer_delta(self.variable.domain()).len();
        self.window.freeze(delta_len, assignments.world_stamp());
    }

    pub fn unfreeze(&mut self, assignments: &Assignments) {
        self.window.unfreeze(assignments.world_stamp());
    }

    /// The number of frozen entries, including the ones caused by the owner.
    pub fn num_frozen(&self) -> usize {
        self.window.frozen().len()
    }

    /// Calls `visit` for every value, as seen through the view of the monitored variable, in the
    /// removed ranges of the frozen window. Values can be visited more than once.
    pub fn for_each_removal(&self, assignments: &Assignments, mut visit: impl FnMut(i32)) {
        let domain = self.variable.domain();
        let entries = assignments.integer_delta(domain);
        for entry in frozen_entries(entries, &self.window, self.owner) {
            let RemovedRange { lower, upper } = entry.payload;
            for value in lower..=upper {
                match self.variable.modifier() {
                    ViewModifier::Identity => visit(value),
                    ViewModifier::Minus => visit(-value),
                    ViewModifier::Abs => {
                        if !assignments.domain_contains(domain, -value) {
                            visit(value.abs())
                        }
                    }
                }
            }
        }
    }
}

/// Replays the mutations of a graph variable which were not caused by the owner of the
/// monitor.
#[derive(Clone, Copy, Debug)]
pub struct GraphDeltaMonitor {
    graph: GraphId,
    owner: Cause,
    window: MonitorWindow,
}

impl GraphDeltaMonitor {
    pub fn new(graph: GraphId, owner: Cause) -> Self {
        GraphDeltaMonitor {
            graph,
            owner,
            window: MonitorWindow::default(),
        }
    }

    pub fn freeze(&mut self, assignments: &Assignments) {
        let delta_len = assignments.graph_delta(self.graph).len();
        self.window.freeze(delta_len, assignments.world_stamp());
    }

    pub fn unfreeze(&mut self, assignments: &Assignments) {
        self.window.unfreeze(assignments.world_stamp());
    }

    /// Visits the nodes of the frozen entries with the given event.
    pub fn for_each_node(
        &self,
        assignments: &Assignments,
        event: DomainEvent,
        mut visit: impl FnMut(usize),
    ) {
        let entries = assignments.graph_delta(self.graph);
        for entry in frozen_entries(entries, &self.window, self.owner) {
            if let (true, GraphElement::Node(node)) = (entry.event == event, entry.payload) {
                visit(node)
            }
        }
    }

    /// Visits the arcs of the frozen entries with the given event.
    pub fn for_each_arc(
        &self,
        assignments: &Assignments,
        event: DomainEvent,
        mut visit: impl FnMut(usize, usize),
    ) {
        let entries = assignments.graph_delta(self.graph);
        for entry in frozen_entries(entries, &self.window, self.owner) {
            if let (true, GraphElement::Arc(from, to)) = (entry.event == event, entry.payload) {
                visit(from, to)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::PropagatorId;

    #[test]
    fn a_second_freeze_without_mutations_replays_nothing() {
        let mut assignments = Assignments::default();
        let x = assignments.new_integer_domain(0, 9, true);
        let mut monitor = IntDeltaMonitor::new(x.into(), Cause::Propagator(PropagatorId(0)));

        let _ = assignments
            .remove_value(x, 4, Cause::Decision)
            .expect("non-empty");
        let _ = assignments
            .update_upper_bound(x, 7, Cause::Decision)
            .expect("non-empty");

        let mut removed = vec![];
        monitor.freeze(&assignments);
        monitor.for_each_removal(&assignments, |value| removed.push(value));
        monitor.for_each_removal(&assignments, |_| {});
        monitor.unfreeze(&assignments);
        assert_eq!(vec![4, 8, 9], removed);

        monitor.freeze(&assignments);
        let mut replayed = 0;
        monitor.for_each_removal(&assignments, |_| replayed += 1);
        monitor.unfreeze(&assignments);
        assert_eq!(0, replayed);
    }

    #[test]
    fn own_mutations_are_skipped() {
        let mut assignments = Assignments::default();
        let x = assignments.new_integer_domain(0, 9, true);
        let owner = Cause::Propagator(PropagatorId(3));
        let mut monitor = IntDeltaMonitor::new(x.into(), owner);

        let _ = assignments.remove_value(x, 2, owner).expect("non-empty");
        let _ = assignments
            .remove_value(x, 5, Cause::Propagator(PropagatorId(1)))
            .expect("non-empty");

        let mut removed = vec![];
        monitor.freeze(&assignments);
        monitor.for_each_removal(&assignments, |value| removed.push(value));
        monitor.unfreeze(&assignments);

        assert_eq!(vec![5], removed);
        assert_eq!(2, monitor.num_frozen());
    }

    #[test]
    fn a_restored_world_resets_the_monitor() {
        let mut assignments = Assignments::default();
        let x = assignments.new_integer_domain(0, 9, true);
        let mut monitor = IntDeltaMonitor::new(x.into(), Cause::Null);

        assignments.new_checkpoint();
        let _ = assignments.remove_value(x, 1, Cause::Decision).expect("non-empty");
        let _ = assignments.remove_value(x, 2, Cause::Decision).expect("non-empty");
        monitor.freeze(&assignments);
        monitor.unfreeze(&assignments);

        assignments.restore_to(0);
        monitor.freeze(&assignments);
        assert_eq!(0, monitor.num_frozen());
        monitor.unfreeze(&assignments);

        let _ = assignments.remove_value(x, 6, Cause::Decision).expect("non-empty");
        let mut removed = vec![];
        monitor.freeze(&assignments);
        monitor.for_each_removal(&assignments, |value| removed.push(value));
        assert_eq!(vec![6], removed);
    }

    #[test]
    fn removals_are_seen_through_the_view() {
        let mut assignments = Assignments::default();
        let x = assignments.new_integer_domain(-3, 3, true);
        let mut negated = IntDeltaMonitor::new(IntVar::from(x).negated().expect("a domain can be negated"), Cause::Null);
        let mut absolute = IntDeltaMonitor::new(IntVar::from(x).absolute(), Cause::Null);

        let _ = assignments.remove_value(x, 2, Cause::Decision).expect("non-empty");
        let _ = assignments.remove_value(x, -1, Cause::Decision).expect("non-empty");

        let mut seen_negated = vec![];
        negated.freeze(&assignments);
        negated.for_each_removal(&assignments, |value| seen_negated.push(value));
        assert_eq!(vec![-2, 1], seen_negated);

        // |x| = 2 is still supported by -2, and |x| = 1 by 1.
        let mut seen_absolute = vec![];
        absolute.freeze(&assignments);
        absolute.for_each_removal(&assignments, |value| seen_absolute.push(value));
        assert!(seen_absolute.is_empty());
    }

    #[test]
    fn graph_monitors_filter_by_event() {
        let mut assignments = Assignments::default();
        let graph = assignments.new_graph_domain(
            3,
            crate::engine::GraphKind::Directed,
            [(0, 1), (1, 2), (0, 2)],
        );
        let mut monitor = GraphDeltaMonitor::new(graph, Cause::Null);

        let _ = assignments
            .remove_node(graph, 1, Cause::Decision)
            .expect("node is optional");

        let mut arcs = vec![];
        let mut nodes = vec![];
        monitor.freeze(&assignments);
        monitor.for_each_arc(&assignments, DomainEvent::RemoveArc, |from, to| {
            arcs.push((from, to))
        });
        monitor.for_each_node(&assignments, DomainEvent::RemoveNode, |node| nodes.push(node));
        monitor.unfreeze(&assignments);

        assert_eq!(vec![(1, 2), (0, 1)], arcs);
        assert_eq!(vec![1], nodes);
    }
}
