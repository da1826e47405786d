use enumset::EnumSet;

use crate::basic_types::Contradiction;
use crate::basic_types::FatalError;
use crate::basic_types::PropagationStatus;
use crate::engine::notifications::DomainEvent;
use crate::engine::notifications::DomainEvents;
use crate::engine::variables::GraphId;
use crate::engine::Assignments;
use crate::engine::GraphDeltaMonitor;
use crate::engine::GraphDomainRef;
use crate::graph::find_dominators;
use crate::graph::StaticGraph;
use crate::options::DominatorAlgorithm;
use crate::propagation::Entailment;
use crate::propagation::LocalId;
use crate::propagation::Priority;
use crate::propagation::PropagationContext;
use crate::propagation::Propagator;
use crate::propagation::PropagatorConstructor;
use crate::propagation::PropagatorConstructorContext;

const ID_GRAPH: LocalId = LocalId::from(0);

/// Which way the arcs of the tree point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TreeOrientation {
    /// Every node is reached from the root; every other node has exactly one predecessor.
    #[default]
    Arborescence,
    /// Every node reaches the root, which acts as a sink; every other node has exactly one
    /// successor.
    AntiArborescence,
}

/// The [`PropagatorConstructor`] for the [`ArborescencePropagator`].
#[derive(Clone, Copy, Debug)]
pub struct ArborescenceArgs {
    pub graph: GraphId,
    /// The root of an arborescence, or the sink of an anti-arborescence.
    pub root: usize,
    pub orientation: TreeOrientation,
}

impl PropagatorConstructor for ArborescenceArgs {
    type PropagatorImpl = ArborescencePropagator;

    fn create(self, mut context: PropagatorConstructorContext) -> Result<Self::PropagatorImpl, FatalError> {
        let ArborescenceArgs {
            graph,
            root,
            orientation,
        } = self;

        let domain = context.assignments().graph(graph);
        if !domain.is_directed() {
            return Err(FatalError::InvalidModel("an arborescence needs a directed graph"));
        }
        if root >= domain.num_nodes() {
            return Err(FatalError::InvalidModel("the root of an arborescence must be a node"));
        }

        context.register_graph(graph, DomainEvents::ANY_GRAPH, ID_GRAPH);

        Ok(ArborescencePropagator {
            graph,
            root,
            orientation,
            algorithm: context.options().dominator_algorithm,
            monitor: context.graph_delta_monitor(graph),
        })
    }
}

/// Ensures that the graph is a spanning arborescence rooted at `root` (or, mirrored, an
/// anti-arborescence towards it).
///
/// An arc from a node back to one of its dominators closes a cycle, so it is removed. Without
/// the root, every node needs a single incoming arc (outgoing for an anti-arborescence).
#[derive(Clone, Debug)]
pub struct ArborescencePropagator {
    graph: GraphId,
    root: usize,
    orientation: TreeOrientation,
    algorithm: DominatorAlgorithm,
    monitor: GraphDeltaMonitor,
}

impl Propagator for ArborescencePropagator {
    fn name(&self) -> &str {
        match self.orientation {
            TreeOrientation::Arborescence => "Arborescence",
            TreeOrientation::AntiArborescence => "AntiArborescence",
        }
    }

    fn priority(&self) -> Priority {
        Priority::Medium
    }

    fn propagate(&mut self, mut context: PropagationContext, _events: EnumSet<DomainEvent>) -> PropagationStatus {
        self.monitor.freeze(context.assignments());
        self.monitor.unfreeze(context.assignments());

        let num_nodes = context.graph(self.graph).num_nodes();
        for node in 0..num_nodes {
            let _ = context.enforce_node(self.graph, node)?;
            let _ = context.remove_arc(self.graph, node, node)?;
            let _ = match self.orientation {
                TreeOrientation::Arborescence => context.remove_arc(self.graph, node, self.root)?,
                TreeOrientation::AntiArborescence => context.remove_arc(self.graph, self.root, node)?,
            };
        }

        self.prune(&mut context)
    }

    fn propagate_on(
        &mut self,
        mut context: PropagationContext,
        _local_id: LocalId,
        _events: EnumSet<DomainEvent>,
    ) -> PropagationStatus {
        // Only arcs leaving the envelope change the dominators, and only arcs entering the
        // kernel change the degrees.
        let mut is_relevant = false;
        self.monitor.freeze(context.assignments());
        self.monitor
            .for_each_arc(context.assignments(), DomainEvent::RemoveArc, |_, _| is_relevant = true);
        self.monitor
            .for_each_arc(context.assignments(), DomainEvent::EnforceArc, |_, _| is_relevant = true);
        self.monitor.unfreeze(context.assignments());

        if !is_relevant {
            return Ok(());
        }
        self.prune(&mut context)
    }

    fn is_entailed(&self, assignments: &Assignments) -> Entailment {
        let graph = assignments.graph(self.graph);
        if !graph.is_instantiated() {
            return Entailment::Undefined;
        }

        let num_nodes = graph.num_nodes();
        let all_nodes = (0..num_nodes).all(|node| graph.kernel_contains_node(node));
        let degrees_hold = (0..num_nodes).all(|node| {
            let degree = self.tree_degree(graph, node, Set::Kernel);
            if node == self.root {
                degree == 0
            } else {
                degree == 1
            }
        });
        let spans = find_dominators(&self.flow_graph(graph), self.root, self.algorithm).is_some();

        Entailment::from_bool(all_nodes && degrees_hold && spans)
    }
}

#[derive(Clone, Copy, Debug)]
enum Set {
    Envelope,
    Kernel,
}

impl ArborescencePropagator {
    fn prune(&self, context: &mut PropagationContext) -> PropagationStatus {
        loop {
            let mut changed = self.prune_dominated_arcs(context)?;
            changed |= self.enforce_tree_degrees(context)?;
            if !changed {
                break;
            }
        }

        if context.graph(self.graph).is_instantiated() {
            context.set_passive();
        }
        Ok(())
    }

    /// The envelope seen from the root: itself for an arborescence, reversed for an
    /// anti-arborescence.
    fn flow_graph(&self, graph: GraphDomainRef<'_>) -> StaticGraph {
        let envelope = StaticGraph::from_envelope(graph);
        match self.orientation {
            TreeOrientation::Arborescence => envelope,
            TreeOrientation::AntiArborescence => envelope.reversed(),
        }
    }

    fn prune_dominated_arcs(&self, context: &mut PropagationContext) -> Result<bool, Contradiction> {
        let graph = context.graph(self.graph);
        let Some(dominators) = find_dominators(&self.flow_graph(graph), self.root, self.algorithm)
        else {
            return Err(context
                .contradiction("a node cannot reach the root, or be reached from it")
                .on(self.graph));
        };

        let dominated_arcs = graph
            .envelope_arcs()
            .filter(|&(from, to)| match self.orientation {
                TreeOrientation::Arborescence => dominators.is_dominated_by(from, to),
                TreeOrientation::AntiArborescence => dominators.is_dominated_by(to, from),
            })
            .collect::<Vec<_>>();

        let mut changed = false;
        for (from, to) in dominated_arcs {
            changed |= context.remove_arc(self.graph, from, to)?;
        }
        Ok(changed)
    }

    /// The number of arcs of `node` which belong to the tree: incoming for an arborescence,
    /// outgoing for an anti-arborescence.
    fn tree_degree(&self, graph: GraphDomainRef<'_>, node: usize, set: Set) -> usize {
        match (self.orientation, set) {
            (TreeOrientation::Arborescence, Set::Envelope) => graph.envelope_predecessors(node).count(),
            (TreeOrientation::Arborescence, Set::Kernel) => graph.kernel_predecessors(node).count(),
            (TreeOrientation::AntiArborescence, Set::Envelope) => graph.envelope_successors(node).count(),
            (TreeOrientation::AntiArborescence, Set::Kernel) => graph.kernel_successors(node).count(),
        }
    }

    /// The tree arcs of `node` as `(from, to)` pairs.
    fn tree_arcs(&self, graph: GraphDomainRef<'_>, node: usize, set: Set) -> Vec<(usize, usize)> {
        match (self.orientation, set) {
            (TreeOrientation::Arborescence, Set::Envelope) => {
                graph.envelope_predecessors(node).map(|from| (from, node)).collect()
            }
            (TreeOrientation::Arborescence, Set::Kernel) => {
                graph.kernel_predecessors(node).map(|from| (from, node)).collect()
            }
            (TreeOrientation::AntiArborescence, Set::Envelope) => {
                graph.envelope_successors(node).map(|to| (node, to)).collect()
            }
            (TreeOrientation::AntiArborescence, Set::Kernel) => {
                graph.kernel_successors(node).map(|to| (node, to)).collect()
            }
        }
    }

    /// Every node other than the root keeps exactly one tree arc.
    fn enforce_tree_degrees(&self, context: &mut PropagationContext) -> Result<bool, Contradiction> {
        let mut changed = false;

        for node in 0..context.graph(self.graph).num_nodes() {
            if node == self.root {
                continue;
            }

            let graph = context.graph(self.graph);
            let kernel_arcs = self.tree_arcs(graph, node, Set::Kernel);
            if kernel_arcs.len() > 1 {
                return Err(context
                    .contradiction("a node has more than one parent in the tree")
                    .on(self.graph));
            }

            if let Some(&kept) = kernel_arcs.first() {
                if self.tree_degree(graph, node, Set::Envelope) > 1 {
                    for (from, to) in self.tree_arcs(graph, node, Set::Envelope) {
                        if (from, to) != kept {
                            changed |= context.remove_arc(self.graph, from, to)?;
                        }
                    }
                }
                continue;
            }

            if let [(from, to)] = self.tree_arcs(graph, node, Set::Envelope)[..] {
                changed |= context.enforce_arc(self.graph, from, to)?;
            }
        }

        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::Cause;
    use crate::basic_types::Inconsistency;
    use crate::engine::GraphKind;
    use crate::engine::State;
    use crate::propagation::PropagatorId;

    fn arborescence(
        state: &mut State,
        graph: GraphId,
        root: usize,
        orientation: TreeOrientation,
    ) -> PropagatorId {
        state
            .add_propagator(ArborescenceArgs {
                graph,
                root,
                orientation,
            })
            .expect("valid arborescence")
    }

    #[test]
    fn a_mandatory_path_prunes_the_shortcut() {
        let mut state = State::default();
        // root 0 -> a 1 -> b 2 -> sink 3, with the shortcut 0 -> 2.
        let graph = state.new_graph_variable(4, GraphKind::Directed, [(0, 1), (1, 2), (2, 3), (0, 2)]);
        for (from, to) in [(0, 1), (1, 2), (2, 3)] {
            let _ = state
                .assignments_mut()
                .enforce_arc(graph, from, to, Cause::Null)
                .expect("arc is in the envelope");
        }
        let propagator = arborescence(&mut state, graph, 0, TreeOrientation::Arborescence);

        state.propagate_to_fixed_point().expect("no contradiction");

        assert!(!state.graph(graph).envelope_contains_arc(0, 2));
        assert!(state.graph(graph).is_instantiated());
        assert_eq!(Entailment::True, state.is_entailed(propagator));
    }

    #[test]
    fn arcs_back_to_a_dominator_are_removed() {
        let mut state = State::default();
        let graph = state.new_graph_variable(3, GraphKind::Directed, [(0, 1), (1, 2), (2, 1)]);
        let _ = arborescence(&mut state, graph, 0, TreeOrientation::Arborescence);

        state.propagate_to_fixed_point().expect("no contradiction");

        let graph = state.graph(graph);
        assert!(!graph.envelope_contains_arc(2, 1));
        assert!(graph.kernel_contains_arc(0, 1));
        assert!(graph.kernel_contains_arc(1, 2));
    }

    #[test]
    fn arcs_into_the_root_and_loops_are_removed() {
        let mut state = State::default();
        let graph = state.new_graph_variable(
            3,
            GraphKind::Directed,
            [(0, 1), (0, 2), (1, 2), (2, 1), (1, 0), (1, 1)],
        );
        let _ = arborescence(&mut state, graph, 0, TreeOrientation::Arborescence);

        state.propagate_to_fixed_point().expect("no contradiction");

        let graph = state.graph(graph);
        assert!(!graph.envelope_contains_arc(1, 0));
        assert!(!graph.envelope_contains_arc(1, 1));
        assert!(graph.kernel_contains_node(2));
        assert!(graph.envelope_contains_arc(1, 2));
        assert!(graph.envelope_contains_arc(2, 1));
    }

    #[test]
    fn anti_arborescences_prune_with_post_dominators() {
        let mut state = State::default();
        // Everything flows into the sink 0 through 1.
        let graph = state.new_graph_variable(3, GraphKind::Directed, [(1, 0), (2, 1), (1, 2)]);
        let _ = arborescence(&mut state, graph, 0, TreeOrientation::AntiArborescence);

        state.propagate_to_fixed_point().expect("no contradiction");

        let graph = state.graph(graph);
        assert!(!graph.envelope_contains_arc(1, 2));
        assert!(graph.kernel_contains_arc(2, 1));
        assert!(graph.kernel_contains_arc(1, 0));
    }

    #[test]
    fn an_unreachable_node_is_a_contradiction() {
        let mut state = State::default();
        let graph = state.new_graph_variable(3, GraphKind::Directed, [(0, 1), (2, 1)]);
        let _ = arborescence(&mut state, graph, 0, TreeOrientation::Arborescence);

        assert!(matches!(
            state.propagate_to_fixed_point(),
            Err(Inconsistency::Contradiction(_))
        ));
    }

    #[test]
    fn removing_an_arc_later_triggers_pruning() {
        let mut state = State::default();
        let graph = state.new_graph_variable(
            4,
            GraphKind::Directed,
            [(0, 1), (0, 2), (1, 3), (2, 3), (3, 1)],
        );
        let _ = arborescence(&mut state, graph, 0, TreeOrientation::Arborescence);
        state.propagate_to_fixed_point().expect("no contradiction");
        assert!(state.graph(graph).envelope_contains_arc(3, 1));

        state.new_checkpoint();
        let _ = state
            .assignments_mut()
            .remove_arc(graph, 0, 1, Cause::Decision)
            .expect("arc is optional");
        state.propagate_to_fixed_point().expect("no contradiction");

        // 1 can now only be reached through 3, so 3 -> 1 is its parent and 1 -> 3 closes a cycle.
        let domain = state.graph(graph);
        assert!(domain.kernel_contains_arc(3, 1));
        assert!(!domain.envelope_contains_arc(1, 3));
        assert!(domain.kernel_contains_arc(2, 3));

        state.restore_to(0);
        assert!(state.graph(graph).envelope_contains_arc(0, 1));
    }

    #[test]
    fn undirected_graphs_are_rejected() {
        let mut state = State::default();
        let graph = state.new_graph_variable(2, GraphKind::Undirected, [(0, 1)]);

        let result = state.add_propagator(ArborescenceArgs {
            graph,
            root: 0,
            orientation: TreeOrientation::Arborescence,
        });

        assert!(matches!(result, Err(FatalError::InvalidModel(_))));
    }
}
