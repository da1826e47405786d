use enumset::EnumSet;

use crate::basic_types::Contradiction;
use crate::basic_types::FatalError;
use crate::basic_types::PropagationStatus;
use crate::engine::notifications::DomainEvent;
use crate::engine::notifications::DomainEvents;
use crate::engine::variables::GraphId;
use crate::engine::variables::IntVar;
use crate::engine::Assignments;
use crate::graph::find_connectivity;
use crate::graph::StaticGraph;
use crate::propagation::Entailment;
use crate::propagation::LocalId;
use crate::propagation::Priority;
use crate::propagation::PropagationContext;
use crate::propagation::Propagator;
use crate::propagation::PropagatorConstructor;
use crate::propagation::PropagatorConstructorContext;

const ID_GRAPH: LocalId = LocalId::from(0);
const ID_K: LocalId = LocalId::from(1);

/// The [`PropagatorConstructor`] for the [`KConnectedComponentsPropagator`].
#[derive(Clone, Copy, Debug)]
pub struct KConnectedComponentsArgs {
    pub graph: GraphId,
    /// The number of connected components of the final graph.
    pub k: IntVar,
}

impl PropagatorConstructor for KConnectedComponentsArgs {
    type PropagatorImpl = KConnectedComponentsPropagator;

    fn create(self, mut context: PropagatorConstructorContext) -> Result<Self::PropagatorImpl, FatalError> {
        let KConnectedComponentsArgs { graph, k } = self;

        context.register_graph(graph, DomainEvents::ANY_GRAPH, ID_GRAPH);
        context.register(k, DomainEvents::BOUNDS, ID_K);

        Ok(KConnectedComponentsPropagator { graph, k })
    }
}

/// Ensures that the final graph consists of exactly `k` connected components, ignoring the
/// direction of arcs.
///
/// The kernel components can only merge, and every optional node can at most add a component of
/// its own, which bounds `k`. When `k` reaches one of its bounds, the envelope is pruned so that
/// the bound can still be met.
#[derive(Clone, Copy, Debug)]
pub struct KConnectedComponentsPropagator {
    graph: GraphId,
    k: IntVar,
}

/// How the envelope and the kernel are split into components.
#[derive(Debug)]
struct ComponentBounds {
    /// The fewest components the final graph can have: one per envelope component with a
    /// mandatory node.
    min: usize,
    /// The most components the final graph can have.
    max: usize,
}

impl Propagator for KConnectedComponentsPropagator {
    fn name(&self) -> &str {
        "KConnectedComponents"
    }

    fn priority(&self) -> Priority {
        Priority::Low
    }

    fn propagate(&mut self, mut context: PropagationContext, _events: EnumSet<DomainEvent>) -> PropagationStatus {
        while self.propagate_once(&mut context)? {}

        if context.graph(self.graph).is_instantiated() && context.is_fixed(self.k) {
            context.set_passive();
        }
        Ok(())
    }

    fn is_entailed(&self, assignments: &Assignments) -> Entailment {
        let graph = assignments.graph(self.graph);
        if !graph.is_instantiated() {
            return Entailment::Undefined;
        }

        let kernel = StaticGraph::from_kernel(graph);
        let num_components = find_connectivity(&kernel, |_| true).num_components();
        match self.k.fixed_value(assignments) {
            Some(k) => Entailment::from_bool(k as usize == num_components),
            None if !self.k.contains(assignments, num_components as i32) => Entailment::False,
            None => Entailment::Undefined,
        }
    }
}

impl KConnectedComponentsPropagator {
    fn propagate_once(&self, context: &mut PropagationContext) -> Result<bool, Contradiction> {
        let graph = context.graph(self.graph);
        let envelope = StaticGraph::from_envelope(graph);
        let connectivity = find_connectivity(&envelope, |node| graph.kernel_contains_node(node));

        let kernel = StaticGraph::from_kernel(graph);
        let kernel_connectivity = find_connectivity(&kernel, |_| true);

        let has_mandatory_node = connectivity
            .components
            .iter()
            .map(|component| component.iter().any(|&node| graph.kernel_contains_node(node)))
            .collect::<Vec<_>>();
        let bounds = ComponentBounds {
            min: has_mandatory_node.iter().filter(|&&mandatory| mandatory).count(),
            max: kernel_connectivity.num_components() + graph.envelope_order() - graph.kernel_order(),
        };
        let is_directed = graph.is_directed();

        let mut changed = context.update_lower_bound(self.k, clamp(bounds.min))?;
        changed |= context.update_upper_bound(self.k, clamp(bounds.max))?;

        let Some(k) = context.fixed_value(self.k) else {
            return Ok(changed);
        };
        let k = k as usize;

        if k == bounds.max {
            // Every kernel component and every optional node has to stay a component of its own.
            let num_nodes = context.graph(self.graph).num_nodes();
            let part = |node: usize| {
                kernel_connectivity.component_of[node].unwrap_or(num_nodes + node)
            };
            let separating_arcs = context
                .graph(self.graph)
                .envelope_arcs()
                .filter(|&(from, to)| part(from) != part(to))
                .collect::<Vec<_>>();

            for (from, to) in separating_arcs {
                changed |= context.remove_arc(self.graph, from, to)?;
            }
        }

        if k == bounds.min {
            for (component, _) in connectivity
                .components
                .iter()
                .zip(&has_mandatory_node)
                .filter(|(_, mandatory)| !**mandatory)
            {
                for &node in component {
                    changed |= context.remove_node(self.graph, node)?;
                }
            }

            for &node in &connectivity.articulation_points {
                changed |= context.enforce_node(self.graph, node)?;
            }

            for &(parent, child) in &connectivity.bridges {
                if !is_directed {
                    changed |= context.enforce_arc(self.graph, parent, child)?;
                    continue;
                }

                let graph = context.graph(self.graph);
                match (
                    graph.envelope_contains_arc(parent, child),
                    graph.envelope_contains_arc(child, parent),
                ) {
                    (true, false) => changed |= context.enforce_arc(self.graph, parent, child)?,
                    (false, true) => changed |= context.enforce_arc(self.graph, child, parent)?,
                    _ => {
                        changed |= context.enforce_node(self.graph, parent)?;
                        changed |= context.enforce_node(self.graph, child)?;
                    }
                }
            }
        }

        Ok(changed)
    }
}

fn clamp(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::Cause;
    use crate::basic_types::Inconsistency;
    use crate::engine::variables::DomainId;
    use crate::engine::GraphKind;
    use crate::engine::State;

    fn k_connected_components(state: &mut State, graph: GraphId, k: DomainId) {
        let _ = state
            .add_propagator(KConnectedComponentsArgs {
                graph,
                k: k.into(),
            })
            .expect("no fatal error");
    }

    #[test]
    fn k_is_bounded_by_the_components() {
        let mut state = State::default();
        // Two envelope components: 0 - 1 - 2 and 3 - 4.
        let graph = state.new_graph_variable(5, GraphKind::Undirected, [(0, 1), (1, 2), (3, 4)]);
        let k = state.new_interval_variable(0, 10);
        let _ = state
            .assignments_mut()
            .enforce_node(graph, 0, Cause::Null)
            .expect("node is in the envelope");
        let _ = state
            .assignments_mut()
            .enforce_node(graph, 2, Cause::Null)
            .expect("node is in the envelope");
        k_connected_components(&mut state, graph, k);

        state.propagate_to_fixed_point().expect("no contradiction");

        // The kernel has two components and three optional nodes.
        assert_eq!(1, state.lower_bound(k));
        assert_eq!(5, state.upper_bound(k));
    }

    #[test]
    fn the_minimum_enforces_separators_and_drops_optional_components() {
        let mut state = State::default();
        let graph = state.new_graph_variable(5, GraphKind::Undirected, [(0, 1), (1, 2), (3, 4)]);
        let k = state.new_interval_variable(1, 1);
        let _ = state
            .assignments_mut()
            .enforce_node(graph, 0, Cause::Null)
            .expect("node is in the envelope");
        let _ = state
            .assignments_mut()
            .enforce_node(graph, 2, Cause::Null)
            .expect("node is in the envelope");
        k_connected_components(&mut state, graph, k);

        state.propagate_to_fixed_point().expect("no contradiction");

        let graph = state.graph(graph);
        assert!(graph.kernel_contains_node(1));
        assert!(graph.kernel_contains_arc(0, 1));
        assert!(graph.kernel_contains_arc(1, 2));
        assert!(!graph.envelope_contains_node(3));
        assert!(!graph.envelope_contains_node(4));
        assert!(graph.is_instantiated());
    }

    #[test]
    fn the_maximum_separates_the_kernel_components() {
        let mut state = State::default();
        let graph = state.new_graph_variable(3, GraphKind::Undirected, [(0, 1), (1, 2), (0, 2)]);
        let k = state.new_interval_variable(3, 3);
        for node in 0..3 {
            let _ = state
                .assignments_mut()
                .enforce_node(graph, node, Cause::Null)
                .expect("node is in the envelope");
        }
        k_connected_components(&mut state, graph, k);

        state.propagate_to_fixed_point().expect("no contradiction");

        assert_eq!(0, state.graph(graph).envelope_arcs().count());
    }

    #[test]
    fn directed_bridges_keep_their_direction() {
        let mut state = State::default();
        let graph = state.new_graph_variable(3, GraphKind::Directed, [(1, 0), (1, 2), (2, 1)]);
        let k = state.new_interval_variable(1, 1);
        let _ = state
            .assignments_mut()
            .enforce_node(graph, 0, Cause::Null)
            .expect("node is in the envelope");
        let _ = state
            .assignments_mut()
            .enforce_node(graph, 2, Cause::Null)
            .expect("node is in the envelope");
        k_connected_components(&mut state, graph, k);

        state.propagate_to_fixed_point().expect("no contradiction");

        let graph = state.graph(graph);
        assert!(graph.kernel_contains_arc(1, 0));
        // Both directions between 1 and 2 exist, so only the endpoints are enforced.
        assert!(graph.kernel_contains_node(1));
        assert!(!graph.kernel_contains_arc(1, 2));
        assert!(!graph.kernel_contains_arc(2, 1));
    }

    #[test]
    fn too_many_mandatory_components_is_a_contradiction() {
        let mut state = State::default();
        let graph = state.new_graph_variable(4, GraphKind::Undirected, [(0, 1), (2, 3)]);
        let k = state.new_interval_variable(1, 1);
        let _ = state
            .assignments_mut()
            .enforce_node(graph, 0, Cause::Null)
            .expect("node is in the envelope");
        let _ = state
            .assignments_mut()
            .enforce_node(graph, 3, Cause::Null)
            .expect("node is in the envelope");
        k_connected_components(&mut state, graph, k);

        assert!(matches!(
            state.propagate_to_fixed_point(),
            Err(Inconsistency::Contradiction(_))
        ));
    }
}
