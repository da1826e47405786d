use enumset::EnumSet;
use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;

use crate::basic_types::FatalError;
use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatus;
use crate::containers::StorageKey;
use crate::engine::notifications::DomainEvent;
use crate::engine::notifications::DomainEvents;
use crate::engine::variables::IntVar;
use crate::engine::Assignments;
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
use crate::propagators::TreeOrientation;
use crate::statistics::StatisticLogger;

/// Which nodes are duplicated to cut the circuit into a path.
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CircuitConf {
    /// Only the first node.
    #[default]
    First,
    /// A node drawn at random on every propagation.
    Random,
    /// Every node in turn.
    All,
}

/// The [`PropagatorConstructor`] for the [`CircuitDominatorPropagator`].
#[derive(Clone, Debug)]
pub struct CircuitDominatorArgs {
    /// `successors[i] - offset` is the node following node `i` on the circuit.
    pub successors: Box<[IntVar]>,
    pub offset: i32,
    pub conf: CircuitConf,
    pub orientation: TreeOrientation,
}

impl PropagatorConstructor for CircuitDominatorArgs {
    type PropagatorImpl = CircuitDominatorPropagator;

    fn create(self, mut context: PropagatorConstructorContext) -> Result<Self::PropagatorImpl, FatalError> {
        let CircuitDominatorArgs {
            successors,
            offset,
            conf,
            orientation,
        } = self;

        if successors.is_empty() {
            return Err(FatalError::InvalidModel("a circuit needs at least one node"));
        }
        if i32::try_from(successors.len())
            .ok()
            .and_then(|num_nodes| offset.checked_add(num_nodes))
            .is_none()
        {
            return Err(FatalError::InvalidModel("the successor values of a circuit overflow"));
        }

        for (index, &successor) in successors.iter().enumerate() {
            context.register(successor, DomainEvents::ANY_INT, LocalId::create_from_index(index));
        }

        Ok(CircuitDominatorPropagator {
            successors,
            offset,
            conf,
            orientation,
            algorithm: context.options().dominator_algorithm,
            rng: SmallRng::seed_from_u64(context.options().random_seed),
            fixpoint: None,
            num_passes: 0,
        })
    }
}

/// Filters the successor variables of a circuit with dominators.
///
/// Duplicating a node `d` into a virtual node `n` turns every circuit into a Hamiltonian path
/// from `d` to `n`: the arcs into `d` are redirected into `n`. Along that path a node comes after
/// all of its dominators, so an arc from a node to one of its dominators would close a cycle which
/// skips `d`. The anti-arborescence orientation does the same on the reversed graph, with post
/// dominators computed from `n`.
#[derive(Clone, Debug)]
pub struct CircuitDominatorPropagator {
    successors: Box<[IntVar]>,
    offset: i32,
    conf: CircuitConf,
    orientation: TreeOrientation,
    algorithm: DominatorAlgorithm,
    rng: SmallRng,
    /// The world stamp and the total size of the successor domains after the last pass.
    fixpoint: Option<(u64, usize)>,
    num_passes: u64,
}

impl Propagator for CircuitDominatorPropagator {
    fn name(&self) -> &str {
        match self.orientation {
            TreeOrientation::Arborescence => "CircuitArborescenceFiltering",
            TreeOrientation::AntiArborescence => "CircuitAntiArborescenceFiltering",
        }
    }

    fn priority(&self) -> Priority {
        Priority::Low
    }

    fn propagate(&mut self, mut context: PropagationContext, _events: EnumSet<DomainEvent>) -> PropagationStatus {
        let last_value = self.offset + self.num_nodes() as i32 - 1;
        for &successor in self.successors.iter() {
            let _ = context.update_lower_bound(successor, self.offset)?;
            let _ = context.update_upper_bound(successor, last_value)?;
        }

        loop {
            let duplicated_nodes = self.duplicated_nodes();
            let mut changed = false;
            for duplicated_node in duplicated_nodes {
                changed |= self.filter_from(&mut context, duplicated_node)?;
            }
            if !changed {
                break;
            }
        }

        if self.successors.iter().all(|&successor| context.is_fixed(successor)) {
            context.set_passive();
        }
        self.num_passes += 1;
        self.fixpoint = Some(self.signature(&context));
        Ok(())
    }

    fn propagate_on(
        &mut self,
        context: PropagationContext,
        _local_id: LocalId,
        events: EnumSet<DomainEvent>,
    ) -> PropagationStatus {
        // The first pending successor of a wake-up runs the pass for all of them. Within a world
        // domains only shrink, so an unchanged total size means nothing was removed since.
        if self.fixpoint == Some(self.signature(&context)) {
            return Ok(());
        }
        self.propagate(context, events)
    }

    fn is_entailed(&self, assignments: &Assignments) -> Entailment {
        let num_nodes = self.num_nodes();
        let mut node = 0;
        for step in 1..=num_nodes {
            let Some(value) = self.successors[node].fixed_value(assignments) else {
                return Entailment::Undefined;
            };
            let Some(next) = self.node_of(value) else {
                return Entailment::False;
            };
            // The circuit may only return to the first node after visiting every node.
            if (next == 0) != (step == num_nodes) {
                return Entailment::False;
            }
            node = next;
        }
        Entailment::True
    }

    fn log_statistics(&self, statistic_logger: StatisticLogger) {
        statistic_logger
            .attach_to_prefix("passes")
            .log_statistic(self.num_passes);
    }
}

impl CircuitDominatorPropagator {
    fn num_nodes(&self) -> usize {
        self.successors.len()
    }

    fn signature(&self, context: &PropagationContext) -> (u64, usize) {
        let total_size = self
            .successors
            .iter()
            .map(|&successor| context.size(successor))
            .sum();
        (context.assignments().world_stamp(), total_size)
    }

    fn node_of(&self, value: i32) -> Option<usize> {
        usize::try_from(value - self.offset)
            .ok()
            .filter(|&node| node < self.num_nodes())
    }

    fn duplicated_nodes(&mut self) -> Vec<usize> {
        match self.conf {
            CircuitConf::First => vec![0],
            CircuitConf::Random => vec![self.rng.gen_range(0..self.num_nodes())],
            CircuitConf::All => (0..self.num_nodes()).collect(),
        }
    }

    /// The successor graph with `duplicated_node` split in two, and the root of the dominator
    /// computation.
    fn flow_graph(&self, assignments: &Assignments, duplicated_node: usize) -> (StaticGraph, usize) {
        let num_nodes = self.num_nodes();
        let virtual_node = num_nodes;
        let mut graph = StaticGraph::new(num_nodes + 1);

        for (node, &successor) in self.successors.iter().enumerate() {
            for next in successor
                .iterate_domain(assignments)
                .filter_map(|value| self.node_of(value))
            {
                match self.orientation {
                    TreeOrientation::Arborescence if next == duplicated_node => {
                        graph.add_arc(node, virtual_node)
                    }
                    TreeOrientation::Arborescence => graph.add_arc(node, next),
                    TreeOrientation::AntiArborescence if next == duplicated_node => {
                        graph.add_arc(virtual_node, node)
                    }
                    TreeOrientation::AntiArborescence => graph.add_arc(next, node),
                }
            }
        }

        let root = match self.orientation {
            TreeOrientation::Arborescence => duplicated_node,
            TreeOrientation::AntiArborescence => virtual_node,
        };
        (graph, root)
    }

    fn filter_from(
        &self,
        context: &mut PropagationContext,
        duplicated_node: usize,
    ) -> Result<bool, Inconsistency> {
        let (graph, root) = self.flow_graph(context.assignments(), duplicated_node);
        let Some(dominators) = find_dominators(&graph, root, self.algorithm) else {
            return Err(context
                .contradiction("the duplicated node does not reach every node")
                .on(self.successors[0])
                .into());
        };

        let mut changed = false;
        for (node, &successor) in self.successors.iter().enumerate() {
            let values = context
                .assignments()
                .iterate_domain(successor)
                .collect::<Vec<_>>();

            for value in values {
                let Some(next) = self.node_of(value) else {
                    continue;
                };
                if next == duplicated_node {
                    continue;
                }

                let closes_cycle = match self.orientation {
                    TreeOrientation::Arborescence => dominators.is_dominated_by(node, next),
                    TreeOrientation::AntiArborescence => dominators.is_dominated_by(next, node),
                };
                if !closes_cycle {
                    continue;
                }
                if self.orientation == TreeOrientation::AntiArborescence && node == duplicated_node {
                    return Err(FatalError::DuplicatedNodeReached {
                        node: duplicated_node,
                    }
                    .into());
                }

                changed |= context.remove_value(successor, value)?;
            }
        }

        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::Cause;
    use crate::engine::variables::DomainId;
    use crate::engine::State;
    use crate::propagation::PropagatorId;
    use crate::propagation::Propagators;

    fn successors(state: &mut State, domains: &[&[i32]]) -> Vec<DomainId> {
        domains
            .iter()
            .map(|values| state.new_sparse_variable(values.to_vec()))
            .collect()
    }

    fn circuit(
        state: &mut State,
        successors: &[DomainId],
        conf: CircuitConf,
        orientation: TreeOrientation,
    ) {
        let _ = state
            .add_propagator(CircuitDominatorArgs {
                successors: successors.iter().map(|&domain| domain.into()).collect(),
                offset: 0,
                conf,
                orientation,
            })
            .expect("valid circuit");
    }

    #[test]
    fn arcs_to_a_dominator_are_removed() {
        let mut state = State::default();
        let nodes = successors(&mut state, &[&[1], &[0, 2], &[1, 3], &[0, 1]]);
        circuit(&mut state, &nodes, CircuitConf::First, TreeOrientation::Arborescence);

        state.propagate_to_fixed_point().expect("no contradiction");

        assert_eq!(Some(3), state.fixed_value(nodes[2]));
        assert_eq!(Some(0), state.fixed_value(nodes[3]));
        assert!(state.contains(nodes[1], 0));
    }

    #[test]
    fn every_duplicated_node_contributes() {
        let mut state = State::default();
        let nodes = successors(&mut state, &[&[1], &[0, 2], &[1, 3], &[0, 1]]);
        circuit(&mut state, &nodes, CircuitConf::All, TreeOrientation::Arborescence);

        state.propagate_to_fixed_point().expect("no contradiction");

        assert_eq!(Some(2), state.fixed_value(nodes[1]));
        assert_eq!(Some(3), state.fixed_value(nodes[2]));
        assert_eq!(Some(0), state.fixed_value(nodes[3]));
    }

    fn num_passes(state: &State, propagator: PropagatorId) -> u64 {
        match &state.propagators.get(propagator).propagator {
            Propagators::CircuitDominator(circuit) => circuit.num_passes,
            other => panic!("not a circuit: {other:?}"),
        }
    }

    #[test]
    fn several_changed_successors_share_one_pass() {
        let mut state = State::default();
        let nodes = (0..5)
            .map(|_| state.new_interval_variable(0, 4))
            .collect::<Vec<_>>();
        let propagator = state
            .add_propagator(CircuitDominatorArgs {
                successors: nodes.iter().map(|&domain| domain.into()).collect(),
                offset: 0,
                conf: CircuitConf::All,
                orientation: TreeOrientation::Arborescence,
            })
            .expect("valid circuit");
        state.propagate_to_fixed_point().expect("no contradiction");
        let passes = num_passes(&state, propagator);

        state.new_checkpoint();
        let _ = state
            .assignments_mut()
            .remove_value(nodes[0], 3, Cause::Decision)
            .expect("3 is not the only value");
        let _ = state
            .assignments_mut()
            .remove_value(nodes[1], 4, Cause::Decision)
            .expect("4 is not the only value");
        let _ = state
            .assignments_mut()
            .remove_value(nodes[2], 1, Cause::Decision)
            .expect("1 is not the only value");
        state.propagate_to_fixed_point().expect("no contradiction");

        assert_eq!(passes + 1, num_passes(&state, propagator));
    }

    #[test]
    fn a_restored_world_is_propagated_again() {
        let mut state = State::default();
        let nodes = successors(&mut state, &[&[1, 2, 3], &[0, 2, 3], &[0, 1, 3], &[0, 1, 2]]);
        let propagator = state
            .add_propagator(CircuitDominatorArgs {
                successors: nodes.iter().map(|&domain| domain.into()).collect(),
                offset: 0,
                conf: CircuitConf::All,
                orientation: TreeOrientation::Arborescence,
            })
            .expect("valid circuit");
        state.propagate_to_fixed_point().expect("no contradiction");

        state.new_checkpoint();
        let _ = state
            .assignments_mut()
            .remove_value(nodes[0], 1, Cause::Decision)
            .expect("1 is not the only value");
        state.propagate_to_fixed_point().expect("no contradiction");

        // The other branch leaves the domains with the same total size.
        state.restore_to(0);
        state.new_checkpoint();
        let _ = state
            .assignments_mut()
            .remove_value(nodes[0], 2, Cause::Decision)
            .expect("2 is not the only value");
        let passes = num_passes(&state, propagator);
        state.propagate_to_fixed_point().expect("no contradiction");

        assert_eq!(passes + 1, num_passes(&state, propagator));
    }

    #[test]
    fn the_anti_orientation_uses_post_dominators() {
        // Node 1 can only continue to 2, so 2 -> 1 would close a cycle without 0.
        let domains: [&[i32]; 3] = [&[1, 2], &[2], &[0, 1]];

        let mut state = State::default();
        let nodes = successors(&mut state, &domains);
        circuit(&mut state, &nodes, CircuitConf::First, TreeOrientation::AntiArborescence);
        state.propagate_to_fixed_point().expect("no contradiction");
        assert_eq!(Some(0), state.fixed_value(nodes[2]));

        let mut state = State::default();
        let nodes = successors(&mut state, &domains);
        circuit(&mut state, &nodes, CircuitConf::First, TreeOrientation::Arborescence);
        state.propagate_to_fixed_point().expect("no contradiction");
        assert!(state.contains(nodes[2], 1));
    }

    #[test]
    fn an_unreachable_duplicated_node_is_a_contradiction() {
        let mut state = State::default();
        let nodes = successors(&mut state, &[&[1], &[2], &[1]]);
        circuit(&mut state, &nodes, CircuitConf::First, TreeOrientation::Arborescence);

        assert!(matches!(
            state.propagate_to_fixed_point(),
            Err(Inconsistency::Contradiction(_))
        ));
    }

    #[test]
    fn successors_are_bounded_by_the_nodes() {
        let mut state = State::default();
        let nodes = (0..3)
            .map(|_| state.new_interval_variable(-5, 10))
            .collect::<Vec<_>>();
        let _ = state
            .add_propagator(CircuitDominatorArgs {
                successors: nodes.iter().map(|&domain| domain.into()).collect(),
                offset: 1,
                conf: CircuitConf::Random,
                orientation: TreeOrientation::Arborescence,
            })
            .expect("valid circuit");

        state.propagate_to_fixed_point().expect("no contradiction");

        for node in nodes {
            assert_eq!(1, state.lower_bound(node));
            assert_eq!(3, state.upper_bound(node));
        }
    }

    #[test]
    fn a_fixed_circuit_is_entailed() {
        let mut state = State::default();
        let nodes = successors(&mut state, &[&[2], &[0], &[1]]);
        let propagator = state
            .add_propagator(CircuitDominatorArgs {
                successors: nodes.iter().map(|&domain| domain.into()).collect(),
                offset: 0,
                conf: CircuitConf::First,
                orientation: TreeOrientation::AntiArborescence,
            })
            .expect("valid circuit");

        state.propagate_to_fixed_point().expect("no contradiction");

        assert_eq!(Entailment::True, state.is_entailed(propagator));
    }
}
