use std::fmt::Display;

use crate::basic_types::Cause;
use crate::basic_types::Contradiction;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::engine::variables::GraphId;
use crate::engine::variables::IntVar;
use crate::engine::Assignments;
use crate::trellis_assert_moderate;
use crate::trellis_assert_simple;

/// The split of the search space made by a decision. Every branching has two outcomes: the
/// primary branch and its refutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Branching {
    /// `variable = value`, refuted by `variable != value`.
    Assign { variable: IntVar, value: i32 },
    /// `variable <= value`, refuted by `variable >= value + 1`.
    Split { variable: IntVar, value: i32 },
    /// The arc is part of the graph, refuted by removing it from the envelope.
    Arc { graph: GraphId, from: usize, to: usize },
    /// The node is part of the graph, refuted by removing it from the envelope.
    Node { graph: GraphId, node: usize },
}

impl Branching {
    fn apply(&self, assignments: &mut Assignments, branch: u8) -> Result<bool, Contradiction> {
        let cause = Cause::Decision;
        let primary = branch == 1;

        match *self {
            Branching::Assign { variable, value } if primary => {
                assignments.instantiate_to(variable, value, cause)
            }
            Branching::Assign { variable, value } => assignments.remove_value(variable, value, cause),
            Branching::Split { variable, value } if primary => {
                assignments.update_upper_bound(variable, value, cause)
            }
            Branching::Split { variable, value } => {
                assignments.update_lower_bound(variable, value.saturating_add(1), cause)
            }
            Branching::Arc { graph, from, to } if primary => {
                assignments.enforce_arc(graph, from, to, cause)
            }
            Branching::Arc { graph, from, to } => assignments.remove_arc(graph, from, to, cause),
            Branching::Node { graph, node } if primary => assignments.enforce_node(graph, node, cause),
            Branching::Node { graph, node } => assignments.remove_node(graph, node, cause),
        }
    }
}

impl Display for Branching {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Branching::Assign { variable, value } => write!(f, "{} = {value}", variable.domain()),
            Branching::Split { variable, value } => write!(f, "{} <= {value}", variable.domain()),
            Branching::Arc { graph, from, to } => write!(f, "{graph} has ({from}, {to})"),
            Branching::Node { graph, node } => write!(f, "{graph} has {node}"),
        }
    }
}

/// A binary branch point of the search.
///
/// A decision goes from free (in the pool) to its primary branch, then to the refutation, after
/// which it is exhausted and goes back to the pool.
#[derive(Clone, Debug, Default)]
pub struct Decision {
    branching: Option<Branching>,
    /// The number of branches applied so far.
    branch: u8,
    /// The world which was current when the decision was taken.
    world_index: usize,
}

impl Decision {
    pub fn set(&mut self, branching: Branching, world_index: usize) {
        self.branching = Some(branching);
        self.branch = 0;
        self.world_index = world_index;
    }

    /// Applies the next branch: the primary branch the first time, the refutation the second.
    pub fn apply(&mut self, assignments: &mut Assignments) -> Result<bool, Contradiction> {
        trellis_assert_simple!(self.has_next(), "a decision has only two branches");
        let Some(branching) = self.branching else {
            return Ok(false);
        };

        self.branch += 1;
        branching.apply(assignments, self.branch)
    }

    pub fn has_next(&self) -> bool {
        self.branching.is_some() && self.branch < 2
    }

    pub fn branching(&self) -> Option<Branching> {
        self.branching
    }

    /// 0 before the decision was applied, then 1 or 2.
    pub fn branch(&self) -> u8 {
        self.branch
    }

    pub fn world_index(&self) -> usize {
        self.world_index
    }

    /// Forgets the branching, as if the decision was just created.
    pub fn free(&mut self) {
        *self = Decision::default();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DecisionId(u32);

impl StorageKey for DecisionId {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        DecisionId(index as u32)
    }
}

/// Recycles decisions so that a deep search does not allocate one per node of the search tree.
#[derive(Clone, Debug, Default)]
pub struct DecisionPool {
    decisions: KeyedVec<DecisionId, Decision>,
    free: Vec<DecisionId>,
}

impl DecisionPool {
    pub fn acquire(&mut self, branching: Branching, world_index: usize) -> DecisionId {
        let id = self
            .free
            .pop()
            .unwrap_or_else(|| self.decisions.push(Decision::default()));
        self.decisions[id].set(branching, world_index);
        id
    }

    /// Returns the decision to the pool; `id` must not be used afterwards.
    pub fn release(&mut self, id: DecisionId) {
        trellis_assert_moderate!(!self.free.contains(&id), "{id:?} was released twice");
        self.decisions[id].free();
        self.free.push(id);
    }

    pub fn get(&self, id: DecisionId) -> &Decision {
        &self.decisions[id]
    }

    pub fn get_mut(&mut self, id: DecisionId) -> &mut Decision {
        &mut self.decisions[id]
    }

    /// The number of decisions created by the pool, free or not.
    pub fn capacity(&self) -> usize {
        self.decisions.len()
    }

    pub fn num_free(&self) -> usize {
        self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_decision_applies_its_branch_and_then_the_refutation() {
        let mut assignments = Assignments::default();
        let x = assignments.new_integer_domain(0, 5, true);
        let mut decision = Decision::default();
        decision.set(
            Branching::Assign {
                variable: x.into(),
                value: 2,
            },
            0,
        );

        assignments.new_checkpoint();
        assert!(decision.apply(&mut assignments).expect("value is in the domain"));
        assert_eq!(Some(2), assignments.fixed_value(x));

        assignments.restore_to(decision.world_index());
        assert!(decision.apply(&mut assignments).expect("value is in the domain"));
        assert!(!assignments.contains(x, 2));
        assert_eq!(5, assignments.size(x));
        assert!(!decision.has_next());
    }

    #[test]
    fn splits_refute_with_the_next_value() {
        let mut assignments = Assignments::default();
        let x = assignments.new_integer_domain(0, 9, false);
        let mut decision = Decision::default();
        decision.set(
            Branching::Split {
                variable: x.into(),
                value: 4,
            },
            0,
        );

        assignments.new_checkpoint();
        let _ = decision.apply(&mut assignments).expect("non-empty");
        assert_eq!(4, assignments.upper_bound(x));

        assignments.restore_to(0);
        let _ = decision.apply(&mut assignments).expect("non-empty");
        assert_eq!(5, assignments.lower_bound(x));
        assert_eq!(9, assignments.upper_bound(x));
    }

    #[test]
    fn released_decisions_are_reused_without_their_state() {
        let mut pool = DecisionPool::default();
        let mut assignments = Assignments::default();
        let x = assignments.new_integer_domain(0, 5, true);
        let graph = assignments.new_graph_domain(2, crate::engine::GraphKind::Directed, [(0, 1)]);

        let first = pool.acquire(
            Branching::Assign {
                variable: x.into(),
                value: 1,
            },
            3,
        );
        let _ = pool.get_mut(first).apply(&mut assignments).expect("non-empty");
        pool.release(first);

        let second = pool.acquire(Branching::Node { graph, node: 1 }, 0);

        assert_eq!(first, second);
        assert_eq!(1, pool.capacity());
        assert_eq!(0, pool.num_free());
        assert_eq!(0, pool.get(second).branch());
        assert_eq!(0, pool.get(second).world_index());
        assert_eq!(Some(Branching::Node { graph, node: 1 }), pool.get(second).branching());
    }
}
