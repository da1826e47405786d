use log::debug;

use super::Solution;
use crate::basic_types::FatalError;
use crate::basic_types::Inconsistency;
use crate::branching::Brancher;
use crate::branching::DecisionId;
use crate::branching::DecisionPool;
use crate::engine::termination::TerminationCondition;
use crate::engine::State;
use crate::statistics::StatisticLogger;

/// The result of a call to [`DepthFirstSearch::solve`].
#[derive(Clone, Debug)]
pub enum SearchOutcome {
    Satisfiable(Solution),
    Unsatisfiable,
    /// The termination condition stopped the search before it reached a conclusion.
    Unknown,
}

/// A chronological backtracking search over the decisions of a [`Brancher`].
///
/// Every decision opens a world and propagates. On a contradiction the world of the most recent
/// decision is restored and its refutation is applied; a decision whose refutation failed as
/// well is returned to the pool and the search backtracks further.
#[derive(Debug)]
pub struct DepthFirstSearch<B, T> {
    brancher: B,
    termination: T,
    pool: DecisionPool,
    /// The decisions from the root to the current node of the search tree.
    trail: Vec<DecisionId>,
}

impl<B: Brancher, T: TerminationCondition> DepthFirstSearch<B, T> {
    pub fn new(brancher: B, termination: T) -> Self {
        DepthFirstSearch {
            brancher,
            termination,
            pool: DecisionPool::default(),
            trail: vec![],
        }
    }

    pub fn brancher(&self) -> &B {
        &self.brancher
    }

    pub fn log_statistics(&self, state: &State) {
        state.log_statistics(true);
        self.brancher
            .log_statistics(StatisticLogger::new(["brancher"]));
    }

    /// Searches for a solution starting from the current world of `state`.
    ///
    /// Whatever the outcome, `state` is restored to the world it was in when the search started.
    pub fn solve(&mut self, state: &mut State) -> Result<SearchOutcome, FatalError> {
        let root_world = state.world_index();
        let outcome = self.search(state, root_world);

        self.backtrack_to_root(state, root_world);
        outcome
    }

    fn search(&mut self, state: &mut State, root_world: usize) -> Result<SearchOutcome, FatalError> {
        if let Err(inconsistency) = state.propagate_to_fixed_point() {
            return match inconsistency {
                Inconsistency::Contradiction(_) => Ok(SearchOutcome::Unsatisfiable),
                Inconsistency::Fatal(fatal) => Err(fatal),
            };
        }

        loop {
            if self.termination.should_stop() {
                debug!("Search stopped at depth {}", state.world_index() - root_world);
                return Ok(SearchOutcome::Unknown);
            }

            let Some(branching) = self.brancher.next_decision(state.assignments()) else {
                let solution = Solution::new(state.assignments());
                debug!("Found a solution at depth {}", state.world_index() - root_world);
                self.brancher.on_solution(&solution);
                return Ok(SearchOutcome::Satisfiable(solution));
            };

            let decision = self.pool.acquire(branching, state.world_index());
            self.trail.push(decision);

            let mut status = self.apply_next_branch(state, decision);
            while let Err(inconsistency) = status {
                if let Inconsistency::Fatal(fatal) = inconsistency {
                    return Err(fatal);
                }

                let Some(decision) = self.backtrack(state) else {
                    return Ok(SearchOutcome::Unsatisfiable);
                };
                status = self.apply_next_branch(state, decision);
            }
        }
    }

    /// Opens a world for the next branch of `decision` and propagates it.
    fn apply_next_branch(&mut self, state: &mut State, decision: DecisionId) -> Result<(), Inconsistency> {
        self.termination.decision_has_been_made();
        state.new_checkpoint();

        let depth = state.world_index() as u64;
        let statistics = state.statistics_mut();
        statistics.num_decisions += 1;
        statistics.peak_depth = statistics.peak_depth.max(depth);

        let _ = self.pool.get_mut(decision).apply(state.assignments_mut())?;
        state.propagate_to_fixed_point()
    }

    /// Undoes decisions until one with an untried branch is found, and returns it with its world
    /// restored. Returns `None` if every decision is exhausted.
    fn backtrack(&mut self, state: &mut State) -> Option<DecisionId> {
        self.brancher.on_backtrack();

        while let Some(&decision) = self.trail.last() {
            state.restore_to(self.pool.get(decision).world_index());
            state.statistics_mut().num_backtracks += 1;

            if self.pool.get(decision).has_next() {
                return Some(decision);
            }

            let _ = self.trail.pop();
            self.pool.release(decision);
        }

        None
    }

    fn backtrack_to_root(&mut self, state: &mut State, root_world: usize) {
        for decision in self.trail.drain(..) {
            self.pool.release(decision);
        }
        if state.world_index() > root_world {
            state.restore_to(root_world);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branching::branchers::InputOrderBrancher;
    use crate::engine::termination::Indefinite;
    use crate::engine::variables::DomainId;
    use crate::propagators::TableArgs;

    fn table(state: &mut State, variables: &[DomainId], tuples: &[&[i32]]) {
        let _ = state
            .add_propagator(TableArgs {
                variables: variables.iter().map(|&variable| variable.into()).collect(),
                tuples: tuples.iter().map(|&tuple| Box::from(tuple)).collect(),
            })
            .expect("no fatal error");
    }

    fn search(state: &State) -> DepthFirstSearch<InputOrderBrancher, Indefinite> {
        DepthFirstSearch::new(InputOrderBrancher::for_all(state.assignments()), Indefinite)
    }

    #[test]
    fn every_decision_returns_to_the_pool() {
        let mut state = State::default();
        let x = state.new_interval_variable(0, 1);
        let y = state.new_interval_variable(0, 1);
        let z = state.new_interval_variable(0, 1);
        // x = y, y != z and x = z: each table on its own is arc consistent.
        table(&mut state, &[x, y], &[&[0, 0], &[1, 1]]);
        table(&mut state, &[y, z], &[&[0, 1], &[1, 0]]);
        table(&mut state, &[x, z], &[&[0, 0], &[1, 1]]);

        let mut search = search(&state);
        let outcome = search.solve(&mut state).expect("no fatal error");

        assert!(matches!(outcome, SearchOutcome::Unsatisfiable));
        assert!(search.trail.is_empty());
        assert!(search.pool.capacity() > 0);
        assert_eq!(search.pool.capacity(), search.pool.num_free());
        assert!(state.statistics().num_backtracks > 0);
    }

    #[test]
    fn refutations_are_explored_after_a_failed_branch() {
        let mut state = State::default();
        let x = state.new_interval_variable(0, 1);
        let y = state.new_interval_variable(0, 1);
        let z = state.new_interval_variable(0, 1);
        table(&mut state, &[x, y, z], &[&[0, 0, 0], &[0, 1, 1], &[1, 0, 1]]);
        table(&mut state, &[y, z], &[&[0, 1], &[1, 0]]);

        let mut search = search(&state);
        let outcome = search.solve(&mut state).expect("no fatal error");

        let SearchOutcome::Satisfiable(solution) = outcome else {
            panic!("expected a solution, got {outcome:?}");
        };
        assert_eq!(1, solution.value(x));
        assert_eq!(0, solution.value(y));
        assert_eq!(1, solution.value(z));
        assert_eq!(0, state.world_index());
    }
}
