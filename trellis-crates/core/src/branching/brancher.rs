use super::Branching;
use crate::engine::Assignments;
use crate::search::Solution;
use crate::statistics::StatisticLogger;

/// Chooses how the search splits the remaining search space.
///
/// The engine only applies the returned [`Branching`]; which variable and value to branch on is
/// entirely up to the implementation. A branching has to shrink at least one domain in both of
/// its branches, otherwise the search does not terminate.
pub trait Brancher {
    /// The next branching, or `None` if every variable the brancher is responsible for is
    /// decided.
    fn next_decision(&mut self, assignments: &Assignments) -> Option<Branching>;

    /// Called after the search backtracked over at least one decision.
    fn on_backtrack(&mut self) {}

    fn on_solution(&mut self, _solution: &Solution) {}

    fn log_statistics(&self, _statistic_logger: StatisticLogger) {}
}
