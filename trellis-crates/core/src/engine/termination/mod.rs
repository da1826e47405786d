//! Conditions under which the search gives up before it reaches a conclusion.
//!
//! The search driver polls its [`TerminationCondition`] between two fixpoints, never while
//! propagating.
mod combinator;
mod decision_budget;
mod indefinite;
mod time_budget;

pub use combinator::Combinator;
pub use decision_budget::DecisionBudget;
pub use indefinite::Indefinite;
pub use time_budget::TimeBudget;

pub trait TerminationCondition {
    /// Whether the search should stop now.
    fn should_stop(&mut self) -> bool;

    /// Called once for every decision the search makes.
    fn decision_has_been_made(&mut self) {}
}

impl<Condition: TerminationCondition> TerminationCondition for Option<Condition> {
    fn should_stop(&mut self) -> bool {
        self.as_mut().is_some_and(|condition| condition.should_stop())
    }

    fn decision_has_been_made(&mut self) {
        if let Some(condition) = self {
            condition.decision_has_been_made();
        }
    }
}
