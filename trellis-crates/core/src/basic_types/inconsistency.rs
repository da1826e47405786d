use thiserror::Error;

use super::Cause;
use crate::engine::variables::VariableRef;

/// The result of invoking a propagator or of running the engine to a fixed point.
pub type PropagationStatus = Result<(), Inconsistency>;

/// Signals that the current branch of the search is infeasible.
///
/// A contradiction is raised when a mutation would empty a domain, when a structural requirement
/// on a graph cannot be met any more, or when a propagator detects a failed consistency check.
/// Only the search driver recovers from it, by backtracking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("{message} (caused by {cause})")]
pub struct Contradiction {
    pub cause: Cause,
    /// The variable whose domain was emptied, if the contradiction is tied to one.
    pub variable: Option<VariableRef>,
    pub message: &'static str,
}

impl Contradiction {
    pub fn new(cause: Cause, message: &'static str) -> Contradiction {
        Contradiction {
            cause,
            variable: None,
            message,
        }
    }

    pub(crate) fn empty_domain(variable: impl Into<VariableRef>, cause: Cause) -> Contradiction {
        Contradiction {
            cause,
            variable: Some(variable.into()),
            message: "empty domain",
        }
    }

    pub fn on(mut self, variable: impl Into<VariableRef>) -> Contradiction {
        self.variable = Some(variable.into());
        self
    }
}

/// A violated invariant of the model. Unlike a [`Contradiction`] this is never a dead end of the
/// search, and search must not be continued after one is raised.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FatalError {
    #[error("the duplicated node {node} was reached as the origin of a pruned successor")]
    DuplicatedNodeReached { node: usize },
    #[error("invalid model: {0}")]
    InvalidModel(&'static str),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Inconsistency {
    #[error(transparent)]
    Contradiction(#[from] Contradiction),
    #[error(transparent)]
    Fatal(#[from] FatalError),
}

impl Inconsistency {
    pub fn is_contradiction(&self) -> bool {
        matches!(self, Inconsistency::Contradiction(_))
    }
}
