use std::fmt::Display;

use crate::propagation::PropagatorId;

/// The agent responsible for a domain mutation.
///
/// Causes are compared by value. A propagator recognises its own mutations in a delta by
/// comparing the recorded cause with its own [`Cause::Propagator`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Cause {
    /// The mutation was posted outside of search, e.g. while building the model.
    #[default]
    Null,
    /// The mutation was performed by applying a search decision.
    Decision,
    Propagator(PropagatorId),
}

impl Cause {
    pub fn is_propagator(&self, propagator_id: PropagatorId) -> bool {
        *self == Cause::Propagator(propagator_id)
    }
}

impl Display for Cause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cause::Null => write!(f, "model"),
            Cause::Decision => write!(f, "decision"),
            Cause::Propagator(propagator_id) => write!(f, "{propagator_id}"),
        }
    }
}
