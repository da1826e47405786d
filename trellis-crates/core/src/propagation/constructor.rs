use super::Propagator;
use super::PropagatorConstructorContext;
use super::Propagators;
use crate::basic_types::FatalError;

/// Creates a propagator, subscribing it to the events of its variables.
///
/// The arguments of a propagator are kept separate from the propagator itself, as the propagator
/// can only be set up once its [`PropagatorId`](super::PropagatorId) is known.
pub trait PropagatorConstructor {
    type PropagatorImpl: Propagator + Into<Propagators>;

    fn create(self, context: PropagatorConstructorContext) -> Result<Self::PropagatorImpl, FatalError>;
}
