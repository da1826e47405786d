use enumset::EnumSet;

use super::Entailment;
use super::LocalId;
use super::Priority;
use super::PropagationContext;
use super::Propagator;
use super::PropagatorId;
use crate::basic_types::PropagationStatus;
use crate::containers::KeyedVec;
use crate::engine::notifications::DomainEvent;
use crate::engine::trailed::TrailedInteger;
use crate::engine::Assignments;
use crate::propagators::ArborescencePropagator;
use crate::propagators::CircuitDominatorPropagator;
use crate::propagators::KConnectedComponentsPropagator;
use crate::propagators::TablePropagator;
use crate::propagators::TimesPropagator;
use crate::statistics::StatisticLogger;

/// Every kind of propagator the engine can run.
#[derive(Debug)]
pub enum Propagators {
    Times(TimesPropagator),
    Table(TablePropagator),
    KConnectedComponents(KConnectedComponentsPropagator),
    Arborescence(ArborescencePropagator),
    CircuitDominator(CircuitDominatorPropagator),
}

macro_rules! dispatch {
    ($propagators:expr, $propagator:ident => $body:expr) => {
        match $propagators {
            Propagators::Times($propagator) => $body,
            Propagators::Table($propagator) => $body,
            Propagators::KConnectedComponents($propagator) => $body,
            Propagators::Arborescence($propagator) => $body,
            Propagators::CircuitDominator($propagator) => $body,
        }
    };
}

macro_rules! impl_from_propagator {
    ($variant:ident, $propagator:ty) => {
        impl From<$propagator> for Propagators {
            fn from(propagator: $propagator) -> Self {
                Propagators::$variant(propagator)
            }
        }
    };
}

impl_from_propagator!(Times, TimesPropagator);
impl_from_propagator!(Table, TablePropagator);
impl_from_propagator!(KConnectedComponents, KConnectedComponentsPropagator);
impl_from_propagator!(Arborescence, ArborescencePropagator);
impl_from_propagator!(CircuitDominator, CircuitDominatorPropagator);

impl Propagator for Propagators {
    fn name(&self) -> &str {
        dispatch!(self, propagator => propagator.name())
    }

    fn priority(&self) -> Priority {
        dispatch!(self, propagator => propagator.priority())
    }

    fn propagate(&mut self, context: PropagationContext, events: EnumSet<DomainEvent>) -> PropagationStatus {
        dispatch!(self, propagator => propagator.propagate(context, events))
    }

    fn propagate_on(
        &mut self,
        context: PropagationContext,
        local_id: LocalId,
        events: EnumSet<DomainEvent>,
    ) -> PropagationStatus {
        dispatch!(self, propagator => propagator.propagate_on(context, local_id, events))
    }

    fn is_entailed(&self, assignments: &Assignments) -> Entailment {
        dispatch!(self, propagator => propagator.is_entailed(assignments))
    }

    fn log_statistics(&self, statistic_logger: StatisticLogger) {
        dispatch!(self, propagator => propagator.log_statistics(statistic_logger))
    }
}

#[derive(Debug)]
pub(crate) struct StoredPropagator {
    pub(crate) propagator: Propagators,
    /// Set while the propagator is entailed in the current world.
    pub(crate) passive: TrailedInteger,
}

/// A central store for propagators.
#[derive(Debug, Default)]
pub(crate) struct PropagatorStore {
    propagators: KeyedVec<PropagatorId, StoredPropagator>,
}

impl PropagatorStore {
    pub(crate) fn num_propagators(&self) -> usize {
        self.propagators.len()
    }

    pub(crate) fn next_id(&self) -> PropagatorId {
        self.propagators.next_key()
    }

    pub(crate) fn push(&mut self, propagator: Propagators, passive: TrailedInteger) -> PropagatorId {
        self.propagators.push(StoredPropagator { propagator, passive })
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (PropagatorId, &StoredPropagator)> + '_ {
        self.propagators.keys().zip(self.propagators.iter())
    }

    pub(crate) fn get(&self, propagator_id: PropagatorId) -> &StoredPropagator {
        &self.propagators[propagator_id]
    }

    pub(crate) fn get_mut(&mut self, propagator_id: PropagatorId) -> &mut StoredPropagator {
        &mut self.propagators[propagator_id]
    }
}
