use std::fmt::Debug;

use enum_map::Enum;
use enumset::EnumSet;

use super::LocalId;
use super::PropagationContext;
use crate::basic_types::PropagationStatus;
use crate::engine::notifications::DomainEvent;
use crate::engine::Assignments;
use crate::statistics::StatisticLogger;

/// A filtering algorithm for a single constraint.
///
/// The engine calls [`Propagator::propagate`] the first time a propagator is scheduled, which
/// should establish the consistency of the propagator from scratch. Afterwards, it calls
/// [`Propagator::propagate_on`] once for every variable which received an event the propagator
/// subscribed to. Unless the propagator overrides it, incremental propagation falls back to full
/// propagation, so correctness never depends on which of the two is called.
///
/// A propagator is expected to reach its own fixpoint before returning; with the default
/// [`SelfNotification`](crate::options::SelfNotification) policy it is not woken by its own
/// changes.
pub trait Propagator: Debug {
    /// The name of the propagator, used for logging and statistics.
    fn name(&self) -> &str;

    fn priority(&self) -> Priority {
        Priority::VeryLow
    }

    /// Propagates from scratch. `events` is the union of the events which woke the propagator,
    /// and is empty on the initial call.
    fn propagate(&mut self, context: PropagationContext, events: EnumSet<DomainEvent>) -> PropagationStatus;

    /// Propagates in reaction to `events` on the variable registered under `local_id`.
    fn propagate_on(
        &mut self,
        context: PropagationContext,
        _local_id: LocalId,
        events: EnumSet<DomainEvent>,
    ) -> PropagationStatus {
        self.propagate(context, events)
    }

    /// Whether the constraint is guaranteed to hold, guaranteed to be violated, or neither, given
    /// the current domains.
    fn is_entailed(&self, _assignments: &Assignments) -> Entailment {
        Entailment::Undefined
    }

    fn log_statistics(&self, _statistic_logger: StatisticLogger) {}
}

/// The priority class of a propagator. Propagators of a higher priority are always run before
/// those of a lower priority; within a class they are run in the order they were scheduled.
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[derive(Default, Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Enum)]
#[repr(u8)]
pub enum Priority {
    High = 0,
    Medium = 1,
    Low = 2,
    #[default]
    VeryLow = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Entailment {
    True,
    False,
    Undefined,
}

impl Entailment {
    pub fn from_bool(holds: bool) -> Entailment {
        if holds {
            Entailment::True
        } else {
            Entailment::False
        }
    }
}
