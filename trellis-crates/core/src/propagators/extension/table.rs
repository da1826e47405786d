use enumset::EnumSet;

use super::FastBooleanValidityChecker;
use super::ValidityChecker;
use crate::basic_types::Contradiction;
use crate::basic_types::FatalError;
use crate::basic_types::PropagationStatus;
use crate::containers::HashMap;
use crate::containers::StorageKey;
use crate::engine::notifications::DomainEvent;
use crate::engine::notifications::DomainEvents;
use crate::engine::variables::IntVar;
use crate::engine::Assignments;
use crate::engine::IntDeltaMonitor;
use crate::propagation::Entailment;
use crate::propagation::LocalId;
use crate::propagation::Priority;
use crate::propagation::PropagationContext;
use crate::propagation::Propagator;
use crate::propagation::PropagatorConstructor;
use crate::propagation::PropagatorConstructorContext;
use crate::statistics::StatisticLogger;

/// The [`PropagatorConstructor`] for the [`TablePropagator`].
#[derive(Clone, Debug)]
pub struct TableArgs {
    pub variables: Box<[IntVar]>,
    /// The allowed assignments; the value at index `i` of a tuple is assigned to `variables[i]`.
    pub tuples: Vec<Box<[i32]>>,
}

impl PropagatorConstructor for TableArgs {
    type PropagatorImpl = TablePropagator;

    fn create(self, mut context: PropagatorConstructorContext) -> Result<Self::PropagatorImpl, FatalError> {
        let TableArgs { variables, tuples } = self;

        if tuples.iter().any(|tuple| tuple.len() != variables.len()) {
            return Err(FatalError::InvalidModel(
                "every tuple of a table needs one value per variable",
            ));
        }

        // Tuples with values outside of the initial domains can never be supports.
        let tuples = tuples
            .into_iter()
            .filter(|tuple| {
                variables
                    .iter()
                    .zip(tuple.iter())
                    .all(|(variable, &value)| context.assignments().contains(*variable, value))
            })
            .collect::<Vec<_>>();

        let mut supports = vec![HashMap::<i32, Vec<usize>>::default(); variables.len()];
        for (index, tuple) in tuples.iter().enumerate() {
            for (position, &value) in tuple.iter().enumerate() {
                supports[position].entry(value).or_default().push(index);
            }
        }

        let mut monitors = Vec::with_capacity(variables.len());
        for (position, &variable) in variables.iter().enumerate() {
            context.register(variable, DomainEvents::ANY_INT, LocalId::create_from_index(position));
            monitors.push(context.int_delta_monitor(variable));
        }

        let is_boolean = variables.iter().all(|&variable| {
            context.assignments().lower_bound(variable) >= 0
                && context.assignments().upper_bound(variable) <= 1
        });
        let checker = if is_boolean {
            TupleChecker::Boolean(FastBooleanValidityChecker::new(variables.clone()))
        } else {
            TupleChecker::General(ValidityChecker::new(variables.clone()))
        };

        Ok(TablePropagator {
            variables,
            tuples: tuples.into(),
            supports: supports.into(),
            residues: HashMap::default(),
            monitors: monitors.into(),
            checker,
            num_support_searches: 0,
        })
    }
}

/// The boolean checker relies on the instantiated variables being sorted first, so the order is
/// refreshed after every removal.
#[derive(Clone, Debug)]
enum TupleChecker {
    General(ValidityChecker),
    Boolean(FastBooleanValidityChecker),
}

impl TupleChecker {
    fn sort_variables(&mut self, assignments: &Assignments) {
        match self {
            TupleChecker::General(checker) => checker.sort_variables(assignments),
            TupleChecker::Boolean(checker) => checker.sort_variables(assignments),
        }
    }

    fn is_valid(&self, assignments: &Assignments, tuple: &[i32]) -> bool {
        match self {
            TupleChecker::General(checker) => checker.is_valid(assignments, tuple),
            TupleChecker::Boolean(checker) => checker.is_valid(assignments, tuple),
        }
    }
}

/// Generalised arc consistency for a positive table constraint.
///
/// Every value keeps the last tuple which was found to support it (its residue). A value only
/// needs a new support when its residue contains a removed value, which is detected by replaying
/// the removals of the variables through delta monitors.
#[derive(Clone, Debug)]
pub struct TablePropagator {
    variables: Box<[IntVar]>,
    tuples: Box<[Box<[i32]>]>,
    /// For every position, the indices of the tuples which have a given value at that position.
    supports: Box<[HashMap<i32, Vec<usize>>]>,
    /// The last known support of a (position, value) pair. These are not backtracked; a residue
    /// is always checked before it is used.
    residues: HashMap<(usize, i32), usize>,
    monitors: Box<[IntDeltaMonitor]>,
    checker: TupleChecker,

    num_support_searches: u64,
}

impl Propagator for TablePropagator {
    fn name(&self) -> &str {
        "Table"
    }

    fn priority(&self) -> Priority {
        Priority::Low
    }

    fn propagate(&mut self, mut context: PropagationContext, _events: EnumSet<DomainEvent>) -> PropagationStatus {
        // Every value is revised below, so the pending removals need not be replayed.
        for monitor in self.monitors.iter_mut() {
            monitor.freeze(context.assignments());
            monitor.unfreeze(context.assignments());
        }
        self.checker.sort_variables(context.assignments());

        let mut removed = vec![];
        for position in 0..self.variables.len() {
            let variable = self.variables[position];
            let values = context.assignments().iterate_domain(variable).collect::<Vec<_>>();

            for value in values {
                if !self.has_support(context.assignments(), position, value) {
                    let _ = context.remove_value(variable, value)?;
                    self.checker.sort_variables(context.assignments());
                    removed.push((position, value));
                }
            }
        }

        self.revise(&mut context, removed)?;
        self.set_passive_if_fixed(&mut context);
        Ok(())
    }

    fn propagate_on(
        &mut self,
        mut context: PropagationContext,
        local_id: LocalId,
        _events: EnumSet<DomainEvent>,
    ) -> PropagationStatus {
        let position = local_id.index();
        let monitor = &mut self.monitors[position];

        let mut removed = vec![];
        monitor.freeze(context.assignments());
        monitor.for_each_removal(context.assignments(), |value| removed.push((position, value)));
        monitor.unfreeze(context.assignments());

        self.checker.sort_variables(context.assignments());
        self.revise(&mut context, removed)?;
        self.set_passive_if_fixed(&mut context);
        Ok(())
    }

    fn is_entailed(&self, assignments: &Assignments) -> Entailment {
        let has_valid_tuple = self.tuples.iter().any(|tuple| {
            self.variables
                .iter()
                .zip(tuple.iter())
                .all(|(variable, &value)| variable.contains(assignments, value))
        });

        if !has_valid_tuple {
            Entailment::False
        } else if self.variables.iter().all(|variable| variable.is_fixed(assignments)) {
            Entailment::True
        } else {
            Entailment::Undefined
        }
    }

    fn log_statistics(&self, statistic_logger: StatisticLogger) {
        statistic_logger
            .attach_to_prefix("tuples")
            .log_statistic(self.tuples.len());
        statistic_logger
            .attach_to_prefix("supportSearches")
            .log_statistic(self.num_support_searches);
    }
}

impl TablePropagator {
    /// Whether `value` at `position` is part of a tuple which is still valid.
    fn has_support(&mut self, assignments: &Assignments, position: usize, value: i32) -> bool {
        if let Some(&residue) = self.residues.get(&(position, value)) {
            if self.checker.is_valid(assignments, &self.tuples[residue]) {
                return true;
            }
        }

        self.num_support_searches += 1;
        let Some(candidates) = self.supports[position].get(&value) else {
            return false;
        };
        let support = candidates
            .iter()
            .copied()
            .find(|&tuple| self.checker.is_valid(assignments, &self.tuples[tuple]));

        match support {
            Some(tuple) => {
                let _ = self.residues.insert((position, value), tuple);
                true
            }
            None => false,
        }
    }

    /// Looks for new supports of the values whose residue contains one of the `removed` values,
    /// until no more values are removed.
    fn revise(
        &mut self,
        context: &mut PropagationContext,
        mut removed: Vec<(usize, i32)>,
    ) -> Result<(), Contradiction> {
        while let Some((position, value)) = removed.pop() {
            let Some(invalidated) = self.supports[position].get(&value).cloned() else {
                continue;
            };

            for tuple in invalidated {
                for other in 0..self.variables.len() {
                    let other_value = self.tuples[tuple][other];
                    if other == position
                        || self.residues.get(&(other, other_value)) != Some(&tuple)
                        || !context.contains(self.variables[other], other_value)
                    {
                        continue;
                    }

                    if !self.has_support(context.assignments(), other, other_value) {
                        let _ = context.remove_value(self.variables[other], other_value)?;
                        self.checker.sort_variables(context.assignments());
                        removed.push((other, other_value));
                    }
                }
            }
        }

        Ok(())
    }

    fn set_passive_if_fixed(&self, context: &mut PropagationContext) {
        if self.variables.iter().all(|&variable| context.is_fixed(variable)) {
            context.set_passive();
        }
    }
}
