use enumset::EnumSet;
use log::debug;
use log::trace;
use log::warn;

use super::notifications::DomainEvent;
use super::notifications::Notification;
use super::notifications::Watchers;
use super::Assignments;
use super::GraphDomainRef;
use super::GraphKind;
use super::PropagatorQueue;
use crate::asserts::TRELLIS_ASSERT_ADVANCED;
use crate::asserts::TRELLIS_ASSERT_LEVEL_DEFINITION;
use crate::basic_types::FatalError;
use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatus;
use crate::containers::KeyedVec;
use crate::engine::variables::DomainId;
use crate::engine::variables::GraphId;
use crate::engine::variables::IntVar;
use crate::options::EngineOptions;
use crate::options::SelfNotification;
use crate::propagation::store::PropagatorStore;
use crate::propagation::Entailment;
use crate::propagation::LocalId;
use crate::propagation::PropagationContext;
use crate::propagation::Propagator;
use crate::propagation::PropagatorConstructor;
use crate::propagation::PropagatorConstructorContext;
use crate::propagation::PropagatorId;
use crate::statistics::log_statistic;
use crate::statistics::EngineStatistics;
use crate::statistics::StatisticLogger;
use crate::trellis_assert_advanced;
use crate::trellis_assert_simple;

/// The work a scheduled propagator has to perform when it is popped from the queue.
#[derive(Clone, Debug, Default)]
struct PendingWork {
    /// Propagate from scratch rather than per variable.
    full: bool,
    events: EnumSet<DomainEvent>,
    variables: Vec<(LocalId, EnumSet<DomainEvent>)>,
}

impl PendingWork {
    fn add(&mut self, local_id: LocalId, event: DomainEvent) {
        self.events |= event;
        match self.variables.iter_mut().find(|(id, _)| *id == local_id) {
            Some((_, events)) => *events |= event,
            None => self.variables.push((local_id, EnumSet::only(event))),
        }
    }
}

/// The container of variables and propagators, and the engine which runs the propagators to a
/// fixpoint.
///
/// Changes to the domains are made through [`State::assignments_mut`] (or by propagators) and
/// only take effect on other propagators during [`State::propagate_to_fixed_point`].
#[derive(Debug)]
pub struct State {
    pub(crate) assignments: Assignments,
    pub(crate) propagators: PropagatorStore,
    pub(crate) propagator_queue: PropagatorQueue,
    pub(crate) watchers: Watchers,
    pending_work: KeyedVec<PropagatorId, PendingWork>,
    notification_buffer: Vec<Notification>,
    options: EngineOptions,
    statistics: EngineStatistics,
}

impl Default for State {
    fn default() -> Self {
        State::new(EngineOptions::default())
    }
}

impl State {
    pub fn new(options: EngineOptions) -> State {
        if TRELLIS_ASSERT_LEVEL_DEFINITION >= TRELLIS_ASSERT_ADVANCED {
            warn!("Potentially expensive assertions are enabled; the engine will be slower");
        }

        State {
            assignments: Assignments::default(),
            propagators: PropagatorStore::default(),
            propagator_queue: PropagatorQueue::new(options.num_priority_levels),
            watchers: Watchers::default(),
            pending_work: KeyedVec::default(),
            notification_buffer: vec![],
            options,
            statistics: EngineStatistics::default(),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn statistics(&self) -> &EngineStatistics {
        &self.statistics
    }

    pub(crate) fn statistics_mut(&mut self) -> &mut EngineStatistics {
        &mut self.statistics
    }

    pub fn assignments(&self) -> &Assignments {
        &self.assignments
    }

    /// Mutable access to the domains, e.g. to post a decision. The changes are picked up by the
    /// next call to [`State::propagate_to_fixed_point`].
    pub fn assignments_mut(&mut self) -> &mut Assignments {
        &mut self.assignments
    }

    pub fn num_propagators(&self) -> usize {
        self.propagators.num_propagators()
    }

    pub fn log_statistics(&self, verbose: bool) {
        log_statistic("variables", self.assignments.num_domains());
        log_statistic("graphVariables", self.assignments.num_graphs());
        log_statistic("propagators", self.propagators.num_propagators());
        self.statistics.log(StatisticLogger::new(["engine"]));
        if verbose {
            for (propagator_id, stored) in self.propagators.iter() {
                stored.propagator.log_statistics(StatisticLogger::new([
                    stored.propagator.name(),
                    "number",
                    propagator_id.to_string().as_str(),
                ]));
            }
        }
    }
}

// Variables.
impl State {
    /// Creates a variable with the domain `[lower_bound, upper_bound]`.
    ///
    /// The domain keeps track of the individual values if it holds at most
    /// [`EngineOptions::max_enumerated_domain_size`] values; otherwise only its bounds are
    /// tracked and removing a value from its interior has no effect.
    ///
    /// Values are at least `-i32::MAX`, so that every domain can be negated.
    pub fn new_interval_variable(&mut self, lower_bound: i32, upper_bound: i32) -> DomainId {
        trellis_assert_simple!(
            lower_bound <= upper_bound,
            "the domain [{lower_bound}, {upper_bound}] is empty"
        );
        trellis_assert_simple!(lower_bound > i32::MIN, "i32::MIN cannot be in a domain");

        let size = upper_bound as i64 - lower_bound as i64 + 1;
        let enumerated = size <= self.options.max_enumerated_domain_size as i64;
        self.assignments
            .new_integer_domain(lower_bound, upper_bound, enumerated)
    }

    /// Creates a variable with exactly the given values in its domain.
    pub fn new_sparse_variable(&mut self, mut values: Vec<i32>) -> DomainId {
        trellis_assert_simple!(!values.is_empty(), "a variable needs at least one value");

        values.sort_unstable();
        values.dedup();
        trellis_assert_simple!(values[0] > i32::MIN, "i32::MIN cannot be in a domain");
        self.assignments.new_sparse_domain(&values)
    }

    /// Creates a graph variable over the nodes `0..num_nodes` whose envelope holds every node and
    /// the given arcs, and whose kernel is empty.
    pub fn new_graph_variable(
        &mut self,
        num_nodes: usize,
        kind: GraphKind,
        arcs: impl IntoIterator<Item = (usize, usize)>,
    ) -> GraphId {
        self.assignments.new_graph_domain(num_nodes, kind, arcs)
    }

    pub fn lower_bound(&self, variable: impl Into<IntVar>) -> i32 {
        self.assignments.lower_bound(variable)
    }

    pub fn upper_bound(&self, variable: impl Into<IntVar>) -> i32 {
        self.assignments.upper_bound(variable)
    }

    pub fn contains(&self, variable: impl Into<IntVar>, value: i32) -> bool {
        self.assignments.contains(variable, value)
    }

    pub fn fixed_value(&self, variable: impl Into<IntVar>) -> Option<i32> {
        self.assignments.fixed_value(variable)
    }

    pub fn graph(&self, graph: GraphId) -> GraphDomainRef<'_> {
        self.assignments.graph(graph)
    }
}

// Propagators.
impl State {
    /// Creates the propagator described by `constructor` and schedules its initial propagation.
    pub fn add_propagator<Constructor>(&mut self, constructor: Constructor) -> Result<PropagatorId, FatalError>
    where
        Constructor: PropagatorConstructor,
    {
        let propagator_id = self.propagators.next_id();
        let context = PropagatorConstructorContext {
            assignments: &mut self.assignments,
            watchers: &mut self.watchers,
            options: &self.options,
            propagator_id,
        };
        let propagator = constructor.create(context)?.into();
        let priority = propagator.priority();

        let passive = self.assignments.new_trailed_integer(0);
        let pushed_id = self.propagators.push(propagator, passive);
        trellis_assert_simple!(pushed_id == propagator_id);

        self.pending_work.accommodate(propagator_id, PendingWork::default());
        self.pending_work[propagator_id].full = true;
        self.propagator_queue.enqueue_propagator(propagator_id, priority);

        Ok(propagator_id)
    }

    pub fn is_passive(&self, propagator_id: PropagatorId) -> bool {
        let passive = self.propagators.get(propagator_id).passive;
        self.assignments.read_trailed_integer(passive) != 0
    }

    pub fn is_entailed(&self, propagator_id: PropagatorId) -> Entailment {
        self.propagators
            .get(propagator_id)
            .propagator
            .is_entailed(&self.assignments)
    }

    /// Runs the scheduled propagators until none of them is scheduled anymore.
    ///
    /// The changes made since the previous call (e.g. a decision) schedule the propagators which
    /// subscribed to them; the changes made by propagators in turn schedule more propagators.
    ///
    /// On an [`Inconsistency`] the fixpoint computation is abandoned: the queue and all pending
    /// notifications are cleared, and the domains are left in the state at the moment of the
    /// failure. The only sensible operation afterwards is [`State::restore_to`].
    pub fn propagate_to_fixed_point(&mut self) -> PropagationStatus {
        self.notify_propagators();

        let mut num_calls = 0;
        while let Some(propagator_id) = self.propagator_queue.pop() {
            num_calls += 1;
            if let Err(inconsistency) = self.propagate(propagator_id) {
                self.abandon_fixed_point(&inconsistency);
                return Err(inconsistency);
            }
            self.notify_propagators();
        }

        self.statistics.average_calls_per_fixpoint.add_term(num_calls);
        trellis_assert_simple!(!self.assignments.has_pending_events());
        trellis_assert_advanced!(self
            .propagators
            .iter()
            .all(|(_, stored)| stored.propagator.is_entailed(&self.assignments) != Entailment::False));

        Ok(())
    }

    fn propagate(&mut self, propagator_id: PropagatorId) -> PropagationStatus {
        let work = std::mem::take(&mut self.pending_work[propagator_id]);
        if self.is_passive(propagator_id) {
            return Ok(());
        }

        let stored = self.propagators.get_mut(propagator_id);
        let passive = stored.passive;
        let priority = stored.propagator.priority();

        if work.full {
            trace!("Propagating {} ({propagator_id}) from scratch", stored.propagator.name());
            self.statistics.num_propagator_calls += 1;
            self.statistics.num_calls_per_priority[priority] += 1;

            let context = PropagationContext::new(&mut self.assignments, propagator_id, passive);
            return stored.propagator.propagate(context, work.events);
        }

        for (local_id, events) in work.variables {
            if self.assignments.read_trailed_integer(passive) != 0 {
                break;
            }

            trace!(
                "Propagating {} ({propagator_id}) on {local_id} for {events:?}",
                stored.propagator.name()
            );
            self.statistics.num_propagator_calls += 1;
            self.statistics.num_calls_per_priority[priority] += 1;

            let context = PropagationContext::new(&mut self.assignments, propagator_id, passive);
            stored.propagator.propagate_on(context, local_id, events)?;
        }

        Ok(())
    }

    /// Schedules the propagators subscribed to the changes made since the last call.
    fn notify_propagators(&mut self) {
        let mut notifications = std::mem::take(&mut self.notification_buffer);
        self.assignments.take_events(&mut notifications);

        for notification in notifications.drain(..) {
            for subscription in self.watchers.subscriptions(notification.variable) {
                let request = subscription.request();
                let propagator_id = request.propagator();

                if self.options.self_notification == SelfNotification::Exclude
                    && notification.cause.is_propagator(propagator_id)
                {
                    continue;
                }

                let stored = self.propagators.get(propagator_id);
                if self.assignments.read_trailed_integer(stored.passive) != 0 {
                    continue;
                }

                let Some(event) =
                    subscription.deliver(notification.event, &self.assignments, notification.variable)
                else {
                    continue;
                };

                self.pending_work[propagator_id].add(request.local_id(), event);
                self.propagator_queue
                    .enqueue_propagator(propagator_id, stored.propagator.priority());
            }
        }

        self.notification_buffer = notifications;
    }

    fn abandon_fixed_point(&mut self, inconsistency: &Inconsistency) {
        debug!("Propagation failed: {inconsistency}");
        self.statistics.num_contradictions += 1;
        self.clear_scheduled_work();
    }

    fn clear_scheduled_work(&mut self) {
        self.propagator_queue.clear();
        for work in self.pending_work.iter_mut() {
            *work = PendingWork::default();
        }
        self.assignments.clear_events();
    }
}

// Worlds.
impl State {
    /// The number of checkpoints which have not been restored.
    pub fn world_index(&self) -> usize {
        self.assignments.world_index()
    }

    /// Opens a new world, which can later be undone with [`State::restore_to`].
    pub fn new_checkpoint(&mut self) {
        self.assignments.new_checkpoint();
    }

    /// Undoes every change made since world `world` was the current world.
    pub fn restore_to(&mut self, world: usize) {
        trellis_assert_simple!(
            world <= self.world_index(),
            "cannot restore to world {world} from world {}",
            self.world_index()
        );

        self.assignments.restore_to(world);
        self.clear_scheduled_work();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::Cause;
    use crate::propagators::TimesArgs;

    #[test]
    fn large_intervals_only_track_their_bounds() {
        let mut state = State::new(EngineOptions {
            max_enumerated_domain_size: 10,
            ..Default::default()
        });
        let small = state.new_interval_variable(0, 9);
        let large = state.new_interval_variable(0, 10);

        assert!(state.assignments().is_enumerated(small));
        assert!(!state.assignments().is_enumerated(large));
    }

    #[test]
    #[should_panic(expected = "i32::MIN cannot be in a domain")]
    fn the_smallest_integer_is_rejected() {
        let mut state = State::default();
        let _ = state.new_interval_variable(i32::MIN, 0);
    }

    #[test]
    fn negated_views_of_the_widest_domain_do_not_overflow() {
        let mut state = State::default();
        let x = state.new_interval_variable(-i32::MAX, 0);
        let minus_x = IntVar::from(x).negated().expect("a domain can be negated");
        let assignments = state.assignments_mut();

        assert_eq!(i32::MAX, assignments.upper_bound(minus_x));
        assert!(!assignments.contains(minus_x, i32::MIN));
        assert_eq!(Some(0), assignments.next_value(minus_x, i32::MIN));
        assert_eq!(None, assignments.previous_value(minus_x, i32::MIN));
        assert_eq!(None, IntVar::from(x).absolute().negated());

        assert_eq!(Ok(false), assignments.update_lower_bound(minus_x, i32::MIN, Cause::Null));
        assert_eq!(Ok(false), assignments.remove_value(minus_x, i32::MIN, Cause::Null));
        assert!(assignments
            .update_upper_bound(minus_x, i32::MIN, Cause::Null)
            .is_err());
        assert_eq!(i32::MAX, assignments.upper_bound(minus_x));
    }

    #[test]
    fn sparse_variables_hold_exactly_their_values() {
        let mut state = State::default();
        let x = state.new_sparse_variable(vec![7, -2, 3, 3]);

        assert_eq!(
            vec![-2, 3, 7],
            state.assignments().iterate_domain(x).collect::<Vec<_>>()
        );
    }

    #[test]
    fn a_decision_wakes_the_subscribed_propagator() {
        let mut state = State::default();
        let x = state.new_interval_variable(0, 10);
        let y = state.new_interval_variable(0, 10);
        let z = state.new_interval_variable(-100, 100);
        let _ = state
            .add_propagator(TimesArgs { a: x.into(), b: y.into(), c: z.into() })
            .expect("no fatal error");
        state.propagate_to_fixed_point().expect("no contradiction");

        state.new_checkpoint();
        let _ = state
            .assignments_mut()
            .instantiate_to(x, 3, Cause::Decision)
            .expect("3 is in the domain");
        let _ = state
            .assignments_mut()
            .instantiate_to(y, 4, Cause::Decision)
            .expect("4 is in the domain");
        state.propagate_to_fixed_point().expect("no contradiction");

        assert_eq!(Some(12), state.fixed_value(z));
        assert!(state.statistics().num_propagator_calls >= 2);

        state.restore_to(0);
        assert_eq!(0, state.lower_bound(z));
        assert_eq!(100, state.upper_bound(z));
    }

    #[test]
    fn a_contradiction_clears_the_scheduled_work() {
        let mut state = State::default();
        let x = state.new_interval_variable(2, 3);
        let y = state.new_interval_variable(2, 3);
        let z = state.new_interval_variable(-10, 10);
        let _ = state
            .add_propagator(TimesArgs { a: x.into(), b: y.into(), c: z.into() })
            .expect("no fatal error");
        state.propagate_to_fixed_point().expect("no contradiction");

        state.new_checkpoint();
        let _ = state
            .assignments_mut()
            .update_upper_bound(z, 5, Cause::Decision)
            .expect("non-empty");
        let _ = state
            .assignments_mut()
            .update_lower_bound(x, 3, Cause::Decision)
            .expect("non-empty");

        let result = state.propagate_to_fixed_point();

        assert!(matches!(result, Err(Inconsistency::Contradiction(_))));
        assert!(state.propagator_queue.is_empty());
        assert_eq!(1, state.statistics().num_contradictions);

        state.restore_to(0);
        assert_eq!(9, state.upper_bound(z));
        assert!(state.propagate_to_fixed_point().is_ok());
    }
}
