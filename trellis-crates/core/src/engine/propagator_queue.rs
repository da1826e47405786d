use std::collections::VecDeque;

use crate::containers::KeyedVec;
use crate::propagation::Priority;
use crate::propagation::PropagatorId;
use crate::trellis_assert_moderate;

/// The maximum number of priority levels; the non-empty levels are tracked in a `u64` mask.
const MAX_LEVELS: u32 = u64::BITS;

/// The scheduler of the engine: one FIFO queue per priority level, where the non-empty queue of
/// the highest priority is drained first.
///
/// Level 0 is the highest priority. A [`Priority`] beyond the last level shares the last level.
#[derive(Debug, Clone)]
pub(crate) struct PropagatorQueue {
    levels: Box<[VecDeque<PropagatorId>]>,
    /// Bit `i` is set iff `levels[i]` is not empty.
    non_empty: u64,
    scheduled: KeyedVec<PropagatorId, bool>,
}

impl Default for PropagatorQueue {
    fn default() -> Self {
        Self::new(4)
    }
}

impl PropagatorQueue {
    pub(crate) fn new(num_priority_levels: u32) -> PropagatorQueue {
        let num_levels = num_priority_levels.clamp(1, MAX_LEVELS) as usize;
        PropagatorQueue {
            levels: (0..num_levels).map(|_| VecDeque::new()).collect(),
            non_empty: 0,
            scheduled: KeyedVec::default(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.non_empty == 0
    }

    fn level_of(&self, priority: Priority) -> usize {
        (priority as usize).min(self.levels.len() - 1)
    }

    /// Schedules the propagator unless it is already scheduled, in which case it keeps its place.
    pub(crate) fn enqueue_propagator(&mut self, propagator_id: PropagatorId, priority: Priority) {
        if self.is_propagator_enqueued(propagator_id) {
            return;
        }

        self.scheduled.accommodate(propagator_id, false);
        self.scheduled[propagator_id] = true;

        let level = self.level_of(priority);
        self.levels[level].push_back(propagator_id);
        self.non_empty |= 1 << level;
    }

    pub(crate) fn pop(&mut self) -> Option<PropagatorId> {
        if self.is_empty() {
            return None;
        }

        let level = self.non_empty.trailing_zeros() as usize;
        let propagator_id = self.levels[level].pop_front();
        trellis_assert_moderate!(propagator_id.is_some(), "level {level} is marked as non-empty");

        if self.levels[level].is_empty() {
            self.non_empty &= !(1 << level);
        }
        let propagator_id = propagator_id?;
        self.scheduled[propagator_id] = false;
        Some(propagator_id)
    }

    pub(crate) fn clear(&mut self) {
        while !self.is_empty() {
            let level = self.non_empty.trailing_zeros() as usize;
            for propagator_id in self.levels[level].drain(..) {
                self.scheduled[propagator_id] = false;
            }
            self.non_empty &= !(1 << level);
        }
    }

    pub(crate) fn is_propagator_enqueued(&self, propagator_id: PropagatorId) -> bool {
        self.scheduled.get(propagator_id).is_some_and(|&scheduled| scheduled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_priorities_are_popped_first() {
        let mut queue = PropagatorQueue::default();

        queue.enqueue_propagator(PropagatorId(1), Priority::High);
        queue.enqueue_propagator(PropagatorId(0), Priority::Medium);
        queue.enqueue_propagator(PropagatorId(3), Priority::VeryLow);
        queue.enqueue_propagator(PropagatorId(4), Priority::Low);

        assert_eq!(Some(PropagatorId(1)), queue.pop());
        assert_eq!(Some(PropagatorId(0)), queue.pop());
        assert_eq!(Some(PropagatorId(4)), queue.pop());
        assert_eq!(Some(PropagatorId(3)), queue.pop());
        assert_eq!(None, queue.pop());
    }

    #[test]
    fn propagators_of_equal_priority_are_popped_in_order() {
        let mut queue = PropagatorQueue::default();

        queue.enqueue_propagator(PropagatorId(2), Priority::Low);
        queue.enqueue_propagator(PropagatorId(0), Priority::Low);
        queue.enqueue_propagator(PropagatorId(2), Priority::Low);

        assert_eq!(Some(PropagatorId(2)), queue.pop());
        assert_eq!(Some(PropagatorId(0)), queue.pop());
        assert!(queue.is_empty());
    }

    #[test]
    fn fewer_levels_merge_the_lowest_priorities() {
        let mut queue = PropagatorQueue::new(2);

        queue.enqueue_propagator(PropagatorId(0), Priority::VeryLow);
        queue.enqueue_propagator(PropagatorId(1), Priority::Medium);
        queue.enqueue_propagator(PropagatorId(2), Priority::High);

        assert_eq!(Some(PropagatorId(2)), queue.pop());
        assert_eq!(Some(PropagatorId(0)), queue.pop());
        assert_eq!(Some(PropagatorId(1)), queue.pop());
    }

    #[test]
    fn clearing_forgets_every_propagator() {
        let mut queue = PropagatorQueue::default();
        queue.enqueue_propagator(PropagatorId(0), Priority::High);
        queue.enqueue_propagator(PropagatorId(1), Priority::Low);

        queue.clear();

        assert!(queue.is_empty());
        assert!(!queue.is_propagator_enqueued(PropagatorId(0)));
        assert_eq!(None, queue.pop());
    }
}
