use crate::engine::delta::RemovedRange;
use crate::engine::notifications::DomainEvent;
use crate::engine::trailed::TrailedBitSet;
use crate::engine::trailed::TrailedInteger;
use crate::engine::trailed::TrailedValues;
use crate::trellis_assert_moderate;

/// Raised by the domain representations when a mutation would leave no value. The caller turns
/// this into a [`crate::Contradiction`] carrying the cause.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct EmptyDomain;

/// The effect of a successful mutation of an integer domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DomainChange {
    pub(crate) event: DomainEvent,
    /// An instantiation can remove values on both sides of the remaining value.
    pub(crate) removed: [Option<RemovedRange>; 2],
}

impl DomainChange {
    fn single(event: DomainEvent, removed: RemovedRange) -> Self {
        DomainChange {
            event,
            removed: [Some(removed), None],
        }
    }
}

/// The domain of an integer variable.
///
/// The bounds are always stored. Domains which are small enough additionally store the present
/// values in a bit set with bit `i` standing for `initial_lower_bound + i`; bits outside of the
/// current bounds are meaningless. Without the bit set the domain is an interval, and removing a
/// value strictly inside the bounds has no effect.
#[derive(Clone, Debug)]
pub(crate) struct IntegerDomain {
    lower_bound: TrailedInteger,
    upper_bound: TrailedInteger,
    size: TrailedInteger,
    values: Option<TrailedBitSet>,
    initial_lower_bound: i32,
}

impl IntegerDomain {
    pub(crate) fn interval(trailed_values: &mut TrailedValues, lower_bound: i32, upper_bound: i32) -> Self {
        trellis_assert_moderate!(lower_bound <= upper_bound);
        IntegerDomain {
            lower_bound: trailed_values.grow(lower_bound as i64),
            upper_bound: trailed_values.grow(upper_bound as i64),
            size: trailed_values.grow(upper_bound as i64 - lower_bound as i64 + 1),
            values: None,
            initial_lower_bound: lower_bound,
        }
    }

    /// Creates an enumerated domain holding exactly `values`, which must not be empty.
    pub(crate) fn enumerated(trailed_values: &mut TrailedValues, values: &[i32]) -> Self {
        let lower_bound = values.iter().copied().min().unwrap_or(0);
        let upper_bound = values.iter().copied().max().unwrap_or(0);
        let capacity = (upper_bound as i64 - lower_bound as i64 + 1) as usize;

        let bits = TrailedBitSet::new(trailed_values, capacity, false);
        let mut size = 0;
        for &value in values {
            if bits.insert(trailed_values, (value - lower_bound) as usize) {
                size += 1;
            }
        }

        IntegerDomain {
            lower_bound: trailed_values.grow(lower_bound as i64),
            upper_bound: trailed_values.grow(upper_bound as i64),
            size: trailed_values.grow(size),
            values: Some(bits),
            initial_lower_bound: lower_bound,
        }
    }

    pub(crate) fn is_enumerated(&self) -> bool {
        self.values.is_some()
    }

    pub(crate) fn lower_bound(&self, trailed_values: &TrailedValues) -> i32 {
        trailed_values.read(self.lower_bound) as i32
    }

    pub(crate) fn upper_bound(&self, trailed_values: &TrailedValues) -> i32 {
        trailed_values.read(self.upper_bound) as i32
    }

    pub(crate) fn size(&self, trailed_values: &TrailedValues) -> usize {
        trailed_values.read(self.size) as usize
    }

    fn bit(&self, value: i32) -> usize {
        (value as i64 - self.initial_lower_bound as i64) as usize
    }

    fn value_of_bit(&self, bit: usize) -> i32 {
        self.initial_lower_bound + bit as i32
    }

    pub(crate) fn contains(&self, trailed_values: &TrailedValues, value: i32) -> bool {
        if value < self.lower_bound(trailed_values) || value > self.upper_bound(trailed_values) {
            return false;
        }
        self.values
            .as_ref()
            .map_or(true, |bits| bits.contains(trailed_values, self.bit(value)))
    }

    pub(crate) fn next_value(&self, trailed_values: &TrailedValues, value: i32) -> Option<i32> {
        let upper_bound = self.upper_bound(trailed_values);
        if value >= upper_bound {
            return None;
        }
        let from = (value + 1).max(self.lower_bound(trailed_values));
        match &self.values {
            None => Some(from),
            Some(bits) => bits
                .next_set_bit(trailed_values, self.bit(from))
                .map(|bit| self.value_of_bit(bit)),
        }
    }

    pub(crate) fn previous_value(&self, trailed_values: &TrailedValues, value: i32) -> Option<i32> {
        let lower_bound = self.lower_bound(trailed_values);
        if value <= lower_bound {
            return None;
        }
        let to = (value - 1).min(self.upper_bound(trailed_values));
        match &self.values {
            None => Some(to),
            Some(bits) => bits
                .previous_set_bit(trailed_values, self.bit(to))
                .map(|bit| self.value_of_bit(bit)),
        }
    }

    /// Counts the present values in `[from, to]`, which must lie within the bounds.
    fn count_present(&self, trailed_values: &TrailedValues, from: i32, to: i32) -> i64 {
        match &self.values {
            None => to as i64 - from as i64 + 1,
            Some(bits) => {
                let last = self.bit(to);
                std::iter::successors(bits.next_set_bit(trailed_values, self.bit(from)), |&bit| {
                    bits.next_set_bit(trailed_values, bit + 1)
                })
                .take_while(|&bit| bit <= last)
                .count() as i64
            }
        }
    }

    fn event_after_bound_change(&self, trailed_values: &TrailedValues, bound_event: DomainEvent) -> DomainEvent {
        if self.lower_bound(trailed_values) == self.upper_bound(trailed_values) {
            DomainEvent::Assign
        } else {
            bound_event
        }
    }

    pub(crate) fn set_lower_bound(
        &self,
        trailed_values: &mut TrailedValues,
        value: i32,
    ) -> Result<Option<DomainChange>, EmptyDomain> {
        let old_lower_bound = self.lower_bound(trailed_values);
        if value <= old_lower_bound {
            return Ok(None);
        }
        if value > self.upper_bound(trailed_values) {
            return Err(EmptyDomain);
        }

        let new_lower_bound = if self.contains(trailed_values, value) {
            value
        } else {
            self.next_value(trailed_values, value).ok_or(EmptyDomain)?
        };
        let removed = self.count_present(trailed_values, old_lower_bound, new_lower_bound - 1);

        trailed_values.assign(self.lower_bound, new_lower_bound as i64);
        trailed_values.add_assign(self.size, -removed);

        Ok(Some(DomainChange::single(
            self.event_after_bound_change(trailed_values, DomainEvent::LowerBound),
            RemovedRange::new(old_lower_bound, new_lower_bound - 1),
        )))
    }

    pub(crate) fn set_upper_bound(
        &self,
        trailed_values: &mut TrailedValues,
        value: i32,
    ) -> Result<Option<DomainChange>, EmptyDomain> {
        let old_upper_bound = self.upper_bound(trailed_values);
        if value >= old_upper_bound {
            return Ok(None);
        }
        if value < self.lower_bound(trailed_values) {
            return Err(EmptyDomain);
        }

        let new_upper_bound = if self.contains(trailed_values, value) {
            value
        } else {
            self.previous_value(trailed_values, value).ok_or(EmptyDomain)?
        };
        let removed = self.count_present(trailed_values, new_upper_bound + 1, old_upper_bound);

        trailed_values.assign(self.upper_bound, new_upper_bound as i64);
        trailed_values.add_assign(self.size, -removed);

        Ok(Some(DomainChange::single(
            self.event_after_bound_change(trailed_values, DomainEvent::UpperBound),
            RemovedRange::new(new_upper_bound + 1, old_upper_bound),
        )))
    }

    pub(crate) fn remove(
        &self,
        trailed_values: &mut TrailedValues,
        value: i32,
    ) -> Result<Option<DomainChange>, EmptyDomain> {
        if !self.contains(trailed_values, value) {
            return Ok(None);
        }

        let lower_bound = self.lower_bound(trailed_values);
        let upper_bound = self.upper_bound(trailed_values);
        if lower_bound == upper_bound {
            return Err(EmptyDomain);
        }
        if value == lower_bound {
            return self.set_lower_bound(trailed_values, value + 1);
        }
        if value == upper_bound {
            return self.set_upper_bound(trailed_values, value - 1);
        }

        match &self.values {
            None => Ok(None),
            Some(bits) => {
                let _ = bits.remove(trailed_values, self.bit(value));
                trailed_values.add_assign(self.size, -1);
                Ok(Some(DomainChange::single(
                    DomainEvent::Removal,
                    RemovedRange::new(value, value),
                )))
            }
        }
    }

    pub(crate) fn assign(
        &self,
        trailed_values: &mut TrailedValues,
        value: i32,
    ) -> Result<Option<DomainChange>, EmptyDomain> {
        if !self.contains(trailed_values, value) {
            return Err(EmptyDomain);
        }

        let lower_bound = self.lower_bound(trailed_values);
        let upper_bound = self.upper_bound(trailed_values);
        if lower_bound == upper_bound {
            return Ok(None);
        }

        let below = (lower_bound < value).then(|| RemovedRange::new(lower_bound, value - 1));
        let above = (value < upper_bound).then(|| RemovedRange::new(value + 1, upper_bound));

        trailed_values.assign(self.lower_bound, value as i64);
        trailed_values.assign(self.upper_bound, value as i64);
        trailed_values.assign(self.size, 1);

        Ok(Some(DomainChange {
            event: DomainEvent::Assign,
            removed: [below, above],
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raising_the_lower_bound_skips_absent_values() {
        let mut trailed_values = TrailedValues::default();
        let domain = IntegerDomain::enumerated(&mut trailed_values, &[1, 2, 5, 8]);

        let change = domain
            .set_lower_bound(&mut trailed_values, 3)
            .expect("non-empty")
            .expect("changed");

        assert_eq!(5, domain.lower_bound(&trailed_values));
        assert_eq!(2, domain.size(&trailed_values));
        assert_eq!(DomainEvent::LowerBound, change.event);
        assert_eq!(Some(RemovedRange::new(1, 4)), change.removed[0]);
    }

    #[test]
    fn removing_the_last_but_one_value_is_an_assignment() {
        let mut trailed_values = TrailedValues::default();
        let domain = IntegerDomain::interval(&mut trailed_values, 4, 5);

        let change = domain
            .remove(&mut trailed_values, 5)
            .expect("non-empty")
            .expect("changed");

        assert_eq!(DomainEvent::Assign, change.event);
        assert_eq!(Err(EmptyDomain), domain.remove(&mut trailed_values, 4));
    }

    #[test]
    fn interior_removal_on_an_interval_has_no_effect() {
        let mut trailed_values = TrailedValues::default();
        let domain = IntegerDomain::interval(&mut trailed_values, 0, 10);

        assert_eq!(Ok(None), domain.remove(&mut trailed_values, 5));
        assert!(domain.contains(&trailed_values, 5));
        assert_eq!(11, domain.size(&trailed_values));
    }

    #[test]
    fn neighbouring_values_in_an_enumerated_domain() {
        let mut trailed_values = TrailedValues::default();
        let domain = IntegerDomain::enumerated(&mut trailed_values, &[-3, 0, 4]);

        assert_eq!(Some(0), domain.next_value(&trailed_values, -3));
        assert_eq!(Some(4), domain.next_value(&trailed_values, 1));
        assert_eq!(None, domain.next_value(&trailed_values, 4));
        assert_eq!(Some(-3), domain.previous_value(&trailed_values, 0));
        assert_eq!(None, domain.previous_value(&trailed_values, -3));
    }

    #[test]
    fn assigning_reports_both_removed_sides() {
        let mut trailed_values = TrailedValues::default();
        let domain = IntegerDomain::interval(&mut trailed_values, 0, 9);

        let change = domain
            .assign(&mut trailed_values, 3)
            .expect("non-empty")
            .expect("changed");

        assert_eq!(
            [Some(RemovedRange::new(0, 2)), Some(RemovedRange::new(4, 9))],
            change.removed
        );
        assert_eq!(1, domain.size(&trailed_values));
        assert_eq!(Err(EmptyDomain), domain.assign(&mut trailed_values, 4));
    }

    #[test]
    fn mutations_are_undone_by_restoring_a_world() {
        let mut trailed_values = TrailedValues::default();
        let domain = IntegerDomain::enumerated(&mut trailed_values, &[1, 2, 3, 4, 5]);

        trailed_values.new_checkpoint();
        let _ = domain.remove(&mut trailed_values, 3).expect("non-empty");
        let _ = domain.set_upper_bound(&mut trailed_values, 4).expect("non-empty");
        trailed_values.synchronise(0);

        assert!(domain.contains(&trailed_values, 3));
        assert_eq!(5, domain.upper_bound(&trailed_values));
        assert_eq!(5, domain.size(&trailed_values));
    }
}
