use crate::basic_types::Cause;
use crate::engine::notifications::DomainEvent;

/// A closed range of values removed from an integer domain by one mutation.
///
/// Values of the range may already have been absent before the mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemovedRange {
    pub lower: i32,
    pub upper: i32,
}

impl RemovedRange {
    pub fn new(lower: i32, upper: i32) -> Self {
        RemovedRange { lower, upper }
    }

    pub fn values(&self) -> impl Iterator<Item = i32> {
        self.lower..=self.upper
    }
}

/// The element of a graph domain affected by one mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphElement {
    Node(usize),
    Arc(usize, usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeltaEntry<Payload> {
    pub event: DomainEvent,
    pub payload: Payload,
    pub cause: Cause,
}

/// The append-only log of the mutations of one variable within the current world.
///
/// The log is cleared lazily: it remembers the world stamp of its entries, and once the stamp
/// has moved on the entries are treated as absent. The storage is only reclaimed on the next
/// append.
#[derive(Clone, Debug)]
pub(crate) struct Delta<Payload> {
    entries: Vec<DeltaEntry<Payload>>,
    stamp: u64,
}

impl<Payload> Default for Delta<Payload> {
    fn default() -> Self {
        Delta {
            entries: Vec::new(),
            stamp: 0,
        }
    }
}

impl<Payload> Delta<Payload> {
    pub(crate) fn push(&mut self, stamp: u64, entry: DeltaEntry<Payload>) {
        self.lazy_clear(stamp);
        self.entries.push(entry);
    }

    fn lazy_clear(&mut self, stamp: u64) {
        if self.stamp != stamp {
            self.entries.clear();
            self.stamp = stamp;
        }
    }

    /// The entries which are valid in the world with the given stamp.
    pub(crate) fn entries(&self, stamp: u64) -> &[DeltaEntry<Payload>] {
        if self.stamp == stamp {
            &self.entries
        } else {
            &[]
        }
    }
}
