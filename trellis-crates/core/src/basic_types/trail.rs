use std::iter::Rev;
use std::ops::Deref;
use std::vec::Drain;

use crate::trellis_assert_simple;

/// An undo log which is partitioned into worlds.
///
/// World `0` is the root; every call to [`Trail::push_world`] opens a new world on top of the
/// current one. Entries are always appended to the current world, and popping back to a world
/// hands back all entries of the discarded worlds, newest first.
#[derive(Clone, Debug)]
pub(crate) struct Trail<T> {
    /// At index `i` is the position in `entries` where world `i + 1` starts.
    world_starts: Vec<usize>,
    entries: Vec<T>,
}

// Implemented by hand so that `T` does not need to implement `Default`.
impl<T> Default for Trail<T> {
    fn default() -> Self {
        Trail {
            world_starts: Vec::new(),
            entries: Vec::new(),
        }
    }
}

impl<T> Trail<T> {
    pub(crate) fn world_index(&self) -> usize {
        self.world_starts.len()
    }

    pub(crate) fn push_world(&mut self) {
        self.world_starts.push(self.entries.len());
    }

    pub(crate) fn entries_of_world(&self, world: usize) -> &[T] {
        assert!(world <= self.world_index());

        let start = if world == 0 {
            0
        } else {
            self.world_starts[world - 1]
        };
        let end = self
            .world_starts
            .get(world)
            .copied()
            .unwrap_or(self.entries.len());

        &self.entries[start..end]
    }

    /// Discards every world above `world` and returns their entries in reverse order of
    /// insertion, which is the order in which they have to be undone.
    pub(crate) fn pop_to(&mut self, world: usize) -> Rev<Drain<'_, T>> {
        trellis_assert_simple!(world < self.world_index());

        let kept_entries = self.world_starts[world];
        self.world_starts.truncate(world);
        self.entries.drain(kept_entries..).rev()
    }

    pub(crate) fn push(&mut self, entry: T) {
        self.entries.push(entry)
    }
}

impl<T> Deref for Trail<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_recorded_in_insertion_order() {
        let mut trail = Trail::default();
        trail.push('a');
        trail.push('b');

        assert_eq!(&['a', 'b'], trail.deref());
        assert_eq!(0, trail.world_index());
    }

    #[test]
    fn popping_a_world_returns_its_entries_newest_first() {
        let mut trail = Trail::default();
        trail.push(10);
        trail.push_world();
        trail.push(20);
        trail.push(30);

        let undone = trail.pop_to(0).collect::<Vec<_>>();

        assert_eq!(vec![30, 20], undone);
        assert_eq!(&[10], trail.deref());
    }

    #[test]
    fn popping_several_worlds_at_once() {
        let mut trail = Trail::default();
        trail.push_world();
        trail.push(1);
        trail.push_world();
        trail.push(2);
        trail.push_world();
        trail.push(3);

        let undone = trail.pop_to(1).collect::<Vec<_>>();

        assert_eq!(vec![3, 2], undone);
        assert_eq!(1, trail.world_index());
        assert_eq!(&[1], trail.entries_of_world(1));
    }

    #[test]
    fn entries_are_partitioned_per_world() {
        let mut trail = Trail::default();
        trail.push(1);
        trail.push_world();
        trail.push_world();
        trail.push(2);
        trail.push(3);

        assert_eq!(&[1], trail.entries_of_world(0));
        assert!(trail.entries_of_world(1).is_empty());
        assert_eq!(&[2, 3], trail.entries_of_world(2));
    }
}
