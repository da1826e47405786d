use log::debug;

use super::TrailedInteger;
use crate::basic_types::Trail;
use crate::containers::KeyedVec;
use crate::trellis_assert_moderate;

#[derive(Clone, Copy, Debug)]
struct Cell {
    value: i64,
    /// The world stamp at which the cell was last recorded on the trail.
    stamp: u64,
}

#[derive(Clone, Copy, Debug)]
struct UndoEntry {
    cell: TrailedInteger,
    old_value: i64,
    old_stamp: u64,
}

/// The backtrackable memory of the engine: an arena of integer cells with an undo log.
///
/// Only the first write to a cell within a world is recorded, which is detected by comparing the
/// stamp stored with the cell to the current world stamp. The world stamp is a monotonic epoch
/// which is bumped both when a world is pushed and when worlds are popped, so two sibling worlds
/// at the same depth never share a stamp.
#[derive(Debug, Clone)]
pub(crate) struct TrailedValues {
    trail: Trail<UndoEntry>,
    cells: KeyedVec<TrailedInteger, Cell>,
    world_stamp: u64,
}

impl Default for TrailedValues {
    fn default() -> Self {
        TrailedValues {
            trail: Trail::default(),
            cells: KeyedVec::default(),
            world_stamp: 1,
        }
    }
}

impl TrailedValues {
    pub(crate) fn grow(&mut self, initial_value: i64) -> TrailedInteger {
        self.cells.push(Cell {
            value: initial_value,
            stamp: self.world_stamp,
        })
    }

    pub(crate) fn read(&self, cell: TrailedInteger) -> i64 {
        self.cells[cell].value
    }

    pub(crate) fn assign(&mut self, cell: TrailedInteger, value: i64) {
        let current = self.cells[cell];
        if current.value == value {
            return;
        }

        // Writes at the root are never undone.
        if current.stamp != self.world_stamp && self.world_index() > 0 {
            self.trail.push(UndoEntry {
                cell,
                old_value: current.value,
                old_stamp: current.stamp,
            });
            self.cells[cell].stamp = self.world_stamp;
        }
        self.cells[cell].value = value;
    }

    pub(crate) fn add_assign(&mut self, cell: TrailedInteger, addition: i64) {
        self.assign(cell, self.read(cell) + addition);
    }

    /// The depth of the current world, `0` being the root.
    pub(crate) fn world_index(&self) -> usize {
        self.trail.world_index()
    }

    pub(crate) fn world_stamp(&self) -> u64 {
        self.world_stamp
    }

    pub(crate) fn new_checkpoint(&mut self) {
        self.trail.push_world();
        self.world_stamp += 1;
        debug!(
            "pushed world {} (stamp {})",
            self.world_index(),
            self.world_stamp
        );
    }

    /// Pops every world above `world`, restoring the cells to the values they had when `world`
    /// was the current world.
    pub(crate) fn synchronise(&mut self, world: usize) {
        trellis_assert_moderate!(world < self.world_index());

        for undo in self.trail.pop_to(world) {
            self.cells[undo.cell] = Cell {
                value: undo.old_value,
                stamp: undo.old_stamp,
            };
        }
        self.world_stamp += 1;
        debug!("restored world {world} (stamp {})", self.world_stamp);
    }

    #[cfg(test)]
    pub(crate) fn num_recorded_changes(&self) -> usize {
        self.trail.len()
    }
}
