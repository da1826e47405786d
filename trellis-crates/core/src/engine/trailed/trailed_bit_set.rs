use super::TrailedInteger;
use super::TrailedValues;

const WORD_BITS: usize = 64;

/// A fixed-capacity set of small non-negative integers whose words live in trailed cells.
///
/// The set does not own its memory; every operation takes the [`TrailedValues`] holding the
/// words, so that restoring a world restores the set as well.
#[derive(Clone, Debug)]
pub(crate) struct TrailedBitSet {
    words: Box<[TrailedInteger]>,
    capacity: usize,
}

impl TrailedBitSet {
    /// Creates a set over `0..capacity`, either completely filled or empty.
    pub(crate) fn new(trailed_values: &mut TrailedValues, capacity: usize, full: bool) -> Self {
        let num_words = capacity.div_ceil(WORD_BITS);
        let words = (0..num_words)
            .map(|word_index| {
                let initial = if !full {
                    0
                } else if (word_index + 1) * WORD_BITS <= capacity {
                    u64::MAX
                } else {
                    (1_u64 << (capacity % WORD_BITS)) - 1
                };
                trailed_values.grow(initial as i64)
            })
            .collect();

        TrailedBitSet { words, capacity }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    fn word(&self, trailed_values: &TrailedValues, word_index: usize) -> u64 {
        trailed_values.read(self.words[word_index]) as u64
    }

    pub(crate) fn contains(&self, trailed_values: &TrailedValues, element: usize) -> bool {
        element < self.capacity
            && self.word(trailed_values, element / WORD_BITS) & (1 << (element % WORD_BITS)) != 0
    }

    /// Returns whether the element was absent.
    pub(crate) fn insert(&self, trailed_values: &mut TrailedValues, element: usize) -> bool {
        let word = self.word(trailed_values, element / WORD_BITS);
        let mask = 1 << (element % WORD_BITS);
        if word & mask != 0 {
            return false;
        }
        trailed_values.assign(self.words[element / WORD_BITS], (word | mask) as i64);
        true
    }

    /// Returns whether the element was present.
    pub(crate) fn remove(&self, trailed_values: &mut TrailedValues, element: usize) -> bool {
        if !self.contains(trailed_values, element) {
            return false;
        }
        let word = self.word(trailed_values, element / WORD_BITS);
        let mask = 1_u64 << (element % WORD_BITS);
        trailed_values.assign(self.words[element / WORD_BITS], (word & !mask) as i64);
        true
    }

    /// The smallest element which is at least `from`.
    pub(crate) fn next_set_bit(&self, trailed_values: &TrailedValues, from: usize) -> Option<usize> {
        if from >= self.capacity {
            return None;
        }

        let mut word_index = from / WORD_BITS;
        let mut word = self.word(trailed_values, word_index) & (u64::MAX << (from % WORD_BITS));
        loop {
            if word != 0 {
                return Some(word_index * WORD_BITS + word.trailing_zeros() as usize);
            }
            word_index += 1;
            if word_index == self.words.len() {
                return None;
            }
            word = self.word(trailed_values, word_index);
        }
    }

    /// The largest element which is at most `from`.
    pub(crate) fn previous_set_bit(
        &self,
        trailed_values: &TrailedValues,
        from: usize,
    ) -> Option<usize> {
        let from = from.min(self.capacity.checked_sub(1)?);

        let mut word_index = from / WORD_BITS;
        let shift = WORD_BITS - 1 - from % WORD_BITS;
        let mut word = self.word(trailed_values, word_index) & (u64::MAX >> shift);
        loop {
            if word != 0 {
                return Some(word_index * WORD_BITS + 63 - word.leading_zeros() as usize);
            }
            if word_index == 0 {
                return None;
            }
            word_index -= 1;
            word = self.word(trailed_values, word_index);
        }
    }

    pub(crate) fn iter<'a>(
        &'a self,
        trailed_values: &'a TrailedValues,
    ) -> impl Iterator<Item = usize> + 'a {
        std::iter::successors(self.next_set_bit(trailed_values, 0), move |&element| {
            self.next_set_bit(trailed_values, element + 1)
        })
    }

    pub(crate) fn is_subset_of(&self, trailed_values: &TrailedValues, other: &TrailedBitSet) -> bool {
        (0..self.words.len()).all(|word_index| {
            self.word(trailed_values, word_index) & !other.word(trailed_values, word_index) == 0
        })
    }
}
