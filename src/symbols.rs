use arrayvec::ArrayVec;

use crate::types::TrieChar;

/// A small sorted set of distinct `TrieChar`s, at most 256 of them. Used by
/// `DArray::insert_branch`/`find_free_base` to describe the set of symbols
/// a relocated node must make room for (`Symbols` in the C engine this is
/// ported from).
#[derive(Default, Clone)]
pub(crate) struct Symbols {
    chars: ArrayVec<TrieChar, 256>,
}

impl Symbols {
    pub fn new() -> Self {
        Self { chars: ArrayVec::new() }
    }

    /// Inserts `c` keeping the set sorted ascending; no-op if already
    /// present.
    pub fn add(&mut self, c: TrieChar) {
        match self.chars.binary_search(&c) {
            Ok(_) => {}
            Err(pos) => self.chars.insert(pos, c),
        }
    }

    /// Appends `c` without checking order; caller must only use this when
    /// symbols are already produced in ascending order (`output_symbols`).
    pub fn add_ascending(&mut self, c: TrieChar) {
        debug_assert!(self.chars.last().map_or(true, |&last| last < c));
        self.chars.push(c);
    }

    pub fn get(&self, index: usize) -> Option<TrieChar> {
        self.chars.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_keeps_sorted_unique() {
        let mut s = Symbols::new();
        s.add(5);
        s.add(1);
        s.add(5);
        s.add(3);
        assert_eq!(s.len(), 3);
        assert_eq!(s.get(0), Some(1));
        assert_eq!(s.get(1), Some(3));
        assert_eq!(s.get(2), Some(5));
    }
}
