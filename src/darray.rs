use alloc::vec;
use alloc::vec::Vec;
use core::cmp;

#[cfg(feature = "std")]
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
#[cfg(feature = "std")]
use std::io::{self, Read, Write};

use crate::symbols::Symbols;
use crate::types::{
    next_power, TrieChar, TrieIndex, DA_POOL_BEGIN, DA_SIGNATURE, TRIE_CHAR_MAX, TRIE_INDEX_ERROR, TRIE_INDEX_MAX,
};

const ROOT: TrieIndex = 2;
const FREE_LIST: TrieIndex = 1;

#[derive(Clone, Copy)]
struct Cell {
    base: TrieIndex,
    check: TrieIndex,
}

/// The double array: two parallel arrays (`base`/`check`) encoding a
/// labelled tree, plus a doubly-linked ring of free cells threaded through
/// the same storage via negated indices. Cell 0 carries the header, cell
/// 1 anchors the free ring, cell 2 is the root.
///
/// `base[s] >= 0` means `s` is a branching node: its child on symbol `c`
/// lives at `base[s] + c` whenever `check[base[s] + c] == s`. `base[s] < 0`
/// means `s` is a terminal node pointing at tail pool slot `-base[s]`.
pub struct DArray {
    cells: Vec<Cell>,
    used: TrieIndex,
}

impl Default for DArray {
    fn default() -> Self {
        let mut cells = vec![Cell { base: 0, check: 0 }; DA_POOL_BEGIN as usize];
        cells[0] = Cell { base: DA_SIGNATURE as TrieIndex, check: DA_POOL_BEGIN };
        cells[FREE_LIST as usize] = Cell { base: -FREE_LIST, check: -FREE_LIST };
        cells[ROOT as usize] = Cell { base: DA_POOL_BEGIN, check: 0 };
        Self { cells, used: 1 }
    }
}

impl DArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_root(&self) -> TrieIndex {
        ROOT
    }

    pub fn len(&self) -> TrieIndex {
        self.cells.len() as TrieIndex
    }

    pub fn is_empty(&self) -> bool {
        self.cells.len() <= DA_POOL_BEGIN as usize
    }

    pub fn used(&self) -> TrieIndex {
        self.used
    }

    fn cell(&self, s: TrieIndex) -> Cell {
        self.cells.get(s as usize).copied().unwrap_or(Cell { base: TRIE_INDEX_ERROR, check: TRIE_INDEX_ERROR })
    }

    pub fn get_base(&self, s: TrieIndex) -> TrieIndex {
        self.cell(s).base
    }

    pub fn get_check(&self, s: TrieIndex) -> TrieIndex {
        self.cell(s).check
    }

    fn set_base(&mut self, s: TrieIndex, v: TrieIndex) {
        self.cells[s as usize].base = v;
    }

    fn set_check(&mut self, s: TrieIndex, v: TrieIndex) {
        self.cells[s as usize].check = v;
    }

    /// Marks `s` as having neither children nor a tail pointer, the first
    /// step of deleting a key (`trieSetBase(t, s, TRIE_INDEX_ERROR)` in
    /// `trieDelete`, followed by a prune).
    pub(crate) fn clear_node(&mut self, s: TrieIndex) {
        self.set_base(s, TRIE_INDEX_ERROR);
    }

    pub fn is_separate(&self, s: TrieIndex) -> bool {
        self.get_base(s) < 0
    }

    pub fn get_tail_index(&self, s: TrieIndex) -> TrieIndex {
        -self.get_base(s)
    }

    pub fn set_tail_index(&mut self, s: TrieIndex, tail_idx: TrieIndex) {
        self.set_base(s, -tail_idx);
    }

    /// Follows the arc labelled `c` out of `s`, if one exists.
    pub fn walk(&self, s: TrieIndex, c: TrieChar) -> Option<TrieIndex> {
        let base = self.get_base(s);
        if base <= 0 {
            return None;
        }
        let next = base + c as TrieIndex;
        if self.get_check(next) == s {
            Some(next)
        } else {
            None
        }
    }

    fn has_children(&self, s: TrieIndex) -> bool {
        let base = self.get_base(s);
        if base <= 0 {
            return false;
        }
        let max_c = cmp::min(TRIE_CHAR_MAX as TrieIndex, self.len() - base);
        (0..=max_c).any(|c| self.get_check(base + c) == s)
    }

    /// Enumerates the symbols on which `s` currently branches, ascending.
    pub fn output_symbols(&self, s: TrieIndex) -> Symbols {
        let mut syms = Symbols::new();
        let base = self.get_base(s);
        if base <= 0 {
            return syms;
        }
        let max_c = cmp::min(TRIE_CHAR_MAX as TrieIndex, self.len() - base);
        for c in 0..=max_c {
            if self.get_check(base + c) == s {
                syms.add_ascending(c as TrieChar);
            }
        }
        syms
    }

    /// Ensures the array has at least `to_index + 1` cells, growing by
    /// doubling and threading the new cells into the free ring.
    fn ensure_capacity(&mut self, to_index: TrieIndex) -> bool {
        if to_index <= 0 || to_index >= TRIE_INDEX_MAX {
            return false;
        }
        if (to_index as usize) < self.cells.len() {
            return true;
        }
        let new_begin = self.cells.len() as TrieIndex;
        let new_size = next_power(to_index);
        self.cells.resize(new_size as usize, Cell { base: 0, check: 0 });

        for i in new_begin..(new_size - 1) {
            self.set_check(i, -(i + 1));
            self.set_base(i + 1, -i);
        }
        let free_tail = -self.get_base(FREE_LIST);
        self.set_check(free_tail, -new_begin);
        self.set_base(new_begin, -free_tail);
        self.set_check(new_size - 1, -FREE_LIST);
        self.set_base(FREE_LIST, -(new_size - 1));
        self.cells[0].check = self.cells.len() as TrieIndex;
        true
    }

    /// Public growth entry point mirroring `trieExpand`: grows at least up
    /// to `size`, a no-op if already that large.
    pub fn expand(&mut self, size: TrieIndex) -> bool {
        self.ensure_capacity(size)
    }

    fn prepare_space(&mut self, s: TrieIndex) -> bool {
        self.ensure_capacity(s) && self.get_check(s) < 0
    }

    fn claim_cell(&mut self, s: TrieIndex) {
        let prev = -self.get_base(s);
        let next = -self.get_check(s);
        self.set_check(prev, -next);
        self.set_base(next, -prev);
        self.used += 1;
    }

    fn free_cell(&mut self, s: TrieIndex) {
        let mut i = -self.get_check(FREE_LIST);
        while i != FREE_LIST && i < s {
            i = -self.get_check(i);
        }
        let prev = -self.get_base(i);
        self.set_check(s, -i);
        self.set_base(s, -prev);
        self.set_check(prev, -s);
        self.set_base(i, -s);
        self.used -= 1;
    }

    fn fit_symbols(&mut self, base: TrieIndex, symbols: &Symbols) -> bool {
        for i in 0..symbols.len() {
            let sym = symbols.get(i).expect("index within symbols.len()");
            if base > TRIE_INDEX_MAX - sym as TrieIndex || !self.prepare_space(base + sym as TrieIndex) {
                return false;
            }
        }
        true
    }

    /// Finds (and reserves room for) a base such that every symbol in
    /// `symbols` lands on a currently-free cell (`_daFindFreeBase`).
    fn find_free_base(&mut self, symbols: &Symbols) -> Option<TrieIndex> {
        let first_sym = symbols.get(0)?;
        let mut s = -self.get_check(FREE_LIST);
        while s != FREE_LIST && s < first_sym as TrieIndex + DA_POOL_BEGIN {
            s = -self.get_check(s);
        }
        if s == FREE_LIST {
            s = first_sym as TrieIndex + DA_POOL_BEGIN;
            loop {
                if !self.ensure_capacity(s) {
                    return None;
                }
                if self.get_check(s) < 0 {
                    break;
                }
                s += 1;
            }
        }
        while !self.fit_symbols(s - first_sym as TrieIndex, symbols) {
            if -self.get_check(s) == FREE_LIST {
                let len = self.len();
                if !self.ensure_capacity(len) {
                    return None;
                }
            }
            s = -self.get_check(s);
        }
        Some(s - first_sym as TrieIndex)
    }

    /// Moves every child of `s` from its current base to `new_base`,
    /// fixing up grandchildren's `check` along the way (`_trieReIndex`).
    fn relocate_base(&mut self, s: TrieIndex, new_base: TrieIndex) {
        let old_base = self.get_base(s);
        let symbols = self.output_symbols(s);
        for i in 0..symbols.len() {
            let sym = symbols.get(i).expect("index within symbols.len()") as TrieIndex;
            let old_next = old_base + sym;
            let new_next = new_base + sym;
            let old_next_base = self.get_base(old_next);

            self.claim_cell(new_next);
            self.set_check(new_next, s);
            self.set_base(new_next, old_next_base);

            if old_next_base > 0 {
                let max_c = cmp::min(TRIE_CHAR_MAX as TrieIndex, self.len() - old_next_base);
                for c in 0..=max_c {
                    if self.get_check(old_next_base + c) == old_next {
                        self.set_check(old_next_base + c, new_next);
                    }
                }
            }
            self.free_cell(old_next);
        }
        self.set_base(s, new_base);
    }

    /// Adds an arc labelled `c` out of `s`, relocating `s`'s children to a
    /// fresh base first if `c`'s cell is already taken by something else.
    pub fn insert_branch(&mut self, s: TrieIndex, c: TrieChar) -> Option<TrieIndex> {
        let base = self.get_base(s);
        let next;
        if base > 0 {
            let candidate = base + c as TrieIndex;
            if self.get_check(candidate) == s {
                return Some(candidate);
            }
            if base > TRIE_INDEX_MAX - c as TrieIndex || !self.prepare_space(candidate) {
                let mut symbols = self.output_symbols(s);
                symbols.add(c);
                let new_base = self.find_free_base(&symbols)?;
                self.relocate_base(s, new_base);
                next = new_base + c as TrieIndex;
            } else {
                next = candidate;
            }
        } else {
            let mut symbols = Symbols::new();
            symbols.add(c);
            let new_base = self.find_free_base(&symbols)?;
            self.set_base(s, new_base);
            next = new_base + c as TrieIndex;
        }
        self.claim_cell(next);
        self.set_check(next, s);
        Some(next)
    }

    /// Frees `s` and its ancestors up to (not including) `upto` as long as
    /// they have no other children, undoing a partially-applied insert or
    /// collapsing a dead branch left behind by a delete (`_daPrune`).
    pub fn prune_upto(&mut self, upto: TrieIndex, mut s: TrieIndex) {
        while s != upto && !self.has_children(s) {
            let parent = self.get_check(s);
            self.free_cell(s);
            s = parent;
        }
    }

    pub fn prune(&mut self, s: TrieIndex) {
        let root = self.get_root();
        self.prune_upto(root, s);
    }

    /// Descends to the leftmost terminal node reachable from `s`
    /// (`_daFirstSeparate`); `None` if `s` has no branches at all.
    pub fn first_separate(&self, mut s: TrieIndex) -> Option<TrieIndex> {
        loop {
            let base = self.get_base(s);
            if base < 0 {
                return Some(s);
            }
            if base == 0 {
                return None;
            }
            let max_c = cmp::min(TRIE_CHAR_MAX as TrieIndex, self.len() - base);
            let mut found = None;
            for c in 0..=max_c {
                if self.get_check(base + c) == s {
                    found = Some(c);
                    break;
                }
            }
            s = base + found?;
        }
    }

    /// Finds the next terminal node after `sep` in ascending order within
    /// the subtree rooted at `root`, or `None` if `sep` was the last one
    /// (`_daNextSeparate`).
    pub fn next_separate(&self, root: TrieIndex, mut sep: TrieIndex) -> Option<TrieIndex> {
        while sep != root {
            let parent = self.get_check(sep);
            let base = self.get_base(parent);
            let mut c = sep - base;
            let max_c = cmp::min(TRIE_CHAR_MAX as TrieIndex, self.len() - base);
            loop {
                c += 1;
                if c > max_c {
                    break;
                }
                if self.get_check(base + c) == parent {
                    return self.first_separate(base + c);
                }
            }
            sep = parent;
        }
        None
    }
}

#[cfg(feature = "std")]
impl DArray {
    pub fn read<R: Read>(r: &mut R) -> io::Result<Self> {
        let sig = r.read_u32::<BigEndian>()?;
        if sig != DA_SIGNATURE {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "bad double array signature"));
        }
        let num_cells = r.read_i32::<BigEndian>()?;
        if num_cells < DA_POOL_BEGIN {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "double array smaller than its own header"));
        }
        let mut cells = Vec::with_capacity(num_cells as usize);
        cells.push(Cell { base: DA_SIGNATURE as TrieIndex, check: num_cells });
        let mut used = 0;
        for _ in 1..num_cells {
            let base = r.read_i32::<BigEndian>()?;
            let check = r.read_i32::<BigEndian>()?;
            if base >= 0 && check > 0 {
                used += 1;
            }
            cells.push(Cell { base, check });
        }
        Ok(Self { cells, used })
    }

    pub fn serialize<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<BigEndian>(DA_SIGNATURE)?;
        w.write_i32::<BigEndian>(self.len())?;
        for cell in &self.cells[1..] {
            w.write_i32::<BigEndian>(cell.base)?;
            w.write_i32::<BigEndian>(cell.check)?;
        }
        Ok(())
    }

    pub fn serialized_size(&self) -> usize {
        8 + (self.cells.len() - 1) * 8
    }
}
