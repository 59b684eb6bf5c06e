use alloc::vec::Vec;

#[cfg(feature = "std")]
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
#[cfg(feature = "std")]
use std::io::{self, Read, Write};

use crate::types::{next_power, TrieChar, TrieIndex, TAIL_SIGNATURE, TAIL_START, TRIE_CHAR_TERM};

struct TailEntry<V> {
    suffix: Option<Vec<TrieChar>>,
    key: Option<Vec<u8>>,
    data: Option<V>,
    /// Index of the next free slot, or -1 if this slot is in use or is the
    /// last link in the free chain.
    next_free: TrieIndex,
}

impl<V> TailEntry<V> {
    fn empty() -> Self {
        Self { suffix: None, key: None, data: None, next_free: -1 }
    }
}

/// The tail pool: one record per key whose suffix diverged from every
/// sibling early enough that the double array stopped branching. Each
/// record also owns the full external key and its value, so lookups and
/// enumeration never need to retrace the double-array path to recover a
/// key (`trieEntry`/`_tailAllocCell`/`_tailFreeCell` in the C engine this
/// is ported from).
pub struct Tail<V> {
    entries: Vec<TailEntry<V>>,
    first_free: TrieIndex,
    used: usize,
}

impl<V> Default for Tail<V> {
    fn default() -> Self {
        Self { entries: Vec::new(), first_free: -1, used: 0 }
    }
}

impl<V> Tail<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tail slots currently holding a key.
    pub fn len(&self) -> usize {
        self.used
    }

    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Total number of slots allocated, in use or not.
    pub(crate) fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn first_free(&self) -> TrieIndex {
        self.first_free
    }

    fn real(idx: TrieIndex) -> usize {
        (idx - TAIL_START) as usize
    }

    /// Claims a free slot (growing the pool if none is free) and returns
    /// its externally-visible index.
    pub fn alloc(&mut self) -> TrieIndex {
        if self.first_free != -1 {
            let real = self.first_free as usize;
            self.first_free = self.entries[real].next_free;
            self.entries[real] = TailEntry::empty();
            self.used += 1;
            return real as TrieIndex + TAIL_START;
        }

        let real = self.entries.len() as TrieIndex;
        let new_size = next_power(real);
        self.entries.resize_with(new_size as usize, TailEntry::empty);
        for i in (real + 1)..(new_size - 1) {
            self.entries[i as usize].next_free = i + 1;
        }
        if new_size - 1 > real {
            self.entries[(new_size - 1) as usize].next_free = -1;
            self.first_free = real + 1;
        } else {
            self.first_free = -1;
        }
        self.used += 1;
        real + TAIL_START
    }

    /// Releases `idx` back to the pool, dropping its contents and
    /// returning the value that was stored there.
    pub fn free(&mut self, idx: TrieIndex) -> Option<V> {
        let real = Self::real(idx);
        if real >= self.entries.len() {
            return None;
        }
        let val = self.entries[real].data.take();
        self.entries[real].suffix = None;
        self.entries[real].key = None;

        let real_i = real as TrieIndex;
        if self.first_free == -1 || real_i < self.first_free {
            self.entries[real].next_free = self.first_free;
            self.first_free = real_i;
        } else {
            let mut cur = self.first_free;
            loop {
                let next = self.entries[cur as usize].next_free;
                if next == -1 || next > real_i {
                    self.entries[cur as usize].next_free = real_i;
                    self.entries[real].next_free = next;
                    break;
                }
                cur = next;
            }
        }
        self.used -= 1;
        val
    }

    pub fn get_suffix(&self, idx: TrieIndex) -> Option<&[TrieChar]> {
        self.entries.get(Self::real(idx))?.suffix.as_deref()
    }

    pub fn set_suffix(&mut self, idx: TrieIndex, suffix: &[TrieChar]) {
        self.entries[Self::real(idx)].suffix = Some(suffix.to_vec());
    }

    pub fn get_key(&self, idx: TrieIndex) -> Option<&[u8]> {
        self.entries.get(Self::real(idx))?.key.as_deref()
    }

    pub fn set_key(&mut self, idx: TrieIndex, key: &[u8]) {
        self.entries[Self::real(idx)].key = Some(key.to_vec());
    }

    pub fn get_data(&self, idx: TrieIndex) -> Option<&V> {
        self.entries.get(Self::real(idx))?.data.as_ref()
    }

    pub fn get_data_mut(&mut self, idx: TrieIndex) -> Option<&mut V> {
        self.entries.get_mut(Self::real(idx))?.data.as_mut()
    }

    pub fn set_data(&mut self, idx: TrieIndex, data: V) {
        self.entries[Self::real(idx)].data = Some(data);
    }

    /// Walks one symbol `c` through the suffix stored at `idx`, starting
    /// at `pos`. Returns the next position, or `None` if `c` does not
    /// match the suffix there (`_trieWalkTail`).
    pub fn walk_char(&self, idx: TrieIndex, pos: i32, c: TrieChar) -> Option<i32> {
        let suffix = self.get_suffix(idx)?;
        let cur = *suffix.get(pos as usize)?;
        if cur != c {
            return None;
        }
        if cur == TRIE_CHAR_TERM {
            Some(pos)
        } else {
            Some(pos + 1)
        }
    }
}

#[cfg(feature = "std")]
impl<V> Tail<V>
where
    V: crate::types::TrieSerializable + crate::types::TrieDeserializable + Default,
{
    pub fn read<R: Read>(r: &mut R) -> io::Result<Self> {
        let sig = r.read_u32::<BigEndian>()?;
        if sig != TAIL_SIGNATURE {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "bad tail signature"));
        }
        let n_entries = r.read_i32::<BigEndian>()?;
        let first_free = r.read_i32::<BigEndian>()?;
        let mut entries = Vec::with_capacity(n_entries as usize);
        let mut used = 0usize;
        for _ in 0..n_entries {
            let next_free = r.read_i32::<BigEndian>()?;
            let in_use = r.read_u8()? != 0;
            if in_use {
                let suffix_len = r.read_i32::<BigEndian>()? as usize;
                let mut suffix = alloc::vec![0u8; suffix_len];
                r.read_exact(&mut suffix)?;
                let key_len = r.read_i32::<BigEndian>()? as usize;
                let mut key = alloc::vec![0u8; key_len];
                r.read_exact(&mut key)?;
                let data = V::deserialize(r)?;
                used += 1;
                entries.push(TailEntry { suffix: Some(suffix), key: Some(key), data: Some(data), next_free });
            } else {
                entries.push(TailEntry { suffix: None, key: None, data: None, next_free });
            }
        }
        Ok(Self { entries, first_free, used })
    }

    pub fn serialize<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<BigEndian>(TAIL_SIGNATURE)?;
        w.write_i32::<BigEndian>(self.entries.len() as i32)?;
        w.write_i32::<BigEndian>(self.first_free)?;
        for entry in &self.entries {
            w.write_i32::<BigEndian>(entry.next_free)?;
            match (&entry.suffix, &entry.key, &entry.data) {
                (Some(suffix), Some(key), Some(data)) => {
                    w.write_u8(1)?;
                    w.write_i32::<BigEndian>(suffix.len() as i32)?;
                    w.write_all(suffix)?;
                    w.write_i32::<BigEndian>(key.len() as i32)?;
                    w.write_all(key)?;
                    data.serialize(w)?;
                }
                _ => w.write_u8(0)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_then_free_recycles_slot() {
        let mut tail: Tail<i32> = Tail::new();
        let a = tail.alloc();
        tail.set_key(a, b"a");
        tail.set_data(a, 1);
        assert_eq!(tail.len(), 1);
        tail.free(a);
        assert_eq!(tail.len(), 0);
        let b = tail.alloc();
        assert_eq!(a, b);
        assert_eq!(tail.get_key(b), None);
    }

    #[test]
    fn walk_char_stops_at_terminator() {
        let mut tail: Tail<i32> = Tail::new();
        let idx = tail.alloc();
        tail.set_suffix(idx, &[b'o', b'g', TRIE_CHAR_TERM]);
        let pos = tail.walk_char(idx, 0, b'o').unwrap();
        let pos = tail.walk_char(idx, pos, b'g').unwrap();
        let pos = tail.walk_char(idx, pos, TRIE_CHAR_TERM).unwrap();
        assert!(tail.walk_char(idx, pos, b'x').is_none());
    }

    /// P3 (spec.md's tail bijection): the set of indices a caller has
    /// allocated and not yet freed is exactly the set of slots that still
    /// hold data, through a mix of allocation, freeing and reuse. A DA cell
    /// only ever points at a slot via exactly one of `alloc`'s returned
    /// indices, so this is the half of the bijection `Tail<V>` alone is
    /// responsible for; the other half (one DA cell per in-use index) is
    /// `trie.rs`'s to keep, since only it writes `base[s] = -idx`.
    #[test]
    fn allocated_indices_match_in_use_slots() {
        let mut tail: Tail<i32> = Tail::new();
        let mut allocated: alloc::collections::BTreeSet<TrieIndex> = alloc::collections::BTreeSet::new();

        let mut idxs = Vec::new();
        for i in 0..8 {
            let idx = tail.alloc();
            tail.set_key(idx, &[i as u8]);
            tail.set_data(idx, i);
            allocated.insert(idx);
            idxs.push(idx);
        }
        for (i, &idx) in idxs.iter().enumerate() {
            if i % 2 == 0 {
                tail.free(idx);
                allocated.remove(&idx);
            }
        }
        for i in 0..3 {
            let idx = tail.alloc();
            tail.set_key(idx, &[100 + i]);
            tail.set_data(idx, 100 + i as i32);
            allocated.insert(idx);
        }

        let capacity = tail.capacity() as TrieIndex;
        let observed: alloc::collections::BTreeSet<TrieIndex> = (TAIL_START..TAIL_START + capacity)
            .filter(|&idx| tail.get_data(idx).is_some())
            .collect();

        assert_eq!(observed, allocated);
        assert_eq!(tail.len(), allocated.len());
    }
}
