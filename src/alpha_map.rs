use alloc::vec::Vec;
use core::ops::RangeInclusive;

use rangemap::RangeInclusiveMap;

#[cfg(feature = "std")]
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
#[cfg(feature = "std")]
use std::io::{self, Read, Write};

use crate::types::{TrieChar, TrieError, TrieIndex, TrieResult, ALPHA_MAP_SIGNATURE, TRIE_CHAR_TERM, TRIE_INDEX_MAX};

/// A bijection between a sparse set of external key bytes and a dense
/// internal symbol range `1..=n_symbols` (0 is reserved for the
/// terminator). Registered ranges may overlap or sit adjacent to one
/// another; `RangeInclusiveMap` coalesces them automatically, which
/// replaces the manually-linked, manually-merged `AlphaRange` list the C
/// engine keeps (`alpha_map_add_range_only`).
#[derive(Clone)]
pub struct AlphaMap {
    ranges: RangeInclusiveMap<u16, ()>,
    alpha_begin: u16,
    alpha_end: u16,
    byte_to_trie: Vec<TrieIndex>,
    trie_to_byte: Vec<u8>,
}

impl Default for AlphaMap {
    fn default() -> Self {
        Self {
            ranges: RangeInclusiveMap::new(),
            alpha_begin: 0,
            alpha_end: 0,
            byte_to_trie: Vec::new(),
            trie_to_byte: Vec::new(),
        }
    }
}

impl AlphaMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `range` as part of the alphabet. Overlapping or adjacent
    /// ranges merge transparently. Fails if the total alphabet width would
    /// exceed 255 distinct symbols.
    pub fn add_range(&mut self, range: RangeInclusive<u8>) -> TrieResult<()> {
        if range.start() > range.end() {
            return Err(TrieError::AlphabetViolation);
        }

        let backup = self.ranges.clone();
        self.ranges
            .insert((*range.start() as u16)..=(*range.end() as u16), ());
        match self.recalc() {
            Ok(()) => Ok(()),
            Err(e) => {
                self.ranges = backup;
                let _ = self.recalc();
                Err(e)
            }
        }
    }

    fn recalc(&mut self) -> TrieResult<()> {
        self.byte_to_trie.clear();
        self.trie_to_byte.clear();

        let Some((first, _)) = self.ranges.iter().next() else {
            self.alpha_begin = 0;
            self.alpha_end = 0;
            return Ok(());
        };
        self.alpha_begin = *first.start();

        let mut total_symbols: u32 = 0;
        let mut last_end = self.alpha_begin;
        for (range, _) in self.ranges.iter() {
            total_symbols += u32::from(*range.end()) - u32::from(*range.start()) + 1;
            last_end = *range.end();
        }
        self.alpha_end = last_end;

        if total_symbols > TrieChar::MAX as u32 {
            return Err(TrieError::CapacityExhausted);
        }

        let n_alpha = (self.alpha_end - self.alpha_begin) as usize + 1;
        self.byte_to_trie.resize(n_alpha, TRIE_INDEX_MAX);

        let n_trie = total_symbols as usize + 1;
        self.trie_to_byte.resize(n_trie, 0);

        let mut trie_char: TrieIndex = 1;
        for (range, _) in self.ranges.iter() {
            for b in *range.start()..=*range.end() {
                self.byte_to_trie[(b - self.alpha_begin) as usize] = trie_char;
                self.trie_to_byte[trie_char as usize] = b as u8;
                trie_char += 1;
            }
        }
        Ok(())
    }

    /// Maps an external byte to its internal symbol, if registered.
    pub fn char_to_trie(&self, b: u8) -> Option<TrieChar> {
        let b16 = b as u16;
        if b16 < self.alpha_begin || b16 > self.alpha_end {
            return None;
        }
        match self.byte_to_trie[(b16 - self.alpha_begin) as usize] {
            TRIE_INDEX_MAX => None,
            v => Some(v as TrieChar),
        }
    }

    /// Maps an internal symbol back to its external byte. The terminator
    /// (0) maps to 0.
    pub fn trie_to_char(&self, tc: TrieChar) -> Option<u8> {
        if tc == TRIE_CHAR_TERM {
            return Some(0);
        }
        self.trie_to_byte.get(tc as usize).copied()
    }

    /// Encodes `key` into the internal alphabet, appending the
    /// terminator. Fails on the first byte outside the registered
    /// alphabet.
    pub fn encode(&self, key: &[u8]) -> TrieResult<Vec<TrieChar>> {
        let mut out = Vec::with_capacity(key.len() + 1);
        for &b in key {
            out.push(self.char_to_trie(b).ok_or(TrieError::AlphabetViolation)?);
        }
        out.push(TRIE_CHAR_TERM);
        Ok(out)
    }

    /// Decodes a terminator-delimited internal buffer back to external
    /// bytes, stopping at the first terminator.
    pub fn decode(&self, internal: &[TrieChar]) -> Vec<u8> {
        internal
            .iter()
            .copied()
            .take_while(|&c| c != TRIE_CHAR_TERM)
            .filter_map(|c| self.trie_to_char(c))
            .collect()
    }
}

#[cfg(feature = "std")]
impl AlphaMap {
    pub fn read<R: Read>(r: &mut R) -> io::Result<Self> {
        let sig = r.read_u32::<BigEndian>()?;
        if sig != ALPHA_MAP_SIGNATURE {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "bad alpha map signature"));
        }
        let n_ranges = r.read_i32::<BigEndian>()?;
        let mut map = AlphaMap::default();
        for _ in 0..n_ranges {
            let begin = r.read_u32::<BigEndian>()?;
            let end = r.read_u32::<BigEndian>()?;
            if begin > 255 || end > 255 {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "alpha map range out of byte range"));
            }
            map.add_range((begin as u8)..=(end as u8))
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "alpha map capacity exceeded"))?;
        }
        Ok(map)
    }

    pub fn serialize<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let merged: Vec<_> = self.ranges.iter().collect();
        w.write_u32::<BigEndian>(ALPHA_MAP_SIGNATURE)?;
        w.write_i32::<BigEndian>(merged.len() as i32)?;
        for (range, _) in merged {
            w.write_u32::<BigEndian>(*range.start() as u32)?;
            w.write_u32::<BigEndian>(*range.end() as u32)?;
        }
        Ok(())
    }

    pub fn serialized_size(&self) -> usize {
        4 + 4 + self.ranges.iter().count() * 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_adjacent_ranges() {
        let mut am = AlphaMap::new();
        am.add_range(b'a'..=b'm').unwrap();
        am.add_range(b'n'..=b'z').unwrap();
        assert_eq!(am.ranges.iter().count(), 1);
    }

    #[test]
    fn encode_decode_round_trips() {
        let mut am = AlphaMap::new();
        am.add_range(b'a'..=b'z').unwrap();
        let encoded = am.encode(b"cat").unwrap();
        assert_eq!(encoded.last(), Some(&TRIE_CHAR_TERM));
        assert_eq!(am.decode(&encoded), b"cat");
    }

    #[test]
    fn rejects_byte_outside_alphabet() {
        let mut am = AlphaMap::new();
        am.add_range(b'a'..=b'z').unwrap();
        assert_eq!(am.encode(b"Cat"), Err(TrieError::AlphabetViolation));
    }

    #[test]
    fn rejects_alphabet_wider_than_255() {
        let mut am = AlphaMap::new();
        assert_eq!(am.add_range(0..=255), Err(TrieError::CapacityExhausted));
    }
}
