use core::fmt;

#[cfg(feature = "std")]
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
#[cfg(feature = "std")]
use std::io::{self, Read, Write};

/// Index into the double array or the tail pool. Negative values encode
/// either a free-ring link or a tail pointer, depending on which array
/// they came from; see `darray.rs`/`tail.rs`.
pub type TrieIndex = i32;
pub const TRIE_INDEX_MAX: TrieIndex = 0x7fffffff;
pub const TRIE_INDEX_ERROR: TrieIndex = 0;
pub const TRIE_INDEX_HALFMAX: TrieIndex = 0x3fffffff;

/// A byte of the *internal* (post-alphabet-map) alphabet. 0 is reserved
/// as the key terminator.
pub type TrieChar = u8;
pub const TRIE_CHAR_TERM: TrieChar = 0;
pub const TRIE_CHAR_MAX: TrieChar = TrieChar::MAX;

pub const DA_SIGNATURE: u32 = 0xdafc_dafc;
pub const TAIL_SIGNATURE: u32 = 0xdffc_dffc;
pub const ALPHA_MAP_SIGNATURE: u32 = 0xd9fc_d9fc;

/// Cells 0 (header), 1 (free-ring anchor) and 2 (root) are reserved; real
/// nodes start here.
pub const DA_POOL_BEGIN: TrieIndex = 3;
/// Tail pool slot indices handed out to callers are offset by this much so
/// that 0/1 stay free for the same kind of header bookkeeping the double
/// array uses.
pub const TAIL_START: TrieIndex = 2;

/// Smallest power of two, counted up from `DA_POOL_BEGIN`, strictly
/// greater than `size`. Shared by the double array and the tail pool, both
/// of which grow by doubling (`_trieNextPower` in the C engine this is
/// ported from).
pub(crate) fn next_power(size: TrieIndex) -> TrieIndex {
    if size >= TRIE_INDEX_HALFMAX {
        return TRIE_INDEX_MAX;
    }
    let mut i = DA_POOL_BEGIN;
    loop {
        if i > size {
            return i;
        }
        i <<= 1;
    }
}

/// Failure modes a caller can distinguish and act on. `Internal` is
/// reserved for invariants this crate itself is supposed to uphold; seeing
/// it means a bug here, not bad caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrieError {
    /// Key contains a byte outside the registered alphabet.
    AlphabetViolation,
    /// The double array or tail pool could not grow any further
    /// (`TrieIndex` would overflow, or the alphabet map would exceed 255
    /// symbols).
    CapacityExhausted,
    NotFound,
    DuplicateKey,
    /// The trie was mutated since this iterator was created.
    InvalidIterator,
    Internal,
}

impl fmt::Display for TrieError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            TrieError::AlphabetViolation => "key contains a byte outside the registered alphabet",
            TrieError::CapacityExhausted => "trie capacity exhausted",
            TrieError::NotFound => "key not found",
            TrieError::DuplicateKey => "key already exists",
            TrieError::InvalidIterator => "iterator invalidated by a concurrent mutation",
            TrieError::Internal => "internal invariant violation",
        };
        f.write_str(msg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TrieError {}

pub type TrieResult<T> = Result<T, TrieError>;

#[cfg(feature = "std")]
pub trait TrieSerializable {
    fn serialize<T: Write>(&self, writer: &mut T) -> io::Result<()>;

    fn serialized_size(&self) -> usize {
        let mut buf = Vec::new();
        self.serialize(&mut buf).expect("in-memory Vec write cannot fail");
        buf.len()
    }
}

#[cfg(feature = "std")]
pub trait TrieDeserializable {
    fn deserialize<T: Read>(reader: &mut T) -> io::Result<Self>
    where
        Self: Sized;
}

#[cfg(feature = "std")]
impl TrieSerializable for i32 {
    fn serialize<T: Write>(&self, writer: &mut T) -> io::Result<()> {
        writer.write_i32::<BigEndian>(*self)
    }

    fn serialized_size(&self) -> usize {
        core::mem::size_of::<i32>()
    }
}

#[cfg(feature = "std")]
impl TrieDeserializable for i32 {
    fn deserialize<T: Read>(reader: &mut T) -> io::Result<Self>
    where
        Self: Sized,
    {
        reader.read_i32::<BigEndian>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_power_starts_at_pool_begin() {
        assert_eq!(next_power(0), DA_POOL_BEGIN);
        assert_eq!(next_power(3), 6);
        assert_eq!(next_power(6), 12);
    }
}
