#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use types::{
    TrieChar, TrieError, TrieIndex, TrieResult, TRIE_CHAR_MAX, TRIE_CHAR_TERM, TRIE_INDEX_ERROR,
    TRIE_INDEX_MAX,
};
#[cfg(feature = "std")]
pub use types::{TrieDeserializable, TrieSerializable};

pub use alpha_map::AlphaMap;

pub use trie::{Trie, TrieIterator, TrieStats};

pub mod alpha_map;
mod darray;
mod symbols;
mod tail;
pub mod trie;
pub mod types;
