#![no_main]

use arbitrary::Arbitrary;
use datrie_kv::{AlphaMap, Trie};
use libfuzzer_sys::fuzz_target;
use std::collections::HashMap;
use std::ops::RangeInclusive;

#[derive(Arbitrary, Debug)]
struct Input {
    pub am_range: RangeInclusive<u8>,
    pub data: HashMap<Vec<u8>, i32>,
}

fuzz_target!(|input: Input| {
    let mut am = AlphaMap::default();
    if am.add_range(input.am_range.clone()).is_err() {
        return;
    }
    let mut trie = Trie::<i32>::new(am);

    for (key, val) in input.data.iter() {
        if key.contains(&0) {
            // 0 is always the terminator; never a valid key byte.
            continue;
        }
        // Byte outside the registered range is a normal `Err`, not a bug.
        let _ = trie.insert(key, *val);
    }

    for (key, expected) in trie.iter() {
        let value = input
            .data
            .get(key)
            .unwrap_or_else(|| panic!("got key {key:?} from the trie that was never inserted"));
        assert_eq!(expected, value);
    }

    for (key, expected) in input.data.iter() {
        if key.contains(&0) {
            continue;
        }
        if let Some(actual) = trie.get(key) {
            assert_eq!(actual, expected);
        }
    }
});
