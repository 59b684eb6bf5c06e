#![no_main]

use arbitrary::Arbitrary;
use datrie_kv::{AlphaMap, Trie};
use libfuzzer_sys::fuzz_target;
use std::collections::HashMap;
use std::io::Cursor;
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
            continue;
        }
        let _ = trie.insert(key, *val);
    }

    let mut buf: Vec<u8> = Vec::new();
    trie.serialize(&mut buf).unwrap();

    let mut buf_cursor = Cursor::new(&buf);
    let new_trie = Trie::<i32>::from_reader(&mut buf_cursor).unwrap();

    let mut new_buf: Vec<u8> = Vec::new();
    new_trie.serialize(&mut new_buf).unwrap();

    assert_eq!(buf, new_buf);
});
