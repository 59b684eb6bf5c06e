#![no_main]

use arbitrary::Arbitrary;
use datrie_kv::{AlphaMap, Trie};
use libfuzzer_sys::fuzz_target;
use std::hint::black_box;
use std::io::Cursor;
use std::ops::RangeInclusive;

#[derive(Arbitrary, Debug)]
struct Input {
    pub am_range: RangeInclusive<u8>,
    pub commands: Vec<Command>,
}

#[derive(Arbitrary, Debug)]
enum Command {
    Store { key: Vec<u8>, data: i32 },
    StoreIfAbsent { key: Vec<u8>, data: i32 },
    Retrieve { key: Vec<u8> },
    Delete { key: Vec<u8> },
    SerdeTest,
}

fn valid_key(key: &[u8]) -> bool {
    !key.contains(&0)
}

fuzz_target!(|input: Input| {
    let mut am = AlphaMap::default();
    if am.add_range(input.am_range.clone()).is_err() {
        return;
    }
    let mut trie = Trie::<i32>::new(am);

    for command in input.commands.iter() {
        match command {
            Command::Store { key, data } => {
                if !valid_key(key) {
                    continue;
                }
                let _ = trie.insert(key, *data);
            }
            Command::StoreIfAbsent { key, data } => {
                if !valid_key(key) {
                    continue;
                }
                let _ = trie.insert_if_absent(key, *data);
            }
            Command::Retrieve { key } => {
                if !valid_key(key) {
                    continue;
                }
                black_box(trie.get(key));
            }
            Command::Delete { key } => {
                if !valid_key(key) {
                    continue;
                }
                let _ = trie.remove(key);
            }
            Command::SerdeTest => {
                let mut buf: Vec<u8> = Vec::new();
                trie.serialize(&mut buf).unwrap();

                let mut buf_cursor = Cursor::new(&buf);
                let new_trie = Trie::<i32>::from_reader(&mut buf_cursor).unwrap();

                let mut new_buf: Vec<u8> = Vec::new();
                new_trie.serialize(&mut new_buf).unwrap();

                assert_eq!(buf, new_buf);
            }
        }
    }
});
