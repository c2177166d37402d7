// Tests for streaming blocks through a DictionaryBuffer.
//
// Coverage:
//   - after a shift, matches reach back into the retained prefix
//   - prefix positions are not queryable; their bytes are candidates only
//   - a window longer than the table is rejected at init

use flzma2::radix::{DataBlock, DictionaryBuffer, MatchTable, RadixParams, TableMode};
use flzma2::threadpool::BuildPool;
use flzma2::Fl2Error;

use crate::support::{assert_matches_hold, params, random_bytes};

#[test]
fn matches_reach_into_the_retained_prefix() {
    let chunk = random_bytes(8192, 41);
    let pool = BuildPool::new(2).unwrap();
    let mut dict = DictionaryBuffer::new(16384).unwrap();
    let mut table = MatchTable::new(&params(16384, 32, TableMode::Auto), 2).unwrap();

    assert_eq!(dict.append(&chunk), chunk.len());
    let block = dict.block();
    table.init(&block).unwrap();
    table.build(&block, &pool).unwrap();
    let first_block_matches = (0..block.end())
        .filter_map(|i| table.get_match(&block, i, 273, 32))
        .filter(|m| m.length >= 8)
        .count();
    assert_eq!(first_block_matches, 0);

    dict.shift(8192);
    assert_eq!(dict.pending(), 0);
    dict.append(&chunk);
    let block = dict.block();
    assert_eq!((block.start(), block.end()), (8192, 16384));
    table.init(&block).unwrap();
    table.build(&block, &pool).unwrap();

    for i in 0..block.start() {
        assert_eq!(table.get_match(&block, i, 273, 32), None);
    }
    for i in block.start()..block.end() - 1 {
        let want = 273.min(block.end() - i) as u32;
        let m = table.get_match(&block, i, 273, 32).unwrap();
        assert_eq!(m.length, want, "at {i}");
        if want > 32 {
            assert_eq!(m.offset, 8192, "at {i}");
        }
    }
    assert_matches_hold(&table, &block, 273, 32);
    table.integrity_check(&block, 32).unwrap();
}

#[test]
fn overlap_size_follows_parameters() {
    let params = RadixParams {
        overlap_fraction: 4,
        ..RadixParams::with_dictionary_size(1 << 16)
    };
    assert_eq!(params.overlap_size(), 1 << 14);

    let data = random_bytes(1 << 16, 42);
    let mut dict = DictionaryBuffer::new(1 << 16).unwrap();
    dict.append(&data);
    assert!(dict.is_full());
    dict.shift(params.overlap_size());
    let block = dict.block();
    assert_eq!(block.start(), 1 << 14);
    assert_eq!(block.data(), &data[data.len() - (1 << 14)..]);
}

#[test]
fn window_longer_than_table_is_rejected() {
    let data = random_bytes(10_000, 43);
    let mut dict = DictionaryBuffer::new(16384).unwrap();
    dict.append(&data);
    let mut table = MatchTable::new(&params(4096, 32, TableMode::Auto), 1).unwrap();
    assert_eq!(table.init(&dict.block()).unwrap_err(), Fl2Error::ParameterOutOfBound);
    let fits = DataBlock::new(&data, 0, 4096).unwrap();
    table.init(&fits).unwrap();
}
