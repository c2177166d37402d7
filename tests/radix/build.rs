// Tests for table construction (radix/table.rs, radix/builder.rs).
//
// Coverage:
//   - the first hop of every chain is the nearest longest prior match,
//     compared with brute force, for short and long bucket lists and both
//     layouts
//   - lists longer than the match buffer (chunked refinement) still give
//     valid, useful tables
//   - parameter and lifecycle errors: ParameterOutOfBound, StageWrong
//   - progress and job accounting after a full build

use flzma2::radix::{build_table, DataBlock, Layout, MatchTable, RadixParams, TableMode};
use flzma2::threadpool::BuildPool;
use flzma2::Fl2Error;

use crate::support::{
    assert_matches_hold, build, longest_prior_match, low_entropy, params, random_bytes,
    text_like, XorShift,
};

/// Mostly one byte value: one huge top-level bucket.
fn mostly_one_byte(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = XorShift::new(seed);
    (0..len)
        .map(|_| if rng.below(50) == 0 { b'b' } else { b'a' })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Match quality
// ─────────────────────────────────────────────────────────────────────────────

fn check_against_brute_force(data: &[u8], depth: u32, mode: TableMode) {
    let block = DataBlock::whole(data);
    let table = build(&block, &params(4096, depth, mode), 2);
    for i in 0..data.len() {
        let expected = longest_prior_match(data, data.len(), i, depth as usize);
        let found = table.get_match(&block, i, 273, depth);
        if expected >= 2 {
            let m = found.unwrap_or_else(|| panic!("no match at {i}, expected {expected}"));
            assert!(
                m.length as usize >= expected,
                "at {i}: length {} < {expected}",
                m.length
            );
        } else {
            assert_eq!(found, None, "at {i}");
        }
    }
}

#[test]
fn first_hop_is_longest_match_on_text() {
    let data = text_like(3000, 1);
    check_against_brute_force(&data, 32, TableMode::Auto);
    check_against_brute_force(&data, 64, TableMode::Structured);
}

#[test]
fn first_hop_is_longest_match_on_low_entropy() {
    let data = low_entropy(3000, 2);
    check_against_brute_force(&data, 16, TableMode::Bitpack);
    check_against_brute_force(&data, 100, TableMode::Structured);
}

#[test]
fn first_hop_is_longest_match_with_two_byte_refinement() {
    // The "aa" bucket is large enough for two-byte splits.
    let data = mostly_one_byte(3000, 3);
    check_against_brute_force(&data, 40, TableMode::Bitpack);
    check_against_brute_force(&data, 7, TableMode::Structured);
}

#[test]
fn random_data_has_few_long_matches() {
    let data = random_bytes(3000, 4);
    check_against_brute_force(&data, 32, TableMode::Auto);
}

#[test]
fn lists_longer_than_match_buffer_are_chunked() {
    let data = mostly_one_byte(60_000, 5);
    let block = DataBlock::whole(&data);
    let params = params(1 << 16, 32, TableMode::Auto);
    assert!(params.match_buffer_size() < data.len());
    let table = build(&block, &params, 3);
    assert_matches_hold(&table, &block, 273, 32);
    table.integrity_check(&block, 32).unwrap();
    // Every position whose first two bytes occurred before has a match.
    let mut seen = std::collections::HashSet::new();
    for i in 0..data.len() - 1 {
        let pair = (data[i], data[i + 1]);
        let found = table.get_match(&block, i, 273, 32);
        assert_eq!(found.is_some(), seen.contains(&pair), "at {i}");
        seen.insert(pair);
    }
}

#[test]
fn build_table_one_call() {
    let data = text_like(20_000, 6);
    let block = DataBlock::whole(&data);
    let table = build_table(&block, 24, 4).unwrap();
    assert!(table.is_built());
    assert_eq!(table.params().depth, 24);
    assert_eq!(table.layout(), Layout::Bitpack);
    assert_matches_hold(&table, &block, 273, 24);
}

#[test]
fn single_byte_block_has_no_matches() {
    let block = DataBlock::whole(b"x");
    let table = build_table(&block, 32, 1).unwrap();
    assert_eq!(table.get_match(&block, 0, 273, 32), None);
    assert_eq!(table.bucket_count(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn out_of_range_parameters_are_rejected() {
    let good = RadixParams::with_dictionary_size(1 << 16);
    assert_eq!(MatchTable::new(&good, 0).unwrap_err(), Fl2Error::ParameterOutOfBound);
    assert_eq!(MatchTable::new(&good, 201).unwrap_err(), Fl2Error::ParameterOutOfBound);
    for depth in [0, 5, 255] {
        let p = RadixParams { depth, ..good };
        assert_eq!(MatchTable::new(&p, 1).unwrap_err(), Fl2Error::ParameterOutOfBound);
    }
    let p = RadixParams { dictionary_size: 100, ..good };
    assert_eq!(MatchTable::new(&p, 1).unwrap_err(), Fl2Error::ParameterOutOfBound);
    let p = RadixParams {
        dictionary_size: 1 << 27,
        mode: TableMode::Bitpack,
        ..good
    };
    assert_eq!(p.validate(), Err(Fl2Error::ParameterOutOfBound));
    assert_eq!(BuildPool::new(0).unwrap_err(), Fl2Error::ParameterOutOfBound);
}

#[test]
fn empty_block_is_rejected() {
    let block = DataBlock::whole(b"");
    assert_eq!(build_table(&block, 32, 1).unwrap_err(), Fl2Error::ParameterOutOfBound);
}

#[test]
fn block_larger_than_dictionary_is_rejected() {
    let data = random_bytes(5000, 7);
    let mut table = MatchTable::new(&RadixParams::with_dictionary_size(4096), 1).unwrap();
    assert_eq!(
        table.init(&DataBlock::whole(&data)).unwrap_err(),
        Fl2Error::ParameterOutOfBound
    );
}

#[test]
fn build_requires_matching_init() {
    let data = text_like(8000, 8);
    let pool = BuildPool::new(2).unwrap();
    let mut table = MatchTable::new(&RadixParams::with_dictionary_size(8192), 2).unwrap();
    let block = DataBlock::whole(&data);
    assert_eq!(table.build(&block, &pool).unwrap_err(), Fl2Error::StageWrong);

    table.init(&block).unwrap();
    let shorter = DataBlock::new(&data, 0, 4000).unwrap();
    assert_eq!(table.build(&shorter, &pool).unwrap_err(), Fl2Error::StageWrong);
    table.build(&block, &pool).unwrap();
    // Built tables need a fresh init before another build.
    assert_eq!(table.build(&block, &pool).unwrap_err(), Fl2Error::StageWrong);
}

// ─────────────────────────────────────────────────────────────────────────────
// Accounting
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn progress_counts_every_bucketed_position() {
    let data = random_bytes(50_000, 9);
    let block = DataBlock::whole(&data);
    let table = build(&block, &params(1 << 16, 32, TableMode::Auto), 4);
    assert_eq!(table.progress(), (data.len() - 1) as u64);
    let control = table.control();
    assert!(table.job_count() > 1);
    assert_eq!(control.jobs_claimed(), table.job_count());
    assert!(!control.is_cancelled());
}

#[test]
fn table_can_be_reused_for_another_block() {
    let first = text_like(10_000, 10);
    let second = low_entropy(12_000, 11);
    let pool = BuildPool::new(2).unwrap();
    let mut table = MatchTable::new(&params(1 << 14, 32, TableMode::Auto), 2).unwrap();
    for data in [&first, &second] {
        let block = DataBlock::whole(data);
        table.init(&block).unwrap();
        table.build(&block, &pool).unwrap();
        assert_matches_hold(&table, &block, 273, 32);
    }
}
