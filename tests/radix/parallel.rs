// Tests for multi-threaded construction.
//
// Coverage:
//   - tables built with 1 and 8 builders answer every query identically
//   - pools smaller or larger than the builder count still build correctly
//   - every job is claimed exactly once

use flzma2::radix::{DataBlock, MatchTable, TableMode};
use flzma2::threadpool::BuildPool;

use crate::support::{assert_matches_hold, build, low_entropy, params, text_like};

fn mixed_input() -> Vec<u8> {
    let mut data = text_like(150_000, 61);
    data.extend(low_entropy(100_000, 62));
    data.extend(text_like(50_000, 61));
    data
}

#[test]
fn thread_count_does_not_change_results() {
    let data = mixed_input();
    let block = DataBlock::whole(&data);
    for mode in [TableMode::Bitpack, TableMode::Structured] {
        let params = params(1 << 19, 32, mode);
        let single = build(&block, &params, 1);
        let many = build(&block, &params, 8);
        for i in 0..data.len() {
            assert_eq!(
                single.get_match(&block, i, 273, 32),
                many.get_match(&block, i, 273, 32),
                "at {i}"
            );
        }
    }
}

#[test]
fn pool_and_builder_counts_may_differ() {
    let data = text_like(120_000, 63);
    let block = DataBlock::whole(&data);
    let params = params(1 << 17, 32, TableMode::Auto);
    let reference = build(&block, &params, 1);

    for (workers, builders) in [(2, 4), (8, 2), (8, 1)] {
        let pool = BuildPool::new(workers).unwrap();
        let mut table = MatchTable::new(&params, builders).unwrap();
        table.init(&block).unwrap();
        table.build(&block, &pool).unwrap();
        assert_eq!(table.control().jobs_claimed(), table.job_count());
        assert_matches_hold(&table, &block, 273, 32);
        for i in (0..data.len()).step_by(7) {
            assert_eq!(
                table.get_match(&block, i, 273, 32),
                reference.get_match(&block, i, 273, 32)
            );
        }
    }
}
