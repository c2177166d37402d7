// Shared fixtures for the match-finder suites: deterministic data
// generators, a one-call table builder and a brute-force longest-match
// reference.

#![allow(dead_code)]

use flzma2::radix::{DataBlock, MatchTable, RadixParams, TableMode};
use flzma2::threadpool::BuildPool;

pub struct XorShift(u64);

impl XorShift {
    pub fn new(seed: u64) -> Self {
        XorShift(seed.max(1))
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    pub fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }
}

pub fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = XorShift::new(seed);
    (0..len).map(|_| rng.next_u64() as u8).collect()
}

/// Words from a small vocabulary: lots of medium-length repeats.
pub fn text_like(len: usize, seed: u64) -> Vec<u8> {
    const WORDS: &[&[u8]] = &[
        b"the", b"radix", b"match", b"finder", b"builds", b"a", b"table", b"of", b"links",
        b"between", b"positions", b"sharing", b"prefixes", b"and", b"range", b"coder",
    ];
    let mut rng = XorShift::new(seed);
    let mut out = Vec::with_capacity(len + 16);
    while out.len() < len {
        out.extend_from_slice(WORDS[rng.below(WORDS.len() as u64) as usize]);
        out.push(if rng.below(9) == 0 { b'\n' } else { b' ' });
    }
    out.truncate(len);
    out
}

/// Four-symbol alphabet with runs: long bucket lists, deep refinement.
pub fn low_entropy(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = XorShift::new(seed);
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        let symbol = b"acgt"[rng.below(4) as usize];
        let run = 1 + rng.below(6) as usize;
        out.extend(std::iter::repeat(symbol).take(run));
    }
    out.truncate(len);
    out
}

pub fn params(dictionary_size: usize, depth: u32, mode: TableMode) -> RadixParams {
    RadixParams {
        depth,
        mode,
        ..RadixParams::with_dictionary_size(dictionary_size)
    }
}

/// Table over `block`, built on `threads` workers.
pub fn build(block: &DataBlock<'_>, params: &RadixParams, threads: usize) -> MatchTable {
    let pool = BuildPool::new(threads).unwrap();
    let mut table = MatchTable::new(params, threads).unwrap();
    table.init(block).unwrap();
    table.build(block, &pool).unwrap();
    table
}

/// Longest `l <= cap` such that some `j < i` has `data[j..j+l] == data[i..i+l]`,
/// with both ranges inside `[0, end)`.
pub fn longest_prior_match(data: &[u8], end: usize, i: usize, cap: usize) -> usize {
    let limit = cap.min(end - i);
    (0..i)
        .map(|j| {
            data[j..end]
                .iter()
                .zip(&data[i..i + limit])
                .take_while(|(a, b)| a == b)
                .count()
        })
        .max()
        .unwrap_or(0)
}

/// Every reported match must hold byte for byte.
pub fn assert_matches_hold(table: &MatchTable, block: &DataBlock<'_>, limit: usize, depth: u32) {
    let data = block.data();
    for i in block.start()..block.end() {
        if let Some(m) = table.get_match(block, i, limit, depth) {
            let (len, off) = (m.length as usize, m.offset as usize);
            assert!(len >= 2 && len <= limit.min(block.end() - i), "length {len} at {i}");
            assert!(off >= 1 && off <= i, "offset {off} at {i}");
            assert_eq!(data[i..i + len], data[i - off..i - off + len], "bytes differ at {i}");
        }
    }
}
