// Tests for price estimation (range_enc/price.rs).
//
// Coverage:
//   - tree prices over the full alphabet at the even split add up to n bits
//     per symbol within one quantization step per bit
//   - price functions leave probabilities untouched
//   - reverse tree price mirrors the reverse encode walk
//   - prices track actual coded size
//   - adaptation lowers the price of what was seen

use flzma2::range_enc::price::{
    get_direct_price, get_price, get_reverse_tree_price, get_tree_price, init_probs,
    Probability, BIT_PRICE, PRICE_TABLE, PROB_INIT_VALUE,
};
use flzma2::range_enc::RangeEncoder;

use crate::support::XorShift;

#[test]
fn full_alphabet_costs_about_n_bits_per_symbol() {
    for n in 1..=8u32 {
        let probs = [PROB_INIT_VALUE; 256];
        let total: u32 = (0..1u32 << n).map(|s| get_tree_price(&probs, n, s)).sum();
        // Each 0 costs 16 units and each 1 costs 17 at the even split; half
        // of all bits over the alphabet are ones.
        let expected = (BIT_PRICE * n << n) + (n << (n - 1));
        assert_eq!(total, expected, "n = {n}");
        let per_symbol = total as f64 / (1u32 << n) as f64 / BIT_PRICE as f64;
        assert!((per_symbol - n as f64).abs() <= n as f64 / 16.0);
    }
}

#[test]
fn pricing_does_not_adapt() {
    let mut rng = XorShift::new(3);
    let mut probs: Vec<Probability> = (0..64).map(|_| (31 + rng.below(1986)) as Probability).collect();
    let snapshot = probs.clone();
    for s in 0..64 {
        get_tree_price(&probs, 6, s);
        get_reverse_tree_price(&probs, 6, s);
    }
    assert_eq!(probs, snapshot);
    init_probs(&mut probs);
    assert!(probs.iter().all(|&p| p == PROB_INIT_VALUE));
}

#[test]
fn reverse_tree_price_follows_reverse_walk() {
    let mut rc = RangeEncoder::with_capacity(4096).unwrap();
    let mut probs = [PROB_INIT_VALUE; 16];
    // Train on symbol 0b0001 so the LSB-first path for it gets cheap.
    for _ in 0..200 {
        rc.encode_bit_tree_reverse(&mut probs, 4, 0b0001);
    }
    let trained = get_reverse_tree_price(&probs, 4, 0b0001);
    let mirrored = get_reverse_tree_price(&probs, 4, 0b1000);
    assert!(trained < mirrored, "{trained} !< {mirrored}");
    // The MSB-first walk visits different nodes for the same symbol.
    assert_ne!(get_tree_price(&probs, 4, 0b0001), trained);
}

#[test]
fn adaptation_lowers_price_of_seen_symbols() {
    let mut rc = RangeEncoder::with_capacity(4096).unwrap();
    let mut probs = [PROB_INIT_VALUE; 256];
    let before = get_tree_price(&probs, 8, 0x5A);
    for _ in 0..50 {
        rc.encode_bit_tree(&mut probs, 8, 0x5A);
    }
    let after = get_tree_price(&probs, 8, 0x5A);
    assert!(after < before / 4, "{after} vs {before}");
    assert!(get_tree_price(&probs, 8, 0xA5) > before);
}

#[test]
fn prices_track_coded_size() {
    let mut rng = XorShift::new(11);
    let mut rc = RangeEncoder::with_capacity(64 * 1024).unwrap();
    let mut probs = [PROB_INIT_VALUE; 256];
    let mut price_total: u64 = 0;
    for _ in 0..20_000 {
        // Skewed toward a few symbols so the models do some work.
        let symbol = if rng.below(4) == 0 {
            rng.below(256) as u32
        } else {
            rng.below(8) as u32
        };
        price_total += get_tree_price(&probs, 8, symbol) as u64;
        rc.encode_bit_tree(&mut probs, 8, symbol);
        if rng.below(16) == 0 {
            let v = rng.next_u64() as u32 & 0xFFF;
            price_total += get_direct_price(12) as u64;
            rc.encode_direct(v, 12);
        }
    }
    rc.flush();
    let estimated_bits = price_total as f64 / BIT_PRICE as f64;
    let actual_bits = (rc.out_index() * 8) as f64;
    let error = (estimated_bits - actual_bits).abs() / actual_bits;
    // Table quantization overcharges skewed bits slightly.
    assert!(error < 0.10, "estimated {estimated_bits}, actual {actual_bits}");
}

#[test]
fn price_table_is_monotone() {
    assert!(PRICE_TABLE.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(get_price(PROB_INIT_VALUE, 0), BIT_PRICE);
    assert_eq!(get_direct_price(3), 3 * BIT_PRICE);
}
