#![no_main]
use libfuzzer_sys::fuzz_target;

use flzma2::range_enc::{get_price, Probability, RangeEncoder, PROB_INIT_VALUE};

// Each input byte is one bit decision: low bit is the value, the next three
// bits pick one of eight contexts.
fuzz_target!(|data: &[u8]| {
    let mut rc = RangeEncoder::with_capacity(data.len() + 16).expect("capacity");
    let mut probs: [Probability; 8] = [PROB_INIT_VALUE; 8];
    let mut price = 0u64;
    for &b in data {
        let bit = (b & 1) as u32;
        let ctx = ((b >> 1) & 7) as usize;
        price += get_price(probs[ctx], bit) as u64;
        rc.encode_bit(&mut probs[ctx], bit);
        assert!(rc.range() >= 1 << 24);
    }
    rc.flush();
    // Initial cache byte plus flush slack.
    let estimate = (price >> 4) / 8;
    assert!(rc.out_index() as u64 <= estimate + estimate / 4 + 8);
});
