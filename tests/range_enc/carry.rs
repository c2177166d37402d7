// Carry propagation checks against an arbitrary-precision reference.
//
// The reference keeps every emitted byte and applies each carry to the byte
// vector directly, walking back through any run of 0xFF bytes. The real
// encoder holds such runs in `cache`/`cache_size` instead; both must emit
// the same bytes.
//
// Coverage:
//   - random adaptive/direct streams produce byte-identical output
//   - those streams actually exercise carries through pending 0xFF runs
//   - a carry resolving a pending run turns it into 0x00 bytes

use flzma2::range_enc::price::{
    Probability, BIT_MODEL_TOTAL, NUM_BIT_MODEL_TOTAL_BITS, NUM_MOVE_BITS, PROB_INIT_VALUE,
    TOP_VALUE,
};
use flzma2::range_enc::RangeEncoder;

use crate::support::XorShift;

/// Arbitrary-precision model of the encoder's interval arithmetic.
struct ReferenceCoder {
    bytes: Vec<u8>,
    low: u64,
    range: u32,
    /// Carries that had to pass over at least one 0xFF byte.
    carries_through_ff: usize,
}

impl ReferenceCoder {
    fn new() -> Self {
        ReferenceCoder {
            bytes: vec![0],
            low: 0,
            range: u32::MAX,
            carries_through_ff: 0,
        }
    }

    fn add(&mut self, value: u32) {
        self.low += value as u64;
        if self.low >= 1 << 32 {
            self.low -= 1 << 32;
            let mut i = self.bytes.len() - 1;
            if self.bytes[i] == 0xFF {
                self.carries_through_ff += 1;
            }
            while self.bytes[i] == 0xFF {
                self.bytes[i] = 0;
                i -= 1;
            }
            self.bytes[i] += 1;
        }
    }

    fn shift(&mut self) {
        self.bytes.push((self.low >> 24) as u8);
        self.low = (self.low & 0x00FF_FFFF) << 8;
    }

    fn normalize(&mut self) {
        if self.range < TOP_VALUE {
            self.range <<= 8;
            self.shift();
        }
    }

    fn encode_bit(&mut self, prob: &mut Probability, bit: u32) {
        let p = *prob as u32;
        let bound = (self.range >> NUM_BIT_MODEL_TOTAL_BITS) * p;
        if bit == 0 {
            self.range = bound;
            *prob = (p + ((BIT_MODEL_TOTAL - p) >> NUM_MOVE_BITS)) as Probability;
        } else {
            self.add(bound);
            self.range -= bound;
            *prob = (p - (p >> NUM_MOVE_BITS)) as Probability;
        }
        self.normalize();
    }

    fn encode_direct(&mut self, value: u32, bit_count: u32) {
        for shift in (0..bit_count).rev() {
            self.range >>= 1;
            if (value >> shift) & 1 != 0 {
                self.add(self.range);
            }
            self.normalize();
        }
    }

    /// Everything but the final byte, which is the still-pending cache.
    fn finish(mut self) -> (Vec<u8>, usize) {
        for _ in 0..5 {
            self.shift();
        }
        let last = self.bytes.pop();
        assert_eq!(last, Some(0));
        (self.bytes, self.carries_through_ff)
    }
}

enum Op {
    Bit(usize, u32),
    Direct(u32, u32),
}

fn random_ops(seed: u64, count: usize) -> Vec<Op> {
    let mut rng = XorShift::new(seed);
    (0..count)
        .map(|_| {
            if rng.below(8) == 0 {
                let bits = 1 + rng.below(26) as u32;
                Op::Direct(rng.next_u64() as u32, bits)
            } else {
                let ctx = rng.below(3) as usize;
                // Mostly-ones streams push low toward the top of the interval.
                Op::Bit(ctx, rng.biased_bit([250, 128, 240][ctx]))
            }
        })
        .collect()
}

#[test]
fn random_streams_match_reference_bytes() {
    let mut total_ff_carries = 0;
    for seed in 1..=40u64 {
        let ops = random_ops(seed, 20_000);
        let mut rc = RangeEncoder::with_capacity(256 * 1024).unwrap();
        let mut reference = ReferenceCoder::new();
        let mut probs = [PROB_INIT_VALUE; 3];
        let mut ref_probs = [PROB_INIT_VALUE; 3];
        for op in &ops {
            match *op {
                Op::Bit(ctx, bit) => {
                    rc.encode_bit(&mut probs[ctx], bit);
                    reference.encode_bit(&mut ref_probs[ctx], bit);
                }
                Op::Direct(value, bits) => {
                    rc.encode_direct(value, bits);
                    reference.encode_direct(value, bits);
                }
            }
        }
        rc.flush();
        let (expected, ff_carries) = reference.finish();
        assert_eq!(rc.output(), &expected[..], "seed {seed}");
        total_ff_carries += ff_carries;
    }
    assert!(total_ff_carries > 0, "no stream carried through a 0xFF run");
}

#[test]
fn carry_turns_pending_ff_run_into_zeros() {
    // Find a stream whose reference output contains 0x00 bytes produced by a
    // carry through a pending run, then check the real bytes agree there.
    for seed in 100..400u64 {
        let ops = random_ops(seed, 4000);
        let mut rc = RangeEncoder::with_capacity(64 * 1024).unwrap();
        let mut reference = ReferenceCoder::new();
        let mut probs = [PROB_INIT_VALUE; 3];
        let mut ref_probs = [PROB_INIT_VALUE; 3];
        let mut saw_pending = false;
        for op in &ops {
            match *op {
                Op::Bit(ctx, bit) => {
                    rc.encode_bit(&mut probs[ctx], bit);
                    reference.encode_bit(&mut ref_probs[ctx], bit);
                }
                Op::Direct(value, bits) => {
                    rc.encode_direct(value, bits);
                    reference.encode_direct(value, bits);
                }
            }
            saw_pending |= rc.cache_size() > 0;
        }
        rc.flush();
        let (expected, ff_carries) = reference.finish();
        if ff_carries == 0 || !saw_pending {
            continue;
        }
        assert_eq!(rc.output(), &expected[..]);
        assert!(rc.output().contains(&0x00));
        return;
    }
    panic!("no stream produced a carry through a pending 0xFF run");
}
