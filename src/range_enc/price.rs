//! Adaptive probability model and bit-price estimation.
//!
//! A [`Probability`] is P(bit = 0) scaled to 11 bits. Each context owns its
//! probabilities and mutates them only through the encoder; the price
//! functions here read them without adapting anything.
//!
//! Prices are in units of 1/16 bit (`1 << NUM_BIT_PRICE_SHIFT_BITS` per bit),
//! looked up from [`PRICE_TABLE`] indexed by the probability quantized to
//! 7 bits. The tree-price walks visit exactly the nodes that
//! [`RangeEncoder::encode_bit_tree`](super::RangeEncoder::encode_bit_tree) and
//! [`RangeEncoder::encode_bit_tree_reverse`](super::RangeEncoder::encode_bit_tree_reverse)
//! adapt, in the same order.

/// Fixed-point P(bit = 0), in `[0, BIT_MODEL_TOTAL)`.
pub type Probability = u16;

pub const NUM_TOP_BITS: u32 = 24;
/// Renormalization threshold: `range` never stays below this after an encode.
pub const TOP_VALUE: u32 = 1 << NUM_TOP_BITS;
pub const NUM_BIT_MODEL_TOTAL_BITS: u32 = 11;
pub const BIT_MODEL_TOTAL: u32 = 1 << NUM_BIT_MODEL_TOTAL_BITS;
/// Adaptation speed: each update moves the probability 1/32 of the way.
pub const NUM_MOVE_BITS: u32 = 5;
pub const PROB_INIT_VALUE: Probability = (BIT_MODEL_TOTAL >> 1) as Probability;
pub const NUM_MOVE_REDUCING_BITS: u32 = 4;
pub const NUM_BIT_PRICE_SHIFT_BITS: u32 = 4;

/// Price of a single bit whose probability is exactly one half.
pub const BIT_PRICE: u32 = 1 << NUM_BIT_PRICE_SHIFT_BITS;

const PRICE_TABLE_SIZE: usize = (BIT_MODEL_TOTAL >> NUM_MOVE_REDUCING_BITS) as usize;

/// `-log2(p)` in 1/16-bit units for each 7-bit quantized probability.
pub static PRICE_TABLE: [u32; PRICE_TABLE_SIZE] = [
    128, 103,  91,  84,  78,  73,  69,  66,
     63,  61,  58,  56,  54,  52,  51,  49,
     48,  46,  45,  44,  43,  42,  41,  40,
     39,  38,  37,  36,  35,  34,  34,  33,
     32,  31,  31,  30,  29,  29,  28,  28,
     27,  26,  26,  25,  25,  24,  24,  23,
     23,  22,  22,  22,  21,  21,  20,  20,
     19,  19,  19,  18,  18,  17,  17,  17,
     16,  16,  16,  15,  15,  15,  14,  14,
     14,  13,  13,  13,  12,  12,  12,  11,
     11,  11,  11,  10,  10,  10,  10,   9,
      9,   9,   9,   8,   8,   8,   8,   7,
      7,   7,   7,   6,   6,   6,   6,   5,
      5,   5,   5,   5,   4,   4,   4,   4,
      3,   3,   3,   3,   3,   2,   2,   2,
      2,   2,   2,   1,   1,   1,   1,   1,
];

/// Price of coding `bit` (0 or 1) with probability `prob`.
#[inline(always)]
pub fn get_price(prob: Probability, bit: u32) -> u32 {
    // For bit = 1 the mask flips every probability bit, pricing 1 - p.
    let mask = 0u32.wrapping_sub(bit & 1) & (BIT_MODEL_TOTAL - 1);
    PRICE_TABLE[((prob as u32 ^ mask) >> NUM_MOVE_REDUCING_BITS) as usize]
}

#[inline(always)]
pub fn get_price_0(prob: Probability) -> u32 {
    PRICE_TABLE[(prob as u32 >> NUM_MOVE_REDUCING_BITS) as usize]
}

#[inline(always)]
pub fn get_price_1(prob: Probability) -> u32 {
    PRICE_TABLE[((prob as u32 ^ (BIT_MODEL_TOTAL - 1)) >> NUM_MOVE_REDUCING_BITS) as usize]
}

/// Price of `bit_count` bits sent through
/// [`RangeEncoder::encode_direct`](super::RangeEncoder::encode_direct).
#[inline]
pub fn get_direct_price(bit_count: u32) -> u32 {
    bit_count << NUM_BIT_PRICE_SHIFT_BITS
}

/// Price of `symbol` under an MSB-first bit tree of `bit_count` levels.
///
/// `probs` is indexed from 1 (the root) exactly as the encoder indexes it.
pub fn get_tree_price(probs: &[Probability], bit_count: u32, symbol: u32) -> u32 {
    let mut price = 0;
    let mut tree_index = 1usize;
    for shift in (0..bit_count).rev() {
        let bit = (symbol >> shift) & 1;
        price += get_price(probs[tree_index], bit);
        tree_index = (tree_index << 1) | bit as usize;
    }
    price
}

/// Price of `symbol` under an LSB-first bit tree of `bit_count` levels.
pub fn get_reverse_tree_price(probs: &[Probability], bit_count: u32, symbol: u32) -> u32 {
    let mut price = 0;
    let mut tree_index = 1usize;
    let mut symbol = symbol;
    for _ in 0..bit_count {
        let bit = symbol & 1;
        symbol >>= 1;
        price += get_price(probs[tree_index], bit);
        tree_index = (tree_index << 1) | bit as usize;
    }
    price
}

/// Reset a context array to the even split.
pub fn init_probs(probs: &mut [Probability]) {
    probs.fill(PROB_INIT_VALUE);
}
