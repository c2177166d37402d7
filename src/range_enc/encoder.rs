//! Binary adaptive range encoder with carry propagation.
//!
//! The encoder keeps a 33-bit `low` accumulator (32 bits of interval base plus
//! one carry bit) and a 32-bit `range`. Whenever `range` falls below
//! [`TOP_VALUE`] the top byte of `low` is retired through [`RangeEncoder::shift_low`]:
//! a byte that could still be bumped by a later carry (`0xFF`) is held back as
//! a count in `cache_size` behind the last settled byte in `cache`, and the
//! whole run is written once the carry is known. Five final shifts in
//! [`RangeEncoder::flush`] drain everything.
//!
//! The output sink is a caller-supplied `Vec<u8>` whose length is the chunk
//! capacity. Sizing it is the caller's job; see [`RangeEncoder::pending_size`].

use super::price::{
    Probability, BIT_MODEL_TOTAL, NUM_BIT_MODEL_TOTAL_BITS, NUM_MOVE_BITS, TOP_VALUE,
};
use crate::error::Fl2Error;

/// Number of `shift_low` calls needed to drain `low` and the cache at chunk end.
pub const FLUSH_SHIFT_COUNT: usize = 5;

/// Stateful range encoder. One instance drives one chunk at a time.
#[derive(Debug)]
pub struct RangeEncoder {
    out_buffer: Vec<u8>,
    out_index: usize,
    cache_size: u64,
    low: u64,
    range: u32,
    cache: u8,
}

impl RangeEncoder {
    /// Encoder with no output buffer bound yet, in the reset state.
    pub fn new() -> Self {
        RangeEncoder {
            out_buffer: Vec::new(),
            out_index: 0,
            cache_size: 0,
            low: 0,
            range: u32::MAX,
            cache: 0,
        }
    }

    /// Encoder owning a zeroed output buffer of `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Result<Self, Fl2Error> {
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(capacity)
            .map_err(|_| Fl2Error::AllocationFailure)?;
        buffer.resize(capacity, 0);
        let mut rc = RangeEncoder::new();
        rc.set_output_buffer(buffer);
        Ok(rc)
    }

    /// Rebind the output sink. `buffer.len()` is the chunk capacity; the write
    /// cursor restarts at 0. Coder state is left untouched.
    pub fn set_output_buffer(&mut self, buffer: Vec<u8>) {
        self.out_buffer = buffer;
        self.out_index = 0;
    }

    /// Hand the output buffer back, truncated to the bytes written so far.
    /// The encoder is left without a sink.
    pub fn take_output_buffer(&mut self) -> Vec<u8> {
        let mut buffer = std::mem::take(&mut self.out_buffer);
        buffer.truncate(self.out_index);
        self.out_index = 0;
        buffer
    }

    /// Bytes written to the sink so far.
    #[inline]
    pub fn output(&self) -> &[u8] {
        &self.out_buffer[..self.out_index]
    }

    #[inline]
    pub fn out_index(&self) -> usize {
        self.out_index
    }

    /// Capacity of the bound sink.
    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.out_buffer.len()
    }

    /// Bytes the current chunk will occupy if flushed now: what has been
    /// written, the carry run still held back, the cache byte itself and the
    /// bytes still inside `low`.
    #[inline]
    pub fn pending_size(&self) -> usize {
        self.out_index + self.cache_size as usize + FLUSH_SHIFT_COUNT
    }

    /// Start a new independently decodable chunk.
    pub fn reset(&mut self) {
        self.low = 0;
        self.range = u32::MAX;
        self.cache_size = 0;
        self.cache = 0;
    }

    #[inline]
    pub fn low(&self) -> u64 {
        self.low
    }

    #[inline]
    pub fn range(&self) -> u32 {
        self.range
    }

    /// Number of `0xFF` bytes waiting for a carry to resolve.
    #[inline]
    pub fn cache_size(&self) -> u64 {
        self.cache_size
    }

    /// # Panics
    /// Panics if the chunk capacity is exhausted.
    #[inline(always)]
    fn write_byte(&mut self, byte: u8) {
        self.out_buffer[self.out_index] = byte;
        self.out_index += 1;
    }

    /// Retire the top byte of `low`, resolving or deferring the carry.
    #[inline(never)]
    pub fn shift_low(&mut self) {
        let low = self.low;
        self.low = ((low << 8) as u32) as u64;
        if low < 0xFF00_0000 || low > 0xFFFF_FFFF {
            let mut high = (low >> 32) as u8;
            let settled = self.cache.wrapping_add(high);
            self.write_byte(settled);
            self.cache = (low >> 24) as u8;
            if self.cache_size != 0 {
                // 0xFF + carry: 0x00 when the carry arrived, 0xFF otherwise.
                high = high.wrapping_add(0xFF);
                while self.cache_size != 0 {
                    self.write_byte(high);
                    self.cache_size -= 1;
                }
            }
        } else {
            self.cache_size += 1;
        }
    }

    #[inline(always)]
    fn normalize(&mut self) {
        if self.range < TOP_VALUE {
            self.range <<= 8;
            self.shift_low();
        }
    }

    /// Encode a 0 and move `prob` toward certainty of 0.
    #[inline(always)]
    pub fn encode_bit0(&mut self, prob: &mut Probability) {
        let p = *prob as u32;
        self.range = (self.range >> NUM_BIT_MODEL_TOTAL_BITS) * p;
        *prob = (p + ((BIT_MODEL_TOTAL - p) >> NUM_MOVE_BITS)) as Probability;
        self.normalize();
    }

    /// Encode a 1 and move `prob` toward certainty of 1.
    #[inline(always)]
    pub fn encode_bit1(&mut self, prob: &mut Probability) {
        let p = *prob as u32;
        let new_bound = (self.range >> NUM_BIT_MODEL_TOTAL_BITS) * p;
        self.low += new_bound as u64;
        self.range -= new_bound;
        *prob = (p - (p >> NUM_MOVE_BITS)) as Probability;
        self.normalize();
    }

    /// Encode `bit` (any non-zero value is a 1) under `prob`.
    #[inline(always)]
    pub fn encode_bit(&mut self, prob: &mut Probability, bit: u32) {
        if bit != 0 {
            self.encode_bit1(prob);
        } else {
            self.encode_bit0(prob);
        }
    }

    /// Encode the low `bit_count` bits of `symbol`, most significant first,
    /// through the bit tree rooted at `probs[1]`.
    ///
    /// `probs` must hold at least `1 << bit_count` entries.
    pub fn encode_bit_tree(&mut self, probs: &mut [Probability], bit_count: u32, symbol: u32) {
        debug_assert!(bit_count > 0);
        let mut tree_index = 1usize;
        for shift in (0..bit_count).rev() {
            let bit = (symbol >> shift) & 1;
            self.encode_bit(&mut probs[tree_index], bit);
            tree_index = (tree_index << 1) | bit as usize;
        }
    }

    /// Same tree walk as [`encode_bit_tree`](Self::encode_bit_tree) but least
    /// significant bit first.
    pub fn encode_bit_tree_reverse(
        &mut self,
        probs: &mut [Probability],
        bit_count: u32,
        symbol: u32,
    ) {
        debug_assert!(bit_count > 0);
        let mut tree_index = 1usize;
        let mut symbol = symbol;
        for _ in 0..bit_count {
            let bit = symbol & 1;
            symbol >>= 1;
            self.encode_bit(&mut probs[tree_index], bit);
            tree_index = (tree_index << 1) | bit as usize;
        }
    }

    /// Encode the low `bit_count` bits of `value` at a fixed even split,
    /// most significant first.
    #[inline(never)]
    pub fn encode_direct(&mut self, value: u32, bit_count: u32) {
        debug_assert!(bit_count > 0 && bit_count <= 32);
        for shift in (0..bit_count).rev() {
            self.range >>= 1;
            let bit = (value >> shift) & 1;
            self.low += (self.range & 0u32.wrapping_sub(bit)) as u64;
            self.normalize();
        }
    }

    /// Drain `low` and any deferred carry run. Call once per chunk, then
    /// [`reset`](Self::reset) before encoding the next one.
    pub fn flush(&mut self) {
        for _ in 0..FLUSH_SHIFT_COUNT {
            self.shift_low();
        }
    }
}

impl Default for RangeEncoder {
    fn default() -> Self {
        RangeEncoder::new()
    }
}
