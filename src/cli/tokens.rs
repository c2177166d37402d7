//! Literal/match token coding used by the analysis tool.
//!
//! Each token starts with an is-match flag, modelled on whether the previous
//! token was a match. A literal follows as an 8-bit tree. A match follows as
//! `length - 2` in an 8-bit tree, the offset's bit count minus one in a
//! 5-bit tree, and the offset bits below the leading one sent direct.
//!
//! Tokens are coded in independent chunks: models and coder are reset at
//! every chunk start, so each [`CodedChunk`] decodes on its own.

use crate::error::Fl2Error;
use crate::radix::MIN_MATCH_LENGTH;
use crate::range_enc::{
    get_direct_price, get_price, get_tree_price, init_probs, Probability, RangeEncoder,
    PROB_INIT_VALUE,
};

/// Input bytes covered by one chunk before it is closed.
pub const CHUNK_INPUT_SIZE: usize = 1 << 16;
/// Longest match a token can carry.
pub const MATCH_LEN_MAX: usize = MIN_MATCH_LENGTH + 255;

const LITERAL_BITS: u32 = 8;
const LENGTH_BITS: u32 = 8;
const OFFSET_SLOT_BITS: u32 = 5;
/// Upper bound on what one token can add to a chunk.
const MAX_TOKEN_BYTES: usize = 32;
/// Output capacity reserved per chunk.
const CHUNK_CAPACITY: usize = (CHUNK_INPUT_SIZE + MATCH_LEN_MAX) * 8 + 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Literal(u8),
    Match { length: u32, offset: u32 },
}

impl Token {
    /// Input bytes the token stands for.
    pub fn len(&self) -> usize {
        match *self {
            Token::Literal(_) => 1,
            Token::Match { length, .. } => length as usize,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Number of significant bits in `offset` (1 for an offset of 1).
#[inline]
pub fn offset_bit_count(offset: u32) -> u32 {
    32 - offset.leading_zeros()
}

/// Adaptive contexts for one chunk.
#[derive(Debug, Clone)]
pub struct TokenModels {
    pub is_match: [Probability; 2],
    pub literal: [Probability; 1 << LITERAL_BITS],
    pub length: [Probability; 1 << LENGTH_BITS],
    pub offset_slot: [Probability; 1 << OFFSET_SLOT_BITS],
    pub prev_match: bool,
}

impl Default for TokenModels {
    fn default() -> Self {
        TokenModels {
            is_match: [PROB_INIT_VALUE; 2],
            literal: [PROB_INIT_VALUE; 1 << LITERAL_BITS],
            length: [PROB_INIT_VALUE; 1 << LENGTH_BITS],
            offset_slot: [PROB_INIT_VALUE; 1 << OFFSET_SLOT_BITS],
            prev_match: false,
        }
    }
}

impl TokenModels {
    pub fn reset(&mut self) {
        init_probs(&mut self.is_match);
        init_probs(&mut self.literal);
        init_probs(&mut self.length);
        init_probs(&mut self.offset_slot);
        self.prev_match = false;
    }

    pub fn encode(&mut self, rc: &mut RangeEncoder, token: Token) {
        let state = self.prev_match as usize;
        match token {
            Token::Literal(byte) => {
                rc.encode_bit0(&mut self.is_match[state]);
                rc.encode_bit_tree(&mut self.literal, LITERAL_BITS, byte as u32);
                self.prev_match = false;
            }
            Token::Match { length, offset } => {
                debug_assert!(length as usize >= MIN_MATCH_LENGTH && length as usize <= MATCH_LEN_MAX);
                debug_assert!(offset > 0);
                rc.encode_bit1(&mut self.is_match[state]);
                rc.encode_bit_tree(
                    &mut self.length,
                    LENGTH_BITS,
                    length - MIN_MATCH_LENGTH as u32,
                );
                let bits = offset_bit_count(offset);
                rc.encode_bit_tree(&mut self.offset_slot, OFFSET_SLOT_BITS, bits - 1);
                if bits > 1 {
                    rc.encode_direct(offset & ((1 << (bits - 1)) - 1), bits - 1);
                }
                self.prev_match = true;
            }
        }
    }

    /// What [`encode`](Self::encode) would cost in the current state, in
    /// 1/16-bit units.
    pub fn price(&self, token: Token) -> u32 {
        let flag = self.is_match[self.prev_match as usize];
        match token {
            Token::Literal(byte) => {
                get_price(flag, 0) + get_tree_price(&self.literal, LITERAL_BITS, byte as u32)
            }
            Token::Match { length, offset } => {
                let bits = offset_bit_count(offset);
                get_price(flag, 1)
                    + get_tree_price(&self.length, LENGTH_BITS, length - MIN_MATCH_LENGTH as u32)
                    + get_tree_price(&self.offset_slot, OFFSET_SLOT_BITS, bits - 1)
                    + get_direct_price(bits - 1)
            }
        }
    }
}

/// One independently decodable chunk.
#[derive(Debug, Clone)]
pub struct CodedChunk {
    /// Input bytes the chunk reproduces.
    pub input_size: usize,
    pub bytes: Vec<u8>,
}

/// Streams tokens into a sequence of [`CodedChunk`]s.
#[derive(Debug)]
pub struct TokenEncoder {
    rc: RangeEncoder,
    models: TokenModels,
    chunk_input: usize,
    /// Sum of [`TokenModels::price`] over every token, in 1/16-bit units.
    price_total: u64,
    chunks: Vec<CodedChunk>,
}

impl TokenEncoder {
    pub fn new() -> Result<Self, Fl2Error> {
        Ok(TokenEncoder {
            rc: RangeEncoder::with_capacity(CHUNK_CAPACITY)?,
            models: TokenModels::default(),
            chunk_input: 0,
            price_total: 0,
            chunks: Vec::new(),
        })
    }

    pub fn push(&mut self, token: Token) -> Result<(), Fl2Error> {
        if self.chunk_input >= CHUNK_INPUT_SIZE
            || self.rc.pending_size() + MAX_TOKEN_BYTES > self.rc.chunk_size()
        {
            self.close_chunk()?;
        }
        self.price_total += self.models.price(token) as u64;
        self.models.encode(&mut self.rc, token);
        self.chunk_input += token.len();
        Ok(())
    }

    /// Estimated size of everything pushed so far, in bits.
    pub fn estimated_bits(&self) -> u64 {
        self.price_total >> 4
    }

    fn close_chunk(&mut self) -> Result<(), Fl2Error> {
        if self.chunk_input == 0 {
            return Ok(());
        }
        self.rc.flush();
        let bytes = self.rc.take_output_buffer();
        self.chunks.push(CodedChunk {
            input_size: self.chunk_input,
            bytes,
        });
        let mut next = Vec::new();
        next.try_reserve_exact(CHUNK_CAPACITY)
            .map_err(|_| Fl2Error::AllocationFailure)?;
        next.resize(CHUNK_CAPACITY, 0);
        self.rc.set_output_buffer(next);
        self.rc.reset();
        self.models.reset();
        self.chunk_input = 0;
        Ok(())
    }

    /// Close the open chunk and return all of them.
    pub fn finish(mut self) -> Result<Vec<CodedChunk>, Fl2Error> {
        self.close_chunk()?;
        Ok(self.chunks)
    }
}
