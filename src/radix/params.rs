//! Runtime parameters of a match table.

use super::types::{Layout, TableMode, BITPACK_MAX_POSITIONS};
use crate::config::{
    BLOCK_OVERLAP_DEFAULT, BLOCK_OVERLAP_MAX, BUFFER_LOG_DEFAULT, BUFFER_LOG_MAX, BUFFER_LOG_MIN,
    DICTIONARY_LOG_DEFAULT, DICTIONARY_SIZE_MAX, DICTIONARY_SIZE_MIN, SEARCH_DEPTH_DEFAULT,
    SEARCH_DEPTH_MAX, SEARCH_DEPTH_MIN,
};
use crate::error::Fl2Error;

/// Smallest builder match buffer, in elements.
const MATCH_BUFFER_SIZE_MIN: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadixParams {
    /// Positions the table can hold; a block's `end` may not exceed it.
    pub dictionary_size: usize,
    /// Refinement depth during the build and chain hops during queries.
    pub depth: u32,
    /// Builder match-buffer size relative to the dictionary, as a log
    /// (16 means one slot per position).
    pub match_buffer_log: u32,
    /// Bytes carried over between streamed blocks, in sixteenths of the
    /// dictionary.
    pub overlap_fraction: u32,
    pub mode: TableMode,
}

impl Default for RadixParams {
    fn default() -> Self {
        RadixParams {
            dictionary_size: 1 << DICTIONARY_LOG_DEFAULT,
            depth: SEARCH_DEPTH_DEFAULT,
            match_buffer_log: BUFFER_LOG_DEFAULT,
            overlap_fraction: BLOCK_OVERLAP_DEFAULT,
            mode: TableMode::Auto,
        }
    }
}

impl RadixParams {
    /// Default parameters for a given dictionary size.
    pub fn with_dictionary_size(dictionary_size: usize) -> Self {
        RadixParams {
            dictionary_size,
            ..RadixParams::default()
        }
    }

    pub fn validate(&self) -> Result<(), Fl2Error> {
        if !(DICTIONARY_SIZE_MIN..=DICTIONARY_SIZE_MAX).contains(&self.dictionary_size)
            || !(SEARCH_DEPTH_MIN..=SEARCH_DEPTH_MAX).contains(&self.depth)
            || !(BUFFER_LOG_MIN..=BUFFER_LOG_MAX).contains(&self.match_buffer_log)
            || self.overlap_fraction > BLOCK_OVERLAP_MAX
        {
            return Err(Fl2Error::ParameterOutOfBound);
        }
        if self.mode == TableMode::Bitpack && self.dictionary_size > BITPACK_MAX_POSITIONS {
            return Err(Fl2Error::ParameterOutOfBound);
        }
        Ok(())
    }

    /// Elements a builder loads from one list at a time.
    pub fn match_buffer_size(&self) -> usize {
        (self.dictionary_size >> (BUFFER_LOG_MAX - self.match_buffer_log))
            .max(MATCH_BUFFER_SIZE_MIN)
    }

    /// Bytes kept as dictionary prefix when a streamed block is shifted out.
    pub fn overlap_size(&self) -> usize {
        (self.dictionary_size >> 4) * self.overlap_fraction as usize
    }

    /// The layout a table built from these parameters uses.
    pub fn layout(&self) -> Layout {
        match self.mode {
            TableMode::Bitpack => Layout::Bitpack,
            TableMode::Structured => Layout::Structured,
            TableMode::Auto if self.dictionary_size <= BITPACK_MAX_POSITIONS => Layout::Bitpack,
            TableMode::Auto => Layout::Structured,
        }
    }
}
