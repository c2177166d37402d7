//! Match-finder constants and the small value types shared by the store,
//! the builder and the table.

// ─────────────────────────────────────────────────────────────────────────────
// Bucketing
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level buckets: one per two-byte prefix.
pub const RADIX16_TABLE_SIZE: usize = 1 << 16;
/// Refinement buckets: one per following byte.
pub const RADIX8_TABLE_SIZE: usize = 1 << 8;

/// Link value meaning "no earlier position shares this prefix".
pub const RADIX_NULL_LINK: u32 = u32::MAX;

/// Consecutive non-empty top-level buckets handed out per job claim.
pub const JOB_BUCKET_COUNT: usize = 32;

/// Lists at or below this size are finished by pairwise comparison.
pub const BRUTE_FORCE_LIST_SIZE: u32 = 5;
/// Lists at or above this size are refined two bytes per step.
pub const RADIX16_LIST_THRESHOLD: u32 = 2048;

/// Elements re-processed at the start of each match-buffer chunk, so the
/// tail of the previous chunk sees candidates from the next one.
pub const MATCH_BUFFER_OVERLAP: usize = 6;

// ─────────────────────────────────────────────────────────────────────────────
// Layout limits
// ─────────────────────────────────────────────────────────────────────────────

/// Bits of a bitpacked word holding the link; the rest hold the length.
pub const BITPACK_LINK_BITS: u32 = 26;
pub const BITPACK_LINK_MASK: u32 = (1 << BITPACK_LINK_BITS) - 1;
/// Largest position count a bitpacked table can address. The all-ones word
/// is reserved for the null link.
pub const BITPACK_MAX_POSITIONS: usize = (1 << BITPACK_LINK_BITS) - 1;
pub const BITPACK_MAX_LENGTH: u32 = (1 << (32 - BITPACK_LINK_BITS)) - 1;

pub const STRUCTURED_MAX_LENGTH: u32 = u8::MAX as u32;
/// Positions grouped per structured unit.
pub const STRUCTURED_UNIT_SIZE: usize = 4;

/// Shortest match [`MatchTable::get_match`](super::MatchTable::get_match) reports.
pub const MIN_MATCH_LENGTH: usize = 2;

// ─────────────────────────────────────────────────────────────────────────────
// Value types
// ─────────────────────────────────────────────────────────────────────────────

/// Head and population of one top-level bucket after stage 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableHead {
    /// Highest position in the bucket; the list runs downward from here.
    pub head: u32,
    pub count: u32,
}

/// Tail tracker for one refinement bucket while a list is being split.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListTail {
    /// Match-buffer index of the first element routed to this bucket.
    pub head: u32,
    /// Match-buffer index of the most recent element routed to this bucket.
    pub prev_index: u32,
    pub list_count: u32,
}

/// One element of a list loaded into the builder's match buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildMatch {
    /// Dictionary position.
    pub from: u32,
    /// Match-buffer index of the next (lower) element in the current sublist.
    pub next: u32,
}

/// A verified match: `length` bytes at `index` repeat those at `index - offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub length: u32,
    pub offset: u32,
}

/// Requested physical layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableMode {
    /// Bitpacked when the dictionary fits its addressing range, else structured.
    #[default]
    Auto,
    Bitpack,
    Structured,
}

/// Layout actually in use by a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One 32-bit word per position: 26-bit link, 6-bit length (cap 63).
    Bitpack,
    /// Units of four links plus four byte-wide lengths (cap 255).
    Structured,
}

impl Layout {
    /// Longest length the layout can record.
    pub fn max_length(self) -> u32 {
        match self {
            Layout::Bitpack => BITPACK_MAX_LENGTH,
            Layout::Structured => STRUCTURED_MAX_LENGTH,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Layout::Bitpack => "bitpack",
            Layout::Structured => "structured",
        }
    }
}
