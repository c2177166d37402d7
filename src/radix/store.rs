//! Physical match-table layouts.
//!
//! Both layouts store, per position, a link to a lower position sharing a
//! prefix plus the (capped) length of that prefix. Entries are atomics so
//! builder threads can write the disjoint entries of their claimed buckets
//! through a shared reference; every access is `Relaxed` because the pool
//! join orders the build before any query.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use super::types::{
    Layout, BITPACK_LINK_BITS, BITPACK_LINK_MASK, BITPACK_MAX_LENGTH, BITPACK_MAX_POSITIONS,
    RADIX_NULL_LINK, STRUCTURED_MAX_LENGTH, STRUCTURED_UNIT_SIZE,
};
use crate::error::Fl2Error;

/// Per-position link/length storage.
pub trait MatchStore: Send + Sync {
    /// Longest length the layout can record; longer lengths are clamped.
    const MAX_LENGTH: u32;
    const LAYOUT: Layout;

    /// Table with `positions` entries, all null.
    fn allocate(positions: usize) -> Result<Self, Fl2Error>
    where
        Self: Sized;

    fn positions(&self) -> usize;

    fn set_null(&self, pos: usize);

    /// Stage-1 link with no length recorded yet.
    fn init_link(&self, pos: usize, link: u32);

    /// Record `link` with `length`, clamped to [`MAX_LENGTH`](Self::MAX_LENGTH).
    fn set_match(&self, pos: usize, link: u32, length: u32);

    /// The link at `pos`, or [`RADIX_NULL_LINK`].
    fn link(&self, pos: usize) -> u32;

    /// The recorded length at `pos`; 0 for a null entry.
    fn length(&self, pos: usize) -> u32;
}

// ─────────────────────────────────────────────────────────────────────────────
// Bitpacked layout
// ─────────────────────────────────────────────────────────────────────────────

/// One word per position: `link | length << 26`, all ones for null.
#[derive(Debug)]
pub struct BitpackStore {
    words: Vec<AtomicU32>,
}

impl MatchStore for BitpackStore {
    const MAX_LENGTH: u32 = BITPACK_MAX_LENGTH;
    const LAYOUT: Layout = Layout::Bitpack;

    fn allocate(positions: usize) -> Result<Self, Fl2Error> {
        if positions > BITPACK_MAX_POSITIONS {
            return Err(Fl2Error::ParameterOutOfBound);
        }
        let mut words = Vec::new();
        words
            .try_reserve_exact(positions)
            .map_err(|_| Fl2Error::AllocationFailure)?;
        words.resize_with(positions, || AtomicU32::new(RADIX_NULL_LINK));
        Ok(BitpackStore { words })
    }

    #[inline]
    fn positions(&self) -> usize {
        self.words.len()
    }

    #[inline]
    fn set_null(&self, pos: usize) {
        self.words[pos].store(RADIX_NULL_LINK, Ordering::Relaxed);
    }

    #[inline]
    fn init_link(&self, pos: usize, link: u32) {
        self.words[pos].store(link, Ordering::Relaxed);
    }

    #[inline]
    fn set_match(&self, pos: usize, link: u32, length: u32) {
        let length = length.min(Self::MAX_LENGTH);
        self.words[pos].store(link | (length << BITPACK_LINK_BITS), Ordering::Relaxed);
    }

    #[inline]
    fn link(&self, pos: usize) -> u32 {
        match self.words[pos].load(Ordering::Relaxed) {
            RADIX_NULL_LINK => RADIX_NULL_LINK,
            word => word & BITPACK_LINK_MASK,
        }
    }

    #[inline]
    fn length(&self, pos: usize) -> u32 {
        match self.words[pos].load(Ordering::Relaxed) {
            RADIX_NULL_LINK => 0,
            word => word >> BITPACK_LINK_BITS,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Structured layout
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct Unit {
    links: [AtomicU32; STRUCTURED_UNIT_SIZE],
    lengths: [AtomicU8; STRUCTURED_UNIT_SIZE],
}

impl Unit {
    fn new() -> Self {
        Unit {
            links: std::array::from_fn(|_| AtomicU32::new(RADIX_NULL_LINK)),
            lengths: std::array::from_fn(|_| AtomicU8::new(0)),
        }
    }
}

/// Four positions per unit, full 32-bit links and byte lengths.
#[derive(Debug)]
pub struct StructuredStore {
    units: Vec<Unit>,
    positions: usize,
}

impl StructuredStore {
    #[inline(always)]
    fn unit(&self, pos: usize) -> (&Unit, usize) {
        (
            &self.units[pos / STRUCTURED_UNIT_SIZE],
            pos % STRUCTURED_UNIT_SIZE,
        )
    }
}

impl MatchStore for StructuredStore {
    const MAX_LENGTH: u32 = STRUCTURED_MAX_LENGTH;
    const LAYOUT: Layout = Layout::Structured;

    fn allocate(positions: usize) -> Result<Self, Fl2Error> {
        if positions >= RADIX_NULL_LINK as usize {
            return Err(Fl2Error::ParameterOutOfBound);
        }
        let unit_count = positions.div_ceil(STRUCTURED_UNIT_SIZE);
        let mut units = Vec::new();
        units
            .try_reserve_exact(unit_count)
            .map_err(|_| Fl2Error::AllocationFailure)?;
        units.resize_with(unit_count, Unit::new);
        Ok(StructuredStore { units, positions })
    }

    #[inline]
    fn positions(&self) -> usize {
        self.positions
    }

    #[inline]
    fn set_null(&self, pos: usize) {
        let (unit, slot) = self.unit(pos);
        unit.links[slot].store(RADIX_NULL_LINK, Ordering::Relaxed);
        unit.lengths[slot].store(0, Ordering::Relaxed);
    }

    #[inline]
    fn init_link(&self, pos: usize, link: u32) {
        let (unit, slot) = self.unit(pos);
        unit.links[slot].store(link, Ordering::Relaxed);
        unit.lengths[slot].store(0, Ordering::Relaxed);
    }

    #[inline]
    fn set_match(&self, pos: usize, link: u32, length: u32) {
        let (unit, slot) = self.unit(pos);
        unit.links[slot].store(link, Ordering::Relaxed);
        unit.lengths[slot].store(length.min(Self::MAX_LENGTH) as u8, Ordering::Relaxed);
    }

    #[inline]
    fn link(&self, pos: usize) -> u32 {
        let (unit, slot) = self.unit(pos);
        unit.links[slot].load(Ordering::Relaxed)
    }

    #[inline]
    fn length(&self, pos: usize) -> u32 {
        let (unit, slot) = self.unit(pos);
        unit.lengths[slot].load(Ordering::Relaxed) as u32
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Layout selection
// ─────────────────────────────────────────────────────────────────────────────

/// A store of either layout, fixed when the table is created.
#[derive(Debug)]
pub enum TableStore {
    Bitpack(BitpackStore),
    Structured(StructuredStore),
}

impl TableStore {
    pub fn allocate(layout: Layout, positions: usize) -> Result<Self, Fl2Error> {
        Ok(match layout {
            Layout::Bitpack => TableStore::Bitpack(BitpackStore::allocate(positions)?),
            Layout::Structured => TableStore::Structured(StructuredStore::allocate(positions)?),
        })
    }

    pub fn layout(&self) -> Layout {
        match self {
            TableStore::Bitpack(_) => Layout::Bitpack,
            TableStore::Structured(_) => Layout::Structured,
        }
    }

    pub fn positions(&self) -> usize {
        match self {
            TableStore::Bitpack(s) => s.positions(),
            TableStore::Structured(s) => s.positions(),
        }
    }
}
