//! Per-thread list refinement.
//!
//! A [`Builder`] takes one top-level bucket list (all positions sharing their
//! first two bytes, highest first) and turns it into final table entries.
//! The list is copied into the match buffer, every element is linked to its
//! successor at length 2, and then sublists are split by the bytes that
//! follow, deepest first, off an explicit frame stack:
//!
//! - at most [`BRUTE_FORCE_LIST_SIZE`] elements: pairwise comparison;
//! - at least [`RADIX16_LIST_THRESHOLD`] elements: one link-only pass on the
//!   next byte, then a split on the next two bytes;
//! - otherwise: a split on the next byte.
//!
//! Each split relinks every element to the nearest lower element that landed
//! in the same sub-bucket, so an entry ends up pointing at the nearest lower
//! position with the longest common prefix found within the depth limit.
//! Links only ever point to lower positions.
//!
//! Lists longer than the match buffer are handled in chunks; the last
//! [`MATCH_BUFFER_OVERLAP`] elements of a chunk are processed again at the
//! front of the next one.

use super::control::BuildControl;
use super::store::MatchStore;
use super::types::{
    BuildMatch, ListTail, BRUTE_FORCE_LIST_SIZE, MATCH_BUFFER_OVERLAP, RADIX16_LIST_THRESHOLD,
    RADIX16_TABLE_SIZE, RADIX8_TABLE_SIZE, RADIX_NULL_LINK,
};
use crate::error::Fl2Error;

/// Common prefix length of `a` and `b`, compared eight bytes at a time.
#[inline]
pub(crate) fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    let limit = a.len().min(b.len());
    let mut n = 0;
    while n + 8 <= limit {
        let diff = read_le64(&a[n..]) ^ read_le64(&b[n..]);
        if diff != 0 {
            return n + (diff.trailing_zeros() / 8) as usize;
        }
        n += 8;
    }
    while n < limit && a[n] == b[n] {
        n += 1;
    }
    n
}

#[inline(always)]
fn read_le64(src: &[u8]) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&src[..8]);
    u64::from_le_bytes(word)
}

fn try_filled<T: Clone>(len: usize, value: T) -> Result<Vec<T>, Fl2Error> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| Fl2Error::AllocationFailure)?;
    v.resize(len, value);
    Ok(v)
}

fn try_with_capacity<T>(capacity: usize) -> Result<Vec<T>, Fl2Error> {
    let mut v = Vec::new();
    v.try_reserve_exact(capacity)
        .map_err(|_| Fl2Error::AllocationFailure)?;
    Ok(v)
}

/// Everything a builder reads or writes outside its own scratch space.
pub(crate) struct BuildScope<'a, S: MatchStore> {
    pub store: &'a S,
    pub data: &'a [u8],
    /// Entries below this position are dictionary prefix and stay untouched.
    pub block_start: u32,
    pub end: u32,
    pub max_depth: u32,
    pub control: &'a BuildControl,
}

impl<S: MatchStore> BuildScope<'_, S> {
    #[inline(always)]
    fn commit(&self, from: u32, link: u32, length: u32) {
        if from >= self.block_start {
            self.store.set_match(from as usize, link, length);
        }
    }
}

/// A sublist waiting to be split: `count` elements chained through
/// `BuildMatch::next` from buffer index `head`, sharing `depth` bytes.
#[derive(Debug, Clone, Copy)]
struct Frame {
    head: u32,
    count: u32,
    depth: u32,
}

/// Scratch space of one builder thread. Sized once; nothing is allocated
/// while a build runs.
#[derive(Debug)]
pub struct Builder {
    match_buffer: Vec<BuildMatch>,
    tails8: Vec<ListTail>,
    tails16: Vec<ListTail>,
    /// Sub-buckets touched by the current split.
    used: Vec<u32>,
    stack: Vec<Frame>,
}

impl Builder {
    pub fn new(match_buffer_size: usize) -> Result<Self, Fl2Error> {
        let buffer_size = match_buffer_size.max(MATCH_BUFFER_OVERLAP * 2);
        Ok(Builder {
            match_buffer: try_filled(buffer_size, BuildMatch::default())?,
            tails8: try_filled(RADIX8_TABLE_SIZE, ListTail::default())?,
            tails16: try_filled(RADIX16_TABLE_SIZE, ListTail::default())?,
            used: try_with_capacity(RADIX16_TABLE_SIZE)?,
            // Frames on the stack cover disjoint sets of at least two elements.
            stack: try_with_capacity(buffer_size / 2 + 1)?,
        })
    }

    /// Elements loaded per chunk.
    pub fn buffer_size(&self) -> usize {
        self.match_buffer.len()
    }

    /// Refine the bucket list starting at position `head`.
    ///
    /// Returns `false` if the build was cancelled part way through.
    pub(crate) fn process_list<S: MatchStore>(
        &mut self,
        scope: &BuildScope<'_, S>,
        head: u32,
        count: u32,
    ) -> bool {
        let buffer_size = self.match_buffer.len();
        let mut next_pos = head;
        let mut remaining = count as usize;
        let mut carried = 0usize;
        loop {
            // Read each link before anything in this chunk is committed over it.
            let take = remaining.min(buffer_size - carried);
            for k in carried..carried + take {
                self.match_buffer[k] = BuildMatch {
                    from: next_pos,
                    next: (k + 1) as u32,
                };
                next_pos = scope.store.link(next_pos as usize);
            }
            remaining -= take;
            let loaded = carried + take;
            if loaded < 2 {
                return true;
            }

            for k in 0..loaded - 1 {
                scope.commit(self.match_buffer[k].from, self.match_buffer[k + 1].from, 2);
            }
            if remaining > 0 {
                scope.commit(self.match_buffer[loaded - 1].from, next_pos, 2);
            }

            self.stack.push(Frame {
                head: 0,
                count: loaded as u32,
                depth: 2,
            });
            if !self.refine(scope) {
                return false;
            }
            if remaining == 0 {
                return true;
            }

            let keep = MATCH_BUFFER_OVERLAP.min(loaded);
            for i in 0..keep {
                self.match_buffer[i] = BuildMatch {
                    from: self.match_buffer[loaded - keep + i].from,
                    next: (i + 1) as u32,
                };
            }
            carried = keep;
        }
    }

    fn refine<S: MatchStore>(&mut self, scope: &BuildScope<'_, S>) -> bool {
        while let Some(frame) = self.stack.pop() {
            if scope.control.is_cancelled() {
                self.stack.clear();
                return false;
            }
            if frame.depth >= scope.max_depth {
                continue;
            }
            if frame.count <= BRUTE_FORCE_LIST_SIZE {
                self.brute_force(scope, frame);
            } else if frame.count >= RADIX16_LIST_THRESHOLD && frame.depth + 2 <= scope.max_depth
            {
                self.radix16_step(scope, frame);
            } else {
                self.radix8_step(scope, frame);
            }
        }
        true
    }

    fn brute_force<S: MatchStore>(&mut self, scope: &BuildScope<'_, S>, frame: Frame) {
        let count = frame.count as usize;
        let mut positions = [0u32; BRUTE_FORCE_LIST_SIZE as usize];
        let mut k = frame.head as usize;
        for (i, slot) in positions.iter_mut().take(count).enumerate() {
            *slot = self.match_buffer[k].from;
            if i + 1 < count {
                k = self.match_buffer[k].next as usize;
            }
        }

        let depth = frame.depth as usize;
        let data = scope.data;
        for i in 0..count - 1 {
            let from = positions[i] as usize;
            let limit = (scope.max_depth as usize).min(scope.end as usize - from);
            if limit <= depth {
                continue;
            }
            let mut best_len = depth;
            let mut best_link = RADIX_NULL_LINK;
            // Candidates are in descending order, so the first hit at a given
            // length is the nearest one.
            for &candidate in &positions[i + 1..count] {
                let c = candidate as usize;
                let len = depth + common_prefix(&data[from + depth..from + limit], &data[c + depth..c + limit]);
                if len > best_len {
                    best_len = len;
                    best_link = candidate;
                    if len == limit {
                        break;
                    }
                }
            }
            if best_link != RADIX_NULL_LINK {
                scope.commit(positions[i], best_link, best_len as u32);
            }
        }
    }

    fn radix8_step<S: MatchStore>(&mut self, scope: &BuildScope<'_, S>, frame: Frame) {
        let depth = frame.depth as usize;
        let end = scope.end as usize;
        let mut k = frame.head;
        for _ in 0..frame.count {
            let current = self.match_buffer[k as usize];
            let from = current.from as usize;
            if from + depth < end {
                let radix = scope.data[from + depth] as usize;
                let tail = &mut self.tails8[radix];
                if tail.list_count == 0 {
                    tail.head = k;
                    tail.prev_index = k;
                    tail.list_count = 1;
                    self.used.push(radix as u32);
                } else {
                    let prev = tail.prev_index as usize;
                    tail.prev_index = k;
                    tail.list_count += 1;
                    self.match_buffer[prev].next = k;
                    scope.commit(self.match_buffer[prev].from, current.from, frame.depth + 1);
                }
            }
            k = current.next;
        }

        for &radix in &self.used {
            let tail = &mut self.tails8[radix as usize];
            if tail.list_count >= 2 {
                self.stack.push(Frame {
                    head: tail.head,
                    count: tail.list_count,
                    depth: frame.depth + 1,
                });
            }
            tail.list_count = 0;
        }
        self.used.clear();
    }

    fn radix16_step<S: MatchStore>(&mut self, scope: &BuildScope<'_, S>, frame: Frame) {
        let depth = frame.depth as usize;
        let end = scope.end as usize;

        // Pass 1: links at depth + 1 only. Elements that end up alone in their
        // two-byte sub-bucket keep these.
        let mut k = frame.head;
        for _ in 0..frame.count {
            let current = self.match_buffer[k as usize];
            let from = current.from as usize;
            if from + depth < end {
                let radix = scope.data[from + depth] as usize;
                let tail = &mut self.tails8[radix];
                if tail.list_count == 0 {
                    tail.list_count = 1;
                    self.used.push(radix as u32);
                } else {
                    let prev = tail.prev_index as usize;
                    scope.commit(self.match_buffer[prev].from, current.from, frame.depth + 1);
                }
                tail.prev_index = k;
            }
            k = current.next;
        }
        for &radix in &self.used {
            self.tails8[radix as usize].list_count = 0;
        }
        self.used.clear();

        // Pass 2: split on two bytes.
        let mut k = frame.head;
        for _ in 0..frame.count {
            let current = self.match_buffer[k as usize];
            let from = current.from as usize;
            if from + depth + 1 < end {
                let radix =
                    ((scope.data[from + depth] as usize) << 8) | scope.data[from + depth + 1] as usize;
                let tail = &mut self.tails16[radix];
                if tail.list_count == 0 {
                    tail.head = k;
                    tail.prev_index = k;
                    tail.list_count = 1;
                    self.used.push(radix as u32);
                } else {
                    let prev = tail.prev_index as usize;
                    tail.prev_index = k;
                    tail.list_count += 1;
                    self.match_buffer[prev].next = k;
                    scope.commit(self.match_buffer[prev].from, current.from, frame.depth + 2);
                }
            }
            k = current.next;
        }

        for &radix in &self.used {
            let tail = &mut self.tails16[radix as usize];
            if tail.list_count >= 2 {
                self.stack.push(Frame {
                    head: tail.head,
                    count: tail.list_count,
                    depth: frame.depth + 2,
                });
            }
            tail.list_count = 0;
        }
        self.used.clear();
    }
}
