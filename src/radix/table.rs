//! The shared match table: stage-1 bucketing, the parallel stage-2 build,
//! match queries and the integrity check.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::builder::{common_prefix, BuildScope, Builder};
use super::control::BuildControl;
use super::dict::DataBlock;
use super::params::RadixParams;
use super::store::{MatchStore, TableStore};
use super::types::{
    Layout, Match, TableHead, JOB_BUCKET_COUNT, MIN_MATCH_LENGTH, RADIX16_TABLE_SIZE,
    RADIX_NULL_LINK,
};
use crate::config::{DICTIONARY_SIZE_MIN, NB_WORKERS_MAX};
use crate::displaylevel;
use crate::error::Fl2Error;
use crate::threadpool::BuildPool;

/// Run `$body` with `$s` bound to the concrete store.
macro_rules! with_store {
    ($store:expr, $s:ident => $body:expr) => {
        match $store {
            TableStore::Bitpack($s) => $body,
            TableStore::Structured($s) => $body,
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableState {
    Empty,
    Initialized { start: usize, end: usize },
    Built { start: usize, end: usize },
    Cancelled,
}

/// Match table for one dictionary window.
///
/// Lifecycle: [`new`](Self::new) allocates, [`init`](Self::init) buckets a
/// block, [`build`](Self::build) refines the buckets across a pool, and
/// [`get_match`](Self::get_match) queries the result. `init` may be called
/// again to reuse the table for another block.
pub struct MatchTable {
    params: RadixParams,
    store: TableStore,
    list_heads: Vec<TableHead>,
    /// Non-empty top-level buckets in discovery order; the job list.
    stack: Vec<u32>,
    builders: Vec<Mutex<Builder>>,
    st_index: AtomicUsize,
    end_index: usize,
    control: Arc<BuildControl>,
    state: TableState,
}

impl MatchTable {
    /// Allocate a table for `params` with one builder per thread.
    pub fn new(params: &RadixParams, thread_count: usize) -> Result<Self, Fl2Error> {
        params.validate()?;
        if thread_count == 0 || thread_count > NB_WORKERS_MAX {
            return Err(Fl2Error::ParameterOutOfBound);
        }
        let layout = params.layout();
        let store = TableStore::allocate(layout, params.dictionary_size)?;

        let mut list_heads = Vec::new();
        list_heads
            .try_reserve_exact(RADIX16_TABLE_SIZE)
            .map_err(|_| Fl2Error::AllocationFailure)?;
        list_heads.resize(RADIX16_TABLE_SIZE, TableHead::default());
        let mut stack = Vec::new();
        stack
            .try_reserve_exact(RADIX16_TABLE_SIZE)
            .map_err(|_| Fl2Error::AllocationFailure)?;

        let buffer_size = params.match_buffer_size();
        let builders = (0..thread_count)
            .map(|_| Builder::new(buffer_size).map(Mutex::new))
            .collect::<Result<Vec<_>, _>>()?;

        displaylevel!(
            4,
            "match table: {} positions, {} layout, {} builders of {} elements \n",
            params.dictionary_size,
            layout.name(),
            thread_count,
            buffer_size
        );

        Ok(MatchTable {
            params: *params,
            store,
            list_heads,
            stack,
            builders,
            st_index: AtomicUsize::new(0),
            end_index: 0,
            control: Arc::new(BuildControl::new()),
            state: TableState::Empty,
        })
    }

    pub fn params(&self) -> &RadixParams {
        &self.params
    }

    pub fn layout(&self) -> Layout {
        self.store.layout()
    }

    /// Handle for cancelling the build and reading its progress.
    pub fn control(&self) -> Arc<BuildControl> {
        Arc::clone(&self.control)
    }

    /// Positions processed by the current or last build.
    pub fn progress(&self) -> u64 {
        self.control.progress()
    }

    pub fn is_built(&self) -> bool {
        matches!(self.state, TableState::Built { .. })
    }

    /// Non-empty top-level buckets found by [`init`](Self::init).
    pub fn bucket_count(&self) -> usize {
        self.end_index
    }

    /// Jobs the current block splits into.
    pub fn job_count(&self) -> usize {
        self.end_index.div_ceil(JOB_BUCKET_COUNT)
    }

    /// Stage 1: bucket every position of `[0, end)` by its first two bytes.
    ///
    /// Each bucket's list is threaded through the entries themselves, highest
    /// position first. The last position has no second byte and gets a null
    /// entry.
    pub fn init(&mut self, block: &DataBlock<'_>) -> Result<(), Fl2Error> {
        let end = block.end();
        if end > self.store.positions() {
            return Err(Fl2Error::ParameterOutOfBound);
        }
        self.list_heads.fill(TableHead::default());
        self.stack.clear();
        self.control.reset();
        self.st_index.store(0, Ordering::Relaxed);

        with_store!(&self.store, s => {
            bucket_positions(s, block.data(), end, &mut self.list_heads, &mut self.stack)
        });
        self.end_index = self.stack.len();
        self.state = TableState::Initialized {
            start: block.start(),
            end,
        };
        displaylevel!(
            4,
            "match table: {} buckets, {} jobs \n",
            self.end_index,
            self.job_count()
        );
        Ok(())
    }

    /// Stage 2 over `pool`, waiting without progress callbacks.
    pub fn build(&mut self, block: &DataBlock<'_>, pool: &BuildPool) -> Result<(), Fl2Error> {
        self.run_build(block, pool, None, || {})
    }

    /// Stage 2 over `pool`, calling `on_tick` every `interval` while builders
    /// are still running. `on_tick` may read [`progress`](BuildControl::progress)
    /// or [`cancel`](BuildControl::cancel) through a [`control`](Self::control)
    /// handle.
    pub fn build_with_progress<T: FnMut()>(
        &mut self,
        block: &DataBlock<'_>,
        pool: &BuildPool,
        interval: Duration,
        on_tick: T,
    ) -> Result<(), Fl2Error> {
        self.run_build(block, pool, Some(interval), on_tick)
    }

    fn run_build<T: FnMut()>(
        &mut self,
        block: &DataBlock<'_>,
        pool: &BuildPool,
        interval: Option<Duration>,
        on_tick: T,
    ) -> Result<(), Fl2Error> {
        let (start, end) = match self.state {
            TableState::Initialized { start, end }
                if start == block.start() && end == block.end() =>
            {
                (start, end)
            }
            _ => return Err(Fl2Error::StageWrong),
        };

        {
            let table = &*self;
            let job = |worker: usize| {
                // A pool wider than the table leaves its extra workers idle.
                let Some(cell) = table.builders.get(worker) else {
                    return;
                };
                let mut builder = cell.lock().unwrap_or_else(PoisonError::into_inner);
                with_store!(&table.store, s => {
                    let scope = BuildScope {
                        store: s,
                        data: block.data(),
                        block_start: start as u32,
                        end: end as u32,
                        max_depth: table.params.depth,
                        control: &table.control,
                    };
                    table.run_jobs(&mut builder, &scope)
                });
            };
            pool.run(job, interval, on_tick);
        }

        if self.control.is_cancelled() {
            displaylevel!(4, "match table: build cancelled \n");
            self.state = TableState::Cancelled;
            return Err(Fl2Error::Cancelled);
        }
        self.state = TableState::Built { start, end };

        #[cfg(debug_assertions)]
        self.integrity_check(block, self.params.depth)?;

        Ok(())
    }

    /// Claim and process jobs until none are left.
    fn run_jobs<S: MatchStore>(&self, builder: &mut Builder, scope: &BuildScope<'_, S>) {
        while let Some(first) = self.control.claim(&self.st_index, self.end_index) {
            if !self.process_job(builder, scope, first) {
                return;
            }
        }
    }

    /// Refine the buckets of the job starting at `first`. `false` if the
    /// build was cancelled part way; the abandoned list adds no progress.
    fn process_job<S: MatchStore>(
        &self,
        builder: &mut Builder,
        scope: &BuildScope<'_, S>,
        first: usize,
    ) -> bool {
        let last = (first + JOB_BUCKET_COUNT).min(self.end_index);
        for &radix in &self.stack[first..last] {
            let head = self.list_heads[radix as usize];
            // Singletons are already null; lists entirely in the prefix
            // have nothing to write.
            if head.count >= 2
                && head.head >= scope.block_start
                && !builder.process_list(scope, head.head, head.count)
            {
                return false;
            }
            self.control.add_progress(head.count as u64);
        }
        true
    }

    /// Longest verified match at `index`, at most `limit` bytes long, walking
    /// at most `max_depth` chain hops. Ties go to the nearest candidate.
    ///
    /// `None` if the table is not built over `block`, `index` is outside the
    /// window, or nothing reaches [`MIN_MATCH_LENGTH`].
    pub fn get_match(
        &self,
        block: &DataBlock<'_>,
        index: usize,
        limit: usize,
        max_depth: u32,
    ) -> Option<Match> {
        let TableState::Built { start, end } = self.state else {
            return None;
        };
        if block.start() != start || block.end() != end || index < start || index >= end {
            return None;
        }
        let limit = limit.min(end - index);
        if limit < MIN_MATCH_LENGTH {
            return None;
        }
        let build_depth = self.params.depth as usize;
        with_store!(&self.store, s => {
            find_match(s, block.data(), index, limit, max_depth, build_depth)
        })
    }

    /// Walk every entry of the built window and check that links point to
    /// lower positions, that recorded lengths hold in the data, and that
    /// `max_depth` hops from any position keep strictly decreasing.
    pub fn integrity_check(&self, block: &DataBlock<'_>, max_depth: u32) -> Result<(), Fl2Error> {
        let TableState::Built { start, end } = self.state else {
            return Err(Fl2Error::StageWrong);
        };
        if block.start() != start || block.end() != end {
            return Err(Fl2Error::StageWrong);
        }
        let result = with_store!(&self.store, s => {
            check_entries(s, block.data(), start, end, max_depth)
        });
        if let Err(index) = result {
            displaylevel!(1, "match table: corrupt entry at position {} \n", index);
            return Err(Fl2Error::CorruptionDetected);
        }
        Ok(())
    }
}

fn bucket_positions<S: MatchStore>(
    store: &S,
    data: &[u8],
    end: usize,
    list_heads: &mut [TableHead],
    stack: &mut Vec<u32>,
) {
    if end == 0 {
        return;
    }
    for (i, pair) in data[..end].windows(2).enumerate() {
        let radix = ((pair[0] as usize) << 8) | pair[1] as usize;
        let head = &mut list_heads[radix];
        if head.count == 0 {
            store.set_null(i);
            stack.push(radix as u32);
            head.count = 1;
        } else {
            store.init_link(i, head.head);
            head.count += 1;
        }
        head.head = i as u32;
    }
    store.set_null(end - 1);
}

fn find_match<S: MatchStore>(
    store: &S,
    data: &[u8],
    index: usize,
    limit: usize,
    max_depth: u32,
    build_depth: usize,
) -> Option<Match> {
    // Recorded lengths stop at the layout cap and at the build depth; one
    // at either bound only says "at least this long".
    let cap = (S::MAX_LENGTH as usize).min(build_depth);
    let target = &data[index..index + limit];
    let mut best_len = 0;
    let mut best_link = 0;
    let mut cursor = index;
    for _ in 0..max_depth.max(1) {
        let link = store.link(cursor);
        if link == RADIX_NULL_LINK || link as usize >= cursor {
            break;
        }
        let link = link as usize;
        let len = common_prefix(target, &data[link..link + limit]);
        if len > best_len {
            best_len = len;
            best_link = link;
            if len >= limit {
                break;
            }
        }
        // The next hop shares no more with `index` than `link` shares with it.
        if (store.length(link) as usize) < best_len.min(cap) {
            break;
        }
        cursor = link;
    }
    (best_len >= MIN_MATCH_LENGTH).then(|| Match {
        length: best_len as u32,
        offset: (index - best_link) as u32,
    })
}

/// `Err(position)` at the first bad entry.
fn check_entries<S: MatchStore>(
    store: &S,
    data: &[u8],
    start: usize,
    end: usize,
    max_depth: u32,
) -> Result<(), usize> {
    for index in start..end {
        let link = store.link(index);
        if link == RADIX_NULL_LINK {
            continue;
        }
        let link = link as usize;
        if link >= index {
            return Err(index);
        }
        let length = store.length(index) as usize;
        if length < MIN_MATCH_LENGTH {
            return Err(index);
        }
        let n = length.min(end - index);
        if data[index..index + n] != data[link..link + n] {
            return Err(index);
        }
        let mut cursor = index;
        for _ in 0..max_depth {
            let next = store.link(cursor);
            if next == RADIX_NULL_LINK {
                break;
            }
            if next as usize >= cursor || next as usize >= store.positions() {
                return Err(index);
            }
            cursor = next as usize;
        }
    }
    Ok(())
}

/// Build a table over `block` in one call, sized to the block.
pub fn build_table(
    block: &DataBlock<'_>,
    max_depth: u32,
    thread_count: usize,
) -> Result<MatchTable, Fl2Error> {
    if block.is_empty() {
        return Err(Fl2Error::ParameterOutOfBound);
    }
    let params = RadixParams {
        dictionary_size: block.end().max(DICTIONARY_SIZE_MIN),
        depth: max_depth,
        ..RadixParams::default()
    };
    let mut table = MatchTable::new(&params, thread_count)?;
    let pool = BuildPool::new(thread_count)?;
    table.init(block)?;
    table.build(block, &pool)?;
    Ok(table)
}

impl std::fmt::Debug for MatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchTable")
            .field("params", &self.params)
            .field("layout", &self.layout())
            .field("state", &self.state)
            .field("buckets", &self.end_index)
            .finish()
    }
}
