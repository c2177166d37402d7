//! Cancellation flag, progress counter and job-claim bookkeeping shared
//! between the builder threads and whoever drives the build.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use super::types::JOB_BUCKET_COUNT;

/// Shared build state. Obtain it from
/// [`MatchTable::control`](super::MatchTable::control); it may be cloned into
/// any thread and cancelled from there.
#[derive(Debug, Default)]
pub struct BuildControl {
    cancelled: AtomicBool,
    progress: AtomicU64,
    jobs_claimed: AtomicUsize,
}

impl BuildControl {
    pub fn new() -> Self {
        BuildControl::default()
    }

    /// Ask every builder to stop at its next job claim or list frame.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Positions whose bucket has been fully processed so far.
    pub fn progress(&self) -> u64 {
        self.progress.load(Ordering::Relaxed)
    }

    /// Jobs handed out so far in the current build.
    pub fn jobs_claimed(&self) -> usize {
        self.jobs_claimed.load(Ordering::Relaxed)
    }

    pub(crate) fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
        self.progress.store(0, Ordering::Relaxed);
        self.jobs_claimed.store(0, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_progress(&self, positions: u64) {
        self.progress.fetch_add(positions, Ordering::Relaxed);
    }

    /// Claim the next run of [`JOB_BUCKET_COUNT`] bucket slots from `cursor`.
    /// `None` once the job list is exhausted or the build was cancelled.
    pub(crate) fn claim(&self, cursor: &AtomicUsize, job_end: usize) -> Option<usize> {
        if self.is_cancelled() {
            return None;
        }
        let first = cursor.fetch_add(JOB_BUCKET_COUNT, Ordering::Relaxed);
        if first >= job_end {
            return None;
        }
        self.jobs_claimed.fetch_add(1, Ordering::Relaxed);
        Some(first)
    }
}
