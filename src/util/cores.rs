use crate::config::NB_WORKERS_MAX;

/// Number of logical cores, used when the thread count is left on auto.
///
/// Never returns 0.
pub fn count_cores() -> usize {
    num_cpus::get().max(1)
}

/// Resolve a requested builder count: 0 means one per logical core, capped
/// at [`NB_WORKERS_MAX`].
pub fn resolve_thread_count(requested: usize) -> usize {
    if requested == 0 {
        count_cores().min(NB_WORKERS_MAX)
    } else {
        requested
    }
}
