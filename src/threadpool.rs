//! Fixed-size worker pool for match-table construction.
//!
//! Backed by a `rayon::ThreadPool` with exactly `nb_threads` workers. A run
//! spawns one job per worker inside an in-place scope; each worker reports
//! completion on a `crossbeam_channel::bounded` channel, which the calling
//! thread drains with a timeout so it can poll progress while the build is
//! still going.

use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};
use rayon::ThreadPool as RayonPool;

use crate::config::NB_WORKERS_MAX;
use crate::error::Fl2Error;

pub struct BuildPool {
    pool: RayonPool,
    nb_threads: usize,
}

impl BuildPool {
    /// Pool of `nb_threads` workers, `1..=NB_WORKERS_MAX`.
    pub fn new(nb_threads: usize) -> Result<Self, Fl2Error> {
        if nb_threads == 0 || nb_threads > NB_WORKERS_MAX {
            return Err(Fl2Error::ParameterOutOfBound);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(nb_threads)
            .thread_name(|i| format!("flzma2-builder-{i}"))
            .build()
            .map_err(|_| Fl2Error::AllocationFailure)?;
        Ok(BuildPool { pool, nb_threads })
    }

    pub fn nb_threads(&self) -> usize {
        self.nb_threads
    }

    /// Run `job(worker_index)` once on every worker and return when all have
    /// finished.
    ///
    /// With `poll_interval` set, `on_tick` runs on the calling thread each
    /// time the interval passes with workers still busy. A panicking job is
    /// re-raised here after the others finish.
    pub fn run<J, T>(&self, job: J, poll_interval: Option<Duration>, mut on_tick: T)
    where
        J: Fn(usize) + Sync,
        T: FnMut(),
    {
        let (done_tx, done_rx) = bounded::<usize>(self.nb_threads);
        let job = &job;
        self.pool.in_place_scope(|scope| {
            for worker in 0..self.nb_threads {
                let done_tx = done_tx.clone();
                scope.spawn(move |_| {
                    job(worker);
                    let _ = done_tx.send(worker);
                });
            }
            // Only the workers' clones remain: the channel disconnects once
            // the last of them finishes or unwinds.
            drop(done_tx);
            loop {
                match poll_interval {
                    Some(interval) => match done_rx.recv_timeout(interval) {
                        Ok(_) => {}
                        Err(RecvTimeoutError::Timeout) => on_tick(),
                        Err(RecvTimeoutError::Disconnected) => break,
                    },
                    None => {
                        if done_rx.recv().is_err() {
                            break;
                        }
                    }
                }
            }
        });
    }
}

impl std::fmt::Debug for BuildPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildPool")
            .field("nb_threads", &self.nb_threads)
            .finish()
    }
}
