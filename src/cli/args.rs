//! Command-line definition and resolution into [`Settings`].

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail};
use clap::Parser;

use crate::cli::analyze::Settings;
use crate::cli::env::{init_depth_from, init_nb_workers_from, ENV_DEPTH, ENV_NBWORKERS};
use crate::config::{
    BLOCK_OVERLAP_DEFAULT, BUFFER_LOG_DEFAULT, DICTIONARY_LOG_DEFAULT, DICTIONARY_LOG_MAX,
    DICTIONARY_LOG_MIN, NB_WORKERS_MAX, POLL_INTERVAL_MS_DEFAULT,
};
use crate::radix::{RadixParams, TableMode};

/// Build radix match tables over files and report match coverage and
/// entropy-coded size.
#[derive(Parser, Debug, Clone)]
#[command(name = "flzma2", version, about)]
pub struct Cli {
    /// Files to analyse
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Builder threads (0 = one per core) [env: FLZMA2_NBWORKERS]
    #[arg(short = 'T', long)]
    pub threads: Option<usize>,

    /// Search depth [env: FLZMA2_DEPTH]
    #[arg(short = 'd', long)]
    pub depth: Option<u32>,

    /// Dictionary size as a power of two
    #[arg(long, default_value_t = DICTIONARY_LOG_DEFAULT)]
    pub dict_log: u32,

    /// Builder match-buffer size, as a log relative to the dictionary
    #[arg(long, default_value_t = BUFFER_LOG_DEFAULT)]
    pub buffer_log: u32,

    /// Dictionary carried between blocks, in sixteenths
    #[arg(long, default_value_t = BLOCK_OVERLAP_DEFAULT)]
    pub overlap: u32,

    /// Force the bitpacked table layout
    #[arg(long, conflicts_with = "structured")]
    pub bitpack: bool,

    /// Force the structured table layout
    #[arg(long)]
    pub structured: bool,

    /// Check every table after it is built
    #[arg(long)]
    pub verify: bool,

    /// Progress poll interval in milliseconds
    #[arg(long, default_value_t = POLL_INTERVAL_MS_DEFAULT)]
    pub poll_ms: u64,

    /// Walk directories
    #[arg(short = 'r', long)]
    pub recursive: bool,

    /// More output (repeatable)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Less output (repeatable)
    #[arg(short = 'q', long, action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    /// Notification level: 2 by default, moved by `-v` and `-q`.
    pub fn display_level(&self) -> i32 {
        2 + self.verbose as i32 - self.quiet as i32
    }

    pub fn mode(&self) -> TableMode {
        if self.bitpack {
            TableMode::Bitpack
        } else if self.structured {
            TableMode::Structured
        } else {
            TableMode::Auto
        }
    }

    /// Combine flags with the environment values `env_workers` and
    /// `env_depth`; flags win.
    pub fn settings(
        &self,
        env_workers: Option<&str>,
        env_depth: Option<&str>,
    ) -> anyhow::Result<Settings> {
        if !(DICTIONARY_LOG_MIN..=DICTIONARY_LOG_MAX).contains(&self.dict_log) {
            bail!(
                "bad usage: --dict-log must be between {} and {}",
                DICTIONARY_LOG_MIN,
                DICTIONARY_LOG_MAX
            );
        }
        let nb_workers = self
            .threads
            .unwrap_or_else(|| init_nb_workers_from(env_workers));
        if nb_workers > NB_WORKERS_MAX {
            bail!("bad usage: at most {} threads are supported", NB_WORKERS_MAX);
        }
        let params = RadixParams {
            dictionary_size: 1 << self.dict_log,
            depth: self.depth.unwrap_or_else(|| init_depth_from(env_depth)),
            match_buffer_log: self.buffer_log,
            overlap_fraction: self.overlap,
            mode: self.mode(),
        };
        params.validate().map_err(|e| {
            anyhow!(
                "bad usage: {e} (depth {}, buffer log {}, overlap {})",
                params.depth,
                params.match_buffer_log,
                params.overlap_fraction
            )
        })?;
        Ok(Settings {
            params,
            nb_workers,
            verify: self.verify,
            poll_interval: Duration::from_millis(self.poll_ms),
            recursive: self.recursive,
        })
    }

    /// [`settings`](Self::settings) with the process environment.
    pub fn settings_from_env(&self) -> anyhow::Result<Settings> {
        self.settings(
            std::env::var(ENV_NBWORKERS).ok().as_deref(),
            std::env::var(ENV_DEPTH).ok().as_deref(),
        )
    }
}
