//! Command-line interface for the `flzma2` binary.
//!
//! | Submodule   | Responsibility |
//! |-------------|----------------|
//! | [`args`]    | `Cli` (clap) and its resolution into `Settings`. |
//! | [`env`]     | `FLZMA2_NBWORKERS` / `FLZMA2_DEPTH` defaults. |
//! | [`analyze`] | Per-file dictionary streaming, table builds and the greedy walk. |
//! | [`tokens`]  | Literal/match token models driving the range encoder. |

pub mod analyze;
pub mod args;
pub mod env;
pub mod tokens;

pub use analyze::{analyze_file, analyze_reader, FileReport, Settings};
pub use args::Cli;
