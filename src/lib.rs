// flzma2: radix match finder and adaptive range encoder for LZMA2-style compression

pub mod config;
pub mod display;
pub mod error;
pub mod range_enc;
pub mod radix;
pub mod threadpool;
pub mod util;
pub mod cli;

// ── Version constants ────────────────────────────────────────────────────────
pub const FLZMA2_VERSION_MAJOR: u32 = 0;
pub const FLZMA2_VERSION_MINOR: u32 = 3;
pub const FLZMA2_VERSION_RELEASE: u32 = 0;
pub const FLZMA2_VERSION_NUMBER: u32 =
    FLZMA2_VERSION_MAJOR * 100 * 100 + FLZMA2_VERSION_MINOR * 100 + FLZMA2_VERSION_RELEASE;
pub const FLZMA2_VERSION_STRING: &str = env!("CARGO_PKG_VERSION");

/// Runtime version number (`major * 10000 + minor * 100 + release`).
pub fn version_number() -> u32 {
    FLZMA2_VERSION_NUMBER
}

pub fn version_string() -> &'static str {
    FLZMA2_VERSION_STRING
}

// ── Top-level re-exports ──────────────────────────────────────────────────────
pub use error::Fl2Error;
pub use radix::{build_table, DataBlock, DictionaryBuffer, Match, MatchTable, RadixParams};
pub use range_enc::RangeEncoder;
pub use threadpool::BuildPool;
