// config.rs: Compile-time configuration constants.
//
// Bounds checked by `RadixParams::validate` and the CLI, plus the defaults the
// CLI starts from before environment variables and flags are applied.

// Dictionary size bounds, as base-2 logs.
// 32-bit targets cannot address a structured table beyond 2^27 positions.
pub const DICTIONARY_LOG_MIN: u32 = 12;
#[cfg(target_pointer_width = "64")]
pub const DICTIONARY_LOG_MAX: u32 = 30;
#[cfg(not(target_pointer_width = "64"))]
pub const DICTIONARY_LOG_MAX: u32 = 27;
pub const DICTIONARY_SIZE_MIN: usize = 1 << DICTIONARY_LOG_MIN;
pub const DICTIONARY_SIZE_MAX: usize = 1 << DICTIONARY_LOG_MAX;

// Default dictionary size (16 MB).
// Can be overridden by the --dict-log command-line flag.
pub const DICTIONARY_LOG_DEFAULT: u32 = 24;

// Search depth: bounds both refinement depth during the build and the number
// of chain hops walked by a match query.
// Can be overridden by the FLZMA2_DEPTH environment variable or -d#.
pub const SEARCH_DEPTH_MIN: u32 = 6;
pub const SEARCH_DEPTH_MAX: u32 = 254;
pub const SEARCH_DEPTH_DEFAULT: u32 = 32;

// Builder match-buffer size, as a log relative to the dictionary size.
// 16 means "one buffer slot per dictionary position" (no chunking of lists).
pub const BUFFER_LOG_MIN: u32 = 4;
pub const BUFFER_LOG_MAX: u32 = 16;
pub const BUFFER_LOG_DEFAULT: u32 = 8;

// Dictionary overlap carried between consecutive blocks, in sixteenths of
// the dictionary size.
pub const BLOCK_OVERLAP_MAX: u32 = 14;
pub const BLOCK_OVERLAP_DEFAULT: u32 = 2;

// Default number of builder threads (0 = one per logical core).
// Can be overridden by the FLZMA2_NBWORKERS environment variable or -T#.
pub const NB_WORKERS_DEFAULT: usize = 0;

// Maximum number of builder threads selectable at runtime.
pub const NB_WORKERS_MAX: usize = 200;

// Interval at which a running build reports progress to its caller.
pub const POLL_INTERVAL_MS_DEFAULT: u64 = 500;
