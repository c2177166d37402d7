//! Startup defaults read from the environment.
//!
//! - [`init_nb_workers`] / [`init_depth`] read `FLZMA2_NBWORKERS` and
//!   `FLZMA2_DEPTH`; explicit command-line flags take precedence over both.
//! - The `_from` variants take the raw value so parsing can be tested without
//!   touching the process environment.

use crate::config::{NB_WORKERS_DEFAULT, SEARCH_DEPTH_DEFAULT};
use crate::displaylevel;

pub const ENV_NBWORKERS: &str = "FLZMA2_NBWORKERS";
pub const ENV_DEPTH: &str = "FLZMA2_DEPTH";

/// Parse the leading decimal digits of `s`. `None` if `s` does not start
/// with a digit or the value overflows.
pub fn read_u32_prefix(s: &str) -> Option<u32> {
    let digits = s.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    s[..digits].parse().ok()
}

/// Builder thread count from `FLZMA2_NBWORKERS`, 0 meaning auto.
pub fn init_nb_workers() -> usize {
    init_nb_workers_from(std::env::var(ENV_NBWORKERS).ok().as_deref())
}

pub fn init_nb_workers_from(env_val: Option<&str>) -> usize {
    if let Some(env) = env_val {
        if let Some(val) = read_u32_prefix(env) {
            return val as usize;
        }
        displaylevel!(
            2,
            "Ignore environment variable setting {}={}: not a valid unsigned value \n",
            ENV_NBWORKERS,
            env
        );
    }
    NB_WORKERS_DEFAULT
}

/// Search depth from `FLZMA2_DEPTH`.
pub fn init_depth() -> u32 {
    init_depth_from(std::env::var(ENV_DEPTH).ok().as_deref())
}

pub fn init_depth_from(env_val: Option<&str>) -> u32 {
    if let Some(env) = env_val {
        if let Some(val) = read_u32_prefix(env) {
            return val;
        }
        displaylevel!(
            2,
            "Ignore environment variable setting {}={}: not a valid unsigned value \n",
            ENV_DEPTH,
            env
        );
    }
    SEARCH_DEPTH_DEFAULT
}
