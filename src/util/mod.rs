//! Small helpers for the CLI: core counting and input expansion.

pub mod cores;
pub mod inputs;

pub use cores::{count_cores, resolve_thread_count};
pub use inputs::expand_inputs;
