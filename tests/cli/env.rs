// Tests for cli/env.rs: FLZMA2_NBWORKERS and FLZMA2_DEPTH parsing.
//
// Only the `_from` variants are exercised so the suite never touches the
// process environment.

use flzma2::cli::env::{init_depth_from, init_nb_workers_from, read_u32_prefix};
use flzma2::config::{NB_WORKERS_DEFAULT, SEARCH_DEPTH_DEFAULT};

#[test]
fn prefix_digits_are_read() {
    assert_eq!(read_u32_prefix("12"), Some(12));
    assert_eq!(read_u32_prefix("12abc"), Some(12));
    assert_eq!(read_u32_prefix("0"), Some(0));
    assert_eq!(read_u32_prefix("abc"), None);
    assert_eq!(read_u32_prefix(""), None);
    assert_eq!(read_u32_prefix("-4"), None);
    assert_eq!(read_u32_prefix("99999999999"), None);
}

#[test]
fn unset_variables_give_defaults() {
    assert_eq!(init_nb_workers_from(None), NB_WORKERS_DEFAULT);
    assert_eq!(init_depth_from(None), SEARCH_DEPTH_DEFAULT);
}

#[test]
fn set_variables_are_used() {
    assert_eq!(init_nb_workers_from(Some("8")), 8);
    assert_eq!(init_depth_from(Some("48k")), 48);
}

#[test]
fn garbage_falls_back_to_defaults() {
    assert_eq!(init_nb_workers_from(Some("many")), NB_WORKERS_DEFAULT);
    assert_eq!(init_depth_from(Some(" 12")), SEARCH_DEPTH_DEFAULT);
}
