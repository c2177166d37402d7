//! Radix match finder.
//!
//! For every position of a dictionary window the table records a link to an
//! earlier position sharing a prefix with it, plus the length of that prefix.
//! Construction is a two-stage radix sort: stage 1 ([`MatchTable::init`])
//! buckets positions by their first two bytes, stage 2 ([`MatchTable::build`])
//! refines each bucket by the bytes that follow, with worker threads claiming
//! runs of buckets from a shared atomic cursor.
//!
//! ```no_run
//! use flzma2::radix::{build_table, DataBlock};
//!
//! let data = b"abracadabra abracadabra";
//! let block = DataBlock::whole(data);
//! let table = build_table(&block, 32, 2)?;
//! if let Some(m) = table.get_match(&block, 12, 273, 32) {
//!     println!("{} bytes at distance {}", m.length, m.offset);
//! }
//! # Ok::<(), flzma2::Fl2Error>(())
//! ```

pub mod builder;
pub mod control;
pub mod dict;
pub mod params;
pub mod store;
pub mod table;
pub mod types;

pub use builder::Builder;
pub use control::BuildControl;
pub use dict::{DataBlock, DictionaryBuffer};
pub use params::RadixParams;
pub use store::{BitpackStore, MatchStore, StructuredStore, TableStore};
pub use table::{build_table, MatchTable};
pub use types::{Layout, Match, TableMode, MIN_MATCH_LENGTH};
