//! Scrapers for fixed-format solver logs and case dictionaries.
//!
//! Every scraper finds an anchor (a keyword token) and reads fields at a
//! fixed position relative to it. A change in the upstream log layout moves
//! those fields, so callers should sanity-check the values (y+ > 0, counts
//! non-zero) before trusting them.

pub mod case;
pub mod parse;
pub mod row;

pub use case::{collect_case_summary, read_recovery_terms};
