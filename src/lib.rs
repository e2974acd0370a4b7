//! Fixed-capacity transposition table for alpha-beta game-tree search.
//!
//! A [transposition table] lets a search reuse previously computed results
//! for positions it reaches again through different move orders. This crate
//! implements the cache itself: a 4-way set-associative hash table with
//! aging-based replacement, mate-score renormalization and the usability
//! predicate the search driver applies to cached bounds. Move generation,
//! the board representation, position hashing and the search driver are the
//! caller's business; the table only sees the 64-bit fingerprints they
//! produce.
//!
//! [transposition table]: https://www.chessprogramming.org/Transposition_Table

// TODO: Gradually move most of warnings to deny.
#![warn(missing_docs, variant_size_differences)]
// Rustc lints.
#![warn(
    absolute_paths_not_starting_with_crate,
    keyword_idents,
    macro_use_extern_crate,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_import_braces,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]
// Rustdoc lints.
#![warn(
    rustdoc::private_doc_tests,
    rustdoc::missing_crate_level_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::invalid_codeblock_attributes,
    rustdoc::invalid_html_tags,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::bare_urls
)]
// Clippy lints.
#![warn(
    clippy::correctness,
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
// Performance is extremely important.
#![deny(clippy::perf)]

pub mod core;
pub mod evaluation;
pub mod transposition;

pub use transposition::{Bound, Entry, TranspositionTable};
