#![cfg_attr(feature = "docs", feature(doc_cfg))]
#![deny(
    absolute_paths_not_starting_with_crate,
    anonymous_parameters,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    meta_variable_misuse,
    non_ascii_idents,
    indirect_structural_match,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unsafe_code,
    unstable_features,
    unused_extern_crates,
    unused_import_braces,
    unused_lifetimes,
    unused_qualifications
)]

//! # tus-checksum
//!
//! Streaming digest computation for the algorithms a tus server may negotiate under the
//! `checksum` extension, plus the small closed registry mapping algorithm names to
//! implementations.

mod algorithm;
mod digest;

pub use algorithm::{Algorithm, UnknownAlgorithm};
pub use digest::{digest_bytes, digest_reader};
