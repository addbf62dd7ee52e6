#![cfg_attr(feature = "docs", feature(doc_cfg))]
#![deny(
    single_use_lifetimes,
    missing_debug_implementations,
    large_assignments,
    exported_private_dependencies,
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
    unused_extern_crates,
    unused_import_braces,
    unused_lifetimes,
    unused_qualifications
)]

//! # tus-http
//!
//! The pluggable HTTP transport collaborator: the [`HttpTransport`] trait the core drives, and a
//! blocking [`UreqTransport`] implementation of it.

mod error;
mod transport;
mod ureq_transport;

pub use error::TransportError;
pub use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
pub use transport::{HttpTransport, Response};
pub use ureq_transport::UreqTransport;
