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
    trivial_numeric_casts,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications
)]

//! # tus-client
//!
//! A client library for the tus resumable upload protocol: discovers remote upload progress,
//! creates or resumes uploads, streams bytes in offset-addressed chunks, computes integrity
//! checksums, and supports partial uploads later concatenated into a final object.

mod cache;
mod client;
mod error;
mod reader;
mod server_info;
mod upload;

pub use cache::{Cache, CacheRecord, FileSystemCache, InMemoryCache};
pub use client::{TusClient, DEFAULT_WINDOW_CAP};
pub use error::{Error, Result};
pub use reader::FileWindowReader;
pub use server_info::ServerInfo;
pub use upload::{ChecksumMode, FinalUpload, Upload};

pub use tus_checksum::Algorithm;
pub use tus_http::{HttpTransport, TransportError, UreqTransport};

pub mod prelude {
    pub use super::{Cache, ChecksumMode, HttpTransport, TusClient};
}
