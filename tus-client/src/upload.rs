use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};
use tus_checksum::Algorithm;
use tus_utils::header::PARTIAL_KEY_SEPARATOR;

/// Whether the `Upload-Checksum` digest covers the whole local file (computed once, memoized,
/// and resent on every `PATCH`) or only the bytes of the chunk currently being sent.
///
/// `WholeFile` is the default. `PerChunk` is a stronger, opt-in alternative: it catches
/// corruption of an individual chunk in transit rather than only corruption of the file as a
/// whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumMode {
    WholeFile,
    PerChunk,
}

impl Default for ChecksumMode {
    fn default() -> Self {
        Self::WholeFile
    }
}

/// The central entity the state machine drives: the local file plus everything known about its
/// remote upload.
#[derive(Debug, Clone)]
pub struct Upload {
    pub(crate) client_key: String,
    pub(crate) server_key: Option<String>,
    pub(crate) path: PathBuf,
    pub(crate) length: u64,
    pub(crate) name: String,
    pub(crate) algorithm: Algorithm,
    pub(crate) checksum: Option<Vec<u8>>,
    pub(crate) partial: bool,
    pub(crate) offset: u64,
}

impl Upload {
    pub(crate) fn new(path: PathBuf, length: u64, name: String, algorithm: Algorithm) -> Self {
        Self {
            client_key: String::new(),
            server_key: None,
            path,
            length,
            name,
            algorithm,
            checksum: None,
            partial: false,
            offset: 0,
        }
    }

    pub fn client_key(&self) -> &str {
        &self.client_key
    }

    pub fn server_key(&self) -> Option<&str> {
        self.server_key.as_deref()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn is_partial(&self) -> bool {
        self.partial
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn is_complete(&self) -> bool {
        self.offset >= self.length
    }
}

/// A synthetic entity that exists only to submit a `concat` request: a parent key plus an
/// ordered list of partial keys. It never streams bytes of its own.
#[derive(Debug, Clone)]
pub struct FinalUpload {
    pub client_key: String,
    pub partial_keys: Vec<String>,
}

static PARTIAL_SUFFIX_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Builds a partial upload's client key: `<parent><SEP><suffix>`.
///
/// The suffix folds together a monotonic per-process counter and the current time in
/// nanoseconds, giving uniqueness within a process and enough entropy across processes.
pub(crate) fn make_partial_key(parent: &str) -> String {
    let suffix = PARTIAL_SUFFIX_COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("{parent}{PARTIAL_KEY_SEPARATOR}{nanos:x}-{suffix:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_keys_are_unique_and_prefixed() {
        let a = make_partial_key("parent");
        let b = make_partial_key("parent");
        assert_ne!(a, b);
        assert!(a.starts_with("parent+"));
        assert!(b.starts_with("parent+"));
    }
}
