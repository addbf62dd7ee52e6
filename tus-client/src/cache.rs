use auto_impl::auto_impl;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::{fs, io, path::PathBuf, time::SystemTime};

/// Everything needed to resume an upload without re-discovering it from the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    pub offset: u64,
    pub server_key: String,
    pub cached_at: SystemTime,
}

/// The cache collaborator: persists and retrieves [`CacheRecord`]s keyed by client key.
///
/// Failures here are never fatal to the state machine — they only degrade resume quality, since
/// a cache miss simply means falling back to a fresh `HEAD`/`POST`.
#[auto_impl(&, &mut, Box, Rc, Arc)]
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<CacheRecord>;
    fn put(&self, key: &str, record: CacheRecord);
    fn delete(&self, key: &str);
}

/// `DashMap`-backed in-memory cache. The default collaborator; records do not outlive the
/// process.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    records: DashMap<String, CacheRecord>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for InMemoryCache {
    fn get(&self, key: &str) -> Option<CacheRecord> {
        self.records.get(key).map(|entry| entry.value().clone())
    }

    fn put(&self, key: &str, record: CacheRecord) {
        self.records.insert(key.to_string(), record);
    }

    fn delete(&self, key: &str) {
        self.records.remove(key);
    }
}

/// One JSON file per client key under `directory`, named by the hex-encoded key bytes, so the
/// cache never depends on the key being a valid path segment.
#[derive(Debug, Clone)]
pub struct FileSystemCache {
    directory: PathBuf,
}

impl FileSystemCache {
    pub fn new(directory: impl Into<PathBuf>) -> io::Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(Self { directory })
    }

    fn path_of(&self, key: &str) -> PathBuf {
        self.directory.join(hex::encode(key.as_bytes()))
    }
}

impl Cache for FileSystemCache {
    fn get(&self, key: &str) -> Option<CacheRecord> {
        let data = fs::read(self.path_of(key)).ok()?;
        serde_json::from_slice(&data).ok()
    }

    fn put(&self, key: &str, record: CacheRecord) {
        if let Ok(data) = serde_json::to_vec(&record) {
            let _ = fs::write(self.path_of(key), data);
        }
    }

    fn delete(&self, key: &str) {
        let _ = fs::remove_file(self.path_of(key));
    }
}
