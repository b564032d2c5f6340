//! Durable HTTP content cache.
//!
//! Responses are stored on disk keyed by the blake3 hash of the URL,
//! sharded two levels deep like a content-addressed store, with an
//! in-memory layer in front. Reads are lock-free; writes take the
//! per-path file lock.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use camino::{Utf8Path, Utf8PathBuf};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use tydi_core::error::TydiError;

use crate::lock::FileLock;
use crate::FetchResult;

/// Freshness window applied when the response carries no `max-age`
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// A cached response with freshness metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Response body, BOM already stripped
    pub body: String,
    /// When the entry was stored
    pub stored_at: SystemTime,
    /// Freshness lifetime from `Cache-Control: max-age` or the default
    pub ttl: Duration,
}

impl CacheEntry {
    fn new(body: String, ttl: Duration) -> Self {
        Self {
            body,
            stored_at: SystemTime::now(),
            ttl,
        }
    }

    /// Check if the entry is still fresh
    pub fn is_fresh(&self) -> bool {
        match self.stored_at.elapsed() {
            Ok(elapsed) => elapsed < self.ttl,
            Err(_) => false, // Clock went backwards, consider stale
        }
    }
}

/// Process-wide HTTP content cache
#[derive(Debug)]
pub struct HttpCache {
    /// Root directory for persisted entries
    dir: Utf8PathBuf,
    /// Lock-free in-memory layer
    memory: DashMap<String, Arc<CacheEntry>>,
}

impl HttpCache {
    /// Open (and create if needed) a cache rooted at `dir`
    pub fn new(dir: impl Into<Utf8PathBuf>) -> FetchResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| TydiError::io(format!("Failed to create cache directory {dir}"), e))?;
        Ok(Self {
            dir,
            memory: DashMap::new(),
        })
    }

    /// The on-disk path for a URL key, sharded as `ab/cd/<hash>.json`
    fn entry_path(&self, url: &str) -> Utf8PathBuf {
        let hex = blake3::hash(url.as_bytes()).to_hex().to_string();
        self.dir.join(&hex[0..2]).join(&hex[2..4]).join(format!("{hex}.json"))
    }

    /// Fetch a fresh entry for `url`, or None on miss/staleness.
    ///
    /// Never takes a lock; a torn concurrent write surfaces as a miss.
    pub fn get(&self, url: &str) -> Option<String> {
        if let Some(entry) = self.memory.get(url) {
            if entry.is_fresh() {
                return Some(entry.body.clone());
            }
            drop(entry);
            self.memory.remove(url);
        }

        let path = self.entry_path(url);
        let content = std::fs::read_to_string(&path).ok()?;
        let entry: CacheEntry = serde_json::from_str(&content).ok()?;
        if !entry.is_fresh() {
            return None;
        }

        debug!(url, "http cache hit from disk");
        let body = entry.body.clone();
        self.memory.insert(url.to_string(), Arc::new(entry));
        Some(body)
    }

    /// Store a response body under `url` with the given freshness lifetime
    pub async fn put(&self, url: &str, body: String, ttl: Duration) -> FetchResult<()> {
        let entry = CacheEntry::new(body, ttl);
        let path = self.entry_path(url);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TydiError::io(format!("Failed to create cache shard {parent}"), e))?;
        }

        let serialized = serde_json::to_string(&entry).map_err(|e| TydiError::JsonParse {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        let _lock = FileLock::acquire(&path).await?;
        tokio::fs::write(&path, serialized)
            .await
            .map_err(|e| TydiError::io(format!("Failed to write cache entry {path}"), e))?;

        self.memory.insert(url.to_string(), Arc::new(entry));
        Ok(())
    }

    /// Drop every in-memory entry (disk entries are left in place)
    pub fn clear_memory(&self) {
        self.memory.clear();
    }
}
