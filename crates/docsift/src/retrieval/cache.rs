//! Bounded cache of built chunk indexes, keyed by document text.
//!
//! The key is the SHA-256 of the exact text: no whitespace or case
//! normalization, so "the same document" means byte-identical text. Entries
//! expire after a TTL and the oldest entry is evicted at capacity. Racing
//! builders for the same text are safe: both build, the last `put` wins,
//! and the loser's index is simply dropped.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

use super::index::ChunkIndex;

struct CacheEntry {
    index: Arc<ChunkIndex>,
    cached_at: DateTime<Utc>,
    hit_count: u32,
}

pub struct IndexCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    max_entries: usize,
    ttl_seconds: u64,
}

impl IndexCache {
    pub fn new(max_entries: usize, ttl_seconds: u64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries,
            ttl_seconds,
        }
    }

    fn key_for(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Fetch the index for this exact text, if cached and fresh.
    pub fn get(&self, text: &str) -> Option<Arc<ChunkIndex>> {
        let key = Self::key_for(text);
        let mut entries = self.entries.write();

        let entry = entries.get_mut(&key)?;

        let age = Utc::now().signed_duration_since(entry.cached_at);
        if age.num_seconds() < 0 || age.num_seconds() as u64 >= self.ttl_seconds {
            tracing::debug!("index cache miss (expired): {}", &key[..12]);
            entries.remove(&key);
            return None;
        }

        entry.hit_count += 1;
        tracing::debug!("index cache hit: {} (hits: {})", &key[..12], entry.hit_count);
        Some(Arc::clone(&entry.index))
    }

    /// Store a built index for this exact text, evicting the oldest entry
    /// when at capacity.
    pub fn put(&self, text: &str, index: Arc<ChunkIndex>) {
        let key = Self::key_for(text);
        let mut entries = self.entries.write();

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.cached_at)
                .map(|(k, _)| k.clone())
            {
                tracing::debug!("index cache evicting oldest entry {}", &oldest[..12]);
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                index,
                cached_at: Utc::now(),
                hit_count: 0,
            },
        );
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        CacheStats {
            entries: entries.len(),
            total_hits: entries.values().map(|e| e.hit_count).sum(),
            max_entries: self.max_entries,
            ttl_seconds: self.ttl_seconds,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_hits: u32,
    pub max_entries: usize,
    pub ttl_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::index::IndexedChunk;

    fn index_with(content: &str) -> Arc<ChunkIndex> {
        Arc::new(ChunkIndex::new(vec![IndexedChunk {
            content: content.to_string(),
            embedding: vec![1.0],
            chunk_index: 0,
        }]))
    }

    #[test]
    fn caches_and_returns_same_index() {
        let cache = IndexCache::new(4, 3600);
        cache.put("document text", index_with("a"));

        let hit = cache.get("document text").unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(cache.stats().total_hits, 1);
    }

    #[test]
    fn key_is_exact_text_no_normalization() {
        let cache = IndexCache::new(4, 3600);
        cache.put("document text", index_with("a"));

        assert!(cache.get("document text ").is_none());
        assert!(cache.get("Document text").is_none());
        assert!(cache.get("document text").is_some());
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let cache = IndexCache::new(4, 0);
        cache.put("document text", index_with("a"));
        assert!(cache.get("document text").is_none());
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn capacity_evicts_oldest_entry() {
        let cache = IndexCache::new(2, 3600);
        cache.put("first", index_with("1"));
        cache.put("second", index_with("2"));
        cache.put("third", index_with("3"));

        assert_eq!(cache.stats().entries, 2);
        assert!(cache.get("first").is_none(), "oldest entry should be gone");
        assert!(cache.get("third").is_some());
    }

    #[test]
    fn replacing_an_entry_does_not_evict_others() {
        let cache = IndexCache::new(2, 3600);
        cache.put("first", index_with("1"));
        cache.put("second", index_with("2"));
        cache.put("second", index_with("2 again"));

        assert_eq!(cache.stats().entries, 2);
        assert!(cache.get("first").is_some());
    }
}
