// cache.rs - Content-addressed embedding cache.
//
// Keys are SHA256(model_name || 0x00 || text). Editing any field that feeds the composed
// text produces a new key, so a stale vector can never be served for changed content.
// The cache is owned by the caller and passed in explicitly.

use std::collections::{HashMap, HashSet};

use sha2::{Digest, Sha256};

use super::TextEmbedder;
use crate::ranking::error::Result;

#[derive(Debug, Default)]
pub struct EmbeddingCache {
    entries: HashMap<String, Vec<f32>>,
    hits: u64,
    misses: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(model_name: &str, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(model_name.as_bytes());
        hasher.update([0u8]);
        hasher.update(text.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Return the cached vector for `text`, calling the embedder only on a miss.
    /// Embedder errors are propagated and nothing is stored.
    pub fn get_or_embed(&mut self, embedder: &dyn TextEmbedder, text: &str) -> Result<Vec<f32>> {
        let key = Self::key(embedder.model_name(), text);
        if let Some(v) = self.entries.get(&key) {
            self.hits += 1;
            return Ok(v.clone());
        }

        let v = embedder.embed(text)?;
        self.misses += 1;
        self.entries.insert(key, v.clone());
        Ok(v)
    }

    /// Drop every entry whose key is not in `live`.
    pub fn retain(&mut self, live: &HashSet<String>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|k, _| live.contains(k));
        before - self.entries.len()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}
