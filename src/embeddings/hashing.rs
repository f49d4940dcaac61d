// hashing.rs - Deterministic feature-hashing embedder.
//
// No model files, no network. Each lowercase word is hashed (SHA256 with a fixed seed)
// to a bucket and a sign; the bag of signed buckets is L2-normalized. Texts that share
// words get positive cosine similarity, which is enough for offline use and tests.
//
// Changing HASH_SEED or the tokenization changes every vector: bump HASH_EMBEDDER_NAME
// so cached vectors are not mixed across versions.

use sha2::{Digest, Sha256};

use super::TextEmbedder;
use crate::config;
use crate::ranking::error::Result;

pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn bucket(&self, token: &str) -> (usize, f32) {
        let mut hasher = Sha256::new();
        hasher.update(config::embedding::HASH_SEED.as_bytes());
        hasher.update(token.as_bytes());
        let digest = hasher.finalize();

        let mut idx_bytes = [0u8; 8];
        idx_bytes.copy_from_slice(&digest[..8]);
        let idx = (u64::from_le_bytes(idx_bytes) % self.dimension as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        (idx, sign)
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(config::embedding::EMBEDDING_DIMS)
    }
}

impl TextEmbedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];

        let lowered = text.to_lowercase();
        for token in lowered.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let (idx, sign) = self.bucket(token);
            vector[idx] += sign;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        config::embedding::HASH_EMBEDDER_NAME
    }
}
