// embeddings/ - Text → vector backends for semantic similarity.
//
// Provides:
// - Model download + SHA256 verification
// - BERT inference with mean pooling (candle)
// - Deterministic feature-hashing backend (offline / tests)
// - Content-addressed embedding cache
// - Stable text composition for opportunities and profiles

pub mod cache;
pub mod download;
pub mod engine;
pub mod hashing;
pub mod text_prep;

use crate::ranking::error::Result;

/// A frozen text → vector function. Implementations must be deterministic for a
/// given `model_name()`; the cache relies on it.
pub trait TextEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}
