//! Embedding generation.
//!
//! The pipeline's only first-party embedder is [`FallbackEmbedder`], a
//! deterministic hash-derived, mean-centered embedder used whenever
//! `EMBEDDINGS_FAKE=1` (always on in tests) or when no LLM embedding
//! provider is configured. Production embedding calls instead go through
//! [`crate::llm::Router::embed`], which defers to this embedder in fake
//! mode and to a configured provider otherwise.

mod fallback;

pub use fallback::FallbackEmbedder;

use crate::Result;

/// Authoritative embedding dimension for this crate: 768, matching the
/// data model's `Embedding.vector` invariant.
pub const DEFAULT_DIMENSIONS: usize = 768;

/// A text embedder. Implementations must be thread-safe to support
/// parallel batch embedding during chunk upsert.
pub trait Embedder: Send + Sync {
    /// The dimensionality of vectors this embedder produces.
    fn dimensions(&self) -> usize;

    /// Embeds a single piece of text.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embeds multiple texts in one call. The default sequentially calls
    /// [`Embedder::embed`]; implementations may override for batch
    /// optimization (the fallback embedder parallelizes via `rayon`).
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Creates the crate's default embedder (the deterministic fallback).
#[must_use]
pub fn create_embedder() -> Box<dyn Embedder> {
    Box::new(FallbackEmbedder::new(DEFAULT_DIMENSIONS))
}

/// Cosine similarity between two vectors of equal length, in `[-1, 1]`.
/// Returns `0.0` for mismatched lengths or a zero-magnitude input.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

/// L2 squared distance between two vectors of equal length. Mismatched
/// lengths return `f32::MAX` so they sort last.
#[must_use]
pub fn l2_distance_squared(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::MAX;
    }
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// The mean of a set of equal-dimension vectors, element-wise. Returns
/// `None` for an empty input.
#[must_use]
pub fn mean_vector(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
    let dim = vectors.first()?.len();
    if dim == 0 {
        return None;
    }
    let mut sum = vec![0.0f32; dim];
    let mut count = 0usize;
    for v in vectors {
        if v.len() != dim {
            continue;
        }
        for (acc, val) in sum.iter_mut().zip(v.iter()) {
            *acc += val;
        }
        count += 1;
    }
    if count == 0 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = count as f32;
    for v in &mut sum {
        *v /= n;
    }
    Some(sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_similarity_identical_is_one() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_orthogonal_is_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn mean_vector_averages_elementwise() {
        let vectors = vec![vec![1.0, 1.0], vec![3.0, 5.0]];
        let mean = mean_vector(&vectors).unwrap();
        assert_eq!(mean, vec![2.0, 3.0]);
    }

    #[test]
    fn mean_vector_empty_is_none() {
        assert!(mean_vector(&[]).is_none());
    }

    #[test]
    fn create_embedder_matches_default_dimensions() {
        let embedder = create_embedder();
        assert_eq!(embedder.dimensions(), DEFAULT_DIMENSIONS);
    }
}
