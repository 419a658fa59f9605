//! Deterministic hash-based embedder.
//!
//! Used whenever `EMBEDDINGS_FAKE=1` is set (the default for tests) and as
//! the crate's only first-party embedder otherwise. Generates reproducible
//! pseudo-embeddings from word- and character-trigram hashing, then
//! mean-centers and unit-normalizes the result.
//!
//! This is NOT semantic similarity — it clusters on lexical overlap.

use crate::Result;
use crate::embedding::Embedder;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Hash-based fallback embedder.
pub struct FallbackEmbedder {
    dimensions: usize,
}

impl FallbackEmbedder {
    /// Creates a new fallback embedder with the given dimensionality.
    #[must_use]
    pub const fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn hash_string(s: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        hasher.finish()
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        let normalized: String = text
            .chars()
            .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c.to_ascii_lowercase() } else { ' ' })
            .collect();

        let words: Vec<&str> = normalized.split_whitespace().collect();

        for word in &words {
            let hash = Self::hash_string(word);
            let idx = (hash as usize) % self.dimensions;
            let sign = if (hash >> 32) & 1 == 0 { 1.0 } else { -1.0 };
            let magnitude = 1.0 + ((hash >> 16) & 0xFF) as f32 / 255.0;
            embedding[idx] += sign * magnitude;
        }

        let chars: Vec<char> = normalized.chars().collect();
        if chars.len() >= 3 {
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                let hash = Self::hash_string(&trigram);
                let idx = (hash as usize) % self.dimensions;
                let sign = if (hash >> 32) & 1 == 0 { 0.5 } else { -0.5 };
                embedding[idx] += sign;
            }
        }

        mean_center(&mut embedding);
        unit_normalize(&mut embedding);
        embedding
    }
}

/// Subtracts the element mean from every component, matching the data
/// model's "mean-centered" requirement for the fake embedding mode.
fn mean_center(v: &mut [f32]) {
    if v.is_empty() {
        return;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = v.iter().sum::<f32>() / v.len() as f32;
    for x in v.iter_mut() {
        *x -= mean;
    }
}

fn unit_normalize(v: &mut [f32]) {
    let magnitude: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for val in v.iter_mut() {
            *val /= magnitude;
        }
    }
}

impl Embedder for FallbackEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.generate_embedding(text))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        use rayon::prelude::*;
        Ok(texts.par_iter().map(|text| self.generate_embedding(text)).collect())
    }
}

// SAFETY: FallbackEmbedder holds only a Copy `usize` with no interior
// mutability, so sharing references across threads is sound.
#[allow(unsafe_code)]
unsafe impl Send for FallbackEmbedder {}
#[allow(unsafe_code)]
unsafe impl Sync for FallbackEmbedder {}
