//! Reciprocal Rank Fusion, generalized to any hashable id type.
//!
//! Adapted from the crate's original chunk-id-only RRF (`search::rrf`) to
//! fuse note-id-keyed ranked lists instead.

use std::collections::HashMap;
use std::hash::Hash;

/// The `k` constant from the RRF formula: `score(d) = Σ 1 / (k + rank + 1)`.
pub const DEFAULT_K: u32 = 60;

/// Fuses multiple ranked lists (most relevant first) into one list sorted
/// descending by fused score.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn reciprocal_rank_fusion<T: Eq + Hash + Clone>(ranked_lists: &[&[T]], k: u32) -> Vec<(T, f64)> {
    let mut scores: HashMap<T, f64> = HashMap::new();

    for list in ranked_lists {
        for (rank, item) in list.iter().enumerate() {
            let rrf_score = 1.0 / f64::from(k + (rank as u32) + 1);
            *scores.entry(item.clone()).or_insert(0.0) += rrf_score;
        }
    }

    let mut results: Vec<(T, f64)> = scores.into_iter().collect();
    results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    results
}
