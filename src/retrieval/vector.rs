//! Dense vector ranking: embed the expanded queries, mean-pool them, and
//! search the vector index for the nearest chunks, mapped back to notes.

use crate::embedding::mean_vector;
use crate::llm::Router;
use crate::notes::NotesStore;
use crate::vector_index::VectorIndex;
use std::collections::HashMap;
use uuid::Uuid;

/// Embeds `queries`, keeps only vectors of the majority dimensionality,
/// mean-pools the survivors, and returns up to `top_k` note ids ranked by
/// nearest chunk distance, excluding `source_note`.
pub async fn vector_rank(
    router: &Router,
    store: &NotesStore,
    index: &VectorIndex,
    queries: &[String],
    source_note: Uuid,
    top_k: usize,
) -> crate::Result<Vec<Uuid>> {
    if queries.is_empty() || index.is_empty() {
        return Ok(Vec::new());
    }

    let embedded = router.embed(queries).await?;
    let non_empty: Vec<Vec<f32>> = embedded.into_iter().filter(|v| !v.is_empty()).collect();
    if non_empty.is_empty() {
        return Ok(Vec::new());
    }

    let majority_dim = majority_dimension(&non_empty);
    let filtered: Vec<Vec<f32>> = non_empty.into_iter().filter(|v| v.len() == majority_dim).collect();

    let Some(query_vector) = mean_vector(&filtered) else {
        return Ok(Vec::new());
    };

    let hits = index.search(&query_vector, top_k * 2)?;

    let mut seen = std::collections::HashSet::new();
    let mut note_ids = Vec::new();
    for hit in hits {
        let Some(note_id) = store.note_id_for_chunk(hit.id)? else { continue };
        if note_id == source_note {
            continue;
        }
        if seen.insert(note_id) {
            note_ids.push(note_id);
        }
        if note_ids.len() >= top_k {
            break;
        }
    }

    Ok(note_ids)
}

fn majority_dimension(vectors: &[Vec<f32>]) -> usize {
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for v in vectors {
        *counts.entry(v.len()).or_insert(0) += 1;
    }
    counts.into_iter().max_by_key(|(_, count)| *count).map_or(0, |(dim, _)| dim)
}
