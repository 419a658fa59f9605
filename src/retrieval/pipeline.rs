//! Hybrid retrieval: expand the source note's topic into queries, rank the
//! corpus both lexically and by dense vector similarity, then fuse the two
//! ranked lists with reciprocal rank fusion.

use super::expand::generate_search_queries;
use super::lexical::lexical_rank;
use super::rrf::{DEFAULT_K, reciprocal_rank_fusion};
use super::vector::vector_rank;
use crate::domain::Note;
use crate::error::Error;
use crate::llm::Router;
use crate::notes::NotesStore;
use crate::vector_index::VectorIndex;
use uuid::Uuid;

/// Default number of candidates a lexical or vector pass considers before
/// fusion narrows the result.
const LEXICAL_TOP_N: usize = 40;
const VECTOR_TOP_N: usize = 20;
const MAX_QUERIES: usize = 8;

/// Retrieves up to `top_k` candidate note ids related to `source`, by
/// expanding its topic into queries, ranking the corpus lexically and by
/// vector similarity, and fusing both rankings.
///
/// # Errors
///
/// Returns [`Error::NoCandidates`] if the corpus (excluding `source`) is
/// empty, or if fusion yields no candidates.
pub async fn retrieve_candidates(
    router: &Router,
    store: &NotesStore,
    index: &VectorIndex,
    source: &Note,
    top_k: usize,
) -> crate::Result<Vec<Uuid>> {
    let corpus: Vec<Note> = store.list_notes()?.into_iter().filter(|n| n.id != source.id).collect();
    if corpus.is_empty() {
        return Err(Error::NoCandidates);
    }

    let queries = generate_search_queries(router, &source.title, &source.content, MAX_QUERIES).await;

    let lexical_ids = lexical_rank(&queries, &corpus, LEXICAL_TOP_N);
    let vector_ids = vector_rank(router, store, index, &queries, source.id, VECTOR_TOP_N).await?;

    let fused = reciprocal_rank_fusion(&[&lexical_ids, &vector_ids], DEFAULT_K);

    let candidates: Vec<Uuid> = fused.into_iter().map(|(id, _)| id).take(top_k).collect();
    if candidates.is_empty() {
        return Err(Error::NoCandidates);
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn fake_router() -> Router {
        Router::new(Config { embeddings_fake: true, gateway_token: None, gateway_url: None, ..Config::from_env() })
    }

    #[tokio::test]
    async fn empty_corpus_errors_no_candidates() {
        let router = fake_router();
        let store = NotesStore::in_memory().unwrap();
        let index = VectorIndex::new(768);
        let source = Note::new("Solo note".to_string(), "Nothing else here".to_string());
        store.upsert_note(&source).unwrap();

        let err = retrieve_candidates(&router, &store, &index, &source, 10).await.unwrap_err();
        assert_eq!(err.code(), "NoCandidates");
    }

    #[tokio::test]
    async fn finds_lexically_related_note() {
        let router = fake_router();
        let store = NotesStore::in_memory().unwrap();
        let index = VectorIndex::new(768);

        let source = Note::new("Rust ownership".to_string(), "Borrowing and lifetimes in Rust".to_string());
        let other = Note::new("Rust traits".to_string(), "Trait objects and ownership in Rust".to_string());
        let unrelated = Note::new("Gardening".to_string(), "Tomatoes need sunlight".to_string());
        store.upsert_note(&source).unwrap();
        store.upsert_note(&other).unwrap();
        store.upsert_note(&unrelated).unwrap();

        let candidates = retrieve_candidates(&router, &store, &index, &source, 5).await.unwrap();
        assert!(candidates.contains(&other.id));
    }
}
