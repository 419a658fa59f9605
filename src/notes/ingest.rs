//! Embedding upsert: the write-path flow that keeps a note's chunks, the
//! vector index, and stored embeddings consistent whenever a note's
//! content changes.

use crate::domain::{Embedding, split_paragraphs};
use crate::llm::Router;
use crate::notes::NotesStore;
use crate::vector_index::VectorIndex;
use uuid::Uuid;

/// Re-chunks and re-embeds `note_id`'s current content, replacing whatever
/// chunks and embeddings previously existed for it.
///
/// Steps mirror an external write transaction: remove the note's existing
/// chunk ids from the vector index, delete its old chunks (cascading
/// embeddings), chunk the new content, persist the new chunks, embed them
/// in one batch, add the vectors to the index, and persist the embeddings.
/// If the new content has no paragraphs, this is a no-op beyond the
/// removal step.
pub async fn upsert_embeddings(
    router: &Router,
    store: &NotesStore,
    index: &VectorIndex,
    note_id: Uuid,
    content: &str,
) -> crate::Result<()> {
    let existing_chunks = store.get_chunks(note_id)?;
    let existing_ids: Vec<i64> = existing_chunks.iter().map(|c| c.id).collect();
    index.remove(&existing_ids);

    let paragraphs = split_paragraphs(content);
    let new_chunks = store.replace_chunks(note_id, &paragraphs)?;

    if new_chunks.is_empty() {
        return Ok(());
    }

    let texts: Vec<String> = new_chunks.iter().map(|c| c.content.clone()).collect();
    let vectors = router.embed(&texts).await?;

    let items: Vec<(i64, Vec<f32>)> = new_chunks.iter().zip(vectors.iter()).map(|(c, v)| (c.id, v.clone())).collect();
    index.add(&items)?;

    let embeddings: Vec<Embedding> = new_chunks
        .iter()
        .zip(vectors.into_iter())
        .map(|(c, vector)| Embedding { id: 0, chunk_id: c.id, model: "router".to_string(), vector })
        .collect();
    store.insert_embeddings(&embeddings)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::Note;

    fn fake_router() -> Router {
        Router::new(Config { embeddings_fake: true, gateway_token: None, gateway_url: None, ..Config::from_env() })
    }

    #[tokio::test]
    async fn upserts_chunks_and_embeddings_for_new_note() {
        let router = fake_router();
        let store = NotesStore::in_memory().unwrap();
        let index = VectorIndex::new(768);

        let note = Note::new("Title".to_string(), "First paragraph.\n\nSecond paragraph.".to_string());
        store.upsert_note(&note).unwrap();

        upsert_embeddings(&router, &store, &index, note.id, &note.content).await.unwrap();

        let chunks = store.get_chunks(note.id).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(index.len(), 2);
        for chunk in &chunks {
            assert!(store.get_embedding(chunk.id).unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn re_upsert_replaces_previous_chunks_and_vectors() {
        let router = fake_router();
        let store = NotesStore::in_memory().unwrap();
        let index = VectorIndex::new(768);

        let note = Note::new("Title".to_string(), "One.\n\nTwo.\n\nThree.".to_string());
        store.upsert_note(&note).unwrap();
        upsert_embeddings(&router, &store, &index, note.id, &note.content).await.unwrap();
        assert_eq!(index.len(), 3);

        upsert_embeddings(&router, &store, &index, note.id, "Only one now.").await.unwrap();

        let chunks = store.get_chunks(note.id).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn empty_content_clears_chunks_and_index() {
        let router = fake_router();
        let store = NotesStore::in_memory().unwrap();
        let index = VectorIndex::new(768);

        let note = Note::new("Title".to_string(), "Some content.".to_string());
        store.upsert_note(&note).unwrap();
        upsert_embeddings(&router, &store, &index, note.id, &note.content).await.unwrap();
        assert_eq!(index.len(), 1);

        upsert_embeddings(&router, &store, &index, note.id, "   \n\n  ").await.unwrap();

        let chunks = store.get_chunks(note.id).unwrap();
        assert!(chunks.is_empty());
        assert_eq!(index.len(), 0);
    }
}
