//! Integration tests exercising the notes store, vector index, and the
//! pipeline orchestrator together against an in-memory database.

#![allow(clippy::expect_used)]

use synapse_engine::config::Config;
use synapse_engine::domain::Note;
use synapse_engine::embedding::DEFAULT_DIMENSIONS;
use synapse_engine::jobs::JobManager;
use synapse_engine::llm::Router;
use synapse_engine::notes::{NotesStore, upsert_embeddings};
use synapse_engine::orchestrator::run_pipeline;
use synapse_engine::vector_index::VectorIndex;
use synapse_engine::web_search::WebSearch;

fn fake_config() -> Config {
    Config { embeddings_fake: true, gateway_token: None, gateway_url: None, serpapi_api_key: None, ..Config::from_env() }
}

#[test]
fn test_notes_store_crud() {
    let store = NotesStore::in_memory().expect("in_memory failed");
    store.init().expect("init failed");
    assert!(store.schema_version().expect("schema_version failed").is_some());

    let note = Note::new("First note".to_string(), "Hello, world! This is test content.".to_string());
    store.upsert_note(&note).expect("upsert_note failed");

    let loaded = store.get_note(note.id).expect("get_note failed");
    assert!(loaded.is_some());
    assert_eq!(loaded.expect("note should exist").title, "First note");

    let notes = store.list_notes().expect("list_notes failed");
    assert_eq!(notes.len(), 1);

    store.delete_note(note.id).expect("delete_note failed");
    assert!(store.get_note(note.id).expect("get_note after delete failed").is_none());
}

#[test]
fn test_note_chunking_round_trip() {
    let store = NotesStore::in_memory().expect("in_memory failed");
    store.init().expect("init failed");

    let note = Note::new("Chunked".to_string(), "Hello, world!".to_string());
    store.upsert_note(&note).expect("upsert_note failed");

    let contents = vec!["Hello, world!".to_string(), "This is test content.".to_string()];
    let chunks = store.replace_chunks(note.id, &contents).expect("replace_chunks failed");
    assert_eq!(chunks.len(), 2);

    let loaded_chunks = store.get_chunks(note.id).expect("get_chunks failed");
    assert_eq!(loaded_chunks.len(), 2);
    assert_eq!(loaded_chunks[0].content, "Hello, world!");

    let owner = store.note_id_for_chunk(loaded_chunks[0].id).expect("note_id_for_chunk failed");
    assert_eq!(owner, Some(note.id));
}

#[tokio::test]
async fn test_upsert_embeddings_populates_index() {
    let store = NotesStore::in_memory().expect("in_memory failed");
    store.init().expect("init failed");
    let index = VectorIndex::new(DEFAULT_DIMENSIONS);
    let router = Router::new(fake_config());

    let note = Note::new("Embeds".to_string(), "First paragraph.\n\nSecond paragraph here.".to_string());
    store.upsert_note(&note).expect("upsert_note failed");

    upsert_embeddings(&router, &store, &index, note.id, &note.content).await.expect("upsert_embeddings failed");

    assert!(!index.is_empty());
    let chunks = store.get_chunks(note.id).expect("get_chunks failed");
    assert!(!chunks.is_empty());
    for chunk in &chunks {
        assert!(store.get_embedding(chunk.id).expect("get_embedding failed").is_some());
    }
}

#[tokio::test]
async fn test_pipeline_requires_candidates() {
    let store = NotesStore::in_memory().expect("in_memory failed");
    store.init().expect("init failed");
    let index = VectorIndex::new(DEFAULT_DIMENSIONS);
    let router = Router::new(fake_config());
    let web_search = WebSearch::new(None);
    let jobs = JobManager::new();
    let (job, _cancelled) = jobs.create();

    let note = Note::new("Lonely note".to_string(), "Nothing to compare against.".to_string());
    store.upsert_note(&note).expect("upsert_note failed");
    upsert_embeddings(&router, &store, &index, note.id, &note.content).await.expect("upsert_embeddings failed");

    let result = run_pipeline(job.id, &jobs, &router, &store, &index, &web_search, note.id).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_pipeline_reaches_synthesis_without_a_provider() {
    // With no LLM provider configured, synthesis discards every candidate,
    // so the pipeline still reaches the synthesis phase and reports
    // `NoInsights` rather than failing earlier in retrieval.
    let store = NotesStore::in_memory().expect("in_memory failed");
    store.init().expect("init failed");
    let index = VectorIndex::new(DEFAULT_DIMENSIONS);
    let router = Router::new(fake_config());
    let web_search = WebSearch::new(None);
    let jobs = JobManager::new();
    let (job, _cancelled) = jobs.create();

    let source = Note::new(
        "Source".to_string(),
        "Distributed consensus protocols trade availability for consistency under partition.".to_string(),
    );
    let related = Note::new(
        "Related".to_string(),
        "Raft achieves consensus through leader election and log replication across partitions.".to_string(),
    );
    for note in [&source, &related] {
        store.upsert_note(note).expect("upsert_note failed");
        upsert_embeddings(&router, &store, &index, note.id, &note.content).await.expect("upsert_embeddings failed");
    }

    let err = run_pipeline(job.id, &jobs, &router, &store, &index, &web_search, source.id).await.unwrap_err();
    assert_eq!(err.code(), "NoInsights");
}
