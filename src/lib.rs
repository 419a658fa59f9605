//! # synapse-engine
//!
//! A local knowledge-synthesis engine: hybrid retrieval, multi-stage LLM
//! synthesis, ranking with an adversarial counter-check, self-evolution,
//! and web verification over a note corpus.
//!
//! ## Features
//!
//! - **Hybrid retrieval**: lexical and dense vector search fused via
//!   reciprocal rank fusion
//! - **`SQLite` storage**: notes, chunks, and embeddings with transaction
//!   support
//! - **Concurrent vector index**: a flat L2 index behind a single-writer
//!   lock
//! - **Job Manager**: TTL-bounded job registry with SSE progress streaming

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod domain;
pub mod embedding;
pub mod error;
pub mod evolution;
pub mod http;
pub mod io;
pub mod jobs;
pub mod llm;
pub mod notes;
pub mod orchestrator;
pub mod ranking;
pub mod retrieval;
pub mod synthesis;
pub mod vector_index;
pub mod verify;
pub mod web_search;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};

// Re-export embedding types
pub use embedding::{DEFAULT_DIMENSIONS, Embedder, FallbackEmbedder, create_embedder};

// Re-export domain model types
pub use domain::{
    Budgets, Chunk, EurekaMarkers, Embedding, EvidenceRef, Hypothesis, Insight, Job, JobError,
    JobMetrics, JobStatus, Note, Phase, PipelineResult, Prescription, PrescriptionMode, Progress,
    RetrievalConfig, Toggles, Verdict, VerificationConfig,
};

// Re-export configuration
pub use config::Config;

// Re-export the vector index
pub use vector_index::{Hit as VectorHit, VectorIndex};

// Re-export the LLM router
pub use llm::{ChatMessage, ChatOptions, Router as LlmRouter, StreamEvent};

// Re-export the notes store
pub use notes::{NotesStore, upsert_embeddings};

// Re-export the retrieval pipeline
pub use retrieval::retrieve_candidates;

// Re-export ranking
pub use ranking::{CounterCheck, rank_insights};

// Re-export synthesis
pub use synthesis::synthesize;

// Re-export self-evolution
pub use evolution::run_self_evolution;

// Re-export the verifier and web search client
pub use verify::{VerificationCandidate, VerificationResult, verify_candidates};
pub use web_search::{SearchResult, WebSearch};

// Re-export the job manager
pub use jobs::JobManager;

// Re-export the pipeline orchestrator
pub use orchestrator::run_pipeline;

// Re-export the HTTP surface
pub use http::{AppState, router};
