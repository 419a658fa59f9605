//! Core domain models for synapse-engine.
//!
//! Pure data structures shared across the retrieval, synthesis, ranking,
//! and job-management layers. None of these types perform I/O.

pub mod insight;
pub mod job;
pub mod note;
pub mod prescription;

pub use insight::{EurekaMarkers, EvidenceRef, Hypothesis, Insight, PipelineResult, Verdict};
pub use job::{Job, JobError, JobMetrics, JobStatus, Phase, Progress};
pub use note::{Chunk, Embedding, Note, split_paragraphs};
pub use prescription::{Budgets, Prescription, PrescriptionMode, RetrievalConfig, Toggles, VerificationConfig};
