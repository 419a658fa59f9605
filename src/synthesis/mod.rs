//! Synthesis: pairwise fusion across candidate notes.
//!
//! This module covers the pipeline's first synthesis pass, run before
//! ranking. The second, multi-hop "constellation" pass the orchestrator
//! runs afterward — against the *ranked* top-1 insight — lives in
//! [`constellation::extend_with_constellation`] and is invoked directly by
//! [`crate::orchestrator::run_pipeline`], not from here.

pub mod constellation;
pub mod pairwise;

pub use constellation::extend_with_constellation;
pub use pairwise::pairwise_fusion;

use crate::domain::{Insight, Note};
use crate::llm::Router;

/// Runs pairwise fusion against every candidate note, discarding any
/// result that errored or came back `mode == "none"`.
pub async fn synthesize(router: &Router, source: &Note, candidates: &[Note]) -> Vec<Insight> {
    pairwise_fusion(router, source, candidates).await
}
