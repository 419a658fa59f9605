//! Prescription: the planning parameters a run is executed under.
//!
//! The pipeline orchestrator is not itself a planner — there is no
//! `prescribe()` agent in this crate — but it accepts a `Prescription` to
//! override its otherwise-fixed defaults (`top_k=10`, verification enabled
//! with `max_sites=3`), matching the shape the original system's planner
//! would have produced.

use serde::{Deserialize, Serialize};

/// Which synthesis strategy a run should favor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrescriptionMode {
    /// Pairwise fusion only; skip multi-hop constellation synthesis.
    Pairwise,
    /// Pairwise plus constellation fusion (the default pipeline flow).
    Fusion,
}

/// Retrieval-stage parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Free-text label for the retrieval strategy in use (informational).
    pub strategy: String,
    /// How many candidate notes to keep after fusion.
    pub top_k: usize,
}

/// Verification-stage parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Whether the Verifier runs at all for this job.
    pub enabled: bool,
    /// Max web-search results consulted per candidate.
    pub max_sites: usize,
    /// Self-evolution iteration count (currently always 1 in this pipeline).
    pub iterations: usize,
}

/// Coarse feature toggles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Toggles {
    /// Whether LLM calls are permitted (false forces deterministic fallbacks).
    pub llm: bool,
    /// Whether the web-search-backed Verifier is permitted.
    pub web: bool,
}

/// Soft resource budgets; informational, not enforced by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Budgets {
    /// USD spend ceiling.
    pub usd: f64,
    /// Token budget ceiling.
    pub tokens: u64,
    /// Wall-clock seconds ceiling.
    pub time_sec: u64,
}

/// A plan for a single pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    /// The source note's title or a short restatement of the goal.
    pub goal: String,
    /// Synthesis strategy.
    pub mode: PrescriptionMode,
    /// Retrieval parameters.
    pub retrieval: RetrievalConfig,
    /// Verification parameters.
    pub verification: VerificationConfig,
    /// Feature toggles.
    pub toggles: Toggles,
    /// Soft budgets.
    pub budgets: Budgets,
}

impl Prescription {
    /// The fixed default plan the orchestrator uses when no override is
    /// supplied, matching §4.10's flow: `top_k=10`, verification enabled
    /// with `max_sites=3`.
    #[must_use]
    pub fn default_for(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            mode: PrescriptionMode::Fusion,
            retrieval: RetrievalConfig {
                strategy: "hybrid".to_string(),
                top_k: 10,
            },
            verification: VerificationConfig {
                enabled: true,
                max_sites: 3,
                iterations: 1,
            },
            toggles: Toggles { llm: true, web: true },
            budgets: Budgets {
                usd: 0.0,
                tokens: 0,
                time_sec: 0,
            },
        }
    }
}
