//! Insight and its sub-structures: the synthesis pipeline's output shape.
//!
//! `Insight` mirrors the JSON schema the LLM Router asks providers to fill
//! in for the `generateInsight` task (mode, hypotheses, eureka markers,
//! evidence refs, …), plus bookkeeping fields the orchestrator and ranking
//! stages attach afterward (score, originating note ids, verification).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel mode value meaning "no usable connection found"; such insights
/// are discarded by the synthesis stage.
pub const MODE_NONE: &str = "none";

/// One candidate explanation considered while generating an insight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Hypothesis {
    /// Short identifying label, referenced by `selected_hypothesis_name`.
    pub name: String,
    /// The hypothesis statement itself.
    pub statement: String,
    /// Evidence that would be expected if the hypothesis were true.
    pub predicted_evidence: Vec<String>,
    /// Observations that would disconfirm the hypothesis.
    pub disconfirmers: Vec<String>,
    /// Prior probability in `[0, 1]`.
    pub prior: f64,
    /// Posterior probability in `[0, 1]`, after considering evidence.
    pub posterior: f64,
}

/// Four bounded scalars quantifying the subjective "eureka" quality of an
/// insight, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EurekaMarkers {
    /// How sudden the realization reads, as a proxy score.
    pub suddenness_proxy: f64,
    /// How fluent / well-formed the write-up is.
    pub fluency: f64,
    /// How convinced the generator is of its own claim.
    pub conviction: f64,
    /// Positive-affect proxy (the "aha" feeling).
    pub positive_affect: f64,
}

impl Default for EurekaMarkers {
    fn default() -> Self {
        Self {
            suddenness_proxy: 0.0,
            fluency: 0.0,
            conviction: 0.0,
            positive_affect: 0.0,
        }
    }
}

/// A pointer from an insight back to the note/chunk text that supports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvidenceRef {
    /// The note this evidence came from.
    pub note_id: Uuid,
    /// The chunk id within that note, when known; empty string when the
    /// evidence came from a raw paragraph rather than a persisted chunk.
    #[serde(default)]
    pub child_id: String,
    /// The quoted text itself.
    pub quote: String,
}

/// The verdict the Verifier assigns a candidate text after web search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// At least one search snippet contained the candidate text.
    Supported,
    /// Search returned results, but none matched the candidate text.
    Uncertain,
    /// Search returned no results at all.
    Refuted,
}

/// The JSON shape requested from the `generateInsight` / `constellation`
/// LLM tasks, enriched with bookkeeping the pipeline attaches afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Insight {
    /// Assigned locally when the insight is first accepted (not by the LLM).
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Free-text mode; `"none"` means "discard".
    pub mode: String,
    /// The restated problem this insight addresses.
    pub reframed_problem: String,
    /// The insight's core claim — also used as its display title.
    pub insight_core: String,
    /// Name of the hypothesis in `hypotheses` that was ultimately selected.
    pub selected_hypothesis_name: String,
    /// Candidate explanations considered.
    pub hypotheses: Vec<Hypothesis>,
    /// Subjective quality markers.
    pub eureka_markers: EurekaMarkers,
    /// How surprising the connection is under a Bayesian prior, in `[0, 1]`.
    pub bayesian_surprise: f64,
    /// Supporting evidence references.
    pub evidence_refs: Vec<EvidenceRef>,
    /// A proposed falsification test for the insight.
    pub test: String,
    /// Known risks or caveats.
    pub risks: Vec<String>,

    /// Ranking score, populated by the Ranking stage; `0.0` before ranking.
    #[serde(default)]
    pub score: f64,
    /// The id of the non-source note this insight was fused against
    /// (pairwise partner, or the final bridge note for constellations).
    #[serde(default)]
    pub old_note_id: Option<Uuid>,
    /// For constellation insights, the three source note ids (source, A, B).
    #[serde(default)]
    pub constellation_note_ids: Option<[Uuid; 3]>,
    /// Populated by the Verifier, when verification ran.
    #[serde(default)]
    pub verification: Option<Verdict>,

    /// A short excerpt surfaced alongside the title.
    #[serde(default)]
    pub snippet: Option<String>,
    /// Optional free-text record of the agentic refinement transcript.
    #[serde(default)]
    pub transcript: Option<String>,
}

impl Insight {
    /// True when this insight's `mode` is the discard sentinel.
    #[must_use]
    pub fn is_none_mode(&self) -> bool {
        self.mode == MODE_NONE
    }

    /// Count of distinct note ids referenced in `evidence_refs` — the
    /// `diversity` term in the ranking score formula.
    #[must_use]
    pub fn diversity(&self) -> usize {
        let mut ids: Vec<Uuid> = self.evidence_refs.iter().map(|e| e.note_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// The insight's display title (its core claim).
    #[must_use]
    pub fn title(&self) -> &str {
        &self.insight_core
    }
}

/// The job's terminal successful result: up to three ranked insights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Result schema version, currently always `"v2"`.
    pub version: String,
    /// Up to three insights, highest score first.
    pub insights: Vec<Insight>,
}

impl PipelineResult {
    /// Builds a `v2` result from a final, already-ranked insight list.
    #[must_use]
    pub fn v2(insights: Vec<Insight>) -> Self {
        Self {
            version: "v2".to_string(),
            insights,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_insight(note_ids: &[Uuid]) -> Insight {
        Insight {
            id: Uuid::new_v4(),
            mode: "connection".to_string(),
            reframed_problem: String::new(),
            insight_core: "X".to_string(),
            selected_hypothesis_name: String::new(),
            hypotheses: vec![],
            eureka_markers: EurekaMarkers::default(),
            bayesian_surprise: 0.0,
            evidence_refs: note_ids
                .iter()
                .map(|id| EvidenceRef {
                    note_id: *id,
                    child_id: String::new(),
                    quote: "q".to_string(),
                })
                .collect(),
            test: String::new(),
            risks: vec![],
            score: 0.0,
            old_note_id: None,
            constellation_note_ids: None,
            verification: None,
            snippet: None,
            transcript: None,
        }
    }

    #[test]
    fn is_none_mode_detects_sentinel() {
        let mut insight = sample_insight(&[]);
        insight.mode = MODE_NONE.to_string();
        assert!(insight.is_none_mode());
        insight.mode = "connection".to_string();
        assert!(!insight.is_none_mode());
    }

    #[test]
    fn diversity_counts_distinct_note_ids() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let insight = sample_insight(&[a, a, b]);
        assert_eq!(insight.diversity(), 2);
    }

    #[test]
    fn diversity_is_zero_with_no_evidence() {
        assert_eq!(sample_insight(&[]).diversity(), 0);
    }
}
