//! Pipeline Orchestrator: the phase machine that drives retrieval,
//! synthesis, ranking, self-evolution, and verification for one job.

use crate::domain::{Insight, JobMetrics, Phase, PipelineResult};
use crate::error::Error;
use crate::jobs::JobManager;
use crate::llm::Router;
use crate::notes::NotesStore;
use crate::ranking::rank_insights;
use crate::retrieval::retrieve_candidates;
use crate::synthesis::{extend_with_constellation, synthesize};
use crate::vector_index::VectorIndex;
use crate::verify::{VerificationCandidate, verify_candidates};
use crate::web_search::WebSearch;
use uuid::Uuid;

/// Notes considered beyond this bound are ignored (spec's "bounded, e.g.
/// <= 1000" load guard).
const MAX_NOTES_LOADED: usize = 1000;
/// Candidates retrieval may surface.
const RETRIEVAL_TOP_K: usize = 10;
/// Web search results considered per verification candidate.
const VERIFY_MAX_SITES: usize = 3;
/// Score multiplier applied when self-evolution actually changes the text.
const SELF_EVOLUTION_BOOST: f64 = 1.1;
/// Score floor applied once verification finds support.
const VERIFIED_SCORE_FLOOR: f64 = 0.85;

fn check_cancelled(jobs: &JobManager, job_id: Uuid) -> crate::Result<()> {
    if jobs.is_cancelled(job_id) {
        return Err(Error::Cancelled);
    }
    Ok(())
}

/// Runs the full pipeline for `source_note_id` against the corpus of
/// `store`, heartbeating progress into `jobs` and checking cooperative
/// cancellation between every phase.
///
/// # Errors
///
/// - [`Error::NotFound`] if `source_note_id` does not exist.
/// - [`Error::NoCandidates`] if Retrieval surfaces nothing.
/// - [`Error::NoInsights`] if Synthesis discards every candidate.
/// - [`Error::Cancelled`] if the job's cancellation flag was observed.
#[allow(clippy::too_many_arguments)]
pub async fn run_pipeline(
    job_id: Uuid,
    jobs: &JobManager,
    router: &Router,
    store: &NotesStore,
    index: &VectorIndex,
    web_search: &WebSearch,
    source_note_id: Uuid,
) -> crate::Result<PipelineResult> {
    jobs.heartbeat(job_id, Phase::CandidateSelection, 5, None, None);

    let all_notes = store.list_notes()?;
    let all_notes: Vec<_> = all_notes.into_iter().take(MAX_NOTES_LOADED).collect();

    let source = all_notes
        .iter()
        .find(|n| n.id == source_note_id)
        .cloned()
        .ok_or_else(|| Error::NotFound(source_note_id.to_string()))?;

    check_cancelled(jobs, job_id)?;

    let candidate_ids = retrieve_candidates(router, store, index, &source, RETRIEVAL_TOP_K).await?;
    let candidates: Vec<_> = all_notes.iter().filter(|n| candidate_ids.contains(&n.id)).cloned().collect();

    jobs.heartbeat(
        job_id,
        Phase::CandidateSelection,
        30,
        None,
        Some(JobMetrics { notes_considered: candidates.len() as u64, clusters: 0, llm_calls: 0, elapsed_ms: 0 }),
    );

    check_cancelled(jobs, job_id)?;

    let synthesized = synthesize(router, &source, &candidates).await;
    if synthesized.is_empty() {
        return Err(Error::NoInsights);
    }

    let top3_preview: Vec<Insight> = synthesized.iter().take(3).cloned().collect();
    jobs.heartbeat(job_id, Phase::InitialSynthesis, 50, Some(top3_preview), None);

    check_cancelled(jobs, job_id)?;

    let mut ranked = rank_insights(router, synthesized).await;

    jobs.heartbeat(job_id, Phase::MultiHop, 55, None, None);
    check_cancelled(jobs, job_id)?;

    if let Some(partner_id) = ranked.first().and_then(|top| top.old_note_id) {
        if let Some(partner) = candidates.iter().find(|n| n.id == partner_id) {
            ranked = extend_with_constellation(router, store, index, &source, partner, ranked).await?;
        }
    }

    jobs.heartbeat(job_id, Phase::MultiHop, 60, None, None);

    if let Some(top) = ranked.first_mut() {
        let original_core = top.insight_core.clone();
        let evolved = crate::evolution::run_self_evolution(router, &original_core).await;
        if evolved != original_core {
            top.insight_core = evolved;
            top.score = (top.score * SELF_EVOLUTION_BOOST).min(1.0);
        }
    }

    jobs.heartbeat(job_id, Phase::AgentRefinement, 80, None, None);
    check_cancelled(jobs, job_id)?;

    if let Some(top) = ranked.first_mut() {
        let query = if source.title.trim().is_empty() { source.content.chars().take(80).collect() } else { source.title.clone() };

        let mut candidates_to_verify = vec![VerificationCandidate { label: "core".to_string(), text: top.insight_core.clone() }];
        candidates_to_verify.extend(top.hypotheses.iter().map(|h| VerificationCandidate {
            label: h.name.clone(),
            text: h.statement.clone(),
        }));

        let verifications = verify_candidates(web_search, &query, &candidates_to_verify, VERIFY_MAX_SITES).await?;
        if let Some(supported) = verifications.iter().find(|v| v.verdict == crate::domain::Verdict::Supported) {
            top.insight_core = supported.candidate.text.clone();
            top.verification = Some(supported.verdict);
            top.score = top.score.max(VERIFIED_SCORE_FLOOR);
        }
    }

    jobs.heartbeat(job_id, Phase::Finalizing, 100, None, None);

    Ok(PipelineResult { version: "v2".to_string(), insights: ranked })
}
