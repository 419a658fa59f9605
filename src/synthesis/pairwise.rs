//! Pairwise fusion: one `generateInsight` call per candidate note,
//! proceeding concurrently.

use crate::domain::{EvidenceRef, Insight, Note};
use crate::llm::Router;
use futures_util::future::join_all;

const LEADING_PARAGRAPHS: usize = 2;

pub(crate) fn leading_paragraphs(note: &Note, n: usize) -> Vec<String> {
    crate::domain::split_paragraphs(&note.content).into_iter().take(n).collect()
}

fn evidence_bullets(source: &Note, candidate: &Note) -> String {
    let mut bullets = Vec::new();
    for p in leading_paragraphs(source, LEADING_PARAGRAPHS) {
        bullets.push(format!("[{}] {p}", source.id));
    }
    for p in leading_paragraphs(candidate, LEADING_PARAGRAPHS) {
        bullets.push(format!("[{}] {p}", candidate.id));
    }
    bullets.join("\n")
}

const INSTRUCTION: &str = "You are an Insight Engine. Using ONLY the provided evidence, return a single JSON \
object with fields: mode, reframedProblem, insightCore, selectedHypothesisName, hypotheses[{name,statement,\
predictedEvidence,disconfirmers,prior,posterior}], eurekaMarkers{suddennessProxy,fluency,conviction,\
positiveAffect}, bayesianSurprise, evidenceRefs[{noteId,childId,quote}], test, risks[].";

async fn generate_insight(router: &Router, evidence: &str) -> Option<Insight> {
    let prompt = format!("{INSTRUCTION}\nEVIDENCE:\n{evidence}");
    router.route_structured::<Insight>("generateInsight", &prompt).await.ok()
}

/// Runs pairwise fusion against every candidate note concurrently, discards
/// any result with `mode == "none"` or that errored, and attaches the
/// candidate's note id as `old_note_id` on each surviving insight.
pub async fn pairwise_fusion(router: &Router, source: &Note, candidates: &[Note]) -> Vec<Insight> {
    let futures = candidates.iter().map(|candidate| {
        let evidence = evidence_bullets(source, candidate);
        async move { (candidate.id, generate_insight(router, &evidence).await) }
    });

    let results = join_all(futures).await;

    results
        .into_iter()
        .filter_map(|(candidate_id, result)| {
            let mut insight = result?;
            if insight.mode == "none" {
                return None;
            }
            insight.old_note_id = Some(candidate_id);
            if insight.evidence_refs.is_empty() {
                insight.evidence_refs =
                    vec![EvidenceRef { note_id: source.id, child_id: String::new(), quote: String::new() }];
            }
            Some(insight)
        })
        .collect()
}
