//! Multi-hop "constellation" synthesis: extend the top pairwise insight by
//! bridging through a second partner note.

use super::pairwise::leading_paragraphs;
use crate::domain::{Insight, Note};
use crate::llm::Router;
use crate::notes::NotesStore;
use crate::retrieval::retrieve_candidates;
use crate::vector_index::VectorIndex;
use futures_util::future::join_all;

const BRIDGE_CANDIDATES: usize = 2;
const LEADING_PARAGRAPHS: usize = 2;

const INSTRUCTION: &str = "You are an Insight Engine performing a multi-hop constellation synthesis across three \
notes. Using ONLY the provided evidence, return a single JSON object with fields: mode, reframedProblem, \
insightCore, selectedHypothesisName, hypotheses[{name,statement,predictedEvidence,disconfirmers,prior,posterior}], \
eurekaMarkers{suddennessProxy,fluency,conviction,positiveAffect}, bayesianSurprise, \
evidenceRefs[{noteId,childId,quote}], test, risks[].";

fn evidence_bullets(source: &Note, a: &Note, b: &Note) -> String {
    [source, a, b]
        .iter()
        .flat_map(|note| leading_paragraphs(note, LEADING_PARAGRAPHS).into_iter().map(|p| format!("[{}] {p}", note.id)))
        .collect::<Vec<_>>()
        .join("\n")
}

async fn generate_constellation(router: &Router, evidence: &str) -> Option<Insight> {
    let prompt = format!("{INSTRUCTION}\nEVIDENCE:\n{evidence}");
    router.route_structured::<Insight>("constellation", &prompt).await.ok()
}

/// Given the current top pairwise insight (whose partner note is `note_a`),
/// retrieves up to [`BRIDGE_CANDIDATES`] bridge notes excluding `source` and
/// `note_a`, generates a constellation insight against each, and — if the
/// highest-conviction survivor beats `top_insight`'s conviction — prepends
/// it to `insights`, truncating the result to 3.
pub async fn extend_with_constellation(
    router: &Router,
    store: &NotesStore,
    index: &VectorIndex,
    source: &Note,
    note_a: &Note,
    mut insights: Vec<Insight>,
) -> crate::Result<Vec<Insight>> {
    let Some(top_insight) = insights.first().cloned() else {
        return Ok(insights);
    };

    let bridge_ids = match retrieve_candidates(router, store, index, note_a, BRIDGE_CANDIDATES + 1).await {
        Ok(ids) => ids,
        Err(_) => return Ok(insights),
    };

    let all_notes = store.list_notes()?;
    let bridges: Vec<Note> = bridge_ids
        .into_iter()
        .filter(|id| *id != source.id && *id != note_a.id)
        .filter_map(|id| all_notes.iter().find(|n| n.id == id).cloned())
        .take(BRIDGE_CANDIDATES)
        .collect();

    if bridges.is_empty() {
        return Ok(insights);
    }

    let futures = bridges.iter().map(|bridge| {
        let evidence = evidence_bullets(source, note_a, bridge);
        let bridge_id = bridge.id;
        async move { (bridge_id, generate_constellation(router, &evidence).await) }
    });

    let results = join_all(futures).await;

    let best = results
        .into_iter()
        .filter_map(|(bridge_id, result)| {
            let mut insight = result?;
            if insight.mode == "none" {
                return None;
            }
            insight.old_note_id = Some(bridge_id);
            insight.constellation_note_ids = Some([source.id, note_a.id, bridge_id]);
            Some(insight)
        })
        .max_by(|a, b| {
            a.eureka_markers.conviction.partial_cmp(&b.eureka_markers.conviction).unwrap_or(std::cmp::Ordering::Equal)
        });

    if let Some(candidate) = best {
        if candidate.eureka_markers.conviction > top_insight.eureka_markers.conviction {
            insights.insert(0, candidate);
            insights.truncate(3);
        }
    }

    Ok(insights)
}
