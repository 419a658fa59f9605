//! Insight scoring and the final top-3 selection.

use super::counter::{CounterCheck, counter_check};
use crate::domain::Insight;
use crate::llm::Router;

/// Weight on `eureka_markers.conviction`.
const W_CONVICTION: f64 = 0.40;
/// Weight on `eureka_markers.fluency`.
const W_FLUENCY: f64 = 0.25;
/// Weight on `bayesian_surprise`.
const W_SURPRISE: f64 = 0.15;
/// Weight on `tanh(diversity / 6)`.
const W_DIVERSITY: f64 = 0.10;
/// Scale for the diversity term's `tanh` compression.
const DIVERSITY_SCALE: f64 = 6.0;
/// Maximum penalty a counter-check severity of `1.0` can impose.
const MAX_PENALTY: f64 = 0.25;

/// Computes the penalty term from an optional counter-check result.
/// Fails open (zero penalty) when no counter-check succeeded.
#[must_use]
pub fn penalty_for(counter: Option<&CounterCheck>) -> f64 {
    counter.map_or(0.0, |c| MAX_PENALTY * c.severity.min(1.0))
}

/// The score formula: `0.40*conviction + 0.25*fluency + 0.15*bayesianSurprise
/// + 0.10*tanh(diversity/6) - penalty`.
#[must_use]
pub fn score_insight(insight: &Insight, penalty: f64) -> f64 {
    let diversity_term = (insight.diversity() as f64 / DIVERSITY_SCALE).tanh();
    W_CONVICTION * insight.eureka_markers.conviction
        + W_FLUENCY * insight.eureka_markers.fluency
        + W_SURPRISE * insight.bayesian_surprise
        + W_DIVERSITY * diversity_term
        - penalty
}

/// Runs the counter-check for every candidate, scores each, sorts
/// descending (stable on ties, preserving input order), and returns the
/// top 3 with `score` populated.
pub async fn rank_insights(router: &Router, mut candidates: Vec<Insight>) -> Vec<Insight> {
    for insight in &mut candidates {
        let counter = counter_check(router, insight).await;
        let penalty = penalty_for(counter.as_ref());
        insight.score = score_insight(insight, penalty);
    }

    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    candidates.truncate(3);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::{EurekaMarkers, EvidenceRef};
    use uuid::Uuid;

    fn fake_router() -> Router {
        Router::new(Config { embeddings_fake: true, gateway_token: None, gateway_url: None, ..Config::from_env() })
    }

    fn insight_with(conviction: f64, fluency: f64, surprise: f64, note_ids: &[Uuid]) -> Insight {
        Insight {
            id: Uuid::new_v4(),
            mode: "fusion".to_string(),
            reframed_problem: String::new(),
            insight_core: "Claim".to_string(),
            selected_hypothesis_name: String::new(),
            hypotheses: vec![],
            eureka_markers: EurekaMarkers { conviction, fluency, suddenness_proxy: 0.0, positive_affect: 0.0 },
            bayesian_surprise: surprise,
            evidence_refs: note_ids
                .iter()
                .map(|id| EvidenceRef { note_id: *id, child_id: String::new(), quote: "q".to_string() })
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
    fn penalty_zero_without_counter_check() {
        assert!((penalty_for(None) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn penalty_scales_with_severity() {
        let counter = CounterCheck { counter_evidence: vec![], weakness: String::new(), severity: 0.8 };
        assert!((penalty_for(Some(&counter)) - 0.20).abs() < 1e-9);
    }

    #[test]
    fn severity_above_one_is_clamped() {
        let counter = CounterCheck { counter_evidence: vec![], weakness: String::new(), severity: 2.0 };
        assert!((penalty_for(Some(&counter)) - MAX_PENALTY).abs() < 1e-9);
    }

    #[test]
    fn counter_check_penalty_lowers_rank_by_exact_amount() {
        let ids = vec![Uuid::new_v4()];
        let a = insight_with(0.9, 0.5, 0.5, &ids);
        let b = insight_with(0.9, 0.5, 0.5, &ids);
        let score_a = score_insight(&a, 0.0);
        let score_b = score_insight(&b, 0.20);
        assert!((score_a - score_b - 0.20).abs() < 1e-9);
    }

    #[tokio::test]
    async fn rank_insights_caps_at_three_and_sorts_descending() {
        let router = fake_router();
        let ids = vec![Uuid::new_v4()];
        let candidates = vec![
            insight_with(0.2, 0.2, 0.2, &ids),
            insight_with(0.9, 0.9, 0.9, &ids),
            insight_with(0.5, 0.5, 0.5, &ids),
            insight_with(0.1, 0.1, 0.1, &ids),
        ];
        let ranked = rank_insights(&router, candidates).await;
        assert_eq!(ranked.len(), 3);
        assert!(ranked[0].score >= ranked[1].score);
        assert!(ranked[1].score >= ranked[2].score);
    }
}
