//! Adversarial counter-check: asks the LLM Router to try to undermine an
//! insight, fails open (zero penalty) whenever it cannot.

use crate::domain::Insight;
use crate::llm::Router;
use schemars::JsonSchema;
use serde::Deserialize;

/// Raw counter-check result from the `counterInsight` task.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CounterCheck {
    /// Evidence the critic found against the insight.
    #[serde(default)]
    pub counter_evidence: Vec<String>,
    /// The critic's summary of the insight's weakness.
    #[serde(default)]
    pub weakness: String,
    /// Severity of the critique in `[0, 1]`.
    pub severity: f64,
}

/// Runs the counter-check for one insight and returns the severity, or
/// `None` if the router errored or returned malformed data (fail-open).
pub async fn counter_check(router: &Router, insight: &Insight) -> Option<CounterCheck> {
    let evidence: String =
        insight.evidence_refs.iter().map(|e| format!("- {}", e.quote)).collect::<Vec<_>>().join("\n");
    let prompt = format!(
        "Critique this insight as harshly as a skeptical reviewer would.\nCore claim: {}\nEvidence:\n{}\nReturn counterEvidence[], weakness, and severity in [0,1].",
        insight.insight_core, evidence
    );

    router.route_structured::<CounterCheck>("counterInsight", &prompt).await.ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use uuid::Uuid;

    fn fake_router() -> Router {
        Router::new(Config { embeddings_fake: true, gateway_token: None, gateway_url: None, ..Config::from_env() })
    }

    fn sample_insight() -> Insight {
        Insight {
            id: Uuid::new_v4(),
            mode: "fusion".to_string(),
            reframed_problem: String::new(),
            insight_core: "Claim".to_string(),
            selected_hypothesis_name: String::new(),
            hypotheses: vec![],
            eureka_markers: crate::domain::EurekaMarkers::default(),
            bayesian_surprise: 0.0,
            evidence_refs: vec![],
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

    #[tokio::test]
    async fn fails_open_without_provider() {
        let router = fake_router();
        let insight = sample_insight();
        assert!(counter_check(&router, &insight).await.is_none());
    }
}
