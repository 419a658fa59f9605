//! Self-Evolution: refines a final insight draft into three focus-tagged
//! variants, scores them, and merges the top two.

use crate::llm::Router;
use futures_util::future::join_all;
use schemars::JsonSchema;
use serde::Deserialize;

const FOCUSES: [&str; 3] = [
    "highlighting technical depth and specific evidence, creating a rigorous, academic tone",
    "emphasizing broad connections and analogies to other fields, creating a creative, lateral-thinking tone",
    "focusing on practical implications and actionable outcomes, creating a pragmatic, business-oriented tone",
];

const MIN_VARIANT_LEN: usize = 20;

#[derive(Debug, Deserialize, JsonSchema)]
struct Evaluation {
    variant: usize,
    score: f64,
    #[serde(default)]
    #[allow(dead_code)]
    feedback: String,
}

async fn generate_variant(router: &Router, draft: &str, focus: &str) -> Option<String> {
    let prompt = format!(
        "You are an expert researcher. Refine the following insight draft with a specific focus.\n\
         Focus: {focus}.\n\nDraft:\n'''\n{draft}\n'''\nReturn ONLY the refined draft text."
    );
    let messages = vec![crate::llm::ChatMessage::user(prompt)];
    let options = crate::llm::ChatOptions { temperature: Some(0.7) };
    router.route("runSelfEvolution", &messages, &options).await.ok().map(|t| t.trim().to_string())
}

async fn evaluate_variants(router: &Router, variants: &[String]) -> Vec<Evaluation> {
    let block = variants
        .iter()
        .enumerate()
        .map(|(i, v)| format!("Insight Variant #{}:\n\"\"\"\n{v}\n\"\"\"", i + 1))
        .collect::<Vec<_>>()
        .join("\n\n");
    let prompt = format!(
        "You are an evaluator. Score each variant from 1 to 10 on overall quality (convincing, well-supported, \
         novel, clear). Provide brief feedback.\n\n{block}\n\nRespond with ONLY a JSON list of objects like \
         {{\"variant\": 1, \"score\": 8, \"feedback\": \"...\"}}."
    );

    match router.route_structured::<Vec<Evaluation>>("refineSection", &prompt).await {
        Ok(evaluations) if !evaluations.is_empty() => evaluations,
        _ => (1..=variants.len()).map(|i| Evaluation { variant: i, score: 0.0, feedback: String::new() }).collect(),
    }
}

async fn merge_variants(router: &Router, first: &str, second: &str) -> Option<String> {
    let prompt = format!(
        "You are a master synthesizer. Merge the best aspects of the following insight drafts into a single, \
         superior insight.\n\nDraft 1:\n'''\n{first}\n'''\n\nDraft 2:\n'''\n{second}\n'''\n\nGuidelines:\n\
         - Preserve the most important evidence, arguments, and novel ideas from each draft.\n\
         - Ensure the merged insight is coherent, well-structured, and not repetitive.\n\
         - Create a concise, clear narrative that includes the key points from both drafts.\n\
         Return ONLY the merged insight text."
    );
    let messages = vec![crate::llm::ChatMessage::user(prompt)];
    let options = crate::llm::ChatOptions { temperature: Some(0.4) };
    router.route("runSelfEvolution", &messages, &options).await.ok().map(|t| t.trim().to_string())
}

/// Runs the full self-evolution cycle on `final_draft`, returning the
/// refined text. Falls back to `final_draft` unchanged whenever fewer than
/// two usable variants survive.
pub async fn run_self_evolution(router: &Router, final_draft: &str) -> String {
    let futures = FOCUSES.iter().map(|focus| generate_variant(router, final_draft, focus));
    let mut variants: Vec<String> = join_all(futures).await.into_iter().flatten().collect();
    variants.push(final_draft.to_string());

    let mut deduped = Vec::new();
    for v in variants {
        if v.len() > MIN_VARIANT_LEN && !deduped.contains(&v) {
            deduped.push(v);
        }
    }

    if deduped.len() < 2 {
        return final_draft.to_string();
    }

    let mut evaluations = evaluate_variants(router, &deduped).await;
    evaluations.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let top: Vec<&String> =
        evaluations.iter().take(2).filter_map(|e| (e.variant >= 1 && e.variant <= deduped.len()).then(|| &deduped[e.variant - 1])).collect();

    match top.as_slice() {
        [] => final_draft.to_string(),
        [only] => (*only).clone(),
        [first, second, ..] => merge_variants(router, first, second).await.unwrap_or_else(|| (*first).clone()),
    }
}
