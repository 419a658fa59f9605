//! Query expansion: deterministic cheap templates plus optional LLM
//! augmentation across eight fixed relation kinds.

use crate::llm::Router;
use std::collections::HashMap;

/// The fixed set of relation kinds a query can probe for.
pub const RELATIONS: [&str; 8] = [
    "Contradiction",
    "PracticalApplication",
    "HistoricalAnalogy",
    "ProblemToSolution",
    "DeepSimilarity",
    "Mechanism",
    "Boundary",
    "TradeOff",
];

/// Deterministic cheap query for each relation kind, in [`RELATIONS`] order.
#[must_use]
pub fn cheap_expand_queries(topic: &str) -> Vec<(&'static str, String)> {
    RELATIONS
        .iter()
        .map(|relation| {
            let query = match *relation {
                "Contradiction" => format!("{topic} limitation counterexample"),
                "PracticalApplication" => format!("{topic} how to apply implementation"),
                "HistoricalAnalogy" => format!("{topic} historical precedent analogous case"),
                "ProblemToSolution" => format!("{topic} bottleneck solution workaround"),
                "DeepSimilarity" => format!("{topic} pattern structure isomorphic"),
                "Mechanism" => format!("{topic} mechanism pathway causes via"),
                "Boundary" => format!("{topic} only if fails when under condition"),
                "TradeOff" => format!("{topic} trade-off at the cost of diminishing returns"),
                _ => unreachable!("RELATIONS is exhaustively matched above"),
            };
            (*relation, query)
        })
        .collect()
}

/// Generates up to `max_queries` search queries for a note's topic: LLM
/// queries (when available) first, then cheap templates, deduplicated
/// while preserving order. Falls back to cheap-only on any LLM error.
pub async fn generate_search_queries(router: &Router, title: &str, content: &str, max_queries: usize) -> Vec<String> {
    let topic = if title.trim().is_empty() { content.chars().take(120).collect() } else { title.trim().to_string() };
    let cheap = cheap_expand_queries(&topic);
    let cheap_values: Vec<String> = cheap.iter().map(|(_, q)| q.clone()).collect();

    let prompt = format!(
        "Return JSON with ANY subset of keys: {}. Each value must be a concise search query derived from:\nTitle: {}\nContent: {}",
        RELATIONS.join(", "),
        title,
        content.chars().take(1000).collect::<String>()
    );

    let llm_values = match router.route_structured::<HashMap<String, String>>("generateSearchQueries", &prompt).await {
        Ok(map) => RELATIONS.iter().filter_map(|r| map.get(*r).cloned()).collect(),
        Err(_) => Vec::new(),
    };

    let mut all: Vec<String> = llm_values;
    all.extend(cheap_values);
    dedup_preserve_order(&mut all);
    all.truncate(max_queries);
    all
}

fn dedup_preserve_order(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn cheap_expand_covers_all_relations_in_order() {
        let expanded = cheap_expand_queries("Quantum computing");
        let relations: Vec<&str> = expanded.iter().map(|(r, _)| *r).collect();
        assert_eq!(relations, RELATIONS);
        assert!(expanded[0].1.contains("limitation counterexample"));
    }

    #[tokio::test]
    async fn falls_back_to_cheap_only_without_provider() {
        let router = Router::new(Config { embeddings_fake: true, gateway_token: None, gateway_url: None, ..Config::from_env() });
        let queries = generate_search_queries(&router, "Topic", "Some content", 8).await;
        assert_eq!(queries.len(), 8);
    }

    #[tokio::test]
    async fn respects_max_queries_cap() {
        let router = Router::new(Config { embeddings_fake: true, gateway_token: None, gateway_url: None, ..Config::from_env() });
        let queries = generate_search_queries(&router, "Topic", "Some content", 3).await;
        assert_eq!(queries.len(), 3);
    }

    #[test]
    fn dedup_preserve_order_keeps_first_occurrence() {
        let mut items = vec!["a".to_string(), "b".to_string(), "a".to_string(), "c".to_string()];
        dedup_preserve_order(&mut items);
        assert_eq!(items, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    }
}
