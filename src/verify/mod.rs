//! Verifier: corroborates candidate insight/hypothesis text against live
//! web search results. Disabled (returns nothing per candidate) whenever
//! the web-search key is absent.

use crate::domain::Verdict;
use crate::web_search::WebSearch;

/// One candidate text to verify, tagged with the hypothesis/insight name
/// it came from for reporting.
#[derive(Debug, Clone)]
pub struct VerificationCandidate {
    /// Display label (e.g. the insight core or hypothesis name).
    pub label: String,
    /// The exact text to search for corroboration of.
    pub text: String,
}

/// One candidate's verification outcome.
#[derive(Debug, Clone)]
pub struct VerificationResult {
    /// The candidate this result is for.
    pub candidate: VerificationCandidate,
    /// The assigned verdict.
    pub verdict: Verdict,
    /// Free-text summary, e.g. `"score=2"`.
    pub notes: String,
    /// Up to `max_sites` supporting citations.
    pub citations: Vec<crate::web_search::SearchResult>,
}

/// Verifies each candidate by searching `"{query} \"{candidate.text}\""`
/// and counting case-insensitive snippet matches against `candidate.text`.
/// A candidate with zero search results is `refuted`; with results but no
/// textual match is `uncertain`; with at least one match is `supported`.
pub async fn verify_candidates(
    web_search: &WebSearch,
    query: &str,
    candidates: &[VerificationCandidate],
    max_sites: usize,
) -> crate::Result<Vec<VerificationResult>> {
    let mut results = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let search_query = format!("{query} \"{}\"", candidate.text);
        let search_results = web_search.search(&search_query, max_sites).await?;

        let needle = candidate.text.to_lowercase();
        let score = search_results.iter().filter(|r| r.snippet.to_lowercase().contains(&needle)).count();

        let verdict = if score >= 1 {
            Verdict::Supported
        } else if !search_results.is_empty() {
            Verdict::Uncertain
        } else {
            Verdict::Refuted
        };

        results.push(VerificationResult {
            candidate: candidate.clone(),
            verdict,
            notes: format!("score={score}"),
            citations: search_results.into_iter().take(max_sites).collect(),
        });
    }

    Ok(results)
}
