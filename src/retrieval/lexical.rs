//! Lexical term-frequency ranking over the note corpus.

use crate::domain::Note;
use std::collections::HashMap;
use uuid::Uuid;

/// Lowercases and splits on non-alphanumeric boundaries.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn term_frequencies(text: &str) -> HashMap<String, usize> {
    let mut freq = HashMap::new();
    for term in tokenize(text) {
        *freq.entry(term).or_insert(0) += 1;
    }
    freq
}

/// Scores each note as the sum, over query terms, of that term's frequency
/// in `title + " " + content`, and returns the top `top_n` note ids
/// descending by score.
#[must_use]
pub fn lexical_rank(queries: &[String], notes: &[Note], top_n: usize) -> Vec<Uuid> {
    let query_terms: Vec<String> = {
        let mut terms: Vec<String> = queries.iter().flat_map(|q| tokenize(q)).collect();
        terms.sort();
        terms.dedup();
        terms
    };

    let mut scored: Vec<(Uuid, usize)> = notes
        .iter()
        .map(|note| {
            let freq = term_frequencies(&note.searchable_text());
            let score = query_terms.iter().map(|t| freq.get(t).copied().unwrap_or(0)).sum();
            (note.id, score)
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.truncate(top_n);
    scored.into_iter().map(|(id, _)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(title: &str, content: &str) -> Note {
        Note::new(title.to_string(), content.to_string())
    }

    #[test]
    fn tokenize_lowercases_and_splits_punctuation() {
        assert_eq!(tokenize("Hello, World!"), vec!["hello".to_string(), "world".to_string()]);
    }

    #[test]
    fn ranks_notes_by_query_term_frequency() {
        let notes = vec![note("Rust", "Rust ownership and borrowing"), note("Python", "Python dynamic typing")];
        let ranked = lexical_rank(&["rust ownership".to_string()], &notes, 10);
        assert_eq!(ranked[0], notes[0].id);
    }

    #[test]
    fn top_n_caps_result_length() {
        let notes = (0..5).map(|i| note(&format!("note{i}"), "shared term")).collect::<Vec<_>>();
        let ranked = lexical_rank(&["shared".to_string()], &notes, 2);
        assert_eq!(ranked.len(), 2);
    }
}
