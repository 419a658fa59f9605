//! Note, Chunk, and Embedding — the persisted units the pipeline reads.
//!
//! These are owned by the Notes Store (see [`crate::notes`]) and are
//! immutable from the pipeline's perspective: nothing downstream of
//! retrieval ever mutates a `Note`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user note: an opaque id, a title, and plain-text content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Stable identity.
    pub id: Uuid,
    /// Short title, used as part of the lexical corpus and query topic.
    pub title: String,
    /// Plain-text body. Paragraphs are split on blank-line boundaries
    /// during chunking.
    pub content: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Note {
    /// Creates a new note with fresh timestamps and a random id.
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = current_timestamp_ms();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// `title + " " + content`, the text indexed by lexical ranking.
    #[must_use]
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }

    /// Up to `n` leading non-empty paragraphs (blank-line separated), used
    /// to assemble pairwise/constellation evidence without a chunk lookup.
    #[must_use]
    pub fn leading_paragraphs(&self, n: usize) -> Vec<String> {
        self.content
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .take(n)
            .map(str::to_owned)
            .collect()
    }
}

/// A paragraph-sized segment of a note's content; the unit of embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Assigned by the store on creation.
    pub id: i64,
    /// Owning note.
    pub note_id: Uuid,
    /// Trimmed, non-empty paragraph text.
    pub content: String,
    /// Zero-based position within the note's chunk sequence.
    pub index: usize,
}

/// A chunk's embedding vector under a specific model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    /// Assigned by the store on creation.
    pub id: i64,
    /// The chunk this embedding belongs to (1:1).
    pub chunk_id: i64,
    /// Identifier of the embedding model that produced this vector.
    pub model: String,
    /// Fixed-dimension dense vector.
    pub vector: Vec<f32>,
}

/// Splits note content on one-or-more blank lines, trims each part, and
/// drops empty paragraphs, preserving order.
///
/// `chunk(content) ▷ join("\n\n")` is the identity up to whitespace-trimming
/// of paragraphs.
#[must_use]
pub fn split_paragraphs(content: &str) -> Vec<String> {
    content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Returns the current Unix timestamp in milliseconds.
#[allow(clippy::cast_possible_wrap)]
pub fn current_timestamp_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_paragraphs_trims_and_drops_empties() {
        let content = "First para.\n\n\n\n  Second para.  \n\n\n";
        let parts = split_paragraphs(content);
        assert_eq!(parts, vec!["First para.".to_string(), "Second para.".to_string()]);
    }

    #[test]
    fn split_paragraphs_roundtrips_through_join() {
        let content = "alpha\n\nbeta\n\ngamma";
        let parts = split_paragraphs(content);
        assert_eq!(parts.join("\n\n"), content);
    }

    #[test]
    fn split_paragraphs_empty_content_yields_empty_vec() {
        assert!(split_paragraphs("").is_empty());
        assert!(split_paragraphs("\n\n\n").is_empty());
    }

    #[test]
    fn note_searchable_text_concatenates_title_and_content() {
        let note = Note::new("Technology", "AI transforms the world.");
        assert_eq!(note.searchable_text(), "Technology AI transforms the world.");
    }

    #[test]
    fn leading_paragraphs_caps_at_n() {
        let note = Note::new("T", "a\n\nb\n\nc\n\nd");
        assert_eq!(note.leading_paragraphs(2), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(note.leading_paragraphs(10).len(), 4);
    }
}
