//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats.

use crate::domain::{Note, PipelineResult};
use crate::io::unicode::truncate_graphemes;
use serde::Serialize;
use std::fmt::Write;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
    /// Newline-delimited JSON (NDJSON) for streaming.
    Ndjson,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "ndjson" | "jsonl" | "stream" => Self::Ndjson,
            _ => Self::Text,
        }
    }
}

/// Status summary for the `status` command.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    /// Schema version currently applied, or `None` if uninitialized.
    pub schema_version: Option<u32>,
    /// Total notes stored.
    pub note_count: usize,
    /// Vectors currently held in the index.
    pub index_size: usize,
    /// Configured dimensionality of the index.
    pub index_dimensions: usize,
}

/// Formats a status response.
#[must_use]
pub fn format_status(report: &StatusReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_status_text(report),
        OutputFormat::Json | OutputFormat::Ndjson => format_json(report),
    }
}

fn format_status_text(report: &StatusReport) -> String {
    let mut output = String::new();
    output.push_str("synapse-engine status\n");
    output.push_str("======================\n\n");
    match report.schema_version {
        Some(v) => {
            let _ = writeln!(output, "  Schema version: v{v}");
        }
        None => output.push_str("  Schema version: uninitialized\n"),
    }
    let _ = writeln!(output, "  Notes:          {}", report.note_count);
    let _ = writeln!(output, "  Index size:     {} / {} dims", report.index_size, report.index_dimensions);
    output
}

/// Formats a note list.
#[must_use]
pub fn format_note_list(notes: &[Note], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_note_list_text(notes),
        OutputFormat::Json | OutputFormat::Ndjson => format_json(&notes),
    }
}

fn format_note_list_text(notes: &[Note]) -> String {
    if notes.is_empty() {
        return "No notes.\n".to_string();
    }
    let mut output = String::new();
    for note in notes {
        let preview = truncate_graphemes(&note.content, 60);
        let _ = writeln!(output, "{}  {:<30}  {preview}", note.id, note.title);
    }
    output
}

/// Formats a pipeline result.
#[must_use]
pub fn format_pipeline_result(result: &PipelineResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_pipeline_result_text(result),
        OutputFormat::Json | OutputFormat::Ndjson => format_json(result),
    }
}

fn format_pipeline_result_text(result: &PipelineResult) -> String {
    if result.insights.is_empty() {
        return "No insights survived the pipeline.\n".to_string();
    }
    let mut output = String::new();
    for (i, insight) in result.insights.iter().enumerate() {
        let _ = writeln!(output, "{}. [{:.3}] {}", i + 1, insight.score, insight.insight_core);
        if !insight.test.is_empty() {
            let _ = writeln!(output, "   test: {}", insight.test);
        }
    }
    output
}

fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Formats an error for output.
///
/// When format is JSON, returns a structured error object.
/// When format is Text, returns the error message string.
#[must_use]
pub fn format_error(error: &crate::Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json | OutputFormat::Ndjson => {
            let json = serde_json::json!({
                "success": false,
                "error": {
                    "code": error.code(),
                    "message": error.to_string(),
                }
            });
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| "{}".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_recognizes_json_and_defaults_to_text() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("ndjson"), OutputFormat::Ndjson);
        assert_eq!(OutputFormat::parse("anything-else"), OutputFormat::Text);
    }

    #[test]
    fn empty_note_list_reports_none() {
        assert_eq!(format_note_list_text(&[]), "No notes.\n");
    }

    #[test]
    fn format_error_json_includes_code() {
        let err = crate::Error::NotFound("note x".to_string());
        let out = format_error(&err, OutputFormat::Json);
        assert!(out.contains("NotFound"));
    }
}
