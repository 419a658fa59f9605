//! Crate-wide error handling for synapse-engine.
//!
//! Every fallible operation in the crate returns [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. [`Error`] composes domain-specific
//! sub-enums (storage) via `#[from]`, mirroring the error kinds catalogued
//! for the pipeline's job-failure reporting contract.

use thiserror::Error as ThisError;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
    /// A referenced entity (note, chunk, job) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Retrieval produced no candidate notes.
    #[error("no candidate notes found for retrieval")]
    NoCandidates,

    /// Every pairwise synthesis call returned null or `mode == \"none\"`.
    #[error("no insights survived synthesis")]
    NoInsights,

    /// An external provider (LLM or web search) timed out.
    #[error("provider timeout calling {provider} for task {task}")]
    ProviderTimeout {
        /// Provider name (e.g. "gateway", "google-api").
        provider: String,
        /// Task name that triggered the call.
        task: String,
    },

    /// An external provider returned an error response.
    #[error("provider error calling {provider} for task {task}: {message}")]
    ProviderError {
        /// Provider name.
        provider: String,
        /// Task name that triggered the call.
        task: String,
        /// Human-readable detail from the provider.
        message: String,
    },

    /// A structured or JSON output could not be parsed after the cleanup retry.
    #[error("bad output from task {task}: {message}")]
    BadOutput {
        /// Task name whose output failed to parse.
        task: String,
        /// Parse failure detail.
        message: String,
    },

    /// A vector was rejected because its dimensionality did not match the index.
    #[error("dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension configured on the index.
        expected: usize,
        /// Dimension of the rejected vector.
        actual: usize,
    },

    /// The caller's cancellation signal was observed; not a failure.
    #[error("operation cancelled")]
    Cancelled,

    /// An unexpected panic was caught and wrapped at a task boundary.
    #[error("unexpected panic [{code}]: {message}")]
    UnexpectedPanic {
        /// A type-name-like identifier for the panic payload.
        code: String,
        /// Panic message, stringified.
        message: String,
    },

    /// Storage-layer failure (SQLite, I/O during persistence).
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// JSON (de)serialization failure outside of the LLM routing path.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Plain I/O failure outside of the storage layer.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration supplied via environment or CLI flags.
    #[error("invalid configuration: {message}")]
    Config {
        /// Detail of what was invalid.
        message: String,
    },
}

impl Error {
    /// Maps this error onto the stable `code` string used in job failure
    /// reports and HTTP error bodies.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NotFound",
            Self::NoCandidates => "NoCandidates",
            Self::NoInsights => "NoInsights",
            Self::ProviderTimeout { .. } => "ProviderTimeout",
            Self::ProviderError { .. } => "ProviderError",
            Self::BadOutput { .. } => "BadOutput",
            Self::DimensionMismatch { .. } => "DimensionMismatch",
            Self::Cancelled => "Cancelled",
            Self::UnexpectedPanic { .. } => "UnexpectedPanic",
            Self::Storage(_) => "StorageError",
            Self::Json(_) => "BadOutput",
            Self::Io(_) => "StorageError",
            Self::Config { .. } => "Config",
        }
    }

    /// True for errors that a non-critical path (counter-check, verifier,
    /// self-evolution) should fail open on rather than escalate.
    #[must_use]
    pub const fn is_fail_open(&self) -> bool {
        matches!(
            self,
            Self::ProviderTimeout { .. } | Self::ProviderError { .. } | Self::BadOutput { .. }
        )
    }

    /// Builds an [`Error::NotFound`] for the given entity kind and id.
    #[must_use]
    pub fn not_found(kind: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{kind} {id}"))
    }
}

/// Storage-layer errors (notes/chunks/embeddings persistence).
#[derive(Debug, ThisError)]
pub enum StorageError {
    /// Underlying SQLite failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Underlying filesystem I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The store has not been initialized (schema not applied).
    #[error("store is not initialized")]
    NotInitialized,

    /// A row was missing a column the schema guarantees; indicates drift.
    #[error("corrupt row in {table}: {message}")]
    CorruptRow {
        /// Table the corrupt row came from.
        table: String,
        /// Detail of what was wrong.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_maps_every_variant() {
        assert_eq!(Error::NotFound("note x".into()).code(), "NotFound");
        assert_eq!(Error::NoCandidates.code(), "NoCandidates");
        assert_eq!(Error::NoInsights.code(), "NoInsights");
        assert_eq!(Error::Cancelled.code(), "Cancelled");
        assert_eq!(
            Error::DimensionMismatch {
                expected: 768,
                actual: 384
            }
            .code(),
            "DimensionMismatch"
        );
    }

    #[test]
    fn provider_errors_fail_open() {
        let e = Error::ProviderError {
            provider: "gateway".into(),
            task: "counterInsight".into(),
            message: "503".into(),
        };
        assert!(e.is_fail_open());
        assert!(!Error::NoCandidates.is_fail_open());
    }

    #[test]
    fn not_found_helper_formats_kind_and_id() {
        let e = Error::not_found("note", "abc-123");
        match e {
            Error::NotFound(msg) => assert_eq!(msg, "note abc-123"),
            _ => unreachable!("expected NotFound"),
        }
    }

    #[test]
    fn storage_error_from_sqlite() {
        let sqlite_err = rusqlite::Error::QueryReturnedNoRows;
        let err: StorageError = sqlite_err.into();
        assert!(matches!(err, StorageError::Sqlite(_)));
    }
}
