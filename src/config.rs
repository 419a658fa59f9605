//! Environment-driven configuration.
//!
//! Centralizes the environment variables listed in the external interfaces
//! contract (`DATABASE_URL`, `VECTOR_INDEX_PATH`, …) so the rest of the
//! crate never calls `std::env::var` directly.

use std::env;
use std::path::PathBuf;

/// Default data directory name under the user's config directory, used
/// when `SYNAPSE_DATA_DIR` is unset.
pub const DEFAULT_DATA_DIR_NAME: &str = "synapse-engine";

/// Default SQLite database file name.
pub const DEFAULT_DB_NAME: &str = "synapse.db";

/// Default vector index binary file name.
pub const DEFAULT_INDEX_NAME: &str = "vector.index";

/// Default vector id-mapping JSON file name.
pub const DEFAULT_ID_MAP_NAME: &str = "vector.ids.json";

/// Resolved filesystem and provider configuration for one process.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection string / path.
    pub database_url: String,
    /// Path to the flat vector index binary file.
    pub vector_index_path: PathBuf,
    /// Path to the vector id-mapping JSON file.
    pub vector_id_mapping_path: PathBuf,
    /// Base data directory (parent of the two paths above by default).
    pub data_dir: PathBuf,
    /// `true` when `EMBEDDINGS_FAKE=1`: forces deterministic hash embeddings.
    pub embeddings_fake: bool,
    /// Preferred provider name when no task-specific routing applies.
    pub default_provider: Option<String>,
    /// Task names that should skip cheaper providers and go straight to a
    /// heavyweight one.
    pub heavy_tasks: Vec<String>,
    /// SerpAPI (or compatible) web-search key; `None` disables the Verifier.
    pub serpapi_api_key: Option<String>,
    /// Bearer token for the preferred OpenAI-compatible chat/embedding gateway.
    pub gateway_token: Option<String>,
    /// Base URL for the gateway (without a trailing `/v1`).
    pub gateway_url: Option<String>,
}

impl Config {
    /// Reads configuration from the process environment, falling back to
    /// the platform config directory (via `dirs::config_dir`) for any path
    /// not explicitly overridden.
    #[must_use]
    pub fn from_env() -> Self {
        let data_dir = env::var("SYNAPSE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_dir());

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| {
            data_dir
                .join(DEFAULT_DB_NAME)
                .to_string_lossy()
                .into_owned()
        });

        let vector_index_path = env::var("VECTOR_INDEX_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join(DEFAULT_INDEX_NAME));

        let vector_id_mapping_path = env::var("VECTOR_ID_MAPPING_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join(DEFAULT_ID_MAP_NAME));

        let embeddings_fake = env::var("EMBEDDINGS_FAKE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let heavy_tasks = env::var("LLM_HEAVY_TASKS")
            .unwrap_or_else(|_| "generateInsight,runSelfEvolution".to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            database_url,
            vector_index_path,
            vector_id_mapping_path,
            data_dir,
            embeddings_fake,
            default_provider: env::var("LLM_DEFAULT_PROVIDER").ok(),
            heavy_tasks,
            serpapi_api_key: env::var("SERPAPI_API_KEY").ok(),
            gateway_token: env::var("AI_GATEWAY_TOKEN").ok(),
            gateway_url: env::var("AI_GATEWAY_URL").ok().map(|u| {
                let trimmed = u.trim_end_matches('/');
                trimmed.strip_suffix("/v1").unwrap_or(trimmed).to_string()
            }),
        }
    }

    /// Returns the per-task model override, checking both the verbatim
    /// `LLM_MODEL_<task>` key and a normalized-uppercase variant.
    #[must_use]
    pub fn model_override_for_task(task: &str) -> Option<String> {
        if let Ok(v) = env::var(format!("LLM_MODEL_{task}")) {
            return Some(v);
        }
        let normalized = normalize_env_key(task);
        env::var(format!("LLM_MODEL_{normalized}")).ok()
    }

    /// An API key for the given provider, e.g. `provider = "google"` reads
    /// `GOOGLE_API_KEY`.
    #[must_use]
    pub fn provider_api_key(provider: &str) -> Option<String> {
        env::var(format!("{}_API_KEY", provider.to_uppercase())).ok()
    }
}

fn default_data_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(DEFAULT_DATA_DIR_NAME)
}

/// Normalizes a task name into the `LLM_MODEL_<TASK>` uppercase form by
/// replacing every run of non-alphanumeric characters with `_`.
fn normalize_env_key(task_name: &str) -> String {
    let mut out = String::with_capacity(task_name.len());
    let mut last_was_sep = false;
    for ch in task_name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_uppercase());
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    out
}
