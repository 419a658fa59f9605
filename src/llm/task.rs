//! Task-to-model routing table.
//!
//! A single source of truth for which model handles which task. Per-task
//! overrides always win (see [`crate::config::Config::model_override_for_task`]).

use crate::config::Config;

/// Default model when a task has neither an env override nor a map entry,
/// and is not flagged heavy or distillation.
pub const DEFAULT_MODEL: &str = "google/gemini-1.5-flash";

/// Model used for a heavy-flagged task with no explicit map entry: skips
/// straight to the preferred heavyweight model rather than falling back
/// to [`DEFAULT_MODEL`].
const HEAVY_FALLBACK_MODEL: &str = "google/gemini-2.5-pro";

/// Model used for a distillation-flagged task with no explicit map entry:
/// the gateway's cheaper distillation-sized model.
const DISTILLATION_FALLBACK_MODEL: &str = "deepseek/deepseek-v3.1-thinking";

const TASK_MODEL_MAP: &[(&str, &str)] = &[
    ("semanticChunker", "groq/meta/llama-3.1-8b"),
    ("evaluateNovelty", "deepseek/deepseek-v3.1-thinking"),
    ("webSearchSummary", "groq/meta/llama-3.1-8b"),
    ("mindMapExtract", "groq/meta/llama-3.1-8b"),
    ("generateDivergentQuestion", "deepseek/deepseek-v3.1-thinking"),
    ("planNextStep", "deepseek/deepseek-v3.1-thinking"),
    ("generateInsight", "google/gemini-2.5-pro"),
    ("runSelfEvolution", "google/gemini-2.5-pro"),
    ("templateSynthesis", "deepseek/deepseek-v3.1-thinking"),
    ("refineSection", "deepseek/deepseek-v3.1-thinking"),
    ("generateSearchQueries", "deepseek/deepseek-v3.1-thinking"),
    ("prescribe", "deepseek/deepseek-v3.1-thinking"),
    ("counterInsight", "deepseek/deepseek-v3.1-thinking"),
];

/// Tasks that should prefer the gateway directly over any SDK-specific
/// path, using a cheaper distillation-sized model.
const DISTILLATION_TASKS: &[&str] = &["templateSynthesis", "refineSection"];

/// Resolves the model name for a task: env override, then the static map,
/// then the heavy/distillation fallback models, then [`DEFAULT_MODEL`].
///
/// Heavy and distillation tasks are classified via [`is_heavy_task`] and
/// [`is_distillation_task`] so a task added to `config.heavy_tasks` at
/// runtime (rather than baked into [`TASK_MODEL_MAP`]) still skips the
/// generic default model.
#[must_use]
pub fn model_for_task(task: &str, config: &Config) -> String {
    if let Some(overridden) = Config::model_override_for_task(task) {
        return overridden;
    }
    if let Some((_, model)) = TASK_MODEL_MAP.iter().find(|(name, _)| *name == task) {
        return (*model).to_string();
    }
    if is_heavy_task(task, config) {
        return HEAVY_FALLBACK_MODEL.to_string();
    }
    if is_distillation_task(task) {
        return DISTILLATION_FALLBACK_MODEL.to_string();
    }
    DEFAULT_MODEL.to_string()
}

/// Whether `task` is flagged as heavy, so routing should skip cheaper
/// providers in favor of a preferred heavyweight one.
#[must_use]
pub fn is_heavy_task(task: &str, config: &Config) -> bool {
    config.heavy_tasks.iter().any(|t| t == task)
}

/// Whether `task` is a distillation task that should prefer the gateway
/// directly rather than going through structured-output degradation.
#[must_use]
pub fn is_distillation_task(task: &str) -> bool {
    DISTILLATION_TASKS.contains(&task)
}
