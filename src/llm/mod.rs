//! LLM dispatch: task routing, structured output, and usage accounting.
//!
//! This is the crate's only boundary to external LLM/embedding providers.
//! Every call is tagged with a task name (`"generateInsight"`,
//! `"counterInsight"`, …) that resolves to a model via [`task::model_for_task`].

pub mod provider;
pub mod router;
pub mod task;
pub mod usage;

pub use provider::{ChatMessage, ChatOptions, GatewayProvider, Provider, StreamEvent};
pub use router::Router;
pub use task::{is_distillation_task, is_heavy_task, model_for_task};
pub use usage::{ModelTotals, UsageCounter, UsageSnapshot};
