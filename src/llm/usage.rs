//! Process-wide LLM usage accounting.
//!
//! Mirrors the original backend's `metrics/usage.py`: one lock-guarded
//! aggregate, incremented per call and readable as an immutable snapshot.

use std::collections::HashMap;
use std::sync::Mutex;

/// Running totals for one (provider, model) pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelTotals {
    /// Number of calls recorded.
    pub calls: u64,
    /// Summed prompt/input tokens, when the provider reports them.
    pub input_tokens: u64,
    /// Summed completion/output tokens, when the provider reports them.
    pub output_tokens: u64,
    /// Summed wall-clock seconds spent in the call.
    pub time_sec: f64,
}

/// A point-in-time read of accumulated usage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageSnapshot {
    /// Total calls across every provider and model.
    pub calls: u64,
    /// Per-`(provider, model)` totals.
    pub by_model: HashMap<(String, String), ModelTotals>,
}

#[derive(Default)]
struct State {
    calls: u64,
    by_model: HashMap<(String, String), ModelTotals>,
}

/// Thread-safe accumulator for LLM call usage.
pub struct UsageCounter {
    state: Mutex<State>,
}

impl Default for UsageCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageCounter {
    /// Creates an empty counter.
    #[must_use]
    pub fn new() -> Self {
        Self { state: Mutex::new(State::default()) }
    }

    /// Records one completed call. Token/time fields may be `None` when the
    /// provider does not report them.
    pub fn record(
        &self,
        provider: &str,
        model: &str,
        input_tokens: Option<u64>,
        output_tokens: Option<u64>,
        time_sec: Option<f64>,
    ) {
        let mut guard = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.calls += 1;
        let entry = guard.by_model.entry((provider.to_string(), model.to_string())).or_default();
        entry.calls += 1;
        if let Some(t) = input_tokens {
            entry.input_tokens += t;
        }
        if let Some(t) = output_tokens {
            entry.output_tokens += t;
        }
        if let Some(t) = time_sec {
            entry.time_sec += t;
        }
    }

    /// Returns a snapshot of the current totals.
    #[must_use]
    pub fn snapshot(&self) -> UsageSnapshot {
        let guard = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        UsageSnapshot { calls: guard.calls, by_model: guard.by_model.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_accumulate_per_model() {
        let counter = UsageCounter::new();
        counter.record("gateway", "deepseek/deepseek-v3.1", Some(100), Some(20), Some(0.5));
        counter.record("gateway", "deepseek/deepseek-v3.1", Some(50), Some(10), Some(0.25));
        let snap = counter.snapshot();
        assert_eq!(snap.calls, 2);
        let totals = &snap.by_model[&("gateway".to_string(), "deepseek/deepseek-v3.1".to_string())];
        assert_eq!(totals.calls, 2);
        assert_eq!(totals.input_tokens, 150);
        assert_eq!(totals.output_tokens, 30);
        assert!((totals.time_sec - 0.75).abs() < 1e-9);
    }

    #[test]
    fn missing_fields_are_skipped_not_zeroed() {
        let counter = UsageCounter::new();
        counter.record("gateway", "model-a", None, None, None);
        let snap = counter.snapshot();
        let totals = &snap.by_model[&("gateway".to_string(), "model-a".to_string())];
        assert_eq!(totals.input_tokens, 0);
        assert_eq!(totals.calls, 1);
    }
}
