//! Job state machine and progress-reporting shapes.
//!
//! A [`Job`] is pure data: identity, status, progress, metrics, and
//! results. The cancellation signal and the store's mutex live in
//! [`crate::jobs::JobManager`], not here, so that `Job` stays cheaply
//! cloneable and comparable for the SSE equality-diff loop.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::insight::{Insight, PipelineResult};

/// Default job time-to-live: 24 hours, in milliseconds.
pub const DEFAULT_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Job lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    /// Created, not yet picked up by a runner.
    Queued,
    /// A runner is actively executing the orchestrator.
    Running,
    /// Terminal: completed with a result.
    Succeeded,
    /// Terminal: completed with an error.
    Failed,
    /// Terminal: cancelled before completion.
    Cancelled,
}

impl JobStatus {
    /// True for any of the three terminal states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

/// Orchestrator phase, in the fixed order the pipeline executes them.
///
/// The numeric order (via [`Phase::order`]) is what "phase index is
/// non-decreasing" means for a single job's progress trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Retrieval runs; candidate notes are selected.
    CandidateSelection,
    /// Pairwise synthesis produces the first insight set.
    InitialSynthesis,
    /// Optional 3-way constellation synthesis.
    MultiHop,
    /// Self-evolution refines the leading insight.
    AgentRefinement,
    /// Verification and final assembly.
    Finalizing,
}

impl Phase {
    /// This phase's position in the fixed pipeline order (0-based).
    #[must_use]
    pub const fn order(self) -> u8 {
        match self {
            Self::CandidateSelection => 0,
            Self::InitialSynthesis => 1,
            Self::MultiHop => 2,
            Self::AgentRefinement => 3,
            Self::Finalizing => 4,
        }
    }
}

/// Current phase and percent-complete anchor, `pct` in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// The phase currently executing (or last completed, for terminal jobs).
    pub phase: Phase,
    /// Percent complete, `0..=100`. Anchors are approximate, not exact.
    pub pct: u8,
}

impl Progress {
    /// The initial progress for a freshly created job.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            phase: Phase::CandidateSelection,
            pct: 0,
        }
    }
}

/// Running counters the orchestrator accumulates over a job's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMetrics {
    /// How many candidate notes retrieval surfaced.
    pub notes_considered: u64,
    /// How many distinct note clusters were touched (constellation hops).
    pub clusters: u64,
    /// Total LLM calls issued by this job.
    pub llm_calls: u64,
    /// Wall-clock milliseconds elapsed since the job started running.
    pub elapsed_ms: u64,
}

impl JobMetrics {
    /// Adds `other`'s fields into `self` in place (used by heartbeat deltas).
    pub fn add_assign(&mut self, other: &Self) {
        self.notes_considered += other.notes_considered;
        self.clusters += other.clusters;
        self.llm_calls += other.llm_calls;
        self.elapsed_ms += other.elapsed_ms;
    }
}

/// The `{code, message}` shape attached to a FAILED job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    /// A stable error code, see [`crate::error::Error::code`].
    pub code: String,
    /// Human-readable detail.
    pub message: String,
}

/// A unit of work tracked by the Job Manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Stable identity.
    pub id: Uuid,
    /// Correlation id for logs/tracing spans, distinct from `id`.
    pub trace_id: Uuid,
    /// Current lifecycle state.
    pub status: JobStatus,
    /// Current phase/percent.
    pub progress: Progress,
    /// Running counters.
    pub metrics: JobMetrics,
    /// In-progress insights, replaced wholesale on each heartbeat that
    /// supplies them.
    pub partial_results: Vec<Insight>,
    /// The final result, present only once `status == SUCCEEDED`.
    pub result: Option<PipelineResult>,
    /// The failure detail, present only once `status == FAILED`.
    pub error: Option<JobError>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds, bumped on every mutation.
    pub updated_at: i64,
    /// Milliseconds after `created_at` at which this job is evictable.
    pub ttl_ms: i64,
}

impl Job {
    /// Mints a new job with two fresh UUIDs, initial progress, and the
    /// default 24h TTL.
    #[must_use]
    pub fn new() -> Self {
        let now = crate::domain::note::current_timestamp_ms();
        Self {
            id: Uuid::new_v4(),
            trace_id: Uuid::new_v4(),
            status: JobStatus::Queued,
            progress: Progress::initial(),
            metrics: JobMetrics::default(),
            partial_results: Vec::new(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
            ttl_ms: DEFAULT_TTL_MS,
        }
    }

    /// True once `created_at + ttl_ms` has passed, relative to `now_ms`.
    #[must_use]
    pub const fn is_expired(&self, now_ms: i64) -> bool {
        now_ms - self.created_at > self.ttl_ms
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_job_starts_queued_at_zero_progress() {
        let job = Job::new();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.progress.phase, Phase::CandidateSelection);
        assert_eq!(job.progress.pct, 0);
        assert_ne!(job.id, job.trace_id);
    }

    #[test]
    fn phase_order_is_strictly_increasing() {
        let phases = [
            Phase::CandidateSelection,
            Phase::InitialSynthesis,
            Phase::MultiHop,
            Phase::AgentRefinement,
            Phase::Finalizing,
        ];
        for pair in phases.windows(2) {
            assert!(pair[0].order() < pair[1].order());
        }
    }

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }

    #[test]
    fn is_expired_respects_ttl() {
        let mut job = Job::new();
        job.created_at = 0;
        job.ttl_ms = 1000;
        assert!(!job.is_expired(999));
        assert!(job.is_expired(1001));
    }

    #[test]
    fn metrics_add_assign_sums_fields() {
        let mut m = JobMetrics {
            notes_considered: 1,
            clusters: 0,
            llm_calls: 2,
            elapsed_ms: 10,
        };
        let delta = JobMetrics {
            notes_considered: 4,
            clusters: 1,
            llm_calls: 0,
            elapsed_ms: 5,
        };
        m.add_assign(&delta);
        assert_eq!(m.notes_considered, 5);
        assert_eq!(m.clusters, 1);
        assert_eq!(m.llm_calls, 2);
        assert_eq!(m.elapsed_ms, 15);
    }
}
