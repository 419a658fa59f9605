//! Job Manager: the in-memory, TTL-bounded job registry the Pipeline
//! Orchestrator reports into and the HTTP Surface reads from.
//!
//! A single store-wide mutex guards the map and individual job records.
//! Operations are short; no work is held under the lock. The cancellation
//! flag lives alongside each job here, outside [`crate::domain::Job`]
//! itself, so `Job` stays cheaply cloneable/comparable for the SSE
//! equality-diff loop.

use crate::domain::note::current_timestamp_ms;
use crate::domain::{Insight, Job, JobError, JobMetrics, JobStatus, Phase, PipelineResult, Progress};
use crate::error::Error;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_stream::Stream;
use uuid::Uuid;

/// Poll interval for [`JobManager::events`]'s SSE loop.
pub const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

struct Entry {
    job: Job,
    cancelled: Arc<AtomicBool>,
}

/// The job registry: `create`/`heartbeat`/`complete`/`fail`/`cancel`, plus
/// an SSE-friendly `events` stream.
#[derive(Default)]
pub struct JobManager {
    jobs: Mutex<HashMap<Uuid, Entry>>,
}

impl JobManager {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { jobs: Mutex::new(HashMap::new()) }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Entry>> {
        self.jobs.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Mints a new job (two fresh UUIDs, initial progress, 24h TTL) and
    /// returns a clone of it plus a handle to observe cancellation.
    #[must_use]
    pub fn create(&self) -> (Job, Arc<AtomicBool>) {
        let job = Job::new();
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut jobs = self.lock();
        jobs.insert(job.id, Entry { job: job.clone(), cancelled: Arc::clone(&cancelled) });
        (job, cancelled)
    }

    /// Fetches a job snapshot, evicting and returning `None` if expired.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<Job> {
        let mut jobs = self.lock();
        let expired = jobs.get(&id).is_some_and(|e| e.job.is_expired(current_timestamp_ms()));
        if expired {
            jobs.remove(&id);
            return None;
        }
        jobs.get(&id).map(|e| e.job.clone())
    }

    /// Marks the job `Running`. No-op past a terminal state.
    pub fn start(&self, id: Uuid) {
        self.mutate(id, |job| {
            if !job.status.is_terminal() {
                job.status = JobStatus::Running;
            }
        });
    }

    /// Replaces progress; optionally replaces partial results and adds
    /// metric deltas; optionally records a free-text log line (not
    /// persisted on [`Job`] itself, since it has no log field — callers
    /// that need the line should use `tracing` directly).
    pub fn heartbeat(
        &self,
        id: Uuid,
        phase: Phase,
        pct: u8,
        partial: Option<Vec<Insight>>,
        metrics_delta: Option<JobMetrics>,
    ) {
        self.mutate(id, |job| {
            if job.status.is_terminal() {
                return;
            }
            job.progress = Progress { phase, pct };
            if let Some(partial) = partial {
                job.partial_results = partial;
            }
            if let Some(delta) = metrics_delta {
                job.metrics.add_assign(&delta);
            }
        });
    }

    /// Terminal success transition. Ignored if already terminal.
    pub fn complete(&self, id: Uuid, result: PipelineResult) {
        self.mutate(id, |job| {
            if job.status.is_terminal() {
                return;
            }
            job.status = JobStatus::Succeeded;
            job.result = Some(result);
        });
    }

    /// Terminal failure transition. Ignored if already terminal.
    pub fn fail(&self, id: Uuid, code: impl Into<String>, message: impl Into<String>) {
        self.mutate(id, |job| {
            if job.status.is_terminal() {
                return;
            }
            job.status = JobStatus::Failed;
            job.error = Some(JobError { code: code.into(), message: message.into() });
        });
    }

    /// Terminal cancellation transition: signals the cancellation flag
    /// cooperatively and marks the job `Cancelled`. Ignored if already
    /// terminal.
    pub fn cancel(&self, id: Uuid) -> crate::Result<()> {
        let mut jobs = self.lock();
        let Some(entry) = jobs.get_mut(&id) else {
            return Err(Error::NotFound(id.to_string()));
        };
        if entry.job.status.is_terminal() {
            return Ok(());
        }
        entry.cancelled.store(true, Ordering::SeqCst);
        entry.job.status = JobStatus::Cancelled;
        entry.job.updated_at = current_timestamp_ms();
        Ok(())
    }

    /// True when the job's cancellation flag has been observed set, or
    /// when the job no longer exists (treated as cancelled, matching the
    /// reference behavior of "missing job polls as cancelled").
    #[must_use]
    pub fn is_cancelled(&self, id: Uuid) -> bool {
        self.lock().get(&id).is_none_or(|e| e.cancelled.load(Ordering::SeqCst))
    }

    /// Removes every job past its TTL. Returns how many were evicted.
    pub fn evict_expired(&self) -> usize {
        let now = current_timestamp_ms();
        let mut jobs = self.lock();
        let before = jobs.len();
        jobs.retain(|_, e| !e.job.is_expired(now));
        before - jobs.len()
    }

    fn mutate(&self, id: Uuid, f: impl FnOnce(&mut Job)) {
        let mut jobs = self.lock();
        if let Some(entry) = jobs.get_mut(&id) {
            f(&mut entry.job);
            entry.job.updated_at = current_timestamp_ms();
        }
    }

    /// An SSE-friendly stream of job snapshots: emits on every observed
    /// change (equality diff), polling every [`EVENT_POLL_INTERVAL`], and
    /// terminates after emitting a terminal status or after the job
    /// disappears (evicted or never existed).
    pub fn events(self: &Arc<Self>, id: Uuid) -> impl Stream<Item = Job> + Send + 'static {
        let manager = Arc::clone(self);
        async_stream::stream! {
            let mut last: Option<Job> = None;
            loop {
                let Some(job) = manager.get(id) else {
                    return;
                };
                let terminal = job.status.is_terminal();
                if last.as_ref() != Some(&job) {
                    last = Some(job.clone());
                    yield job;
                }
                if terminal {
                    return;
                }
                tokio::time::sleep(EVENT_POLL_INTERVAL).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[test]
    fn create_starts_queued_and_not_cancelled() {
        let manager = JobManager::new();
        let (job, cancelled) = manager.create();
        assert_eq!(job.status, JobStatus::Queued);
        assert!(!cancelled.load(Ordering::SeqCst));
    }

    #[test]
    fn get_returns_none_for_unknown_job() {
        let manager = JobManager::new();
        assert!(manager.get(Uuid::new_v4()).is_none());
    }

    #[test]
    fn complete_is_ignored_after_terminal() {
        let manager = JobManager::new();
        let (job, _) = manager.create();
        manager.fail(job.id, "NoCandidates", "no candidates");
        manager.complete(job.id, PipelineResult { version: "v2".to_string(), insights: vec![] });
        let updated = manager.get(job.id).unwrap();
        assert_eq!(updated.status, JobStatus::Failed);
    }

    #[test]
    fn cancel_sets_flag_and_terminal_status() {
        let manager = JobManager::new();
        let (job, cancelled) = manager.create();
        manager.cancel(job.id).unwrap();
        assert!(cancelled.load(Ordering::SeqCst));
        assert!(manager.is_cancelled(job.id));
        assert_eq!(manager.get(job.id).unwrap().status, JobStatus::Cancelled);
    }

    #[test]
    fn cancel_unknown_job_errors_not_found() {
        let manager = JobManager::new();
        let err = manager.cancel(Uuid::new_v4()).unwrap_err();
        assert_eq!(err.code(), "NotFound");
    }

    #[test]
    fn heartbeat_updates_progress_and_accumulates_metrics() {
        let manager = JobManager::new();
        let (job, _) = manager.create();
        manager.heartbeat(
            job.id,
            Phase::InitialSynthesis,
            50,
            None,
            Some(JobMetrics { notes_considered: 3, clusters: 0, llm_calls: 2, elapsed_ms: 10 }),
        );
        manager.heartbeat(
            job.id,
            Phase::MultiHop,
            55,
            None,
            Some(JobMetrics { notes_considered: 1, clusters: 1, llm_calls: 1, elapsed_ms: 5 }),
        );
        let updated = manager.get(job.id).unwrap();
        assert_eq!(updated.progress.phase, Phase::MultiHop);
        assert_eq!(updated.metrics.notes_considered, 4);
        assert_eq!(updated.metrics.llm_calls, 3);
    }

    #[tokio::test]
    async fn events_stream_terminates_after_terminal_status() {
        let manager = Arc::new(JobManager::new());
        let (job, _) = manager.create();
        manager.complete(job.id, PipelineResult { version: "v2".to_string(), insights: vec![] });

        let snapshots: Vec<Job> = manager.events(job.id).collect().await;
        assert!(!snapshots.is_empty());
        assert_eq!(snapshots.last().unwrap().status, JobStatus::Succeeded);
    }

    #[tokio::test]
    async fn events_stream_ends_immediately_for_missing_job() {
        let manager = Arc::new(JobManager::new());
        let snapshots: Vec<Job> = manager.events(Uuid::new_v4()).collect().await;
        assert!(snapshots.is_empty());
    }
}
