use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;
use uuid::Uuid;

/// Terminal jobs are kept around for polling this long before the GC
/// sweep drops them.
const JOB_RETENTION: Duration = Duration::from_secs(60 * 60);

/// Work function handed to [`JobQueueService::add_job`]. Receives a
/// progress handle; the returned value becomes the job result.
pub type JobProcessor =
    Box<dyn FnOnce(ProgressHandle) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct JobProgress {
    pub current: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct JobFailure {
    pub message: String,
    pub trace: String,
}

/// Pollable view of a job. The processor itself never leaves the
/// service.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct JobSnapshot {
    pub id: String,
    pub job_type: String,
    pub payload: Value,
    pub status: JobStatus,
    pub progress: JobProgress,
    pub result: Option<Value>,
    pub error: Option<JobFailure>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct QueueStats {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub queue_length: usize,
    pub is_processing: bool,
}

struct Job {
    snapshot: JobSnapshot,
    processor: Option<JobProcessor>,
}

/// In-memory FIFO job queue with a single lazy consumer. Jobs run
/// strictly one at a time, in submission order, and survive only as
/// long as the process does.
#[derive(Clone)]
pub struct JobQueueService {
    jobs: Arc<DashMap<String, Job>>,
    fifo: Arc<Mutex<VecDeque<String>>>,
    draining: Arc<AtomicBool>,
}

/// Lets a running processor report progress back onto its own job row.
#[derive(Clone)]
pub struct ProgressHandle {
    jobs: Arc<DashMap<String, Job>>,
    id: String,
}

impl ProgressHandle {
    /// Progress never moves backwards and never exceeds the total.
    pub fn update(&self, current: usize, total: usize) {
        if let Some(mut job) = self.jobs.get_mut(&self.id) {
            let progress = &mut job.snapshot.progress;
            progress.total = total;
            progress.current = progress.current.max(current.min(total));
        }
    }
}

impl Default for JobQueueService {
    fn default() -> Self {
        Self::new()
    }
}

impl JobQueueService {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(DashMap::new()),
            fifo: Arc::new(Mutex::new(VecDeque::new())),
            draining: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Registers a job and wakes the consumer if it is idle. Returns
    /// the id callers poll with.
    pub fn add_job(&self, job_type: &str, payload: Value, processor: JobProcessor) -> String {
        let id = Uuid::new_v4().to_string();
        let job = Job {
            snapshot: JobSnapshot {
                id: id.clone(),
                job_type: job_type.to_string(),
                payload,
                status: JobStatus::Pending,
                progress: JobProgress::default(),
                result: None,
                error: None,
                created_at: Utc::now(),
                started_at: None,
                completed_at: None,
            },
            processor: Some(processor),
        };
        self.jobs.insert(id.clone(), job);
        self.fifo
            .lock()
            .expect("job queue mutex poisoned")
            .push_back(id.clone());
        tracing::debug!("queued {} job {}", job_type, id);
        self.spawn_drain_if_idle();
        id
    }

    pub fn get_job(&self, id: &str) -> Option<JobSnapshot> {
        self.jobs.get(id).map(|job| job.snapshot.clone())
    }

    pub fn stats(&self) -> QueueStats {
        let mut stats = QueueStats {
            total: 0,
            pending: 0,
            processing: 0,
            completed: 0,
            failed: 0,
            queue_length: self.fifo.lock().expect("job queue mutex poisoned").len(),
            is_processing: self.draining.load(Ordering::SeqCst),
        };
        for job in self.jobs.iter() {
            stats.total += 1;
            match job.snapshot.status {
                JobStatus::Pending => stats.pending += 1,
                JobStatus::Processing => stats.processing += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }

    /// Drops terminal jobs whose completion is older than the
    /// retention window. Driven by a periodic task in `main`.
    pub fn cleanup_old_jobs(&self) -> usize {
        self.cleanup_jobs_older_than(JOB_RETENTION)
    }

    pub fn cleanup_jobs_older_than(&self, retention: Duration) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(retention).unwrap_or_else(|_| chrono::Duration::zero());
        let stale: Vec<String> = self
            .jobs
            .iter()
            .filter(|job| {
                job.snapshot.status.is_terminal()
                    && job
                        .snapshot
                        .completed_at
                        .is_some_and(|done| done < cutoff)
            })
            .map(|job| job.snapshot.id.clone())
            .collect();
        for id in &stale {
            self.jobs.remove(id);
        }
        if !stale.is_empty() {
            tracing::info!("cleaned up {} finished jobs", stale.len());
        }
        stale.len()
    }

    fn spawn_drain_if_idle(&self) {
        if self
            .draining
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let service = self.clone();
            tokio::spawn(async move { service.drain().await });
        }
    }

    async fn drain(&self) {
        loop {
            let next = self
                .fifo
                .lock()
                .expect("job queue mutex poisoned")
                .pop_front();
            let Some(id) = next else {
                self.draining.store(false, Ordering::SeqCst);
                // A producer may have pushed between the pop and the
                // store; reclaim the consumer role if so.
                let refill = !self.fifo.lock().expect("job queue mutex poisoned").is_empty();
                if refill
                    && self
                        .draining
                        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                        .is_ok()
                {
                    continue;
                }
                return;
            };
            self.run_job(&id).await;
        }
    }

    async fn run_job(&self, id: &str) {
        let processor = match self.jobs.get_mut(id) {
            Some(mut job) => {
                job.snapshot.status = JobStatus::Processing;
                job.snapshot.started_at = Some(Utc::now());
                job.processor.take()
            }
            None => None,
        };
        let Some(processor) = processor else {
            tracing::warn!("job {} disappeared before it could run", id);
            return;
        };

        let handle = ProgressHandle {
            jobs: self.jobs.clone(),
            id: id.to_string(),
        };
        let outcome = processor(handle).await;

        if let Some(mut job) = self.jobs.get_mut(id) {
            let snapshot = &mut job.snapshot;
            snapshot.completed_at = Some(Utc::now());
            match outcome {
                Ok(result) => {
                    snapshot.status = JobStatus::Completed;
                    snapshot.progress.current = snapshot.progress.total;
                    snapshot.result = Some(result);
                }
                Err(err) => {
                    snapshot.status = JobStatus::Failed;
                    snapshot.error = Some(JobFailure {
                        message: err.to_string(),
                        trace: format!("{:?}", err),
                    });
                    tracing::error!("job {} failed: {}", id, err);
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn backdate_completion(&self, id: &str, completed_at: DateTime<Utc>) {
        if let Some(mut job) = self.jobs.get_mut(id) {
            job.snapshot.completed_at = Some(completed_at);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use serde_json::json;

    use super::{JobQueueService, JobStatus};

    async fn wait_for_terminal(queue: &JobQueueService, id: &str) -> JobStatus {
        for _ in 0..200 {
            if let Some(snapshot) = queue.get_job(id)
                && snapshot.status.is_terminal()
            {
                return snapshot.status;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("job {} never reached a terminal status", id);
    }

    #[tokio::test]
    async fn jobs_run_in_submission_order() {
        let queue = JobQueueService::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut ids = Vec::new();
        for n in 0..5 {
            let order = order.clone();
            ids.push(queue.add_job(
                "test",
                json!({ "n": n }),
                Box::new(move |_progress| {
                    Box::pin(async move {
                        order.lock().unwrap().push(n);
                        Ok(json!(n))
                    })
                }),
            ));
        }

        for id in &ids {
            assert_eq!(wait_for_terminal(&queue, id).await, JobStatus::Completed);
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_forced_to_total_on_completion() {
        let queue = JobQueueService::new();
        let id = queue.add_job(
            "test",
            json!({}),
            Box::new(|progress| {
                Box::pin(async move {
                    progress.update(3, 10);
                    // A stale lower report must not move progress back.
                    progress.update(1, 10);
                    Ok(json!("done"))
                })
            }),
        );

        assert_eq!(wait_for_terminal(&queue, &id).await, JobStatus::Completed);
        let snapshot = queue.get_job(&id).unwrap();
        assert_eq!(snapshot.progress.total, 10);
        assert_eq!(snapshot.progress.current, 10);
        assert_eq!(snapshot.result, Some(json!("done")));
    }

    #[tokio::test]
    async fn failed_job_records_error_and_queue_continues() {
        let queue = JobQueueService::new();
        let failing = queue.add_job(
            "test",
            json!({}),
            Box::new(|_progress| Box::pin(async { Err(anyhow::anyhow!("boom")) })),
        );
        let after = queue.add_job(
            "test",
            json!({}),
            Box::new(|_progress| Box::pin(async { Ok(serde_json::json!("ok")) })),
        );

        assert_eq!(wait_for_terminal(&queue, &failing).await, JobStatus::Failed);
        assert_eq!(wait_for_terminal(&queue, &after).await, JobStatus::Completed);

        let snapshot = queue.get_job(&failing).unwrap();
        let error = snapshot.error.unwrap();
        assert_eq!(error.message, "boom");
        assert!(error.trace.contains("boom"));
    }

    #[tokio::test]
    async fn cleanup_drops_only_old_terminal_jobs() {
        let queue = JobQueueService::new();
        let old = queue.add_job(
            "test",
            json!({}),
            Box::new(|_progress| Box::pin(async { Ok(serde_json::json!(1)) })),
        );
        let fresh = queue.add_job(
            "test",
            json!({}),
            Box::new(|_progress| Box::pin(async { Ok(serde_json::json!(2)) })),
        );
        wait_for_terminal(&queue, &old).await;
        wait_for_terminal(&queue, &fresh).await;

        queue.backdate_completion(&old, chrono::Utc::now() - chrono::Duration::hours(2));
        let removed = queue.cleanup_old_jobs();

        assert_eq!(removed, 1);
        assert!(queue.get_job(&old).is_none());
        assert!(queue.get_job(&fresh).is_some());
    }

    #[tokio::test]
    async fn stats_count_by_status() {
        let queue = JobQueueService::new();
        let ok = queue.add_job(
            "test",
            json!({}),
            Box::new(|_progress| Box::pin(async { Ok(serde_json::json!(1)) })),
        );
        let bad = queue.add_job(
            "test",
            json!({}),
            Box::new(|_progress| Box::pin(async { Err(anyhow::anyhow!("nope")) })),
        );
        wait_for_terminal(&queue, &ok).await;
        wait_for_terminal(&queue, &bad).await;

        let stats = queue.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.pending, 0);
    }
}
