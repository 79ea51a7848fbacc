//! In-process implementation of the host-scheduler contract, backed by one
//! tokio interval loop per job. Plays the role a platform job scheduler
//! plays in production: it owns the job store, serializes firings per name,
//! and feeds each run its predecessor's output.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use pulse_core::host::{HostScheduler, JobInfo, JobRequest, JobRunner, JobState, KvMap};
use pulse_core::task::TaskType;

struct JobEntry {
    id: Uuid,
    state: JobState,
    tags: Vec<String>,
    task_type: TaskType,
    interval: Duration,
    output: KvMap,
    run_attempt_count: u32,
    next_fire_ms: i64,
    handle: Option<JoinHandle<()>>,
}

type JobMap = Arc<RwLock<HashMap<String, JobEntry>>>;

/// Tokio-backed host scheduler. Each enqueued job owns a single loop task,
/// so runs for a given name never overlap; REPLACE aborts the old loop and
/// resets the persisted output to the request's input.
pub struct TokioHost {
    jobs: JobMap,
    runner: Arc<dyn JobRunner>,
}

impl TokioHost {
    pub fn new(runner: Arc<dyn JobRunner>) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            runner,
        }
    }

    /// Runs one firing for `name` immediately, outside the interval loop.
    /// Returns false if no such job exists, or if the job was replaced or
    /// cancelled while the run was in flight (the stale output is
    /// discarded). Intended for tests and one-shot CLI triggers.
    pub async fn fire(&self, name: &str) -> bool {
        Self::fire_once(&self.jobs, &self.runner, name, None).await
    }

    /// Aborts every job loop. The job store is left intact.
    pub async fn shutdown(&self) {
        let mut jobs = self.jobs.write().await;
        for entry in jobs.values_mut() {
            if let Some(handle) = entry.handle.take() {
                handle.abort();
            }
        }
    }

    async fn job_loop(jobs: JobMap, runner: Arc<dyn JobRunner>, name: String, job_id: Uuid) {
        loop {
            let interval = {
                let guard = jobs.read().await;
                match guard.get(&name) {
                    Some(entry) if entry.id == job_id => entry.interval,
                    _ => return,
                }
            };
            tokio::time::sleep(interval).await;
            if !Self::fire_once(&jobs, &runner, &name, Some(job_id)).await {
                return;
            }
        }
    }

    /// One firing: snapshot the job's persisted output, invoke the run
    /// callback, persist its result. The entry id observed at snapshot time
    /// is verified at write-back, so a job replaced or cancelled while the
    /// run was in flight never has stale output persisted over its reset
    /// state.
    async fn fire_once(
        jobs: &JobMap,
        runner: &Arc<dyn JobRunner>,
        name: &str,
        expect_id: Option<Uuid>,
    ) -> bool {
        let (job_id, task_type, input) = {
            let mut guard = jobs.write().await;
            let Some(entry) = guard.get_mut(name) else {
                return false;
            };
            if expect_id.is_some_and(|id| entry.id != id) {
                return false;
            }
            entry.state = JobState::Running;
            (entry.id, entry.task_type, entry.output.clone())
        };

        let output = runner.run(name, task_type, input).await;

        let mut guard = jobs.write().await;
        let Some(entry) = guard.get_mut(name) else {
            return false;
        };
        if entry.id != job_id {
            return false;
        }
        entry.output = output;
        entry.run_attempt_count += 1;
        entry.state = JobState::Enqueued;
        entry.next_fire_ms = Utc::now().timestamp_millis() + entry.interval.as_millis() as i64;
        debug!(
            job = name,
            attempts = entry.run_attempt_count,
            "job fired"
        );
        true
    }
}

#[async_trait]
impl HostScheduler for TokioHost {
    async fn enqueue_unique_recurring(&self, request: JobRequest) -> anyhow::Result<()> {
        let id = Uuid::new_v4();
        {
            let mut jobs = self.jobs.write().await;
            if let Some(mut old) = jobs.remove(&request.name) {
                if let Some(handle) = old.handle.take() {
                    handle.abort();
                }
                info!(job = %request.name, "replacing existing job");
            }
            jobs.insert(
                request.name.clone(),
                JobEntry {
                    id,
                    state: JobState::Enqueued,
                    tags: request.tags.clone(),
                    task_type: request.task_type,
                    interval: request.interval,
                    output: request.input.clone(),
                    run_attempt_count: 0,
                    next_fire_ms: Utc::now().timestamp_millis()
                        + request.interval.as_millis() as i64,
                    handle: None,
                },
            );
        }

        let handle = tokio::spawn(Self::job_loop(
            self.jobs.clone(),
            self.runner.clone(),
            request.name.clone(),
            id,
        ));
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&request.name) {
            Some(entry) if entry.id == id => entry.handle = Some(handle),
            // Replaced again before we could store the handle.
            _ => handle.abort(),
        }
        Ok(())
    }

    async fn cancel_by_name(&self, name: &str) -> anyhow::Result<()> {
        let mut jobs = self.jobs.write().await;
        if let Some(mut entry) = jobs.remove(name) {
            if let Some(handle) = entry.handle.take() {
                handle.abort();
            }
            info!(job = name, "job cancelled");
        }
        Ok(())
    }

    async fn cancel_by_tag(&self, tag: &str) -> anyhow::Result<()> {
        let mut jobs = self.jobs.write().await;
        let names: Vec<String> = jobs
            .iter()
            .filter(|(_, entry)| entry.tags.iter().any(|t| t == tag))
            .map(|(name, _)| name.clone())
            .collect();
        for name in names {
            if let Some(mut entry) = jobs.remove(&name) {
                if let Some(handle) = entry.handle.take() {
                    handle.abort();
                }
            }
            info!(job = %name, "job cancelled by tag");
        }
        Ok(())
    }

    async fn list_by_tag(&self, tag: &str) -> anyhow::Result<Vec<JobInfo>> {
        let jobs = self.jobs.read().await;
        Ok(jobs
            .values()
            .filter(|entry| entry.tags.iter().any(|t| t == tag))
            .map(|entry| JobInfo {
                id: entry.id,
                state: entry.state,
                tags: entry.tags.clone(),
                run_attempt_count: entry.run_attempt_count,
                output: entry.output.clone(),
                next_schedule_time_ms: entry.next_fire_ms,
            })
            .collect())
    }
}
