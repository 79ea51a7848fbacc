// Host scheduler boundary. The engine owns no durable store: job existence
// and run state live in the host scheduler, which serializes firings per
// job name and feeds each run its predecessor's output.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::task::TaskType;

/// Flat key/value payload the host scheduler persists per job.
pub type KvMap = serde_json::Map<String, serde_json::Value>;

/// Host-scheduler lifecycle state for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Enqueued,
    Running,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Enqueued => "ENQUEUED",
            JobState::Running => "RUNNING",
        }
    }
}

/// Request to enqueue a uniquely named recurring job. A job with the same
/// name is atomically superseded (REPLACE policy) and its state reset to
/// `input`.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub name: String,
    pub interval: Duration,
    pub flex: Duration,
    pub task_type: TaskType,
    pub tags: Vec<String>,
    pub input: KvMap,
}

/// Snapshot of one job as reported by the host scheduler.
#[derive(Debug, Clone)]
pub struct JobInfo {
    pub id: Uuid,
    pub state: JobState,
    pub tags: Vec<String>,
    pub run_attempt_count: u32,
    pub output: KvMap,
    pub next_schedule_time_ms: i64,
}

/// Run callback the engine supplies to the host scheduler. Invoked once per
/// firing with the job's most recent output as input; the returned map
/// becomes the next firing's input. The signature is deliberately
/// infallible: a run always reports success to the host so one failed
/// execution never halts the recurring schedule.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, name: &str, task_type: TaskType, input: KvMap) -> KvMap;
}

/// External scheduler that fires recurring jobs and persists each job's
/// input/output payload across process restarts.
#[async_trait]
pub trait HostScheduler: Send + Sync {
    async fn enqueue_unique_recurring(&self, request: JobRequest) -> anyhow::Result<()>;

    /// Idempotent: cancelling an unknown name is not an error.
    async fn cancel_by_name(&self, name: &str) -> anyhow::Result<()>;

    async fn cancel_by_tag(&self, tag: &str) -> anyhow::Result<()>;

    async fn list_by_tag(&self, tag: &str) -> anyhow::Result<Vec<JobInfo>>;
}
