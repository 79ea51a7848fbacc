use std::sync::Arc;

use serde::Serialize;

use crate::error::{EngineError, EngineResult};
use crate::facade::ENGINE_TAG;
use crate::host::{HostScheduler, JobInfo, KvMap};
use crate::state::RunState;

/// Raw projection of one engine-owned job, as reported by `getActiveWorks`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveWork {
    pub id: String,
    pub state: String,
    pub tags: Vec<String>,
    pub run_attempt_count: u32,
    pub output_data: KvMap,
    pub next_schedule_time_millis: i64,
}

/// Full projection combining job identity, scheduler metadata, and decoded
/// run state, as reported by `getAllWorkStatus`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkStatus {
    pub task_name: String,
    pub state: String,
    pub last_result: String,
    pub last_run_time: i64,
    pub success_count: u64,
    pub failure_count: u64,
    pub run_attempt_count: u32,
    pub next_schedule_time: i64,
}

/// On-demand snapshots over the live job set. Ordering is unspecified (set
/// semantics); a job whose run state cannot be decoded is reported with the
/// codec's defaults rather than omitted.
#[derive(Clone)]
pub struct StatusQueryService {
    host: Arc<dyn HostScheduler>,
}

impl StatusQueryService {
    pub fn new(host: Arc<dyn HostScheduler>) -> Self {
        Self { host }
    }

    pub async fn list_active(&self) -> EngineResult<Vec<ActiveWork>> {
        let jobs = self
            .host
            .list_by_tag(ENGINE_TAG)
            .await
            .map_err(|e| EngineError::Query {
                code: "GET_WORKS_ERROR",
                source: e,
            })?;

        Ok(jobs
            .into_iter()
            .map(|job| ActiveWork {
                id: job.id.to_string(),
                state: job.state.as_str().to_string(),
                tags: own_tags(&job),
                run_attempt_count: job.run_attempt_count,
                output_data: job.output,
                next_schedule_time_millis: job.next_schedule_time_ms,
            })
            .collect())
    }

    pub async fn list_all(&self) -> EngineResult<Vec<WorkStatus>> {
        let jobs = self
            .host
            .list_by_tag(ENGINE_TAG)
            .await
            .map_err(|e| EngineError::Query {
                code: "GET_STATUS_ERROR",
                source: e,
            })?;

        Ok(jobs
            .into_iter()
            .map(|job| {
                let task_name = own_tags(&job)
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| "unknown".to_string());
                let state = RunState::decode(&job.output);
                WorkStatus {
                    task_name,
                    state: job.state.as_str().to_string(),
                    last_result: state.last_result,
                    last_run_time: state.last_run_time_ms,
                    success_count: state.success_count,
                    failure_count: state.failure_count,
                    run_attempt_count: job.run_attempt_count,
                    next_schedule_time: job.next_schedule_time_ms,
                }
            })
            .collect())
    }
}

fn own_tags(job: &JobInfo) -> Vec<String> {
    job.tags
        .iter()
        .filter(|tag| tag.as_str() != ENGINE_TAG)
        .cloned()
        .collect()
}
