use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error};

use crate::host::{JobRunner, KvMap};
use crate::registry::TaskRegistry;
use crate::signal::SignalDispatcher;
use crate::state::RunState;
use crate::task::{TaskResult, TaskType};

/// Executed once per firing: decodes the prior run state, runs the task
/// body, folds the outcome into new state, dispatches the signal, and hands
/// the new state back for the host to persist. Infallible by construction:
/// every failure mode ends up recorded in state, never surfaced to the
/// host's retry machinery.
pub struct RunDriver {
    registry: Arc<TaskRegistry>,
    signals: SignalDispatcher,
}

impl RunDriver {
    pub fn new(registry: Arc<TaskRegistry>, signals: SignalDispatcher) -> Self {
        Self { registry, signals }
    }
}

#[async_trait]
impl JobRunner for RunDriver {
    async fn run(&self, name: &str, task_type: TaskType, input: KvMap) -> KvMap {
        let prev = RunState::decode(&input);
        let task_name = if prev.task_name.is_empty() {
            name.to_string()
        } else {
            prev.task_name.clone()
        };
        debug!(%task_name, task_type = task_type.as_str(), "starting run");

        // catch_unwind is defense in depth: the registry already converts
        // body errors into failed results, so only a panic lands here.
        let (result, faulted) = match AssertUnwindSafe(self.registry.execute(task_type))
            .catch_unwind()
            .await
        {
            Ok(result) => (result, false),
            Err(panic) => {
                error!(%task_name, "task body panicked");
                (TaskResult::failure(panic_message(panic)), true)
            }
        };

        let tag = match (faulted, result.success) {
            (true, _) => "ERROR",
            (false, true) => "SUCCESS",
            (false, false) => "FAILED",
        };
        // Runs for a name are serialized by the host; the clamp keeps the
        // persisted timestamp monotonic even if the wall clock steps back.
        let now_ms = Utc::now().timestamp_millis().max(prev.last_run_time_ms);
        let next = RunState {
            task_name: task_name.clone(),
            last_result: format!("{tag}: {}", result.message),
            last_run_time_ms: now_ms,
            success_count: prev.success_count + u64::from(result.success),
            failure_count: prev.failure_count + u64::from(!result.success),
        };

        self.signals
            .emit(&task_name, result.success, &result.message)
            .await;

        debug!(
            %task_name,
            success = result.success,
            success_count = next.success_count,
            failure_count = next.failure_count,
            "run completed"
        );
        next.encode()
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "task body panicked".to_string()
    }
}
