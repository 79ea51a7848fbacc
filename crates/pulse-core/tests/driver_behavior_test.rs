use std::sync::Arc;

use async_trait::async_trait;
use pulse_core::bodies::TaskBody;
use pulse_core::driver::RunDriver;
use pulse_core::host::JobRunner;
use pulse_core::signal::{LogNotifier, SignalDispatcher};
use pulse_core::state::{RunState, NOT_STARTED};
use pulse_core::task::{TaskResult, TaskType};
use pulse_core::TaskRegistry;

struct SucceedingBody;

#[async_trait]
impl TaskBody for SucceedingBody {
    async fn execute(&self) -> anyhow::Result<TaskResult> {
        Ok(TaskResult::success("all good"))
    }
}

struct FailingBody;

#[async_trait]
impl TaskBody for FailingBody {
    async fn execute(&self) -> anyhow::Result<TaskResult> {
        Ok(TaskResult::failure("endpoint unreachable"))
    }
}

struct PanickingBody;

#[async_trait]
impl TaskBody for PanickingBody {
    async fn execute(&self) -> anyhow::Result<TaskResult> {
        panic!("index out of bounds");
    }
}

fn driver_with(kind: TaskType, body: Arc<dyn TaskBody>) -> RunDriver {
    let mut registry = TaskRegistry::new();
    registry.register(kind, body);
    RunDriver::new(
        Arc::new(registry),
        SignalDispatcher::new(Arc::new(LogNotifier::default())),
    )
}

#[tokio::test]
async fn test_first_run_starts_from_codec_defaults() {
    let driver = driver_with(TaskType::Ping, Arc::new(SucceedingBody));

    let initial = RunState::initial("heartbeat");
    assert_eq!(initial.last_result, NOT_STARTED);

    let output = driver
        .run("heartbeat", TaskType::Ping, initial.encode())
        .await;
    let state = RunState::decode(&output);

    assert_eq!(state.task_name, "heartbeat");
    assert_eq!(state.last_result, "SUCCESS: all good");
    assert_eq!(state.success_count, 1);
    assert_eq!(state.failure_count, 0);
    assert!(state.last_run_time_ms > 0);
}

#[tokio::test]
async fn test_failed_body_is_recorded_not_propagated() {
    let driver = driver_with(TaskType::Ping, Arc::new(FailingBody));

    let output = driver
        .run("heartbeat", TaskType::Ping, RunState::initial("heartbeat").encode())
        .await;
    let state = RunState::decode(&output);

    assert_eq!(state.last_result, "FAILED: endpoint unreachable");
    assert_eq!(state.success_count, 0);
    assert_eq!(state.failure_count, 1);
}

#[tokio::test]
async fn test_panicking_body_yields_error_result_and_keeps_going() {
    let driver = driver_with(TaskType::Ping, Arc::new(PanickingBody));

    // Two consecutive firings: the panic must be absorbed each time and the
    // failure counter must keep accumulating.
    let mut input = RunState::initial("heartbeat").encode();
    for expected_failures in 1..=2 {
        let output = driver.run("heartbeat", TaskType::Ping, input).await;
        let state = RunState::decode(&output);
        assert_eq!(state.last_result, "ERROR: index out of bounds");
        assert_eq!(state.success_count, 0);
        assert_eq!(state.failure_count, expected_failures);
        input = output;
    }
}

#[tokio::test]
async fn test_counters_accumulate_across_fed_back_runs() {
    let driver = driver_with(TaskType::Ping, Arc::new(SucceedingBody));

    let mut input = RunState::initial("heartbeat").encode();
    let mut last_time = 0;
    for n in 1..=5u64 {
        let output = driver.run("heartbeat", TaskType::Ping, input).await;
        let state = RunState::decode(&output);
        assert_eq!(state.success_count + state.failure_count, n);
        assert!(state.last_run_time_ms >= last_time);
        last_time = state.last_run_time_ms;
        input = output;
    }
}

#[tokio::test]
async fn test_empty_input_falls_back_to_job_name() {
    let driver = driver_with(TaskType::Ping, Arc::new(SucceedingBody));

    let output = driver
        .run("heartbeat", TaskType::Ping, pulse_core::KvMap::new())
        .await;
    let state = RunState::decode(&output);
    assert_eq!(state.task_name, "heartbeat");
    assert_eq!(state.success_count, 1);
}
