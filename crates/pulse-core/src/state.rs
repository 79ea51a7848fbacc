use serde_json::Value;

use crate::host::KvMap;

pub const KEY_TASK_NAME: &str = "taskName";
pub const KEY_LAST_RESULT: &str = "lastResult";
pub const KEY_LAST_RUN_TIME: &str = "lastRunTime";
pub const KEY_SUCCESS_COUNT: &str = "successCount";
pub const KEY_FAILURE_COUNT: &str = "failureCount";

/// Sentinel result for a task that has been registered but never fired.
pub const NOT_STARTED: &str = "Not started";

/// Durable record for one named task, round-tripped through the host
/// scheduler on every run (output of run N is input of run N+1). Pure value
/// type: the engine never caches it in process memory between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    pub task_name: String,
    pub last_result: String,
    pub last_run_time_ms: i64,
    pub success_count: u64,
    pub failure_count: u64,
}

impl RunState {
    /// State handed to the host scheduler when a job is (re)registered.
    pub fn initial(task_name: &str) -> Self {
        Self {
            task_name: task_name.to_string(),
            last_result: NOT_STARTED.to_string(),
            last_run_time_ms: 0,
            success_count: 0,
            failure_count: 0,
        }
    }

    /// Decode from the host scheduler's flat KV payload. Total: missing or
    /// mistyped keys resolve to the documented defaults, so a job whose
    /// state cannot be read still yields a usable record.
    pub fn decode(kv: &KvMap) -> Self {
        Self {
            task_name: kv
                .get(KEY_TASK_NAME)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            last_result: kv
                .get(KEY_LAST_RESULT)
                .and_then(Value::as_str)
                .unwrap_or(NOT_STARTED)
                .to_string(),
            last_run_time_ms: kv
                .get(KEY_LAST_RUN_TIME)
                .and_then(Value::as_i64)
                .unwrap_or(0),
            success_count: kv
                .get(KEY_SUCCESS_COUNT)
                .and_then(Value::as_u64)
                .unwrap_or(0),
            failure_count: kv
                .get(KEY_FAILURE_COUNT)
                .and_then(Value::as_u64)
                .unwrap_or(0),
        }
    }

    /// Encode to the flat KV payload. Every field is always present; the
    /// codec never produces partial updates.
    pub fn encode(&self) -> KvMap {
        let mut kv = KvMap::new();
        kv.insert(KEY_TASK_NAME.into(), Value::from(self.task_name.clone()));
        kv.insert(
            KEY_LAST_RESULT.into(),
            Value::from(self.last_result.clone()),
        );
        kv.insert(KEY_LAST_RUN_TIME.into(), Value::from(self.last_run_time_ms));
        kv.insert(KEY_SUCCESS_COUNT.into(), Value::from(self.success_count));
        kv.insert(KEY_FAILURE_COUNT.into(), Value::from(self.failure_count));
        kv
    }
}
