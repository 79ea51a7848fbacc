use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::bodies::{DefaultBody, FileSyncBody, PingBody, SshCheckBody, SystemMonitorBody, TaskBody};
use crate::config::EngineConfig;
use crate::task::{TaskResult, TaskType};

/// Maps task types to their bodies. `execute` never fails: a body returning
/// `Err` is absorbed into a failed `TaskResult`, and a type without a body
/// falls through to the `Default` body.
pub struct TaskRegistry {
    bodies: HashMap<TaskType, Arc<dyn TaskBody>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            bodies: HashMap::new(),
        }
    }

    /// Registry with every built-in body wired up.
    pub fn builtin(config: &EngineConfig) -> Self {
        let mut registry = Self::new();
        registry.register(
            TaskType::Ping,
            Arc::new(PingBody::new(config.ping_url.clone(), config.network_timeout)),
        );
        registry.register(
            TaskType::SshCheck,
            Arc::new(SshCheckBody::new(config.probe_delay)),
        );
        registry.register(TaskType::SystemMonitor, Arc::new(SystemMonitorBody));
        registry.register(
            TaskType::FileSync,
            Arc::new(FileSyncBody::new(config.probe_delay)),
        );
        registry.register(TaskType::Default, Arc::new(DefaultBody));
        registry
    }

    pub fn register(&mut self, kind: TaskType, body: Arc<dyn TaskBody>) {
        self.bodies.insert(kind, body);
    }

    pub async fn execute(&self, kind: TaskType) -> TaskResult {
        let body = match self.bodies.get(&kind) {
            Some(body) => body,
            None => {
                warn!(task_type = kind.as_str(), "no body registered, using default");
                match self.bodies.get(&TaskType::Default) {
                    Some(body) => body,
                    None => return TaskResult::failure("no task body registered"),
                }
            }
        };

        match body.execute().await {
            Ok(result) => result,
            Err(e) => TaskResult::failure(e.to_string()),
        }
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct ErringBody;

    #[async_trait]
    impl TaskBody for ErringBody {
        async fn execute(&self) -> anyhow::Result<TaskResult> {
            Err(anyhow::anyhow!("socket closed unexpectedly"))
        }
    }

    #[tokio::test]
    async fn test_body_error_becomes_failed_result() {
        let mut registry = TaskRegistry::new();
        registry.register(TaskType::Ping, Arc::new(ErringBody));

        let result = registry.execute(TaskType::Ping).await;
        assert!(!result.success);
        assert_eq!(result.message, "socket closed unexpectedly");
    }

    #[tokio::test]
    async fn test_missing_body_falls_back_to_default() {
        let mut registry = TaskRegistry::new();
        registry.register(TaskType::Default, Arc::new(DefaultBody));

        let result = registry.execute(TaskType::FileSync).await;
        assert!(result.success);
        assert!(result.message.starts_with("Default task completed"));
    }

    #[tokio::test]
    async fn test_builtin_registry_runs_simulated_bodies_without_delay() {
        let registry = TaskRegistry::builtin(&EngineConfig::immediate());

        let result = registry.execute(TaskType::FileSync).await;
        assert!(result.success);
        assert!(result.message.starts_with("Synced "));

        let result = registry.execute(TaskType::Default).await;
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_empty_registry_reports_failure() {
        let registry = TaskRegistry::new();
        let result = registry.execute(TaskType::Ping).await;
        assert!(!result.success);
    }
}
