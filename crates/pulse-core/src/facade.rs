use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::EngineResult;
use crate::host::{HostScheduler, JobRequest};
use crate::state::RunState;
use crate::task::TaskType;

/// Tag carried by every job this engine owns, used to enumerate "all of our
/// jobs" distinctly from other consumers of the host scheduler.
pub const ENGINE_TAG: &str = "pulse.active";

/// Flex window applied to every job regardless of the requested interval.
pub const FLEX_SECS: u64 = 5;

/// Registers, replaces, and cancels named periodic jobs against the host
/// scheduler. Holds no bookkeeping of its own: the host's store is the
/// single source of truth, so a process restart loses nothing.
#[derive(Clone)]
pub struct SchedulerFacade {
    host: Arc<dyn HostScheduler>,
}

impl SchedulerFacade {
    pub fn new(host: Arc<dyn HostScheduler>) -> Self {
        Self { host }
    }

    /// Enqueues a uniquely named recurring job with REPLACE policy: an
    /// existing job under this name is atomically superseded and its run
    /// state reset. No device constraints are applied; intervals below the
    /// host's minimum are left for the host to clamp.
    pub async fn register(
        &self,
        name: &str,
        interval_seconds: u64,
        task_type_tag: &str,
    ) -> EngineResult<()> {
        let task_type = match TaskType::from_tag(task_type_tag) {
            Some(kind) => kind,
            None => {
                warn!(
                    task_name = name,
                    task_type = task_type_tag,
                    "unknown task type, falling back to default body"
                );
                TaskType::Default
            }
        };

        let interval = Duration::from_secs(interval_seconds);
        let flex = Duration::from_secs(FLEX_SECS).min(interval);
        let request = JobRequest {
            name: name.to_string(),
            interval,
            flex,
            task_type,
            tags: vec![name.to_string(), ENGINE_TAG.to_string()],
            input: RunState::initial(name).encode(),
        };

        self.host.enqueue_unique_recurring(request).await?;
        info!(
            task_name = name,
            interval_seconds,
            task_type = task_type.as_str(),
            "periodic work registered"
        );
        Ok(())
    }

    /// Idempotent: cancelling a name that was never registered is a no-op.
    pub async fn cancel(&self, name: &str) -> EngineResult<()> {
        self.host.cancel_by_name(name).await?;
        info!(task_name = name, "periodic work cancelled");
        Ok(())
    }

    pub async fn cancel_all(&self) -> EngineResult<()> {
        self.host.cancel_by_tag(ENGINE_TAG).await?;
        info!("all periodic work cancelled");
        Ok(())
    }
}
