//! Built-in task bodies. Each body is stateless per call, has no side
//! effect on run state, and keeps any network or timed work within bounded
//! timeouts so the host scheduler's execution window is never exceeded.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chrono::Local;
use reqwest::Client;
use sysinfo::System;
use tokio::time::sleep;

use crate::task::TaskResult;

/// Pluggable unit of work. Returning `Err` is treated as an internal body
/// failure and converted to a failed `TaskResult` by the registry.
#[async_trait]
pub trait TaskBody: Send + Sync {
    async fn execute(&self) -> anyhow::Result<TaskResult>;
}

/// HEAD request against a configured URL; success iff the server answers 200.
pub struct PingBody {
    url: String,
    timeout: Duration,
}

impl PingBody {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl TaskBody for PingBody {
    async fn execute(&self) -> anyhow::Result<TaskResult> {
        let client = Client::builder()
            .connect_timeout(self.timeout)
            .timeout(self.timeout)
            .build()?;

        match client.head(&self.url).send().await {
            Ok(response) if response.status().as_u16() == 200 => Ok(TaskResult::success(format!(
                "Ping successful ({})",
                response.status().as_u16()
            ))),
            Ok(response) => Ok(TaskResult::failure(format!(
                "Ping failed with code: {}",
                response.status().as_u16()
            ))),
            Err(e) => Ok(TaskResult::failure(format!("Ping failed: {e}"))),
        }
    }
}

/// Simulated SSH reachability probe: bounded delay, pseudo-random outcome.
pub struct SshCheckBody {
    delay: Duration,
}

impl SshCheckBody {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl TaskBody for SshCheckBody {
    async fn execute(&self) -> anyhow::Result<TaskResult> {
        sleep(self.delay).await;
        if subsec_entropy()? % 2 == 0 {
            Ok(TaskResult::success("SSH connection check passed"))
        } else {
            Ok(TaskResult::failure("SSH connection unavailable"))
        }
    }
}

/// Reports system memory usage.
pub struct SystemMonitorBody;

#[async_trait]
impl TaskBody for SystemMonitorBody {
    async fn execute(&self) -> anyhow::Result<TaskResult> {
        let mut system = System::new();
        system.refresh_memory();
        let used_mb = system.used_memory() / (1024 * 1024);
        let total_mb = system.total_memory() / (1024 * 1024);
        Ok(TaskResult::success(format!(
            "Memory: {used_mb}MB used of {total_mb}MB total"
        )))
    }
}

/// Simulated file sync: bounded delay, reports a small file count.
pub struct FileSyncBody {
    delay: Duration,
}

impl FileSyncBody {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl TaskBody for FileSyncBody {
    async fn execute(&self) -> anyhow::Result<TaskResult> {
        sleep(self.delay).await;
        let files = subsec_entropy()? % 10 + 1;
        Ok(TaskResult::success(format!("Synced {files} files")))
    }
}

/// Fallback body: always succeeds with a timestamped message.
pub struct DefaultBody;

#[async_trait]
impl TaskBody for DefaultBody {
    async fn execute(&self) -> anyhow::Result<TaskResult> {
        let timestamp = Local::now().format("%H:%M:%S");
        Ok(TaskResult::success(format!(
            "Default task completed at {timestamp}"
        )))
    }
}

fn subsec_entropy() -> anyhow::Result<u32> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)?
        .subsec_nanos())
}
