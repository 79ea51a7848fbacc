use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use tracing::{info, warn};

/// Delivery channel for user-visible signals. Implementations must tolerate
/// repeated `ensure_channel` calls (lazy, idempotent creation).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn ensure_channel(&self) -> anyhow::Result<()>;

    /// Emits or updates the notification identified by `id`.
    async fn notify(&self, id: i32, title: &str, body: &str) -> anyhow::Result<()>;

    /// Whether notifications are currently enabled for this channel.
    fn enabled(&self) -> bool;
}

/// Channel identifier used when none is configured.
pub const DEFAULT_CHANNEL: &str = "PULSE_WORK_CHANNEL";

/// Headless notifier that reports signals through tracing. Lets the engine
/// run without a platform notification service attached.
pub struct LogNotifier {
    channel: String,
    channel_created: AtomicBool,
}

impl LogNotifier {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            channel_created: AtomicBool::new(false),
        }
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL)
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn ensure_channel(&self) -> anyhow::Result<()> {
        if !self.channel_created.swap(true, Ordering::SeqCst) {
            info!(channel = %self.channel, "notification channel created");
        }
        Ok(())
    }

    async fn notify(&self, id: i32, title: &str, body: &str) -> anyhow::Result<()> {
        info!(notification_id = id, title, body, "notification");
        Ok(())
    }

    fn enabled(&self) -> bool {
        true
    }
}

/// Formats and emits the per-run signal. The identifier is a stable
/// function of the task name, so repeat runs of the same task update the
/// existing notification instead of stacking new ones.
#[derive(Clone)]
pub struct SignalDispatcher {
    notifier: Arc<dyn Notifier>,
}

impl SignalDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Never fails the caller: delivery problems are logged and dropped so a
    /// broken notification channel cannot affect a run's outcome.
    pub async fn emit(&self, task_name: &str, success: bool, message: &str) {
        let id = signal_id(task_name);
        let title = if success {
            format!("✅ {task_name}")
        } else {
            format!("❌ {task_name}")
        };
        let body = format!("{message} at {}", Local::now().format("%H:%M:%S"));

        if let Err(e) = self.notifier.ensure_channel().await {
            warn!(task_name, "failed to create notification channel: {e}");
            return;
        }
        if let Err(e) = self.notifier.notify(id, &title, &body).await {
            warn!(task_name, notification_id = id, "failed to notify: {e}");
        }
    }
}

/// Stable identifier for a task's notification: 31-multiplier fold over the
/// name bytes. Same input always yields the same id.
pub fn signal_id(task_name: &str) -> i32 {
    task_name
        .bytes()
        .fold(0i32, |h, b| h.wrapping_mul(31).wrapping_add(b as i32))
}
