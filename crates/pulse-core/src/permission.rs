use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{oneshot, Mutex};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// Foreground UI host able to show a permission prompt. The user's answer
/// arrives later through `PermissionBroker::resolve`.
#[async_trait]
pub trait ForegroundContext: Send + Sync {
    async fn prompt(&self) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Idle,
    Requesting,
}

/// Single in-flight permission request slot, tied to the presence of a
/// foreground context. The slot is an owned oneshot channel: overwriting it
/// (a second request) or detaching the foreground context cancels the first
/// caller's future instead of leaving a dangling callback.
pub struct PermissionBroker {
    foreground: Mutex<Option<Arc<dyn ForegroundContext>>>,
    pending: Mutex<Option<oneshot::Sender<bool>>>,
    granted: AtomicBool,
}

impl PermissionBroker {
    pub fn new() -> Self {
        Self {
            foreground: Mutex::new(None),
            pending: Mutex::new(None),
            granted: AtomicBool::new(false),
        }
    }

    pub async fn attach(&self, context: Arc<dyn ForegroundContext>) {
        *self.foreground.lock().await = Some(context);
    }

    /// Foreground context went away: discard it and the pending slot. The
    /// abandoned caller's await resolves with a cancellation.
    pub async fn detach(&self) {
        self.pending.lock().await.take();
        self.foreground.lock().await.take();
        debug!("foreground context detached");
    }

    pub async fn state(&self) -> PermissionState {
        if self.pending.lock().await.is_some() {
            PermissionState::Requesting
        } else {
            PermissionState::Idle
        }
    }

    pub fn granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    /// Issues a permission request and waits for the decision. A request
    /// while another is in flight overwrites the pending slot; the first
    /// caller resolves with "abandoned".
    pub async fn request(&self) -> EngineResult<String> {
        if self.granted() {
            return Ok("Permission already granted".to_string());
        }

        let context = self
            .foreground
            .lock()
            .await
            .clone()
            .ok_or(EngineError::NoForegroundContext)?;

        let (tx, rx) = oneshot::channel();
        *self.pending.lock().await = Some(tx);

        if let Err(e) = context.prompt().await {
            self.pending.lock().await.take();
            return Err(EngineError::Permission { source: e });
        }

        match rx.await {
            Ok(true) => {
                self.granted.store(true, Ordering::SeqCst);
                Ok("Permission granted".to_string())
            }
            Ok(false) => Ok("Permission denied".to_string()),
            Err(_) => Ok("Permission request abandoned".to_string()),
        }
    }

    /// Platform reported the user's decision: resolve and clear the slot.
    pub async fn resolve(&self, granted: bool) {
        if let Some(tx) = self.pending.lock().await.take() {
            let _ = tx.send(granted);
        }
    }
}

impl Default for PermissionBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PromptingContext;

    #[async_trait]
    impl ForegroundContext for PromptingContext {
        async fn prompt(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_request_without_foreground_fails() {
        let broker = PermissionBroker::new();
        let err = broker.request().await.expect_err("no foreground");
        assert!(matches!(err, EngineError::NoForegroundContext));
        assert_eq!(err.code(), "NO_ACTIVITY");
    }

    #[tokio::test]
    async fn test_grant_flow_transitions_back_to_idle() {
        let broker = Arc::new(PermissionBroker::new());
        broker.attach(Arc::new(PromptingContext)).await;

        let requester = {
            let broker = broker.clone();
            tokio::spawn(async move { broker.request().await })
        };
        // Wait for the request to park in the pending slot.
        while broker.state().await != PermissionState::Requesting {
            tokio::task::yield_now().await;
        }

        broker.resolve(true).await;
        let outcome = requester.await.expect("join").expect("request");
        assert_eq!(outcome, "Permission granted");
        assert_eq!(broker.state().await, PermissionState::Idle);
        assert!(broker.granted());

        // Subsequent requests short-circuit.
        assert_eq!(
            broker.request().await.expect("request"),
            "Permission already granted"
        );
    }

    #[tokio::test]
    async fn test_deny_flow_does_not_set_grant() {
        let broker = Arc::new(PermissionBroker::new());
        broker.attach(Arc::new(PromptingContext)).await;

        let requester = {
            let broker = broker.clone();
            tokio::spawn(async move { broker.request().await })
        };
        while broker.state().await != PermissionState::Requesting {
            tokio::task::yield_now().await;
        }

        broker.resolve(false).await;
        assert_eq!(
            requester.await.expect("join").expect("request"),
            "Permission denied"
        );
        assert!(!broker.granted());
    }

    #[tokio::test]
    async fn test_detach_abandons_pending_request() {
        let broker = Arc::new(PermissionBroker::new());
        broker.attach(Arc::new(PromptingContext)).await;

        let requester = {
            let broker = broker.clone();
            tokio::spawn(async move { broker.request().await })
        };
        while broker.state().await != PermissionState::Requesting {
            tokio::task::yield_now().await;
        }

        broker.detach().await;
        assert_eq!(
            requester.await.expect("join").expect("request"),
            "Permission request abandoned"
        );
        assert!(matches!(
            broker.request().await,
            Err(EngineError::NoForegroundContext)
        ));
    }

    #[tokio::test]
    async fn test_second_request_overwrites_first_slot() {
        let broker = Arc::new(PermissionBroker::new());
        broker.attach(Arc::new(PromptingContext)).await;

        let first = {
            let broker = broker.clone();
            tokio::spawn(async move { broker.request().await })
        };
        while broker.state().await != PermissionState::Requesting {
            tokio::task::yield_now().await;
        }

        let second = {
            let broker = broker.clone();
            tokio::spawn(async move { broker.request().await })
        };
        // The first caller is abandoned once the second replaces the slot.
        assert_eq!(
            first.await.expect("join").expect("request"),
            "Permission request abandoned"
        );

        broker.resolve(true).await;
        assert_eq!(
            second.await.expect("join").expect("request"),
            "Permission granted"
        );
    }
}
