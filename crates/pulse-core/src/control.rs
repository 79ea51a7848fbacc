use std::sync::Arc;

use crate::error::{EngineError, EngineResult};
use crate::facade::SchedulerFacade;
use crate::host::HostScheduler;
use crate::permission::PermissionBroker;
use crate::signal::Notifier;
use crate::status::{ActiveWork, StatusQueryService, WorkStatus};

/// Notification id reserved for test notifications.
const TEST_NOTIFICATION_ID: i32 = 9999;

/// Transport-independent control surface: one method per caller-facing
/// operation, each returning either a confirmation payload or an
/// `EngineError` carrying a stable code.
pub struct ControlService {
    facade: SchedulerFacade,
    status: StatusQueryService,
    permissions: Arc<PermissionBroker>,
    notifier: Arc<dyn Notifier>,
}

impl ControlService {
    pub fn new(
        host: Arc<dyn HostScheduler>,
        notifier: Arc<dyn Notifier>,
        permissions: Arc<PermissionBroker>,
    ) -> Self {
        Self {
            facade: SchedulerFacade::new(host.clone()),
            status: StatusQueryService::new(host),
            permissions,
            notifier,
        }
    }

    pub async fn start_periodic_work(
        &self,
        task_name: &str,
        interval_seconds: u64,
        task_type: &str,
    ) -> EngineResult<String> {
        self.facade
            .register(task_name, interval_seconds, task_type)
            .await?;
        Ok(format!("Work started: {task_name}"))
    }

    pub async fn stop_work(&self, task_name: &str) -> EngineResult<String> {
        self.facade.cancel(task_name).await?;
        Ok(format!("Work stopped: {task_name}"))
    }

    pub async fn get_active_works(&self) -> EngineResult<Vec<ActiveWork>> {
        self.status.list_active().await
    }

    pub async fn get_all_work_status(&self) -> EngineResult<Vec<WorkStatus>> {
        self.status.list_all().await
    }

    pub async fn cancel_all_work(&self) -> EngineResult<String> {
        self.facade.cancel_all().await?;
        Ok("All work cancelled".to_string())
    }

    pub fn check_notification_permission(&self) -> bool {
        self.permissions.granted() || self.notifier.enabled()
    }

    pub async fn request_notification_permission(&self) -> EngineResult<String> {
        self.permissions.request().await
    }

    pub async fn send_test_notification(&self) -> EngineResult<String> {
        self.notifier
            .ensure_channel()
            .await
            .map_err(|e| EngineError::Notification { source: e })?;
        self.notifier
            .notify(
                TEST_NOTIFICATION_ID,
                "Pulse Test",
                "Test notification from the task engine",
            )
            .await
            .map_err(|e| EngineError::Notification { source: e })?;
        Ok("Test notification sent".to_string())
    }
}
