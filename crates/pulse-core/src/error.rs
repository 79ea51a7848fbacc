use thiserror::Error;

/// Errors surfaced on the control path. Failures inside a single run are
/// never represented here: the run driver absorbs them into run state so the
/// recurring schedule keeps going.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to query work status: {source}")]
    Query {
        code: &'static str,
        source: anyhow::Error,
    },

    #[error("no foreground context available for permission request")]
    NoForegroundContext,

    #[error("permission request failed: {source}")]
    Permission { source: anyhow::Error },

    #[error("notification delivery failed: {source}")]
    Notification { source: anyhow::Error },

    #[error("host scheduler error: {0}")]
    Host(#[from] anyhow::Error),
}

impl EngineError {
    /// Stable error code reported to callers alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Query { code, .. } => code,
            EngineError::NoForegroundContext => "NO_ACTIVITY",
            EngineError::Permission { .. } => "PERMISSION_REQUEST_ERROR",
            EngineError::Notification { .. } => "TEST_NOTIFICATION_ERROR",
            EngineError::Host(_) => "HOST_ERROR",
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
