use serde::{Deserialize, Serialize};

/// Outcome of one task-body invocation. Produced fresh per run and consumed
/// immediately by the run driver; never persisted directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub success: bool,
    pub message: String,
}

impl TaskResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Closed set of task kinds the engine knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Ping,
    SshCheck,
    SystemMonitor,
    FileSync,
    Default,
}

impl TaskType {
    /// Resolve a wire tag to a task type. Unknown tags fall back to
    /// `Default` explicitly; callers that care should check `from_tag` first.
    pub fn parse(tag: &str) -> Self {
        Self::from_tag(tag).unwrap_or(TaskType::Default)
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ping" => Some(TaskType::Ping),
            "ssh_check" => Some(TaskType::SshCheck),
            "system_monitor" => Some(TaskType::SystemMonitor),
            "file_sync" => Some(TaskType::FileSync),
            "default" => Some(TaskType::Default),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Ping => "ping",
            TaskType::SshCheck => "ssh_check",
            TaskType::SystemMonitor => "system_monitor",
            TaskType::FileSync => "file_sync",
            TaskType::Default => "default",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tags_round_trip() {
        for kind in [
            TaskType::Ping,
            TaskType::SshCheck,
            TaskType::SystemMonitor,
            TaskType::FileSync,
            TaskType::Default,
        ] {
            assert_eq!(TaskType::parse(kind.as_str()), kind);
        }
    }

    #[test]
    fn test_unknown_tag_falls_back_to_default() {
        assert_eq!(TaskType::from_tag("bitcoin_miner"), None);
        assert_eq!(TaskType::parse("bitcoin_miner"), TaskType::Default);
    }
}
