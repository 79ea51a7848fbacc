use std::time::Duration;

/// Engine configuration for task bodies and notifications.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// URL probed by the ping task body.
    pub ping_url: String,

    /// Connect/read timeout applied to every network call a task body makes.
    pub network_timeout: Duration,

    /// Simulated probe delay for the ssh-check and file-sync bodies.
    pub probe_delay: Duration,

    /// Notification channel identifier, created lazily before first use.
    pub notification_channel: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ping_url: std::env::var("PULSE_PING_URL")
                .unwrap_or_else(|_| "https://www.google.com".to_string()),
            network_timeout: Duration::from_secs(
                std::env::var("PULSE_NETWORK_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5),
            ),
            probe_delay: Duration::from_millis(
                std::env::var("PULSE_PROBE_DELAY_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1000),
            ),
            notification_channel: std::env::var("PULSE_NOTIFICATION_CHANNEL")
                .unwrap_or_else(|_| crate::signal::DEFAULT_CHANNEL.to_string()),
        }
    }
}

impl EngineConfig {
    /// Configuration suited to tests: no artificial delays.
    pub fn immediate() -> Self {
        Self {
            probe_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immediate_zeroes_probe_delay() {
        let config = EngineConfig::immediate();
        assert_eq!(config.probe_delay, Duration::ZERO);
        assert!(!config.notification_channel.is_empty());
    }
}
