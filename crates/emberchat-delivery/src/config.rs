// Delivery loop timing configuration

use std::time::Duration;

/// Timing knobs for one SSE connection
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// How often the loop polls the stores (the loop's only suspension point)
    pub check_interval: Duration,
    /// Cadence of keep-alive comment frames
    pub heartbeat_interval: Duration,
    /// Hard wall-clock cap per connection; hitting it is not an error, the
    /// loop ends with a reconnect hint carrying the resume cursor
    pub max_connection: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(2),
            heartbeat_interval: Duration::from_secs(15),
            max_connection: Duration::from_secs(300),
        }
    }
}

impl DeliveryConfig {
    /// Load from environment, falling back to defaults per field
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            check_interval: env_millis("EMBERCHAT_CHECK_INTERVAL_MS")
                .unwrap_or(defaults.check_interval),
            heartbeat_interval: env_secs("EMBERCHAT_HEARTBEAT_SECS")
                .unwrap_or(defaults.heartbeat_interval),
            max_connection: env_secs("EMBERCHAT_MAX_CONNECTION_SECS")
                .unwrap_or(defaults.max_connection),
        }
    }

    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_max_connection(mut self, max: Duration) -> Self {
        self.max_connection = max;
        self
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .map(Duration::from_secs)
}

fn env_millis(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DeliveryConfig::default();
        assert_eq!(config.check_interval, Duration::from_secs(2));
        assert_eq!(config.heartbeat_interval, Duration::from_secs(15));
        assert_eq!(config.max_connection, Duration::from_secs(300));
    }

    #[test]
    fn test_builders() {
        let config = DeliveryConfig::default()
            .with_check_interval(Duration::from_millis(100))
            .with_max_connection(Duration::from_secs(5));
        assert_eq!(config.check_interval, Duration::from_millis(100));
        assert_eq!(config.max_connection, Duration::from_secs(5));
    }
}
