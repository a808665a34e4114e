// Store TTL configuration
//
// TTLs are explicit construction-time configuration: the stores are built
// from this at process start and injected where needed, never reached
// through globals.

use std::time::Duration;

/// TTL windows for the three cache-backed stores
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// How long a (widget, session) event window stays alive
    pub event_ttl: Duration,
    /// How long a typing signal shows before clearing itself
    pub typing_ttl: Duration,
    /// How long a widget's notification window stays alive
    pub notification_ttl: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            event_ttl: Duration::from_secs(3600),
            typing_ttl: Duration::from_secs(5),
            notification_ttl: Duration::from_secs(3600),
        }
    }
}

impl StoreConfig {
    /// Load from environment, falling back to defaults per field
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            event_ttl: env_secs("EMBERCHAT_EVENT_TTL_SECS").unwrap_or(defaults.event_ttl),
            typing_ttl: env_secs("EMBERCHAT_TYPING_TTL_SECS").unwrap_or(defaults.typing_ttl),
            notification_ttl: env_secs("EMBERCHAT_NOTIFICATION_TTL_SECS")
                .unwrap_or(defaults.notification_ttl),
        }
    }

    pub fn with_event_ttl(mut self, ttl: Duration) -> Self {
        self.event_ttl = ttl;
        self
    }

    pub fn with_typing_ttl(mut self, ttl: Duration) -> Self {
        self.typing_ttl = ttl;
        self
    }

    pub fn with_notification_ttl(mut self, ttl: Duration) -> Self {
        self.notification_ttl = ttl;
        self
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.event_ttl, Duration::from_secs(3600));
        assert_eq!(config.typing_ttl, Duration::from_secs(5));
        assert_eq!(config.notification_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn test_builders() {
        let config = StoreConfig::default()
            .with_event_ttl(Duration::from_secs(60))
            .with_typing_ttl(Duration::from_secs(2));
        assert_eq!(config.event_ttl, Duration::from_secs(60));
        assert_eq!(config.typing_ttl, Duration::from_secs(2));
    }
}
