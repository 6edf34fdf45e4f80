use async_trait::async_trait;

use crate::events::{BusMessage, Listener};

/// Logs every bus message through the `log` facade.
///
/// # Example
///
/// ```rust
/// use tenantry::events::ListenerRegistry;
/// use tenantry::events::listeners::LoggingListener;
///
/// let mut registry = ListenerRegistry::new();
/// registry.listen(LoggingListener::with_level(log::Level::Debug));
/// ```
pub struct LoggingListener {
    level: log::Level,
}

impl LoggingListener {
    /// Creates a new logging listener at INFO level.
    pub fn new() -> Self {
        Self {
            level: log::Level::Info,
        }
    }

    pub fn with_level(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Listener for LoggingListener {
    async fn handle(&self, message: &BusMessage) {
        // failures are worth a warning regardless of the configured level
        let level = if message.event_type.ends_with(".failed") {
            self.level.min(log::Level::Warn)
        } else {
            self.level
        };

        log::log!(
            target: "tenantry::events",
            level,
            "event={} scope={} producer={} payload={}",
            message.event_type,
            message.scope,
            message.producer,
            message.payload
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventScope;

    #[test]
    fn test_logging_listener_levels() {
        assert_eq!(LoggingListener::new().level, log::Level::Info);
        assert_eq!(LoggingListener::default().level, log::Level::Info);
        assert_eq!(
            LoggingListener::with_level(log::Level::Debug).level,
            log::Level::Debug
        );
    }

    #[tokio::test]
    async fn test_logging_listener_handle() {
        let listener = LoggingListener::new();
        let message = BusMessage::new(
            "team.failed",
            serde_json::json!({"name": "X", "reason": "boom"}),
            EventScope::Global,
            "test",
        );

        // should not panic
        listener.handle(&message).await;
    }
}
