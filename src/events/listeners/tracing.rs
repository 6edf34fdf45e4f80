use async_trait::async_trait;

use crate::events::{BusMessage, Listener};

/// Emits bus messages as tracing events.
///
/// Requires the `tracing` feature.
pub struct TracingListener;

#[async_trait]
impl Listener for TracingListener {
    async fn handle(&self, message: &BusMessage) {
        tracing::info!(
            target: "tenantry::events",
            event_type = %message.event_type,
            scope = %message.scope,
            producer = message.producer,
            payload = %message.payload,
            "domain event"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventScope;

    #[tokio::test]
    async fn test_tracing_listener_handle() {
        let message = BusMessage::new(
            "workspace.archived",
            serde_json::Value::Null,
            EventScope::Global,
            "test",
        );

        // should not panic
        TracingListener.handle(&message).await;
    }
}
