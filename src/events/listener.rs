use async_trait::async_trait;

use super::BusMessage;

/// Trait for handling bus messages asynchronously.
///
/// Implement this to forward events to logs, metrics, queues or
/// notification services.
///
/// # Example
///
/// ```rust,ignore
/// use tenantry::events::{BusMessage, Listener};
/// use async_trait::async_trait;
///
/// struct SlackAlertListener {
///     webhook_url: String,
/// }
///
/// #[async_trait]
/// impl Listener for SlackAlertListener {
///     async fn handle(&self, message: &BusMessage) {
///         if message.event_type == "organization.failed" {
///             // send alert to slack
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    /// Called for every message emitted on the registry this listener is
    /// attached to. Filter on `message.event_type` for specific events.
    async fn handle(&self, message: &BusMessage);
}
