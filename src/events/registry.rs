use async_trait::async_trait;

use super::{BusMessage, EventBus, Listener};

/// An [`EventBus`] that fans each message out to registered listeners.
///
/// Listeners are called in registration order. With no listeners, emitting
/// is a no-op.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Vec<Box<dyn Listener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Register a listener to receive messages.
    pub fn listen(&mut self, listener: impl Listener) -> &mut Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[async_trait]
impl EventBus for ListenerRegistry {
    async fn emit(&self, message: BusMessage) {
        for listener in &self.listeners {
            listener.handle(&message).await;
        }
    }
}
