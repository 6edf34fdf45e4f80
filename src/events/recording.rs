use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::{BusMessage, EventBus};

/// In-memory bus that keeps every emitted message.
///
/// Clones share the same buffer, so a test can hand one clone to the code
/// under test and inspect another.
#[derive(Clone, Default)]
pub struct RecordingEventBus {
    messages: Arc<RwLock<Vec<BusMessage>>>,
}

impl RecordingEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<BusMessage> {
        self.messages
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn event_types(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .map(|message| message.event_type)
            .collect()
    }

    pub fn of_type(&self, event_type: &str) -> Vec<BusMessage> {
        self.messages()
            .into_iter()
            .filter(|message| message.event_type == event_type)
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.messages.write() {
            guard.clear();
        }
    }
}

#[async_trait]
impl EventBus for RecordingEventBus {
    async fn emit(&self, message: BusMessage) {
        if let Ok(mut guard) = self.messages.write() {
            guard.push(message);
        }
    }
}
