// src/dlq/memory.rs

//! In-memory dead-letter sink for local runs and tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::dlq::FailureSink;
use crate::models::ErrorEvent;

/// Sink that collects payloads in a vector.
#[derive(Default)]
pub struct MemoryDeadLetter {
    sent: Mutex<Vec<ErrorEvent>>,
}

impl MemoryDeadLetter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payloads captured so far, in send order.
    pub fn sent(&self) -> Vec<ErrorEvent> {
        self.sent.lock().expect("sink lock poisoned").clone()
    }
}

#[async_trait]
impl FailureSink for MemoryDeadLetter {
    async fn send(&self, payload: &ErrorEvent) {
        self.sent
            .lock()
            .expect("sink lock poisoned")
            .push(payload.clone());
    }
}
