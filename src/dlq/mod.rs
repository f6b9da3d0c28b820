// src/dlq/mod.rs

//! Dead-letter sink for failed operations.
//!
//! The sink is a side channel: delivery is best effort, and nothing in
//! the main fetch flow ever blocks on or aborts because of it.

pub mod memory;
pub mod sqs;

use async_trait::async_trait;

use crate::models::ErrorEvent;

pub use memory::MemoryDeadLetter;
pub use sqs::SqsDeadLetter;

/// Best-effort durable capture of failed-operation payloads.
#[async_trait]
pub trait FailureSink: Send + Sync {
    /// Submit a payload. Never fails from the caller's perspective;
    /// delivery problems are reported through the event recorder only.
    async fn send(&self, payload: &ErrorEvent);
}

#[async_trait]
impl<T: FailureSink + ?Sized> FailureSink for std::sync::Arc<T> {
    async fn send(&self, payload: &ErrorEvent) {
        (**self).send(payload).await;
    }
}
