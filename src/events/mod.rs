// src/events/mod.rs

//! Durable, categorized event logging.
//!
//! An [`EventRecorder`] appends timestamped events to one of three named
//! channels (info, error, status) and can read back the most recent status
//! entry. The production backend is CloudWatch Logs; an in-memory backend
//! serves local runs and tests.

pub mod cloudwatch;
pub mod memory;

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::models::{Channel, ErrorEvent, FetchStatus, LogEvent};

pub use cloudwatch::CloudWatchRecorder;
pub use memory::MemoryRecorder;

/// Append-only categorized event log with a "last status" read path.
#[async_trait]
pub trait EventRecorder: Send + Sync {
    /// Append `event` to the named channel, stamping it if unstamped.
    async fn record(&self, channel: Channel, event: LogEvent) -> Result<()>;

    /// Most recent status-channel entry, parsed. `None` when the channel
    /// is empty, which is the normal state before the first fetch.
    async fn peek_last_status(&self) -> Result<Option<FetchStatus>>;

    /// Best-effort info append; failures are traced, never raised.
    async fn info(&self, message: String) {
        if let Err(err) = self.record(Channel::Info, LogEvent::message(message)).await {
            warn!("Could not append info event: {err}");
        }
    }

    /// Best-effort error append. The event is serialized into the entry's
    /// message so the diagnostic fields survive in the log.
    async fn error(&self, event: &ErrorEvent) {
        let message =
            serde_json::to_string(event).unwrap_or_else(|_| event.message.clone());
        if let Err(err) = self.record(Channel::Error, LogEvent::message(message)).await {
            warn!("Could not append error event: {err}");
        }
    }

    /// Append a finished cycle summary to the status channel.
    async fn status(&self, status: &FetchStatus) -> Result<()> {
        let message = serde_json::to_string(status)?;
        self.record(Channel::Status, LogEvent::message(message))
            .await
    }
}
