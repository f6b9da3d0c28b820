// src/events/memory.rs

//! In-memory event recorder for local runs and tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::events::EventRecorder;
use crate::models::{Channel, FetchStatus, LogEvent};
use crate::utils::timestamp_millis;

/// Recorder that keeps each channel as a vector in memory.
#[derive(Default)]
pub struct MemoryRecorder {
    channels: Mutex<HashMap<Channel, Vec<LogEvent>>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a channel's events, in append order.
    pub fn events(&self, channel: Channel) -> Vec<LogEvent> {
        self.channels
            .lock()
            .expect("recorder lock poisoned")
            .get(&channel)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventRecorder for MemoryRecorder {
    async fn record(&self, channel: Channel, mut event: LogEvent) -> Result<()> {
        if event.timestamp.is_none() {
            event.timestamp = Some(timestamp_millis());
        }
        self.channels
            .lock()
            .expect("recorder lock poisoned")
            .entry(channel)
            .or_default()
            .push(event);
        Ok(())
    }

    async fn peek_last_status(&self) -> Result<Option<FetchStatus>> {
        let last = self
            .channels
            .lock()
            .expect("recorder lock poisoned")
            .get(&Channel::Status)
            .and_then(|events| events.last().cloned());

        match last {
            Some(event) => Ok(Some(serde_json::from_str(&event.message)?)),
            None => Ok(None),
        }
    }
}
