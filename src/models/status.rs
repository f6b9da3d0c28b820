// src/models/status.rs

//! Fetch cycle status and event records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::timestamp_millis;

/// Summary of one fetch cycle.
///
/// Reset at the start of every cycle, accumulated while the cycle runs,
/// then emitted to the status channel and returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchStatus {
    /// Users fetched and counted across successful calls
    pub users: u64,
    /// API calls attempted, successful or not
    pub api_calls: u64,
    /// Failures in encounter order
    pub errors: Vec<ErrorEvent>,
    /// Cycle start, milliseconds since epoch
    pub timestamp: i64,
    /// Elapsed wall-clock seconds, set at cycle end
    pub duration: f64,
}

impl FetchStatus {
    /// Fresh zero-state stamped with the current time.
    pub fn begin() -> Self {
        Self {
            users: 0,
            api_calls: 0,
            errors: Vec::new(),
            timestamp: timestamp_millis(),
            duration: 0.0,
        }
    }
}

/// One failure, with whatever diagnostic context the failure site has.
///
/// Not a fixed schema: the flattened `extra` bag varies by failure site,
/// only `message` is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub message: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ErrorEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            extra: Map::new(),
        }
    }

    /// Attach a diagnostic field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The upstream returned a non-200 status.
    pub fn unexpected_status(code: u16, body: &str) -> Self {
        Self::new(format!("Received {code} code, but expected 200"))
            .with("response_code", code)
            .with("response_content", body)
    }

    /// HTTP 200 carrying the "Maximum allowed size" sentinel payload.
    pub fn size_sentinel(host: &str, code: u16, body: &str) -> Self {
        Self::new("An unexpected error occurred when fetching users.")
            .with("host", host)
            .with("response", code)
            .with("response_content", body)
    }

    /// Transport or parse failure before a usable response existed.
    pub fn transport(host: &str, size: u32, error: impl std::fmt::Display) -> Self {
        Self::new("An unexpected Runtime error occurred.")
            .with("error", error.to_string())
            .with("params", serde_json::json!({ "size": size }))
            .with("host", host)
    }
}

/// One entry bound for a log channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub message: String,
    /// Milliseconds since epoch; injected at append time when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl LogEvent {
    /// Event without a timestamp; the recorder stamps it on append.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: None,
        }
    }

    /// Event with an explicit timestamp.
    pub fn stamped(message: impl Into<String>, timestamp: i64) -> Self {
        Self {
            message: message.into(),
            timestamp: Some(timestamp),
        }
    }
}

/// The three named log channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Info,
    Error,
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_is_zeroed_and_stamped() {
        let status = FetchStatus::begin();
        assert_eq!(status.users, 0);
        assert_eq!(status.api_calls, 0);
        assert!(status.errors.is_empty());
        assert_eq!(status.duration, 0.0);
        assert!(status.timestamp > 0);
    }

    #[test]
    fn test_error_event_extra_fields_flatten() {
        let event = ErrorEvent::unexpected_status(503, "unavailable");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["message"], "Received 503 code, but expected 200");
        assert_eq!(json["response_code"], 503);
        assert_eq!(json["response_content"], "unavailable");
    }

    #[test]
    fn test_status_round_trips_through_json() {
        let mut status = FetchStatus::begin();
        status.users = 7;
        status.api_calls = 3;
        status.errors.push(ErrorEvent::new("boom"));
        status.duration = 1.25;

        let text = serde_json::to_string(&status).unwrap();
        let back: FetchStatus = serde_json::from_str(&text).unwrap();
        assert_eq!(back, status);
    }
}
