// src/service.rs

//! Fetch orchestration.
//!
//! [`DataFetcher`] is the composition root: it wires the event recorder,
//! the record store, and the dead-letter sink, and drives the bounded,
//! rate-limited ingestion cycle behind the `/fetch-data` operation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use serde_json::Value;
use tracing::warn;

use crate::dlq::FailureSink;
use crate::error::Result;
use crate::events::EventRecorder;
use crate::models::{Config, ErrorEvent, FetchStatus, UserRecord};
use crate::storage::RecordStore;
use crate::utils::RateLimiter;

/// Upstream quirk: an oversized `size` comes back as HTTP 200 with this
/// message payload instead of an HTTP error.
const SIZE_SENTINEL_PREFIX: &str = "Maximum allowed size is";

/// What one bounded upstream call produced.
enum CallOutcome {
    Users(Vec<UserRecord>),
    Rejected(ErrorEvent),
}

/// Drives ingestion cycles and exposes the read paths.
pub struct DataFetcher<S, Q>
where
    S: RecordStore<Record = UserRecord>,
    Q: FailureSink,
{
    events: Arc<dyn EventRecorder>,
    store: S,
    dlq: Q,
    http: reqwest::Client,
    limiter: RateLimiter,
    endpoint: String,
    users_per_call: (u32, u32),
    calls_per_fetch: (u32, u32),
}

impl<S, Q> DataFetcher<S, Q>
where
    S: RecordStore<Record = UserRecord>,
    Q: FailureSink,
{
    /// Wire the components and ensure the store exists, creating it on
    /// first run. Construction failure is fatal; there is no degraded
    /// start.
    pub async fn new(
        config: &Config,
        events: Arc<dyn EventRecorder>,
        store: S,
        dlq: Q,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let fetcher = Self {
            events,
            store,
            dlq,
            http,
            limiter: RateLimiter::per_minute(config.api_calls_per_minute),
            endpoint: config.endpoint.clone(),
            users_per_call: config.users_per_call,
            calls_per_fetch: config.calls_per_fetch,
        };

        if let Err(err) = fetcher.ensure_table().await {
            fetcher
                .events
                .error(
                    &ErrorEvent::new("[FATAL] Could not create Data Fetcher")
                        .with("error_message", err.to_string()),
                )
                .await;
            return Err(err);
        }

        Ok(fetcher)
    }

    async fn ensure_table(&self) -> Result<()> {
        if !self.store.exists().await? {
            self.store.create().await?;
        }
        Ok(())
    }

    /// Run one ingestion cycle and return its summary.
    ///
    /// Per-call failures are captured in the summary and routed to the
    /// error channel and the dead-letter sink; they never abort the
    /// cycle.
    pub async fn fetch(&self) -> FetchStatus {
        let mut status = FetchStatus::begin();
        let started = Instant::now();

        let calls = rand::rng().random_range(self.calls_per_fetch.0..=self.calls_per_fetch.1);
        for i in 1..=calls {
            self.events.info(format!("Performing call {i}/{calls}")).await;

            let batch = self.get_data(&mut status).await;
            status.users += batch.len() as u64;

            if let Err(err) = self.store.add_elements(&batch).await {
                warn!("Batch write failed, continuing cycle: {err}");
            }
        }

        status.duration = started.elapsed().as_secs_f64();
        if let Err(err) = self.events.status(&status).await {
            warn!("Could not record fetch status: {err}");
        }

        status
    }

    /// One bounded, rate-limited upstream call. Counts the attempt,
    /// classifies the response, and returns the fetched records or an
    /// empty batch on any failure. No error escapes.
    async fn get_data(&self, status: &mut FetchStatus) -> Vec<UserRecord> {
        status.api_calls += 1;
        let size = rand::rng().random_range(self.users_per_call.0..=self.users_per_call.1);

        self.limiter.acquire().await;

        match self.try_call(size).await {
            Ok(CallOutcome::Users(users)) => {
                self.events
                    .info(format!("Fetched {} users successfully.", users.len()))
                    .await;
                users
            }
            Ok(CallOutcome::Rejected(event)) => {
                self.report_failure(status, event).await;
                Vec::new()
            }
            Err(err) => {
                let event = ErrorEvent::transport(&self.endpoint, size, &err);
                self.report_failure(status, event).await;
                Vec::new()
            }
        }
    }

    async fn try_call(&self, size: u32) -> Result<CallOutcome> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("size", size)])
            .send()
            .await?;

        let code = response.status().as_u16();
        let body = response.text().await?;

        if code != 200 {
            return Ok(CallOutcome::Rejected(ErrorEvent::unexpected_status(
                code, &body,
            )));
        }

        let data: Value = serde_json::from_str(&body)?;
        if let Some(message) = data.get("message").and_then(Value::as_str) {
            if message.starts_with(SIZE_SENTINEL_PREFIX) {
                return Ok(CallOutcome::Rejected(ErrorEvent::size_sentinel(
                    &self.endpoint,
                    code,
                    &body,
                )));
            }
        }

        Ok(CallOutcome::Users(serde_json::from_value(data)?))
    }

    async fn report_failure(&self, status: &mut FetchStatus, event: ErrorEvent) {
        status.errors.push(event.clone());
        self.events.error(&event).await;
        self.dlq.send(&event).await;
    }

    /// Last recorded fetch status, read back from the status channel.
    pub async fn status(&self) -> Option<FetchStatus> {
        match self.events.peek_last_status().await {
            Ok(status) => status,
            Err(err) => {
                warn!("Could not read last fetch status: {err}");
                None
            }
        }
    }

    /// Everything currently in the store. A failed read yields an empty
    /// list; the failure is already on the error channel.
    pub async fn get(&self) -> Vec<UserRecord> {
        match self.store.get_elements().await {
            Ok(records) => records,
            Err(err) => {
                warn!("Could not read stored users: {err}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dlq::MemoryDeadLetter;
    use crate::error::AppError;
    use crate::events::MemoryRecorder;
    use crate::models::Channel;
    use crate::storage::MemoryTable;
    use async_trait::async_trait;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Store whose backend is unreachable: every call errors, including
    /// the existence check.
    struct UnreachableTable;

    #[async_trait]
    impl RecordStore for UnreachableTable {
        type Record = UserRecord;

        async fn exists(&self) -> Result<bool> {
            Err(AppError::dynamodb("endpoint unreachable"))
        }

        async fn create(&self) -> Result<()> {
            Err(AppError::dynamodb("endpoint unreachable"))
        }

        async fn add_elements(&self, _records: &[UserRecord]) -> Result<()> {
            Err(AppError::dynamodb("endpoint unreachable"))
        }

        async fn get_elements(&self) -> Result<Vec<UserRecord>> {
            Err(AppError::dynamodb("endpoint unreachable"))
        }
    }

    /// Serve one canned HTTP response per accepted connection, in order.
    async fn canned_upstream(responses: Vec<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            for response in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };

                let mut request = Vec::new();
                let mut chunk = [0u8; 1024];
                loop {
                    match socket.read(&mut chunk).await {
                        Ok(0) => break,
                        Ok(n) => {
                            request.extend_from_slice(&chunk[..n]);
                            if request.windows(4).any(|w| w == b"\r\n\r\n") {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }

                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        format!("http://{addr}/api/v2/users")
    }

    fn http_response(code: u16, reason: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {code} {reason}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn one_user_body(id: u64, last_name: &str) -> String {
        serde_json::json!([{
            "id": id,
            "last_name": last_name,
            "address": {"coordinates": {"lat": 1.0, "lng": 2.0}}
        }])
        .to_string()
    }

    fn test_config(endpoint: String, calls: u32) -> Config {
        let mut config = Config::default();
        config.endpoint = endpoint;
        config.calls_per_fetch = (calls, calls);
        config.users_per_call = (1, 1);
        // Effectively unthrottled so tests stay fast.
        config.api_calls_per_minute = 600_000;
        config.timeout_secs = 5;
        config
    }

    struct Harness {
        recorder: Arc<MemoryRecorder>,
        store: Arc<MemoryTable>,
        dlq: Arc<MemoryDeadLetter>,
        fetcher: DataFetcher<Arc<MemoryTable>, Arc<MemoryDeadLetter>>,
    }

    async fn harness(config: Config, store: Arc<MemoryTable>) -> Harness {
        let recorder = Arc::new(MemoryRecorder::new());
        let dlq = Arc::new(MemoryDeadLetter::new());
        let fetcher = DataFetcher::new(
            &config,
            recorder.clone() as Arc<dyn EventRecorder>,
            store.clone(),
            dlq.clone(),
        )
        .await
        .unwrap();

        Harness {
            recorder,
            store,
            dlq,
            fetcher,
        }
    }

    #[tokio::test]
    async fn test_two_successful_calls() {
        let endpoint = canned_upstream(vec![
            http_response(200, "OK", &one_user_body(1, "Doe")),
            http_response(200, "OK", &one_user_body(2, "Roe")),
        ])
        .await;

        let h = harness(test_config(endpoint, 2), Arc::new(MemoryTable::new())).await;
        let status = h.fetcher.fetch().await;

        assert_eq!(status.users, 2);
        assert_eq!(status.api_calls, 2);
        assert!(status.errors.is_empty());
        assert!(status.duration >= 0.0);

        let stored = h.fetcher.get().await;
        assert_eq!(stored.len(), 2);
        assert!(h.dlq.sent().is_empty());
    }

    #[tokio::test]
    async fn test_second_call_failing_continues_cycle() {
        let endpoint = canned_upstream(vec![
            http_response(200, "OK", &one_user_body(1, "Doe")),
            http_response(500, "Internal Server Error", "boom"),
        ])
        .await;

        let h = harness(test_config(endpoint, 2), Arc::new(MemoryTable::new())).await;
        let status = h.fetcher.fetch().await;

        assert_eq!(status.users, 1);
        assert_eq!(status.api_calls, 2);
        assert_eq!(status.errors.len(), 1);
        assert_eq!(status.errors[0].extra["response_code"], 500);

        // Exactly one dead-letter send for the failed call.
        assert_eq!(h.dlq.sent().len(), 1);
        assert_eq!(h.fetcher.get().await.len(), 1);
    }

    #[tokio::test]
    async fn test_size_sentinel_counts_as_failure() {
        let body = r#"{"message": "Maximum allowed size is 100"}"#;
        let endpoint = canned_upstream(vec![http_response(200, "OK", body)]).await;

        let h = harness(test_config(endpoint.clone(), 1), Arc::new(MemoryTable::new())).await;
        let status = h.fetcher.fetch().await;

        assert_eq!(status.users, 0);
        assert_eq!(status.api_calls, 1);
        assert_eq!(status.errors.len(), 1);
        assert_eq!(status.errors[0].extra["host"], endpoint);
        assert_eq!(h.dlq.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_is_contained() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/api/v2/users", listener.local_addr().unwrap());
        drop(listener);

        let h = harness(test_config(endpoint, 1), Arc::new(MemoryTable::new())).await;
        let status = h.fetcher.fetch().await;

        assert_eq!(status.users, 0);
        assert_eq!(status.api_calls, 1);
        assert_eq!(status.errors.len(), 1);
        assert!(status.errors[0].extra.contains_key("error"));
        assert_eq!(status.errors[0].extra["params"]["size"], 1);
        assert_eq!(h.dlq.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_construction_creates_missing_table() {
        let endpoint = canned_upstream(vec![]).await;
        let store = Arc::new(MemoryTable::new());

        let h = harness(test_config(endpoint, 1), store).await;

        assert_eq!(h.store.create_calls(), 1);
        assert!(h.store.exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_unreachable_store_makes_construction_fatal() {
        let recorder = Arc::new(MemoryRecorder::new());
        let result = DataFetcher::new(
            &test_config("http://127.0.0.1:1/api/v2/users".to_string(), 1),
            recorder.clone() as Arc<dyn EventRecorder>,
            UnreachableTable,
            MemoryDeadLetter::new(),
        )
        .await;

        // An existence check failing for any reason other than "not
        // found" propagates; there is no degraded start.
        assert!(matches!(result, Err(AppError::DynamoDb(_))));

        let errors = recorder.events(Channel::Error);
        assert_eq!(errors.len(), 1);
        assert!(
            errors[0]
                .message
                .contains("[FATAL] Could not create Data Fetcher")
        );
        assert!(errors[0].message.contains("endpoint unreachable"));
    }

    #[tokio::test]
    async fn test_existing_table_is_not_recreated() {
        let endpoint = canned_upstream(vec![]).await;
        let store = Arc::new(MemoryTable::existing());

        let h = harness(test_config(endpoint, 1), store).await;
        assert_eq!(h.store.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_status_reads_back_emitted_summary() {
        let endpoint = canned_upstream(vec![http_response(
            200,
            "OK",
            &one_user_body(1, "Doe"),
        )])
        .await;

        let h = harness(test_config(endpoint, 1), Arc::new(MemoryTable::new())).await;
        assert_eq!(h.fetcher.status().await, None);

        let emitted = h.fetcher.fetch().await;
        let peeked = h.fetcher.status().await.unwrap();
        assert_eq!(peeked, emitted);

        // The cycle also announced its calls on the info channel.
        let info = h.recorder.events(Channel::Info);
        assert!(info.iter().any(|e| e.message == "Performing call 1/1"));
    }
}
