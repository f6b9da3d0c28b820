// src/storage/dynamo.rs

//! DynamoDB implementation of the record store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{PutRequest, TableStatus, WriteRequest};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::events::EventRecorder;
use crate::models::ErrorEvent;
use crate::storage::{RecordStore, TableSpec, attr};

/// BatchWriteItem accepts at most 25 put requests per call.
const BATCH_WRITE_LIMIT: usize = 25;

/// How many unprocessed-item resubmissions to attempt per chunk.
const BATCH_RETRY_LIMIT: usize = 3;

/// Polling cadence while waiting for a created table to become ACTIVE.
const CREATE_POLL_INTERVAL: Duration = Duration::from_secs(2);
const CREATE_POLL_ATTEMPTS: usize = 60;

/// Generic DynamoDB table parameterized by a schema spec.
///
/// Failures are reported through the event recorder the way every other
/// component reports: existence checks and creation re-raise, bulk writes
/// and scans surface their error to the caller who applies the
/// best-effort policy.
pub struct DynamoTable<S: TableSpec> {
    client: Client,
    spec: S,
    events: Arc<dyn EventRecorder>,
}

impl<S> DynamoTable<S>
where
    S: TableSpec,
    S::Record: DeserializeOwned + Send + Sync,
{
    pub fn new(client: Client, spec: S, events: Arc<dyn EventRecorder>) -> Self {
        Self {
            client,
            spec,
            events,
        }
    }

    async fn wait_until_active(&self) -> Result<()> {
        for _ in 0..CREATE_POLL_ATTEMPTS {
            let described = self
                .client
                .describe_table()
                .table_name(self.spec.table_name())
                .send()
                .await;

            if let Ok(output) = described {
                let status = output.table().and_then(|t| t.table_status().cloned());
                if status == Some(TableStatus::Active) {
                    return Ok(());
                }
                debug!(
                    "Table {} not ready yet (status {:?})",
                    self.spec.table_name(),
                    status
                );
            }

            tokio::time::sleep(CREATE_POLL_INTERVAL).await;
        }

        Err(AppError::dynamodb(format!(
            "table {} did not become active in time",
            self.spec.table_name()
        )))
    }

    async fn write_chunk(&self, mut requests: Vec<WriteRequest>) -> Result<()> {
        for _ in 0..BATCH_RETRY_LIMIT {
            let output = self
                .client
                .batch_write_item()
                .request_items(self.spec.table_name(), requests)
                .send()
                .await
                .map_err(|e| AppError::dynamodb(DisplayErrorContext(&e)))?;

            let unprocessed = output
                .unprocessed_items()
                .and_then(|items| items.get(self.spec.table_name()))
                .cloned()
                .unwrap_or_default();

            if unprocessed.is_empty() {
                return Ok(());
            }
            requests = unprocessed;
        }

        Err(AppError::dynamodb(format!(
            "unprocessed items remained after {BATCH_RETRY_LIMIT} attempts"
        )))
    }
}

#[async_trait]
impl<S> RecordStore for DynamoTable<S>
where
    S: TableSpec,
    S::Record: DeserializeOwned + Send + Sync,
{
    type Record = S::Record;

    async fn exists(&self) -> Result<bool> {
        let described = self
            .client
            .describe_table()
            .table_name(self.spec.table_name())
            .send()
            .await;

        match described {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_resource_not_found_exception() {
                    return Ok(false);
                }

                self.events
                    .error(
                        &ErrorEvent::new(format!(
                            "Could not check for existence of {}",
                            self.spec.table_name()
                        ))
                        .with("error_message", service_err.to_string()),
                    )
                    .await;
                Err(AppError::dynamodb(service_err))
            }
        }
    }

    async fn create(&self) -> Result<()> {
        let result = self
            .client
            .create_table()
            .table_name(self.spec.table_name())
            .set_key_schema(Some(self.spec.key_schema()?))
            .set_attribute_definitions(Some(self.spec.attribute_definitions()?))
            .provisioned_throughput(self.spec.provisioned_throughput()?)
            .send()
            .await;

        if let Err(e) = result {
            let message = DisplayErrorContext(&e).to_string();
            self.events
                .error(&ErrorEvent::new(format!(
                    "Could not create table {}. Error: {message}",
                    self.spec.table_name()
                )))
                .await;
            return Err(AppError::DynamoDb(message));
        }

        self.wait_until_active().await?;
        info!("Created table {}", self.spec.table_name());
        Ok(())
    }

    async fn add_elements(&self, records: &[Self::Record]) -> Result<()> {
        let result: Result<()> = async {
            for chunk in records.chunks(BATCH_WRITE_LIMIT) {
                let mut requests = Vec::with_capacity(chunk.len());
                for record in chunk {
                    let item = self.spec.serialize(record)?;
                    let put = PutRequest::builder()
                        .set_item(Some(item))
                        .build()
                        .map_err(AppError::dynamodb)?;
                    requests.push(WriteRequest::builder().put_request(put).build());
                }
                self.write_chunk(requests).await?;
            }
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                self.events
                    .info(format!(
                        "Saved {} into {}",
                        records.len(),
                        self.spec.table_name()
                    ))
                    .await;
                Ok(())
            }
            Err(e) => {
                self.events
                    .error(&ErrorEvent::new(format!(
                        "Couldn't save data into table {}. Error: {e}",
                        self.spec.table_name()
                    )))
                    .await;
                Err(e)
            }
        }
    }

    async fn get_elements(&self) -> Result<Vec<Self::Record>> {
        let mut records = Vec::new();
        let mut start_key = None;

        loop {
            let scanned = self
                .client
                .scan()
                .table_name(self.spec.table_name())
                .set_exclusive_start_key(start_key.take())
                .send()
                .await;

            let output = match scanned {
                Ok(output) => output,
                Err(e) => {
                    let message = DisplayErrorContext(&e).to_string();
                    self.events
                        .error(
                            &ErrorEvent::new(format!(
                                "Couldn't get elements from table {}",
                                self.spec.table_name()
                            ))
                            .with("error_message", message.clone()),
                        )
                        .await;
                    return Err(AppError::DynamoDb(message));
                }
            };

            for item in output.items().iter().cloned() {
                let value = attr::from_item(item)?;
                records.push(serde_json::from_value(value)?);
            }

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(records)
    }
}
