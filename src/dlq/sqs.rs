// src/dlq/sqs.rs

//! SQS implementation of the dead-letter sink.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_sqs::Client;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::MessageAttributeValue;
use tracing::{info, warn};

use crate::dlq::FailureSink;
use crate::events::EventRecorder;
use crate::models::ErrorEvent;

/// Dead-letter sink backed by a named SQS queue.
///
/// The queue is resolved (or created) once at construction and its URL
/// cached. When provisioning fails the sink degrades to a logged no-op
/// instead of failing startup: dead-lettering is an auxiliary safety net,
/// not a dependency.
pub struct SqsDeadLetter {
    client: Client,
    queue_name: String,
    queue_url: Option<String>,
    events: Arc<dyn EventRecorder>,
}

impl SqsDeadLetter {
    /// Locate the queue by name, creating it when absent.
    pub async fn provision(
        client: Client,
        queue_name: &str,
        events: Arc<dyn EventRecorder>,
    ) -> Self {
        let queue_url = Self::resolve_queue(&client, queue_name, events.as_ref()).await;
        if queue_url.is_none() {
            warn!("Dead letter queue {queue_name} unavailable; payloads will be dropped");
        }

        Self {
            client,
            queue_name: queue_name.to_string(),
            queue_url,
            events,
        }
    }

    async fn resolve_queue(
        client: &Client,
        queue_name: &str,
        events: &dyn EventRecorder,
    ) -> Option<String> {
        let listed = client
            .list_queues()
            .queue_name_prefix(queue_name)
            .max_results(1)
            .send()
            .await;

        match listed {
            Ok(response) => {
                if let Some(url) = response.queue_urls().first() {
                    return Some(url.clone());
                }
            }
            Err(e) => {
                events
                    .error(&ErrorEvent::new(format!(
                        "Couldn't find queue {queue_name}. Creating..."
                    )))
                    .await;
                warn!(
                    "Could not list queues matching {queue_name}: {}",
                    DisplayErrorContext(&e)
                );
            }
        }

        match client.create_queue().queue_name(queue_name).send().await {
            Ok(response) => {
                let url = response.queue_url().map(str::to_string);
                if let Some(url) = &url {
                    events
                        .info(format!(
                            "Created queue with name {queue_name}. URL: {url}"
                        ))
                        .await;
                }
                url
            }
            Err(e) => {
                events
                    .error(
                        &ErrorEvent::new(format!("Couldn't create queue {queue_name}."))
                            .with("error", DisplayErrorContext(&e).to_string()),
                    )
                    .await;
                None
            }
        }
    }

    /// Submit a payload with SQS message attributes attached.
    pub async fn send_with_attributes(
        &self,
        payload: &ErrorEvent,
        attributes: HashMap<String, MessageAttributeValue>,
    ) {
        let Some(queue_url) = &self.queue_url else {
            warn!(
                "Dead letter queue {} unavailable; dropping payload: {}",
                self.queue_name, payload.message
            );
            return;
        };

        let body = match serde_json::to_string(payload) {
            Ok(body) => body,
            Err(e) => {
                warn!("Could not serialize dead letter payload: {e}");
                return;
            }
        };

        let sent = self
            .client
            .send_message()
            .queue_url(queue_url)
            .message_body(&body)
            .set_message_attributes(if attributes.is_empty() {
                None
            } else {
                Some(attributes)
            })
            .send()
            .await;

        match sent {
            Ok(_) => {
                info!("Dead-lettered payload to {}", self.queue_name);
                self.events
                    .info(format!(
                        "Sent message to DLQ {}: {body}",
                        self.queue_name
                    ))
                    .await;
            }
            Err(e) => {
                self.events
                    .error(
                        &ErrorEvent::new(format!(
                            "Couldn't send message to DLQ {}.",
                            self.queue_name
                        ))
                        .with("error", DisplayErrorContext(&e).to_string()),
                    )
                    .await;
            }
        }
    }
}

#[async_trait]
impl FailureSink for SqsDeadLetter {
    async fn send(&self, payload: &ErrorEvent) {
        self.send_with_attributes(payload, HashMap::new()).await;
    }
}
