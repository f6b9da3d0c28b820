// src/events/cloudwatch.rs

//! CloudWatch Logs implementation of the event recorder.

use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::Client;
use aws_sdk_cloudwatchlogs::error::DisplayErrorContext;
use aws_sdk_cloudwatchlogs::types::InputLogEvent;
use tracing::{error, info};

use crate::error::{AppError, Result};
use crate::events::EventRecorder;
use crate::models::{Channel, FetchStatus, LogConfig, LogEvent};
use crate::utils::timestamp_millis;

/// Event recorder backed by a CloudWatch Logs group with three streams.
pub struct CloudWatchRecorder {
    client: Client,
    log: LogConfig,
}

impl CloudWatchRecorder {
    /// Provision the log group and streams, then return the recorder.
    ///
    /// Idempotent: existing groups and streams are left alone, and a
    /// concurrent provisioner winning the create race counts as success.
    /// A provisioning failure here is fatal to startup.
    pub async fn provision(client: Client, log: &LogConfig) -> Result<Self> {
        let recorder = Self {
            client,
            log: log.clone(),
        };
        recorder.ensure_log_group().await?;
        recorder.ensure_log_streams().await?;
        Ok(recorder)
    }

    async fn ensure_log_group(&self) -> Result<()> {
        let described = self
            .client
            .describe_log_groups()
            .log_group_name_prefix(&self.log.group)
            .send()
            .await
            .map_err(|e| AppError::cloudwatch(DisplayErrorContext(&e)))?;

        // Prefix matching can return siblings; require the exact name.
        let exists = described
            .log_groups()
            .iter()
            .any(|g| g.log_group_name() == Some(self.log.group.as_str()));
        if exists {
            return Ok(());
        }

        let created = self
            .client
            .create_log_group()
            .log_group_name(&self.log.group)
            .tags("Frequency", "30 seconds")
            .tags("Environment", "Development")
            .tags("RetentionPeriod", self.log.retention_days.to_string())
            .tags("Type", "Backend")
            .send()
            .await;

        if let Err(e) = created {
            let service_err = e.into_service_error();
            if !service_err.is_resource_already_exists_exception() {
                error!(
                    "Could not create log group {}: {}",
                    self.log.group, service_err
                );
                return Err(AppError::cloudwatch(service_err));
            }
        } else {
            info!("Created log group {}", self.log.group);
        }

        self.client
            .put_retention_policy()
            .log_group_name(&self.log.group)
            .retention_in_days(self.log.retention_days)
            .send()
            .await
            .map_err(|e| AppError::cloudwatch(DisplayErrorContext(&e)))?;

        Ok(())
    }

    async fn ensure_log_streams(&self) -> Result<()> {
        let described = self
            .client
            .describe_log_streams()
            .log_group_name(&self.log.group)
            .send()
            .await
            .map_err(|e| AppError::cloudwatch(DisplayErrorContext(&e)))?;

        let existing: Vec<&str> = described
            .log_streams()
            .iter()
            .filter_map(|s| s.log_stream_name())
            .collect();

        let streams = &self.log.streams;
        for name in [&streams.info, &streams.error, &streams.status] {
            if existing.contains(&name.as_str()) {
                continue;
            }

            let created = self
                .client
                .create_log_stream()
                .log_group_name(&self.log.group)
                .log_stream_name(name)
                .send()
                .await;

            if let Err(e) = created {
                let service_err = e.into_service_error();
                if !service_err.is_resource_already_exists_exception() {
                    error!("Could not create log stream {name}: {service_err}");
                    return Err(AppError::cloudwatch(service_err));
                }
            } else {
                info!("Created log stream {name}");
            }
        }

        Ok(())
    }

    fn stream_name(&self, channel: Channel) -> &str {
        match channel {
            Channel::Info => &self.log.streams.info,
            Channel::Error => &self.log.streams.error,
            Channel::Status => &self.log.streams.status,
        }
    }
}

#[async_trait]
impl EventRecorder for CloudWatchRecorder {
    async fn record(&self, channel: Channel, event: LogEvent) -> Result<()> {
        let timestamp = event.timestamp.unwrap_or_else(timestamp_millis);
        let input = InputLogEvent::builder()
            .timestamp(timestamp)
            .message(event.message)
            .build()
            .map_err(AppError::cloudwatch)?;

        self.client
            .put_log_events()
            .log_group_name(&self.log.group)
            .log_stream_name(self.stream_name(channel))
            .log_events(input)
            .send()
            .await
            .map_err(|e| AppError::cloudwatch(DisplayErrorContext(&e)))?;

        Ok(())
    }

    async fn peek_last_status(&self) -> Result<Option<FetchStatus>> {
        // Without start_from_head the service reads from the tail, so
        // limit 1 yields the newest entry.
        let response = self
            .client
            .get_log_events()
            .log_group_name(&self.log.group)
            .log_stream_name(&self.log.streams.status)
            .limit(1)
            .send()
            .await
            .map_err(|e| AppError::cloudwatch(DisplayErrorContext(&e)))?;

        match response.events().first().and_then(|e| e.message()) {
            Some(message) => Ok(Some(serde_json::from_str(message)?)),
            None => Ok(None),
        }
    }
}
