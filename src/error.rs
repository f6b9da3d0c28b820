// src/error.rs

//! Unified error handling for the fetcher application.

use std::fmt;

use thiserror::Error;

/// Result type alias for fetcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CloudWatch Logs error
    #[error("CloudWatch Logs error: {0}")]
    CloudWatch(String),

    /// DynamoDB error
    #[error("DynamoDB error: {0}")]
    DynamoDb(String),

    /// SQS error
    #[error("SQS error: {0}")]
    Sqs(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a CloudWatch Logs error.
    pub fn cloudwatch(message: impl fmt::Display) -> Self {
        Self::CloudWatch(message.to_string())
    }

    /// Create a DynamoDB error.
    pub fn dynamodb(message: impl fmt::Display) -> Self {
        Self::DynamoDb(message.to_string())
    }

    /// Create an SQS error.
    pub fn sqs(message: impl fmt::Display) -> Self {
        Self::Sqs(message.to_string())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
