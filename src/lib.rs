// src/lib.rs

//! Fetcher Library
//!
//! Periodically pulls randomized user profiles from a public HTTP API,
//! rate-limits the calls, persists results to DynamoDB, records
//! operational events to CloudWatch Logs, and dead-letters failed
//! operations to SQS.

pub mod dlq;
pub mod error;
pub mod events;
pub mod models;
pub mod service;
pub mod storage;
pub mod utils;
