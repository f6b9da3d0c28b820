// src/storage/mod.rs

//! Record persistence over a wide-column table.
//!
//! [`TableSpec`] supplies the schema hooks a concrete collection needs
//! (key schema, attribute types, throughput, serialization) and
//! [`RecordStore`] is the lifecycle contract the orchestrator drives:
//! existence check, creation, bulk insert, full scan. The production
//! implementation is [`DynamoTable`]; [`MemoryTable`] backs local runs
//! and tests.

pub mod attr;
pub mod dynamo;
pub mod memory;
pub mod users;

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, KeySchemaElement, ProvisionedThroughput,
};

use crate::error::Result;

pub use dynamo::DynamoTable;
pub use memory::MemoryTable;
pub use users::UsersSpec;

/// Schema hooks for one concrete table.
pub trait TableSpec: Send + Sync {
    /// Record shape stored in the table.
    type Record;

    fn table_name(&self) -> &str;

    fn key_schema(&self) -> Result<Vec<KeySchemaElement>>;

    fn attribute_definitions(&self) -> Result<Vec<AttributeDefinition>>;

    fn provisioned_throughput(&self) -> Result<ProvisionedThroughput>;

    /// Transform one record into a DynamoDB item immediately before write.
    fn serialize(&self, record: &Self::Record) -> Result<HashMap<String, AttributeValue>>;
}

/// Lifecycle contract for one persisted collection.
#[async_trait]
pub trait RecordStore: Send + Sync {
    type Record: Send + Sync;

    /// Whether the collection exists. `Ok(false)` only when the backend
    /// reports "not found"; any other failure is re-raised so callers can
    /// tell "doesn't exist yet" from "backend unreachable".
    async fn exists(&self) -> Result<bool>;

    /// Create the collection and block until it is ready for use.
    async fn create(&self) -> Result<()>;

    /// Bulk-insert records, upserting by key. An error means the batch's
    /// durability is not guaranteed; partial failure is possible.
    async fn add_elements(&self, records: &[Self::Record]) -> Result<()>;

    /// Full scan, following pagination until exhausted, pages concatenated
    /// in read order.
    async fn get_elements(&self) -> Result<Vec<Self::Record>>;
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for std::sync::Arc<T> {
    type Record = T::Record;

    async fn exists(&self) -> Result<bool> {
        (**self).exists().await
    }

    async fn create(&self) -> Result<()> {
        (**self).create().await
    }

    async fn add_elements(&self, records: &[Self::Record]) -> Result<()> {
        (**self).add_elements(records).await
    }

    async fn get_elements(&self) -> Result<Vec<Self::Record>> {
        (**self).get_elements().await
    }
}
