// src/storage/users.rs

//! Schema spec for the users table.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, KeySchemaElement, KeyType, ProvisionedThroughput,
    ScalarAttributeType,
};

use crate::error::{AppError, Result};
use crate::models::UserRecord;
use crate::storage::{TableSpec, attr};

/// Users table: `(id: N HASH, last_name: S RANGE)`.
pub struct UsersSpec {
    table_name: String,
}

impl UsersSpec {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
        }
    }
}

/// Decimal string form of a coordinate.
///
/// Going through the string intermediate keeps the value in its exact
/// decimal shape; DynamoDB's `N` type is decimal, so no binary-float
/// rounding is introduced on the way in or out.
fn decimal_string(value: f64) -> String {
    format!("{value}")
}

impl TableSpec for UsersSpec {
    type Record = UserRecord;

    fn table_name(&self) -> &str {
        &self.table_name
    }

    fn key_schema(&self) -> Result<Vec<KeySchemaElement>> {
        Ok(vec![
            KeySchemaElement::builder()
                .attribute_name("id")
                .key_type(KeyType::Hash)
                .build()
                .map_err(AppError::dynamodb)?,
            KeySchemaElement::builder()
                .attribute_name("last_name")
                .key_type(KeyType::Range)
                .build()
                .map_err(AppError::dynamodb)?,
        ])
    }

    fn attribute_definitions(&self) -> Result<Vec<AttributeDefinition>> {
        Ok(vec![
            AttributeDefinition::builder()
                .attribute_name("id")
                .attribute_type(ScalarAttributeType::N)
                .build()
                .map_err(AppError::dynamodb)?,
            AttributeDefinition::builder()
                .attribute_name("last_name")
                .attribute_type(ScalarAttributeType::S)
                .build()
                .map_err(AppError::dynamodb)?,
        ])
    }

    fn provisioned_throughput(&self) -> Result<ProvisionedThroughput> {
        ProvisionedThroughput::builder()
            .read_capacity_units(1)
            .write_capacity_units(1)
            .build()
            .map_err(AppError::dynamodb)
    }

    fn serialize(&self, record: &UserRecord) -> Result<HashMap<String, AttributeValue>> {
        let mut item = attr::to_item(serde_json::to_value(record)?)?;

        // Rewrite the coordinates through the string intermediate so they
        // land as exact decimals regardless of how serde rendered them.
        let coordinates = AttributeValue::M(HashMap::from([
            (
                "lat".to_string(),
                AttributeValue::N(decimal_string(record.address.coordinates.lat)),
            ),
            (
                "lng".to_string(),
                AttributeValue::N(decimal_string(record.address.coordinates.lng)),
            ),
        ]));

        if let Some(AttributeValue::M(address)) = item.get_mut("address") {
            address.insert("coordinates".to_string(), coordinates);
        }

        Ok(item)
    }
}
