// src/storage/memory.rs

//! In-memory record store for local runs and tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::UserRecord;
use crate::storage::RecordStore;

/// Store keeping user records in a map keyed by `(id, last_name)`,
/// which gives the same upsert-by-key semantics the real table has.
#[derive(Default)]
pub struct MemoryTable {
    exists: Mutex<bool>,
    rows: Mutex<BTreeMap<(u64, String), UserRecord>>,
    create_calls: AtomicUsize,
}

impl MemoryTable {
    /// A table that does not exist yet; `create` must be called first.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table that already exists, as on a warm start.
    pub fn existing() -> Self {
        let table = Self::default();
        *table.exists.lock().expect("table lock poisoned") = true;
        table
    }

    /// How many times `create` was invoked.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for MemoryTable {
    type Record = UserRecord;

    async fn exists(&self) -> Result<bool> {
        Ok(*self.exists.lock().expect("table lock poisoned"))
    }

    async fn create(&self) -> Result<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        *self.exists.lock().expect("table lock poisoned") = true;
        Ok(())
    }

    async fn add_elements(&self, records: &[UserRecord]) -> Result<()> {
        if !*self.exists.lock().expect("table lock poisoned") {
            return Err(AppError::dynamodb("table does not exist"));
        }
        let mut rows = self.rows.lock().expect("table lock poisoned");
        for record in records {
            rows.insert((record.id, record.last_name.clone()), record.clone());
        }
        Ok(())
    }

    async fn get_elements(&self) -> Result<Vec<UserRecord>> {
        Ok(self
            .rows
            .lock()
            .expect("table lock poisoned")
            .values()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Address, Coordinates};
    use serde_json::Map;

    fn user(id: u64, last_name: &str, lat: f64) -> UserRecord {
        UserRecord {
            id,
            last_name: last_name.to_string(),
            address: Address {
                coordinates: Coordinates { lat, lng: 0.0 },
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }

    #[tokio::test]
    async fn test_exists_false_until_created() {
        let table = MemoryTable::new();
        assert!(!table.exists().await.unwrap());
        table.create().await.unwrap();
        assert!(table.exists().await.unwrap());
        assert_eq!(table.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_add_then_get_contains_every_record() {
        let table = MemoryTable::existing();
        table
            .add_elements(&[user(1, "Doe", 1.0), user(2, "Roe", 2.0)])
            .await
            .unwrap();

        let all = table.get_elements().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|u| u.key() == (1, "Doe")));
        assert!(all.iter().any(|u| u.key() == (2, "Roe")));
    }

    #[tokio::test]
    async fn test_readding_same_key_overwrites() {
        let table = MemoryTable::existing();
        table.add_elements(&[user(1, "Doe", 1.0)]).await.unwrap();
        table.add_elements(&[user(1, "Doe", 9.0)]).await.unwrap();

        let all = table.get_elements().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].address.coordinates.lat, 9.0);
    }
}
