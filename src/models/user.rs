// src/models/user.rs

//! The fetched user profile record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One user profile as returned by the upstream API.
///
/// `(id, last_name)` is the storage identity: `id` is the table's partition
/// key and `last_name` its sort key. Every other field the API returns is
/// carried through unmodified in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    pub last_name: String,
    pub address: Address,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Address block; only the coordinates get special treatment on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub coordinates: Coordinates,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Geographic coordinates, persisted in a decimal-safe representation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl UserRecord {
    /// The `(id, last_name)` pair that uniquely identifies this record.
    pub fn key(&self) -> (u64, &str) {
        (self.id, &self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_fields_pass_through() {
        let raw = serde_json::json!({
            "id": 42,
            "last_name": "Doe",
            "first_name": "Jane",
            "address": {
                "city": "Springfield",
                "coordinates": {"lat": 1.5, "lng": -2.25}
            }
        });

        let user: UserRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(user.key(), (42, "Doe"));
        assert_eq!(user.address.coordinates.lat, 1.5);
        assert_eq!(user.extra["first_name"], "Jane");
        assert_eq!(user.address.extra["city"], "Springfield");

        // Round-trips without losing the flattened fields.
        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back, raw);
    }
}
