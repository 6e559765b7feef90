//! Order Model

use serde::{Deserialize, Serialize};

fn default_order_type() -> String {
    "custom".to_string()
}

fn default_status() -> String {
    "New".to_string()
}

/// The sole persisted business record.
///
/// Records arrive from two sources (local storage and the remote
/// datastore) with loosely-populated fields. Defaults are applied once
/// at the deserialization boundary so everything downstream operates
/// on a fully-populated shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Caller-assigned, unique within a consistent view. A larger id
    /// conventionally means "created later" and is used only for
    /// display ordering, never for conflict resolution.
    pub id: i64,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_order_type")]
    pub order_type: String,
    /// Amount in currency unit
    #[serde(default)]
    pub total: f64,
    /// Opaque date string
    #[serde(default)]
    pub date: String,
    /// Free-form status tag. No fixed enumeration is enforced; the
    /// statistics aggregation treats each distinct string as a bucket.
    #[serde(default = "default_status")]
    pub status: String,
}

impl Order {
    /// Create an order with the given id and every other field at its
    /// default value
    pub fn new(id: i64) -> Self {
        Self {
            id,
            full_name: String::new(),
            phone: String::new(),
            email: String::new(),
            address: String::new(),
            order_type: default_order_type(),
            total: 0.0,
            date: String::new(),
            status: default_status(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }
}
