//! Remote endpoint actions and response envelopes
//!
//! The remote datastore exposes a single endpoint discriminated by an
//! `action` field. Mutations are POSTed as JSON and answered with a
//! [`MutationResponse`]; the connectivity probe (`ping`) and the read
//! path (`getOrders`) are query-style, the latter answered out-of-band
//! against a caller-supplied callback token.

use crate::models::Order;
use serde::{Deserialize, Serialize};

/// A mutating action posted to the remote endpoint.
///
/// Mutations carry an ISO-8601 timestamp; `clearAll` carries the
/// confirmation flag instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action")]
pub enum RemoteAction {
    #[serde(rename = "addOrder")]
    AddOrder { order: Order, timestamp: String },

    #[serde(rename = "updateStatus", rename_all = "camelCase")]
    UpdateStatus {
        order_id: i64,
        status: String,
        timestamp: String,
    },

    #[serde(rename = "deleteOrder", rename_all = "camelCase")]
    DeleteOrder { order_id: i64, timestamp: String },

    #[serde(rename = "clearAll")]
    ClearAll { confirm: bool },
}

impl RemoteAction {
    /// Wire name of the action, for logging
    pub fn name(&self) -> &'static str {
        match self {
            RemoteAction::AddOrder { .. } => "addOrder",
            RemoteAction::UpdateStatus { .. } => "updateStatus",
            RemoteAction::DeleteOrder { .. } => "deleteOrder",
            RemoteAction::ClearAll { .. } => "clearAll",
        }
    }
}

/// Response envelope for mutating actions.
///
/// Mutations must report success explicitly; an absent flag is treated
/// as a failure by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response envelope for the connectivity probe.
///
/// The remote's ping handler predates the success envelope, so the
/// flag may be absent; interpretation of an absent flag is the
/// gateway's permissive-parsing policy, not fixed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response envelope for the read path, delivered through the
/// callback channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Order>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_order_serialization() {
        let action = RemoteAction::AddOrder {
            order: Order::new(41),
            timestamp: "2025-01-01T00:00:00.000Z".to_string(),
        };

        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "addOrder");
        assert_eq!(json["order"]["id"], 41);
        assert_eq!(json["timestamp"], "2025-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_update_status_uses_camel_case_fields() {
        let action = RemoteAction::UpdateStatus {
            order_id: 9,
            status: "Shipped".to_string(),
            timestamp: "2025-01-01T00:00:00.000Z".to_string(),
        };

        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "updateStatus");
        assert_eq!(json["orderId"], 9);
        assert_eq!(json["status"], "Shipped");
    }

    #[test]
    fn test_clear_all_carries_confirm_flag() {
        let action = RemoteAction::ClearAll { confirm: true };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "clearAll");
        assert_eq!(json["confirm"], true);
    }

    #[test]
    fn test_envelopes_tolerate_missing_fields() {
        let m: MutationResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(m.success, None);
        assert_eq!(m.error, None);

        let p: ProbeResponse = serde_json::from_str(r#"{"message":"pong"}"#).unwrap();
        assert_eq!(p.success, None);
        assert_eq!(p.message.as_deref(), Some("pong"));

        let f: FetchResponse =
            serde_json::from_str(r#"{"success":true,"data":[{"id":1}]}"#).unwrap();
        assert_eq!(f.success, Some(true));
        assert_eq!(f.data.unwrap()[0].status, "New");
    }
}
