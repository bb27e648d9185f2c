//! # Feed Protocol Messages
//!
//! Message types carried by the change feed, one hotel per message.
//!
//! ## Protocol Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Change Feed Messages                               │
//! │                                                                         │
//! │  INITIAL LOAD (one per collection)                                     │
//! │  ────────────                                                          │
//! │  source ───► Snapshot { hotelId, collection, documents: [...] }        │
//! │                                                                         │
//! │  INCREMENTAL UPDATES                                                   │
//! │  ───────────────────                                                   │
//! │  source ───► Changes { hotelId, collection, changes: [                 │
//! │                 { kind: "added",    id, data },                        │
//! │                 { kind: "modified", id, data },                        │
//! │                 { kind: "removed",  id } ] }                           │
//! │                                                                         │
//! │  CONNECTION STATUS                                                     │
//! │  ─────────────────                                                     │
//! │  source ───► Status { hotelId, status: "connected" | "disconnected" }  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Messages are serialized as adjacently tagged JSON:
//! ```json
//! { "type": "Snapshot", "payload": { "hotelId": "...", "collection": "rooms", ... } }
//! ```
//!
//! Documents stay loosely typed here (`serde_json::Value`); they are validated
//! and converted into domain types by [`crate::inbound`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Main Message Enum (Tagged Union)
// =============================================================================

/// All change feed messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum FeedMessage {
    /// Full contents of one collection. Replaces whatever was held before.
    Snapshot(SnapshotPayload),

    /// Incremental add/modify/remove events for one collection.
    Changes(ChangesPayload),

    /// Upstream connection state.
    #[serde(rename_all = "camelCase")]
    Status { hotel_id: String, status: FeedStatus },
}

impl FeedMessage {
    /// Hotel the message belongs to.
    pub fn hotel_id(&self) -> &str {
        match self {
            FeedMessage::Snapshot(p) => &p.hotel_id,
            FeedMessage::Changes(p) => &p.hotel_id,
            FeedMessage::Status { hotel_id, .. } => hotel_id,
        }
    }

    /// Returns the message type name for logging.
    pub fn message_type(&self) -> &'static str {
        match self {
            FeedMessage::Snapshot(_) => "Snapshot",
            FeedMessage::Changes(_) => "Changes",
            FeedMessage::Status { .. } => "Status",
        }
    }

    pub fn snapshot(hotel_id: &str, collection: Collection, documents: Vec<Document>) -> Self {
        FeedMessage::Snapshot(SnapshotPayload {
            hotel_id: hotel_id.to_string(),
            collection,
            documents,
        })
    }

    pub fn changes(hotel_id: &str, collection: Collection, changes: Vec<DocumentChange>) -> Self {
        FeedMessage::Changes(ChangesPayload {
            hotel_id: hotel_id.to_string(),
            collection,
            changes,
        })
    }

    pub fn status(hotel_id: &str, status: FeedStatus) -> Self {
        FeedMessage::Status {
            hotel_id: hotel_id.to_string(),
            status,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes a message from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// =============================================================================
// Collections
// =============================================================================

/// Per-hotel record collections delivered by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Rooms,
    ServiceRequests,
    InventoryItems,
    StockMovements,
    CheckoutHistory,
    Settings,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Rooms,
        Collection::ServiceRequests,
        Collection::InventoryItems,
        Collection::StockMovements,
        Collection::CheckoutHistory,
        Collection::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Rooms => "rooms",
            Collection::ServiceRequests => "service_requests",
            Collection::InventoryItems => "inventory_items",
            Collection::StockMovements => "stock_movements",
            Collection::CheckoutHistory => "checkout_history",
            Collection::Settings => "settings",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// One stored document: its id plus the raw fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Document { id: id.into(), data }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPayload {
    pub hotel_id: String,
    pub collection: Collection,
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangesPayload {
    pub hotel_id: String,
    pub collection: Collection,
    pub changes: Vec<DocumentChange>,
}

/// A single incremental event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentChange {
    Added { id: String, data: Value },
    Modified { id: String, data: Value },
    Removed { id: String },
}

impl DocumentChange {
    pub fn id(&self) -> &str {
        match self {
            DocumentChange::Added { id, .. }
            | DocumentChange::Modified { id, .. }
            | DocumentChange::Removed { id } => id,
        }
    }
}

/// Upstream connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedStatus {
    Connected,
    Disconnected,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_wire_format() {
        let msg = FeedMessage::snapshot(
            "h",
            Collection::Rooms,
            vec![Document::new("r-1", json!({ "number": "101" }))],
        );
        let value: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();

        assert_eq!(value["type"], "Snapshot");
        assert_eq!(value["payload"]["hotelId"], "h");
        assert_eq!(value["payload"]["collection"], "rooms");
        assert_eq!(value["payload"]["documents"][0]["data"]["number"], "101");
    }

    #[test]
    fn test_changes_from_json() {
        let json = r#"{
            "type": "Changes",
            "payload": {
                "hotelId": "h",
                "collection": "service_requests",
                "changes": [
                    { "kind": "added", "id": "q-1", "data": { "serviceName": "Laundry" } },
                    { "kind": "removed", "id": "q-0" }
                ]
            }
        }"#;

        let msg = FeedMessage::from_json(json).unwrap();
        assert_eq!(msg.hotel_id(), "h");
        match msg {
            FeedMessage::Changes(payload) => {
                assert_eq!(payload.collection, Collection::ServiceRequests);
                assert_eq!(payload.changes.len(), 2);
                assert_eq!(payload.changes[1], DocumentChange::Removed { id: "q-0".into() });
            }
            other => panic!("unexpected message: {}", other.message_type()),
        }
    }

    #[test]
    fn test_status_wire_format() {
        let msg = FeedMessage::status("h", FeedStatus::Disconnected);
        let json = msg.to_json().unwrap();
        assert!(json.contains(r#""status":"disconnected""#));
        assert_eq!(FeedMessage::from_json(&json).unwrap(), msg);
    }
}
