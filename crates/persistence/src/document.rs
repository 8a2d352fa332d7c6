use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_kernel::DomainEvent;
use uuid::Uuid;

use crate::Version;

shared_kernel::define_id!(
    /// Unique identifier for a recorded domain event.
    EventId
);

/// Persisted state of one aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Aggregate id.
    pub id: Uuid,

    /// Aggregate type (e.g., "Order", "Coupon").
    pub kind: String,

    /// Version of the state held in `body`.
    pub version: Version,

    /// When this version was written.
    pub updated_at: DateTime<Utc>,

    /// The aggregate state as JSON.
    pub body: serde_json::Value,
}

impl Document {
    /// Serializes `state` into a document at `version`.
    pub fn from_state<T: Serialize>(
        id: Uuid,
        kind: impl Into<String>,
        version: Version,
        state: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id,
            kind: kind.into(),
            version,
            updated_at: Utc::now(),
            body: serde_json::to_value(state)?,
        })
    }
}

/// A domain event as written to the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique identifier for this event.
    pub event_id: EventId,

    /// The type of the event (e.g., "OrderCreated", "PaymentApproved").
    pub event_type: String,

    /// The aggregate this event belongs to.
    pub aggregate_id: Uuid,

    /// The type of aggregate (e.g., "Order", "Payment").
    pub aggregate_type: String,

    /// The aggregate version the event was saved with.
    pub aggregate_version: Version,

    /// Position of the event among those saved with the same version.
    pub sequence: i32,

    /// When the event was recorded.
    pub timestamp: DateTime<Utc>,

    /// The event payload as JSON.
    pub payload: serde_json::Value,

    /// Additional metadata about the event.
    pub metadata: HashMap<String, serde_json::Value>,
}

impl EventRecord {
    /// Records a domain event raised by an aggregate.
    pub fn from_event<E: DomainEvent>(
        aggregate_type: impl Into<String>,
        aggregate_id: Uuid,
        aggregate_version: Version,
        sequence: i32,
        event: &E,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event_id: EventId::new(),
            event_type: event.event_type().to_string(),
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            aggregate_version,
            sequence,
            timestamp: Utc::now(),
            payload: serde_json::to_value(event)?,
            metadata: HashMap::new(),
        })
    }

    /// Adds a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize)]
    struct Shipped {
        tracking: String,
    }

    impl DomainEvent for Shipped {
        fn event_type(&self) -> &'static str {
            "Shipped"
        }
    }

    #[test]
    fn record_carries_event_type_and_payload() {
        let aggregate_id = Uuid::new_v4();
        let record = EventRecord::from_event(
            "Shipment",
            aggregate_id,
            Version::first(),
            0,
            &Shipped {
                tracking: "TRK-1".to_string(),
            },
        )
        .unwrap()
        .with_metadata("request_id", serde_json::json!("abc"));

        assert_eq!(record.event_type, "Shipped");
        assert_eq!(record.aggregate_type, "Shipment");
        assert_eq!(record.aggregate_id, aggregate_id);
        assert_eq!(record.payload["tracking"], "TRK-1");
        assert_eq!(
            record.metadata.get("request_id"),
            Some(&serde_json::json!("abc"))
        );
    }

    #[test]
    fn document_from_state() {
        let id = Uuid::new_v4();
        let doc =
            Document::from_state(id, "Thing", Version::first(), &serde_json::json!({"a": 1}))
                .unwrap();
        assert_eq!(doc.kind, "Thing");
        assert_eq!(doc.body["a"], 1);
    }
}
