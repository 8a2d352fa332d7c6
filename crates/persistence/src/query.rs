use uuid::Uuid;

use crate::EventRecord;

/// Filter for reading the event log.
///
/// Selects the events of a set of aggregates, for histories that span
/// several documents (an order with its payment and shipment).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    /// Aggregates whose events are returned. Empty matches nothing.
    pub aggregate_ids: Vec<Uuid>,
}

impl EventQuery {
    /// Creates a query for the events of every aggregate in `ids`.
    pub fn for_aggregates(ids: impl IntoIterator<Item = Uuid>) -> Self {
        let mut aggregate_ids: Vec<Uuid> = ids.into_iter().collect();
        aggregate_ids.sort_unstable();
        aggregate_ids.dedup();
        Self { aggregate_ids }
    }

    /// Returns true if `event` belongs to one of the queried aggregates.
    pub fn matches(&self, event: &EventRecord) -> bool {
        self.aggregate_ids.binary_search(&event.aggregate_id).is_ok()
    }
}
