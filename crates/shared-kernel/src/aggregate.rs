//! Core aggregate and domain event traits.

use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::Version;

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: Serialize + Send + Sync + Clone + std::fmt::Debug {
    /// Returns the event type name.
    ///
    /// This is used for serialization and event log filtering.
    fn event_type(&self) -> &'static str;
}

/// Trait for aggregate roots.
///
/// An aggregate is the consistency boundary for a cluster of domain objects.
/// Its methods check invariants, mutate state and record the events that
/// describe what changed. The recorded events are drained by the
/// persistence layer when the aggregate is saved.
pub trait AggregateRoot: Serialize + DeserializeOwned + Send + Sync + Sized {
    /// Typed identifier of the aggregate.
    type Id: Copy + Into<Uuid> + std::fmt::Display + Send + Sync;

    /// The events this aggregate raises.
    type Event: DomainEvent;

    /// Returns the aggregate type name.
    ///
    /// Used for storage organization and routing.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's unique identifier.
    fn id(&self) -> Self::Id;

    /// Returns the persisted version of the aggregate.
    fn version(&self) -> Version;

    /// Sets the aggregate version.
    ///
    /// Called by the repository after loading or saving.
    fn set_version(&mut self, version: Version);

    /// Removes and returns the events raised since the last save.
    fn take_events(&mut self) -> Vec<Self::Event>;
}
