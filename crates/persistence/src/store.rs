use async_trait::async_trait;
use uuid::Uuid;

use crate::{Document, EventQuery, EventRecord, Result, StoreError, Version};

/// Options for saving a document.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Expected stored version for optimistic concurrency control.
    /// If None, no version check is performed (use with caution).
    pub expected_version: Option<Version>,
}

impl SaveOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the document to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting the document to not exist yet.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// One change in a [`DocumentStore::commit`] batch.
#[derive(Debug, Clone)]
pub enum Write {
    /// Stores a document and the events raised with it.
    Save {
        document: Document,
        events: Vec<EventRecord>,
        options: SaveOptions,
    },
    /// Removes a document, optionally checking its version first.
    Delete {
        kind: String,
        id: Uuid,
        expected: Option<Version>,
    },
}

impl Write {
    /// The `(kind, id)` the write touches.
    pub fn key(&self) -> (&str, Uuid) {
        match self {
            Write::Save { document, .. } => (&document.kind, document.id),
            Write::Delete { kind, id, .. } => (kind, *id),
        }
    }
}

/// Core trait for document store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Applies a batch of writes atomically.
    ///
    /// Either every document and event in the batch is stored or nothing
    /// is. Each write's expected version is checked against the stored
    /// version as left by the earlier writes of the batch; the first
    /// mismatch fails the whole batch with `ConcurrencyConflict`.
    async fn commit(&self, writes: Vec<Write>) -> Result<()>;

    /// Writes a document and the events raised with it.
    ///
    /// Returns the stored version.
    async fn save(
        &self,
        document: Document,
        events: Vec<EventRecord>,
        options: SaveOptions,
    ) -> Result<Version> {
        let version = document.version;
        self.commit(vec![Write::Save {
            document,
            events,
            options,
        }])
        .await?;
        Ok(version)
    }

    /// Deletes a document, optionally checking its version first.
    async fn delete(&self, kind: &str, id: Uuid, expected: Option<Version>) -> Result<()> {
        self.commit(vec![Write::Delete {
            kind: kind.to_string(),
            id,
            expected,
        }])
        .await
    }

    /// Loads a document by kind and id.
    async fn load(&self, kind: &str, id: Uuid) -> Result<Option<Document>>;

    /// Loads every document of a kind.
    async fn load_all(&self, kind: &str) -> Result<Vec<Document>>;

    /// Retrieves events matching a query, oldest first.
    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventRecord>>;

    /// Retrieves all events recorded for an aggregate, oldest first.
    async fn events_for_aggregate(&self, aggregate_id: Uuid) -> Result<Vec<EventRecord>> {
        self.query_events(EventQuery::for_aggregates([aggregate_id]))
            .await
    }
}

/// Extension trait providing convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Checks if a document exists.
    async fn exists(&self, kind: &str, id: Uuid) -> Result<bool> {
        Ok(self.load(kind, id).await?.is_some())
    }

    /// Gets the stored version of a document.
    ///
    /// Returns None if the document doesn't exist.
    async fn stored_version(&self, kind: &str, id: Uuid) -> Result<Option<Version>> {
        Ok(self.load(kind, id).await?.map(|doc| doc.version))
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}

/// Validates a save request before it reaches storage.
///
/// A document saved several times in one unit of work arrives with the
/// version it was loaded at as the expected version, so the new version
/// only has to be later than that.
pub fn validate_save(
    document: &Document,
    events: &[EventRecord],
    options: &SaveOptions,
) -> Result<()> {
    if let Some(expected) = options.expected_version
        && document.version <= expected
    {
        return Err(StoreError::InvalidSave(format!(
            "Document version must be after the expected version. Expected more than {expected}, got {}",
            document.version
        )));
    }

    for event in events {
        if event.aggregate_id != document.id {
            return Err(StoreError::InvalidSave(
                "All events must belong to the saved document".to_string(),
            ));
        }
        if event.aggregate_type != document.kind {
            return Err(StoreError::InvalidSave(
                "All events must have the document's aggregate type".to_string(),
            ));
        }
    }

    Ok(())
}
