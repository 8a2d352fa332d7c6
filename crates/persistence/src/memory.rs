use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    Document, EventQuery, EventRecord, Result, StoreError, Version,
    store::{DocumentStore, Write, validate_save},
};

type DocumentKey = (String, Uuid);

/// In-memory document store.
///
/// Used for tests and for running the API without a database. Provides the
/// same concurrency guarantees as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<HashMap<DocumentKey, Document>>>,
    events: Arc<RwLock<Vec<EventRecord>>>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of documents stored.
    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Returns the total number of events recorded.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Clears all documents and events.
    pub async fn clear(&self) {
        self.documents.write().await.clear();
        self.events.write().await.clear();
    }
}

/// Version of `key` as left by the writes checked so far.
fn version_in_batch(
    documents: &HashMap<DocumentKey, Document>,
    pending: &HashMap<DocumentKey, Version>,
    key: &DocumentKey,
) -> Version {
    pending
        .get(key)
        .copied()
        .or_else(|| documents.get(key).map(|d| d.version))
        .unwrap_or(Version::initial())
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn commit(&self, writes: Vec<Write>) -> Result<()> {
        for write in &writes {
            if let Write::Save {
                document,
                events,
                options,
            } = write
            {
                validate_save(document, events, options)?;
            }
        }

        // Lock order: documents, then events. Both stay held until the batch
        // is applied, so readers never see half of it.
        let mut documents = self.documents.write().await;
        let mut log = self.events.write().await;

        let mut pending: HashMap<DocumentKey, Version> = HashMap::new();
        for write in &writes {
            let (kind, id) = write.key();
            let key = (kind.to_string(), id);
            let current = version_in_batch(&documents, &pending, &key);

            match write {
                Write::Save {
                    document, options, ..
                } => {
                    if let Some(expected) = options.expected_version
                        && current != expected
                    {
                        return Err(StoreError::ConcurrencyConflict {
                            kind: key.0,
                            id,
                            expected,
                            actual: current,
                        });
                    }
                    pending.insert(key, document.version);
                }
                Write::Delete { expected, .. } => {
                    if current.is_initial() {
                        return Err(StoreError::NotFound { kind: key.0, id });
                    }
                    if let Some(expected) = *expected
                        && current != expected
                    {
                        return Err(StoreError::ConcurrencyConflict {
                            kind: key.0,
                            id,
                            expected,
                            actual: current,
                        });
                    }
                    pending.insert(key, Version::initial());
                }
            }
        }

        for write in writes {
            match write {
                Write::Save {
                    document, events, ..
                } => {
                    documents.insert((document.kind.clone(), document.id), document);
                    log.extend(events);
                }
                Write::Delete { kind, id, .. } => {
                    documents.remove(&(kind, id));
                }
            }
        }
        Ok(())
    }

    async fn load(&self, kind: &str, id: Uuid) -> Result<Option<Document>> {
        let documents = self.documents.read().await;
        Ok(documents.get(&(kind.to_string(), id)).cloned())
    }

    async fn load_all(&self, kind: &str) -> Result<Vec<Document>> {
        let documents = self.documents.read().await;
        let mut matching: Vec<Document> = documents
            .values()
            .filter(|d| d.kind == kind)
            .cloned()
            .collect();
        matching.sort_by_key(|d| d.id);
        Ok(matching)
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventRecord>> {
        let events = self.events.read().await;
        // Insertion order is the log order; a stable sort keeps it for ties.
        let mut matching: Vec<_> = events.iter().filter(|e| query.matches(e)).cloned().collect();
        matching.sort_by_key(|e| e.timestamp);
        Ok(matching)
    }
}
