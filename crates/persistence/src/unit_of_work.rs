//! Staged writes committed as one batch.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    Document, EventQuery, EventRecord, Result, StoreError, Version,
    store::{DocumentStore, SaveOptions, Write, validate_save},
};

/// Document kind holding unique key claims.
pub const UNIQUE_KEY_KIND: &str = "UniqueKey";

type DocumentKey = (String, Uuid);

/// Deterministic document id for `key` within `scope`.
pub fn unique_key_id(scope: &str, key: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{scope}:{key}").as_bytes())
}

struct StagedDocument {
    /// Stored version the batch is checked against.
    expected: Option<Version>,
    /// Latest state written in this unit of work.
    latest: Document,
    /// Set once `latest` differs from the stored document.
    written: bool,
    deleted: bool,
    events: Vec<EventRecord>,
}

impl StagedDocument {
    fn current_version(&self) -> Version {
        if self.deleted {
            Version::initial()
        } else {
            self.latest.version
        }
    }

    fn created_here(&self) -> bool {
        self.expected.is_some_and(|v| v.is_initial())
    }
}

#[derive(Default)]
struct Staged {
    order: Vec<DocumentKey>,
    documents: HashMap<DocumentKey, StagedDocument>,
    claims: HashMap<Uuid, (String, String)>,
}

/// A document store view that holds writes back until [`flush`](Self::flush).
///
/// Reads see the staged state on top of the underlying store, so code
/// running inside one request observes its own writes. Flushing hands every
/// staged write to the underlying store's [`DocumentStore::commit`]: the
/// request's changes land together or not at all.
pub struct UnitOfWork {
    base: Arc<dyn DocumentStore>,
    staged: Mutex<Staged>,
}

impl UnitOfWork {
    pub fn new(base: Arc<dyn DocumentStore>) -> Self {
        Self {
            base,
            staged: Mutex::new(Staged::default()),
        }
    }

    /// Number of documents with staged changes.
    pub async fn pending(&self) -> usize {
        self.staged.lock().await.order.len()
    }

    /// Claims `key` within `scope` for `owner`.
    ///
    /// The claim is a document with an id derived from the key, created with
    /// `expect_new`. Two units of work claiming the same key cannot both
    /// commit; the loser's flush fails with [`StoreError::DuplicateKey`].
    pub async fn claim(&self, scope: &str, key: &str, owner: Uuid) -> Result<()> {
        let id = unique_key_id(scope, key);
        let body = serde_json::json!({ "scope": scope, "key": key, "owner": owner });
        let document = Document::from_state(id, UNIQUE_KEY_KIND, Version::first(), &body)?;

        self.stage_save(document, Vec::new(), SaveOptions::expect_new())
            .await
            .map_err(|err| match err {
                StoreError::ConcurrencyConflict { .. } => StoreError::DuplicateKey {
                    scope: scope.to_string(),
                    key: key.to_string(),
                },
                other => other,
            })?;
        self.staged
            .lock()
            .await
            .claims
            .insert(id, (scope.to_string(), key.to_string()));
        Ok(())
    }

    /// Releases a claim on `key` within `scope`, if there is one.
    pub async fn release(&self, scope: &str, key: &str) -> Result<()> {
        let id = unique_key_id(scope, key);
        if self.load(UNIQUE_KEY_KIND, id).await?.is_none() {
            return Ok(());
        }
        self.stage_delete(UNIQUE_KEY_KIND, id, None).await
    }

    /// Commits every staged write to the underlying store in one batch.
    ///
    /// The staged state is cleared whether or not the commit succeeds.
    pub async fn flush(&self) -> Result<()> {
        let staged = std::mem::take(&mut *self.staged.lock().await);
        let Staged {
            order,
            mut documents,
            claims,
        } = staged;

        let mut writes = Vec::with_capacity(order.len());
        for key in order {
            let Some(doc) = documents.remove(&key) else {
                continue;
            };
            if doc.deleted {
                let mut expected = doc.expected;
                if doc.written {
                    expected = Some(doc.latest.version);
                    writes.push(Write::Save {
                        document: doc.latest,
                        events: doc.events,
                        options: options_for(doc.expected),
                    });
                }
                writes.push(Write::Delete {
                    kind: key.0,
                    id: key.1,
                    expected,
                });
            } else {
                writes.push(Write::Save {
                    document: doc.latest,
                    events: doc.events,
                    options: options_for(doc.expected),
                });
            }
        }
        if writes.is_empty() {
            return Ok(());
        }

        tracing::debug!(writes = writes.len(), "committing unit of work");
        self.base.commit(writes).await.map_err(|err| {
            if let StoreError::ConcurrencyConflict { kind, id, .. } = &err
                && kind == UNIQUE_KEY_KIND
                && let Some((scope, key)) = claims.get(id)
            {
                return StoreError::DuplicateKey {
                    scope: scope.clone(),
                    key: key.clone(),
                };
            }
            err
        })
    }

    async fn stage_save(
        &self,
        document: Document,
        events: Vec<EventRecord>,
        options: SaveOptions,
    ) -> Result<()> {
        validate_save(&document, &events, &options)?;
        let key = (document.kind.clone(), document.id);
        let mut staged = self.staged.lock().await;

        if let Some(existing) = staged.documents.get_mut(&key) {
            let current = existing.current_version();
            if let Some(expected) = options.expected_version
                && expected != current
            {
                return Err(StoreError::ConcurrencyConflict {
                    kind: key.0,
                    id: key.1,
                    expected,
                    actual: current,
                });
            }
            if existing.deleted {
                return Err(StoreError::InvalidSave(format!(
                    "{} {} was deleted in this unit of work",
                    key.0, key.1
                )));
            }
            existing.latest = document;
            existing.written = true;
            existing.events.extend(events);
            return Ok(());
        }

        staged.order.push(key.clone());
        staged.documents.insert(
            key,
            StagedDocument {
                expected: options.expected_version,
                latest: document,
                written: true,
                deleted: false,
                events,
            },
        );
        Ok(())
    }

    async fn stage_delete(&self, kind: &str, id: Uuid, expected: Option<Version>) -> Result<()> {
        let key = (kind.to_string(), id);
        {
            let mut staged = self.staged.lock().await;
            if let Some(existing) = staged.documents.get_mut(&key) {
                let current = existing.current_version();
                if current.is_initial() {
                    return Err(StoreError::NotFound {
                        kind: key.0,
                        id,
                    });
                }
                if let Some(expected) = expected
                    && expected != current
                {
                    return Err(StoreError::ConcurrencyConflict {
                        kind: key.0,
                        id,
                        expected,
                        actual: current,
                    });
                }
                if existing.created_here() {
                    staged.documents.remove(&key);
                    staged.order.retain(|k| k != &key);
                    staged.claims.remove(&id);
                } else {
                    existing.deleted = true;
                }
                return Ok(());
            }
        }

        let stored = self
            .base
            .load(kind, id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                kind: kind.to_string(),
                id,
            })?;
        if let Some(expected) = expected
            && expected != stored.version
        {
            return Err(StoreError::ConcurrencyConflict {
                kind: kind.to_string(),
                id,
                expected,
                actual: stored.version,
            });
        }

        let mut staged = self.staged.lock().await;
        staged.order.push(key.clone());
        staged.documents.insert(
            key,
            StagedDocument {
                expected: Some(stored.version),
                latest: stored,
                written: false,
                deleted: true,
                events: Vec::new(),
            },
        );
        Ok(())
    }
}

fn options_for(expected: Option<Version>) -> SaveOptions {
    SaveOptions {
        expected_version: expected,
    }
}

#[async_trait]
impl DocumentStore for UnitOfWork {
    /// Stages the writes; nothing reaches the underlying store until
    /// [`UnitOfWork::flush`].
    async fn commit(&self, writes: Vec<Write>) -> Result<()> {
        for write in writes {
            match write {
                Write::Save {
                    document,
                    events,
                    options,
                } => self.stage_save(document, events, options).await?,
                Write::Delete { kind, id, expected } => {
                    self.stage_delete(&kind, id, expected).await?
                }
            }
        }
        Ok(())
    }

    async fn load(&self, kind: &str, id: Uuid) -> Result<Option<Document>> {
        {
            let staged = self.staged.lock().await;
            if let Some(doc) = staged.documents.get(&(kind.to_string(), id)) {
                return Ok((!doc.deleted).then(|| doc.latest.clone()));
            }
        }
        self.base.load(kind, id).await
    }

    async fn load_all(&self, kind: &str) -> Result<Vec<Document>> {
        let stored = self.base.load_all(kind).await?;
        let staged = self.staged.lock().await;

        let mut documents: Vec<Document> = stored
            .into_iter()
            .filter(|d| !staged.documents.contains_key(&(d.kind.clone(), d.id)))
            .collect();
        documents.extend(
            staged
                .documents
                .values()
                .filter(|d| !d.deleted && d.latest.kind == kind)
                .map(|d| d.latest.clone()),
        );
        documents.sort_by_key(|d| d.id);
        Ok(documents)
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventRecord>> {
        let mut events = self.base.query_events(query.clone()).await?;
        let staged = self.staged.lock().await;
        for key in &staged.order {
            if let Some(doc) = staged.documents.get(key) {
                events.extend(doc.events.iter().filter(|e| query.matches(e)).cloned());
            }
        }
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DocumentStoreExt, InMemoryDocumentStore};
    use shared_kernel::DomainEvent;

    #[derive(Debug, Clone, serde::Serialize)]
    struct Renamed {
        name: String,
    }

    impl DomainEvent for Renamed {
        fn event_type(&self) -> &'static str {
            "Renamed"
        }
    }

    fn doc(id: Uuid, version: i64, name: &str) -> Document {
        Document::from_state(id, "Thing", Version::new(version), &serde_json::json!({ "name": name }))
            .unwrap()
    }

    fn event(id: Uuid, version: i64, name: &str) -> EventRecord {
        EventRecord::from_event(
            "Thing",
            id,
            Version::new(version),
            0,
            &Renamed {
                name: name.to_string(),
            },
        )
        .unwrap()
    }

    fn unit() -> (UnitOfWork, InMemoryDocumentStore) {
        let store = InMemoryDocumentStore::new();
        (UnitOfWork::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn writes_are_visible_before_flush_and_stored_after() {
        let (unit, store) = unit();
        let id = Uuid::new_v4();

        unit.save(doc(id, 1, "a"), vec![event(id, 1, "a")], SaveOptions::expect_new())
            .await
            .unwrap();
        unit.save(doc(id, 2, "b"), vec![event(id, 2, "b")], SaveOptions::expect_version(Version::first()))
            .await
            .unwrap();

        assert_eq!(unit.load("Thing", id).await.unwrap().unwrap().body["name"], "b");
        assert_eq!(unit.load_all("Thing").await.unwrap().len(), 1);
        assert_eq!(unit.events_for_aggregate(id).await.unwrap().len(), 2);
        assert!(!store.exists("Thing", id).await.unwrap());

        unit.flush().await.unwrap();
        let stored = store.load("Thing", id).await.unwrap().unwrap();
        assert_eq!(stored.version, Version::new(2));
        assert_eq!(store.event_count().await, 2);
        assert_eq!(unit.pending().await, 0);
    }

    #[tokio::test]
    async fn a_stale_document_fails_the_whole_flush() {
        let (unit, store) = unit();
        let contested = Uuid::new_v4();
        store
            .save(doc(contested, 1, "a"), vec![], SaveOptions::expect_new())
            .await
            .unwrap();

        let fresh = Uuid::new_v4();
        unit.save(doc(fresh, 1, "new"), vec![event(fresh, 1, "new")], SaveOptions::expect_new())
            .await
            .unwrap();
        unit.save(doc(contested, 2, "mine"), vec![], SaveOptions::expect_version(Version::first()))
            .await
            .unwrap();

        // Another writer gets there first.
        store
            .save(doc(contested, 2, "theirs"), vec![], SaveOptions::expect_version(Version::first()))
            .await
            .unwrap();

        let result = unit.flush().await;
        assert!(matches!(result, Err(StoreError::ConcurrencyConflict { .. })));
        assert!(!store.exists("Thing", fresh).await.unwrap());
        assert_eq!(store.event_count().await, 0);
    }

    #[tokio::test]
    async fn deletes_hide_documents_until_flushed() {
        let (unit, store) = unit();
        let id = Uuid::new_v4();
        store
            .save(doc(id, 1, "a"), vec![], SaveOptions::expect_new())
            .await
            .unwrap();

        unit.delete("Thing", id, Some(Version::first())).await.unwrap();
        assert!(unit.load("Thing", id).await.unwrap().is_none());
        assert!(unit.load_all("Thing").await.unwrap().is_empty());
        assert!(store.exists("Thing", id).await.unwrap());

        unit.flush().await.unwrap();
        assert!(!store.exists("Thing", id).await.unwrap());

        let missing = unit.delete("Thing", id, None).await;
        assert!(matches!(missing, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn competing_claims_on_one_key_commit_once() {
        let store = InMemoryDocumentStore::new();
        let first = UnitOfWork::new(Arc::new(store.clone()));
        let second = UnitOfWork::new(Arc::new(store.clone()));

        first.claim("Email", "dup@shop.test", Uuid::new_v4()).await.unwrap();
        second.claim("Email", "dup@shop.test", Uuid::new_v4()).await.unwrap();

        first.flush().await.unwrap();
        match second.flush().await {
            Err(StoreError::DuplicateKey { scope, key }) => {
                assert_eq!(scope, "Email");
                assert_eq!(key, "dup@shop.test");
            }
            other => panic!("expected duplicate key, got {other:?}"),
        }
        assert_eq!(store.load_all(UNIQUE_KEY_KIND).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn released_keys_can_be_claimed_again() {
        let (unit, store) = unit();
        unit.claim("SKU", "LAMP-1", Uuid::new_v4()).await.unwrap();
        unit.flush().await.unwrap();

        unit.release("SKU", "LAMP-1").await.unwrap();
        unit.claim("SKU", "LAMP-2", Uuid::new_v4()).await.unwrap();
        unit.flush().await.unwrap();

        unit.claim("SKU", "LAMP-1", Uuid::new_v4()).await.unwrap();
        unit.flush().await.unwrap();
        assert_eq!(store.load_all(UNIQUE_KEY_KIND).await.unwrap().len(), 2);

        // Claiming the same key twice in one unit of work fails at once.
        unit.claim("SKU", "LAMP-3", Uuid::new_v4()).await.unwrap();
        let again = unit.claim("SKU", "LAMP-3", Uuid::new_v4()).await;
        assert!(matches!(again, Err(StoreError::DuplicateKey { .. })));
    }
}
