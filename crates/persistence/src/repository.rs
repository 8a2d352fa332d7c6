//! Typed repository over a document store.

use std::marker::PhantomData;
use std::sync::Arc;

use shared_kernel::{AggregateRoot, Page, Paged, Specification};

use crate::{Document, DocumentStore, EventRecord, Result, SaveOptions, StoreError};

/// Loads and saves one aggregate type.
///
/// The repository is responsible for:
/// 1. Mapping aggregates to documents and back
/// 2. Guarding saves with the aggregate's version
/// 3. Writing the aggregate's raised events to the event log
/// 4. Evaluating specifications against stored aggregates
pub struct Repository<A> {
    store: Arc<dyn DocumentStore>,
    _phantom: PhantomData<fn() -> A>,
}

impl<A> Clone for Repository<A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _phantom: PhantomData,
        }
    }
}

impl<A: AggregateRoot> Repository<A> {
    /// Creates a repository over `store`.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Loads an aggregate, returning None if it doesn't exist.
    pub async fn get(&self, id: A::Id) -> Result<Option<A>> {
        match self.store.load(A::aggregate_type(), id.into()).await? {
            Some(document) => Ok(Some(Self::from_document(document)?)),
            None => Ok(None),
        }
    }

    /// Loads an aggregate, failing with `NotFound` if it doesn't exist.
    pub async fn get_required(&self, id: A::Id) -> Result<A> {
        self.get(id).await?.ok_or_else(|| StoreError::NotFound {
            kind: A::aggregate_type().to_string(),
            id: id.into(),
        })
    }

    /// Returns the page of aggregates matching `spec`.
    pub async fn find<S>(&self, spec: &S, page: Page) -> Result<Paged<A>>
    where
        S: Specification<A> + ?Sized,
    {
        let all = self.load_all().await?;
        Ok(Paged::from_candidates(all, spec, page))
    }

    /// Returns every aggregate matching `spec`.
    pub async fn find_all<S>(&self, spec: &S) -> Result<Vec<A>>
    where
        S: Specification<A> + ?Sized,
    {
        Ok(self.find(spec, Page::unbounded()).await?.items)
    }

    /// Returns the first aggregate matching `spec`.
    pub async fn find_one<S>(&self, spec: &S) -> Result<Option<A>>
    where
        S: Specification<A> + ?Sized,
    {
        Ok(self.find(spec, Page::new(0, 1)).await?.items.into_iter().next())
    }

    /// Counts aggregates matching `spec`.
    pub async fn count<S>(&self, spec: &S) -> Result<usize>
    where
        S: Specification<A> + ?Sized,
    {
        Ok(self.find(spec, Page::new(0, 1)).await?.total)
    }

    /// Saves an aggregate and the events it raised.
    ///
    /// On success the aggregate's version is bumped and the drained events
    /// are returned so callers can dispatch them.
    #[tracing::instrument(skip(self, aggregate), fields(kind = A::aggregate_type(), id = %aggregate.id()))]
    pub async fn save(&self, aggregate: &mut A) -> Result<Vec<A::Event>> {
        let id = aggregate.id().into();
        let expected = aggregate.version();
        let next = expected.next();
        let events = aggregate.take_events();

        let records = events
            .iter()
            .enumerate()
            .map(|(sequence, event)| {
                EventRecord::from_event(A::aggregate_type(), id, next, sequence as i32, event)
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let document = Document::from_state(id, A::aggregate_type(), next, &*aggregate)?;
        let options = if expected.is_initial() {
            SaveOptions::expect_new()
        } else {
            SaveOptions::expect_version(expected)
        };

        let version = self.store.save(document, records, options).await?;
        aggregate.set_version(version);

        tracing::debug!(%version, events = events.len(), "aggregate saved");
        Ok(events)
    }

    /// Deletes an aggregate at its current version.
    pub async fn delete(&self, aggregate: &A) -> Result<()> {
        self.store
            .delete(
                A::aggregate_type(),
                aggregate.id().into(),
                Some(aggregate.version()),
            )
            .await
    }

    async fn load_all(&self) -> Result<Vec<A>> {
        self.store
            .load_all(A::aggregate_type())
            .await?
            .into_iter()
            .map(Self::from_document)
            .collect()
    }

    fn from_document(document: Document) -> Result<A> {
        let mut aggregate: A = serde_json::from_value(document.body)?;
        aggregate.set_version(document.version);
        Ok(aggregate)
    }
}
