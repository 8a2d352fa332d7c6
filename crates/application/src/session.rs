//! Per-request unit of work.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::Event;
use persistence::{DocumentStore, Repository, UnitOfWork};
use shared_kernel::AggregateRoot;
use uuid::Uuid;

use crate::authorization::Actor;
use crate::context::AppContext;
use crate::error::Result;

/// State of one request while it runs.
///
/// A session fixes the request time, hands out repositories and collects
/// the events raised by every aggregate it saves. Writes are staged in a
/// [`UnitOfWork`]; the mediator dispatches the queued events and then
/// commits every change of the request at once.
pub struct Session {
    context: AppContext,
    actor: Actor,
    now: DateTime<Utc>,
    unit: Arc<UnitOfWork>,
    raised: Vec<Event>,
}

impl Session {
    pub fn new(context: AppContext, actor: Actor) -> Self {
        let now = context.clock.now();
        let unit = Arc::new(UnitOfWork::new(context.store.clone()));
        Self {
            context,
            actor,
            now,
            unit,
            raised: Vec::new(),
        }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// The time the request is processed at.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// The request's view of the store, including its staged writes.
    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.unit.clone()
    }

    pub fn repository<A: AggregateRoot>(&self) -> Repository<A> {
        Repository::new(self.store())
    }

    /// Loads an aggregate, failing with `NotFound`.
    pub async fn load<A: AggregateRoot>(&self, id: A::Id) -> Result<A> {
        Ok(self.repository::<A>().get_required(id).await?)
    }

    /// Saves an aggregate and queues the events it raised.
    pub async fn save<A>(&mut self, aggregate: &mut A) -> Result<()>
    where
        A: AggregateRoot,
        A::Event: Into<Event>,
    {
        let events = self.repository::<A>().save(aggregate).await?;
        self.raised.extend(events.into_iter().map(Into::into));
        Ok(())
    }

    /// Reserves `key` within `scope` for `owner` when the request commits.
    ///
    /// Fails with `Conflict` if another owner holds the key, either already
    /// or by committing first.
    pub async fn claim_unique(&self, scope: &str, key: &str, owner: Uuid) -> Result<()> {
        Ok(self.unit.claim(scope, key, owner).await?)
    }

    /// Frees `key` within `scope` when the request commits.
    pub async fn release_unique(&self, scope: &str, key: &str) -> Result<()> {
        Ok(self.unit.release(scope, key).await?)
    }

    /// Writes every staged change to the store in one batch.
    #[tracing::instrument(skip_all)]
    pub async fn commit(&self) -> Result<()> {
        Ok(self.unit.flush().await?)
    }

    /// Removes and returns the events queued so far.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.raised)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.raised.is_empty()
    }
}
