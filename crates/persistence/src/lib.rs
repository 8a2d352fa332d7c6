//! Persistence for storefront aggregates.
//!
//! Aggregates are stored as versioned JSON documents. Every save is guarded
//! by an expected version and writes the events the aggregate raised into a
//! domain event log in the same atomic step. A [`UnitOfWork`] stages the
//! writes of one request and commits them as a single batch.

pub mod document;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod repository;
pub mod store;
pub mod unit_of_work;

pub use document::{Document, EventId, EventRecord};
pub use error::{Result, StoreError};
pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use query::EventQuery;
pub use repository::Repository;
pub use shared_kernel::Version;
pub use store::{DocumentStore, DocumentStoreExt, SaveOptions, Write};
pub use unit_of_work::UnitOfWork;
