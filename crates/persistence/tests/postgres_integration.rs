//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p persistence --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use persistence::{
    Document, DocumentStore, EventQuery, EventRecord, PostgresDocumentStore, SaveOptions,
    StoreError, Version, Write,
};
use shared_kernel::DomainEvent;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for migrations
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_documents_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresDocumentStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE documents, domain_events")
        .execute(&pool)
        .await
        .unwrap();

    PostgresDocumentStore::new(pool)
}

#[derive(Debug, Clone, serde::Serialize)]
struct PriceChanged {
    cents: i64,
}

impl DomainEvent for PriceChanged {
    fn event_type(&self) -> &'static str {
        "ProductPriceChanged"
    }
}

fn product_doc(id: Uuid, version: i64, cents: i64) -> Document {
    Document::from_state(
        id,
        "Product",
        Version::new(version),
        &serde_json::json!({ "price": cents }),
    )
    .unwrap()
}

fn price_event(id: Uuid, version: i64, cents: i64) -> EventRecord {
    EventRecord::from_event(
        "Product",
        id,
        Version::new(version),
        0,
        &PriceChanged { cents },
    )
    .unwrap()
}

#[tokio::test]
async fn save_and_load_document() {
    let store = get_test_store().await;
    let id = Uuid::new_v4();

    let version = store
        .save(
            product_doc(id, 1, 1000),
            vec![price_event(id, 1, 1000)],
            SaveOptions::expect_new(),
        )
        .await
        .unwrap();
    assert_eq!(version, Version::first());

    let loaded = store.load("Product", id).await.unwrap().unwrap();
    assert_eq!(loaded.version, Version::first());
    assert_eq!(loaded.body["price"], 1000);

    let events = store.events_for_aggregate(id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "ProductPriceChanged");
}

#[tokio::test]
async fn update_with_expected_version() {
    let store = get_test_store().await;
    let id = Uuid::new_v4();

    store
        .save(product_doc(id, 1, 1000), vec![], SaveOptions::expect_new())
        .await
        .unwrap();
    store
        .save(
            product_doc(id, 2, 1500),
            vec![price_event(id, 2, 1500)],
            SaveOptions::expect_version(Version::first()),
        )
        .await
        .unwrap();

    let loaded = store.load("Product", id).await.unwrap().unwrap();
    assert_eq!(loaded.version, Version::new(2));
    assert_eq!(loaded.body["price"], 1500);
}

#[tokio::test]
async fn stale_update_conflicts_and_writes_nothing() {
    let store = get_test_store().await;
    let id = Uuid::new_v4();

    store
        .save(product_doc(id, 1, 1000), vec![], SaveOptions::expect_new())
        .await
        .unwrap();
    store
        .save(
            product_doc(id, 2, 1200),
            vec![],
            SaveOptions::expect_version(Version::first()),
        )
        .await
        .unwrap();

    let result = store
        .save(
            product_doc(id, 2, 1300),
            vec![price_event(id, 2, 1300)],
            SaveOptions::expect_version(Version::first()),
        )
        .await;

    match result {
        Err(StoreError::ConcurrencyConflict {
            expected, actual, ..
        }) => {
            assert_eq!(expected, Version::first());
            assert_eq!(actual, Version::new(2));
        }
        other => panic!("expected conflict, got {other:?}"),
    }

    assert!(store.events_for_aggregate(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_create_conflicts() {
    let store = get_test_store().await;
    let id = Uuid::new_v4();

    store
        .save(product_doc(id, 1, 1000), vec![], SaveOptions::expect_new())
        .await
        .unwrap();
    let result = store
        .save(product_doc(id, 1, 1000), vec![], SaveOptions::expect_new())
        .await;

    assert!(matches!(
        result,
        Err(StoreError::ConcurrencyConflict { .. })
    ));
}

#[tokio::test]
async fn load_all_and_delete() {
    let store = get_test_store().await;
    let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
    for id in &ids {
        store
            .save(product_doc(*id, 1, 500), vec![], SaveOptions::expect_new())
            .await
            .unwrap();
    }

    assert_eq!(store.load_all("Product").await.unwrap().len(), 3);
    assert!(store.load_all("Order").await.unwrap().is_empty());

    store
        .delete("Product", ids[0], Some(Version::first()))
        .await
        .unwrap();
    assert_eq!(store.load_all("Product").await.unwrap().len(), 2);

    let missing = store.delete("Product", ids[0], None).await;
    assert!(matches!(missing, Err(StoreError::NotFound { .. })));
}

#[tokio::test]
async fn query_events_spans_aggregates() {
    let store = get_test_store().await;
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    store
        .save(
            product_doc(first, 1, 100),
            vec![price_event(first, 1, 100)],
            SaveOptions::expect_new(),
        )
        .await
        .unwrap();
    store
        .save(
            product_doc(second, 1, 200),
            vec![price_event(second, 1, 200)],
            SaveOptions::expect_new(),
        )
        .await
        .unwrap();
    store
        .save(
            product_doc(Uuid::new_v4(), 1, 300),
            vec![],
            SaveOptions::expect_new(),
        )
        .await
        .unwrap();

    let events = store
        .query_events(EventQuery::for_aggregates([first, second]))
        .await
        .unwrap();
    let prices: Vec<_> = events.iter().map(|e| e.payload["cents"].as_i64()).collect();
    assert_eq!(prices, [Some(100), Some(200)]);
}

#[tokio::test]
async fn failed_batch_rolls_back_every_write() {
    let store = get_test_store().await;
    let existing = Uuid::new_v4();
    store
        .save(product_doc(existing, 1, 100), vec![], SaveOptions::expect_new())
        .await
        .unwrap();

    let fresh = Uuid::new_v4();
    let result = store
        .commit(vec![
            Write::Save {
                document: product_doc(fresh, 1, 500),
                events: vec![price_event(fresh, 1, 500)],
                options: SaveOptions::expect_new(),
            },
            Write::Save {
                document: product_doc(existing, 3, 900),
                events: vec![],
                options: SaveOptions::expect_version(Version::new(2)),
            },
        ])
        .await;

    assert!(matches!(
        result,
        Err(StoreError::ConcurrencyConflict { .. })
    ));
    assert!(store.load("Product", fresh).await.unwrap().is_none());
    assert!(store.events_for_aggregate(fresh).await.unwrap().is_empty());
    let untouched = store.load("Product", existing).await.unwrap().unwrap();
    assert_eq!(untouched.body["price"], 100);
}
