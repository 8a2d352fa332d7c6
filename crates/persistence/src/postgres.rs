use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Document, EventId, EventQuery, EventRecord, Result, StoreError, Version,
    store::{DocumentStore, SaveOptions, Write, validate_save},
};

/// PostgreSQL-backed document store.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and returns a store on a fresh pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_document(row: PgRow) -> Result<Document> {
        Ok(Document {
            id: row.try_get("id")?,
            kind: row.try_get("kind")?,
            version: Version::new(row.try_get("version")?),
            updated_at: row.try_get("updated_at")?,
            body: row.try_get("body")?,
        })
    }

    fn row_to_event(row: PgRow) -> Result<EventRecord> {
        let metadata_json: serde_json::Value = row.try_get("metadata")?;
        let metadata: HashMap<String, serde_json::Value> = serde_json::from_value(metadata_json)?;

        Ok(EventRecord {
            event_id: EventId::from_uuid(row.try_get::<Uuid, _>("id")?),
            event_type: row.try_get("event_type")?,
            aggregate_id: row.try_get("aggregate_id")?,
            aggregate_type: row.try_get("aggregate_type")?,
            aggregate_version: Version::new(row.try_get("aggregate_version")?),
            sequence: row.try_get("sequence")?,
            timestamp: row.try_get("timestamp")?,
            payload: row.try_get("payload")?,
            metadata,
        })
    }

    async fn current_version(
        tx: &mut Transaction<'_, Postgres>,
        kind: &str,
        id: Uuid,
    ) -> Result<Version> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM documents WHERE kind = $1 AND id = $2")
                .bind(kind)
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?;
        Ok(Version::new(version.unwrap_or(0)))
    }

    async fn insert_events(
        tx: &mut Transaction<'_, Postgres>,
        events: &[EventRecord],
    ) -> Result<()> {
        for event in events {
            let metadata_json = serde_json::to_value(&event.metadata)?;

            sqlx::query(
                r#"
                INSERT INTO domain_events
                    (id, event_type, aggregate_id, aggregate_type, aggregate_version, sequence, timestamp, payload, metadata)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(event.event_id.as_uuid())
            .bind(&event.event_type)
            .bind(event.aggregate_id)
            .bind(&event.aggregate_type)
            .bind(event.aggregate_version.as_i64())
            .bind(event.sequence)
            .bind(event.timestamp)
            .bind(&event.payload)
            .bind(metadata_json)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    async fn apply_save(
        tx: &mut Transaction<'_, Postgres>,
        document: &Document,
        events: &[EventRecord],
        options: &SaveOptions,
    ) -> Result<()> {
        let rows_affected = match options.expected_version {
            Some(expected) if expected.is_initial() => sqlx::query(
                r#"
                INSERT INTO documents (kind, id, version, updated_at, body)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (kind, id) DO NOTHING
                "#,
            )
            .bind(&document.kind)
            .bind(document.id)
            .bind(document.version.as_i64())
            .bind(document.updated_at)
            .bind(&document.body)
            .execute(&mut **tx)
            .await?
            .rows_affected(),
            Some(expected) => sqlx::query(
                r#"
                UPDATE documents
                SET version = $3, updated_at = $4, body = $5
                WHERE kind = $1 AND id = $2 AND version = $6
                "#,
            )
            .bind(&document.kind)
            .bind(document.id)
            .bind(document.version.as_i64())
            .bind(document.updated_at)
            .bind(&document.body)
            .bind(expected.as_i64())
            .execute(&mut **tx)
            .await?
            .rows_affected(),
            None => sqlx::query(
                r#"
                INSERT INTO documents (kind, id, version, updated_at, body)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (kind, id) DO UPDATE SET
                    version = EXCLUDED.version,
                    updated_at = EXCLUDED.updated_at,
                    body = EXCLUDED.body
                "#,
            )
            .bind(&document.kind)
            .bind(document.id)
            .bind(document.version.as_i64())
            .bind(document.updated_at)
            .bind(&document.body)
            .execute(&mut **tx)
            .await?
            .rows_affected(),
        };

        if rows_affected == 0 {
            let actual = Self::current_version(tx, &document.kind, document.id).await?;
            return Err(StoreError::ConcurrencyConflict {
                kind: document.kind.clone(),
                id: document.id,
                expected: options.expected_version.unwrap_or(Version::initial()),
                actual,
            });
        }

        Self::insert_events(tx, events).await
    }

    async fn apply_delete(
        tx: &mut Transaction<'_, Postgres>,
        kind: &str,
        id: Uuid,
        expected: Option<Version>,
    ) -> Result<()> {
        let actual = Self::current_version(tx, kind, id).await?;

        if actual.is_initial() {
            return Err(StoreError::NotFound {
                kind: kind.to_string(),
                id,
            });
        }
        if let Some(expected) = expected
            && expected != actual
        {
            return Err(StoreError::ConcurrencyConflict {
                kind: kind.to_string(),
                id,
                expected,
                actual,
            });
        }

        sqlx::query("DELETE FROM documents WHERE kind = $1 AND id = $2 AND version = $3")
            .bind(kind)
            .bind(id)
            .bind(actual.as_i64())
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    #[tracing::instrument(skip_all, fields(writes = writes.len()))]
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

        // Dropping the transaction on an early return rolls the batch back.
        let mut tx = self.pool.begin().await?;
        for write in &writes {
            match write {
                Write::Save {
                    document,
                    events,
                    options,
                } => Self::apply_save(&mut tx, document, events, options).await?,
                Write::Delete { kind, id, expected } => {
                    Self::apply_delete(&mut tx, kind, *id, *expected).await?
                }
            }
        }
        tx.commit().await?;

        for write in &writes {
            if let Write::Save { document, .. } = write {
                metrics::counter!("store_saves_total", "kind" => document.kind.clone())
                    .increment(1);
            }
        }
        Ok(())
    }

    async fn load(&self, kind: &str, id: Uuid) -> Result<Option<Document>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT kind, id, version, updated_at, body
            FROM documents
            WHERE kind = $1 AND id = $2
            "#,
        )
        .bind(kind)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_document).transpose()
    }

    async fn load_all(&self, kind: &str) -> Result<Vec<Document>> {
        let rows = sqlx::query(
            r#"
            SELECT kind, id, version, updated_at, body
            FROM documents
            WHERE kind = $1
            ORDER BY id ASC
            "#,
        )
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_document).collect()
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, event_type, aggregate_id, aggregate_type, aggregate_version, sequence, timestamp, payload, metadata
            FROM domain_events
            WHERE aggregate_id = ANY($1)
            ORDER BY timestamp ASC, position ASC
            "#,
        )
        .bind(query.aggregate_ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_event).collect()
    }
}
