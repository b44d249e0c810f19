//! Postgres-backed [`PageStore`] client.
//!
//! Saves run in a transaction so the upsert and its revision row commit
//! together. Queries are runtime-bound; the schema lives in `migrations/`.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::document::{PageDocument, PageRecord};

use super::{PageStore, StoreError};

const RECORD_COLUMNS: &str =
    "id, page_name, page_data, version, is_published, created_at, updated_at";

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_by_name(
        &self,
        page_name: &str,
        published: Option<bool>,
    ) -> Result<Option<PageRecord>, StoreError> {
        let sql = match published {
            None => format!("SELECT {RECORD_COLUMNS} FROM pages WHERE page_name = $1"),
            Some(_) => format!(
                "SELECT {RECORD_COLUMNS} FROM pages WHERE page_name = $1 AND is_published = $2"
            ),
        };
        let mut query = sqlx::query(&sql).bind(page_name);
        if let Some(flag) = published {
            query = query.bind(flag);
        }
        let row = query.fetch_optional(&self.pool).await?;
        row.as_ref().map(record_from_row).transpose()
    }
}

fn record_from_row(row: &PgRow) -> Result<PageRecord, StoreError> {
    let page_data: Value = row.try_get("page_data")?;
    Ok(PageRecord {
        id: row.try_get("id")?,
        page_name: row.try_get("page_name")?,
        page_data: serde_json::from_value(page_data)?,
        version: row.try_get("version")?,
        is_published: row.try_get("is_published")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

#[async_trait]
impl PageStore for PostgresStore {
    async fn save(
        &self,
        page_name: &str,
        document: &PageDocument,
        is_published: bool,
    ) -> Result<PageRecord, StoreError> {
        let page_data = serde_json::to_value(document)?;
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO pages (id, page_name, page_data, version, is_published) \
             VALUES ($1, $2, $3, 1, $4) \
             ON CONFLICT (page_name) DO UPDATE SET \
                 page_data = EXCLUDED.page_data, \
                 is_published = EXCLUDED.is_published, \
                 version = pages.version + 1, \
                 updated_at = now() \
             RETURNING {RECORD_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(page_name)
            .bind(&page_data)
            .bind(is_published)
            .fetch_one(&mut *tx)
            .await?;
        let record = record_from_row(&row)?;

        sqlx::query(
            "INSERT INTO page_revisions (id, page_id, page_name, page_data, version, is_published) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::new_v4())
        .bind(record.id)
        .bind(&record.page_name)
        .bind(&page_data)
        .bind(record.version)
        .bind(record.is_published)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(record)
    }

    async fn load(&self, page_name: &str) -> Result<Option<PageRecord>, StoreError> {
        self.fetch_by_name(page_name, None).await
    }

    async fn get_published(&self, page_name: &str) -> Result<Option<PageRecord>, StoreError> {
        self.fetch_by_name(page_name, Some(true)).await
    }

    async fn get_draft(&self, page_name: &str) -> Result<Option<PageRecord>, StoreError> {
        self.fetch_by_name(page_name, Some(false)).await
    }

    async fn publish(&self, page_name: &str) -> Result<PageRecord, StoreError> {
        let sql = format!(
            "UPDATE pages SET is_published = true, updated_at = now() \
             WHERE page_name = $1 RETURNING {RECORD_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(page_name)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => record_from_row(&row),
            None => Err(StoreError::PageNotFound(page_name.to_string())),
        }
    }

    async fn delete(&self, page_name: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM pages WHERE page_name = $1")
            .bind(page_name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn duplicate(
        &self,
        source_name: &str,
        new_name: &str,
    ) -> Result<PageRecord, StoreError> {
        let mut tx = self.pool.begin().await?;

        let source = sqlx::query("SELECT page_data FROM pages WHERE page_name = $1")
            .bind(source_name)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::PageNotFound(source_name.to_string()))?;
        let page_data: Value = source.try_get("page_data")?;

        let sql = format!(
            "INSERT INTO pages (id, page_name, page_data, version, is_published) \
             VALUES ($1, $2, $3, 1, false) RETURNING {RECORD_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(new_name)
            .bind(&page_data)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Conflict(format!("page name already exists: {new_name}"))
                } else {
                    StoreError::Database(e)
                }
            })?;
        let record = record_from_row(&row)?;

        sqlx::query(
            "INSERT INTO page_revisions (id, page_id, page_name, page_data, version, is_published) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::new_v4())
        .bind(record.id)
        .bind(&record.page_name)
        .bind(&page_data)
        .bind(record.version)
        .bind(record.is_published)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(record)
    }

    async fn history(&self, page_name: &str) -> Result<Vec<PageRecord>, StoreError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM page_revisions \
             WHERE page_name = $1 ORDER BY version DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(page_name)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(record_from_row).collect()
    }

    async fn search(&self, term: &str) -> Result<Vec<PageRecord>, StoreError> {
        let pattern = format!("%{term}%");
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM pages \
             WHERE page_name ILIKE $1 OR page_data::text ILIKE $1 \
             ORDER BY updated_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(record_from_row).collect()
    }
}
