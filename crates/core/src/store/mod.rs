//! Page store abstraction.
//!
//! The engine talks to its datastore only through [`PageStore`]; any
//! transactional backend that can upsert records keyed by page name
//! satisfies the contract. Absence on read paths is `Ok(None)`, never an
//! error — `StoreError` is reserved for I/O and query failures, plus
//! operations that require an existing record.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use crate::document::name::backup_name;
use crate::document::{PageDocument, PageRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("page not found: {0}")]
    PageNotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Contract every page datastore client implements.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Upsert keyed by `page_name`; assigns a fresh, strictly increased
    /// version. First save creates the record as a draft unless
    /// `is_published` says otherwise.
    async fn save(
        &self,
        page_name: &str,
        document: &PageDocument,
        is_published: bool,
    ) -> Result<PageRecord, StoreError>;

    /// Latest record by name regardless of publish state.
    async fn load(&self, page_name: &str) -> Result<Option<PageRecord>, StoreError>;

    async fn get_published(&self, page_name: &str) -> Result<Option<PageRecord>, StoreError>;

    async fn get_draft(&self, page_name: &str) -> Result<Option<PageRecord>, StoreError>;

    /// Flip `is_published` in place, refreshing `updated_at`.
    async fn publish(&self, page_name: &str) -> Result<PageRecord, StoreError>;

    /// Remove a record by name. Idempotent.
    async fn delete(&self, page_name: &str) -> Result<(), StoreError>;

    /// Copy `page_data` into a new draft record under `new_name`.
    async fn duplicate(&self, source_name: &str, new_name: &str)
        -> Result<PageRecord, StoreError>;

    /// `duplicate` with a deterministically derived target name.
    async fn backup(&self, page_name: &str) -> Result<PageRecord, StoreError> {
        let target = backup_name(page_name, Utc::now());
        self.duplicate(page_name, &target).await
    }

    /// All saved versions for a name, newest first.
    async fn history(&self, page_name: &str) -> Result<Vec<PageRecord>, StoreError>;

    /// Case-insensitive match on page name or serialized page data.
    async fn search(&self, term: &str) -> Result<Vec<PageRecord>, StoreError>;
}
