//! PageForge core engine.
//!
//! Persistence and synchronization for visually-edited page documents:
//! draft/publish lifecycle over an abstracted page store, fallback-chained
//! loading, a durable local cache mirror, auto-save scheduling, and
//! portable export/import.

pub mod cache;
pub mod document;
pub mod events;
pub mod export;
pub mod store;
pub mod sync;

pub use cache::{CacheEntry, CacheError, LocalCache};
pub use document::{ComponentInstance, PageDocument, PageRecord, ValidationReport};
pub use export::{ImportError, PageExport, PageImport};
pub use store::memory::MemoryStore;
pub use store::postgres::PostgresStore;
pub use store::{PageStore, StoreError};
pub use sync::autosave::{AutoSaveHandle, DEFAULT_AUTOSAVE_INTERVAL};
pub use sync::{LoadSource, SyncError, SyncOrchestrator, TierOutcome};
