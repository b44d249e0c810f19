//! Synchronization orchestrator.
//!
//! Composes the page store, the local cache and the validator into the two
//! operations the editing surface relies on: fallback-chained loading and
//! backup-guaranteed saving. The auto-save schedule lives in [`autosave`].

pub mod autosave;

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::warn;

use crate::cache::LocalCache;
use crate::document::validate::validate_document;
use crate::document::{PageDocument, PageRecord, ValidationReport};
use crate::store::{PageStore, StoreError};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("document failed validation: {0}")]
    Validation(ValidationReport),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a single remote tier produced during fallback loading.
///
/// Modeled as data rather than thrown-error control flow so callers and
/// tests can tell "legitimately not found" apart from "the store errored".
#[derive(Debug)]
pub enum TierOutcome {
    Found(PageRecord),
    Absent,
    Failed(StoreError),
}

impl From<Result<Option<PageRecord>, StoreError>> for TierOutcome {
    fn from(result: Result<Option<PageRecord>, StoreError>) -> Self {
        match result {
            Ok(Some(record)) => TierOutcome::Found(record),
            Ok(None) => TierOutcome::Absent,
            Err(err) => TierOutcome::Failed(err),
        }
    }
}

/// Which tier satisfied a fallback load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Published,
    Draft,
    Any,
    Cache,
    Default,
}

impl LoadSource {
    fn as_str(self) -> &'static str {
        match self {
            LoadSource::Published => "published",
            LoadSource::Draft => "draft",
            LoadSource::Any => "any",
            LoadSource::Cache => "cache",
            LoadSource::Default => "default",
        }
    }
}

struct Inner<S> {
    store: S,
    cache: LocalCache,
    /// Per-page save locks. Manual saves wait; auto-save ticks skip.
    locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

/// Orchestrates loading and saving for the page builder. Cheap to clone;
/// clones share the store, cache and per-page locks.
pub struct SyncOrchestrator<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for SyncOrchestrator<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: PageStore> SyncOrchestrator<S> {
    pub fn new(store: S, cache: LocalCache) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                cache,
                locks: StdMutex::new(HashMap::new()),
            }),
        }
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    pub fn cache(&self) -> &LocalCache {
        &self.inner.cache
    }

    /// Load a page, trying tiers strictly in priority order:
    /// published > draft > any > local cache > `default_document`.
    ///
    /// Never fails: a failing remote tier is logged and treated as absent,
    /// and the default document is always available as the terminal tier.
    pub async fn load_with_fallback(
        &self,
        page_name: &str,
        default_document: &PageDocument,
    ) -> PageDocument {
        self.load_traced(page_name, default_document).await.0
    }

    /// [`load_with_fallback`](Self::load_with_fallback), also reporting
    /// which tier won.
    pub async fn load_traced(
        &self,
        page_name: &str,
        default_document: &PageDocument,
    ) -> (PageDocument, LoadSource) {
        for source in [LoadSource::Published, LoadSource::Draft, LoadSource::Any] {
            let result = match source {
                LoadSource::Published => self.inner.store.get_published(page_name).await,
                LoadSource::Draft => self.inner.store.get_draft(page_name).await,
                _ => self.inner.store.load(page_name).await,
            };
            match TierOutcome::from(result) {
                TierOutcome::Found(record) => {
                    tracing::debug!(page = page_name, tier = source.as_str(), "page loaded");
                    return (record.page_data, source);
                }
                TierOutcome::Absent => {}
                TierOutcome::Failed(err) => {
                    warn!(
                        page = page_name,
                        tier = source.as_str(),
                        error = %err,
                        "remote tier failed, falling through"
                    );
                }
            }
        }

        match self.inner.cache.get(page_name) {
            Ok(Some(entry)) => {
                tracing::debug!(page = page_name, tier = "cache", "page loaded");
                return (entry.document, LoadSource::Cache);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(page = page_name, error = %err, "cache tier failed, falling through");
            }
        }

        (default_document.clone(), LoadSource::Default)
    }

    /// Save a page, mirroring it into the local cache whatever the remote
    /// outcome.
    ///
    /// Validation gates the save before any I/O. On remote failure the
    /// cache mirror is still written (flagged as failed) before the
    /// original error is returned, so the newest document survives
    /// locally either way.
    pub async fn save_with_backup(
        &self,
        page_name: &str,
        document: &PageDocument,
        is_published: bool,
    ) -> Result<PageRecord, SyncError> {
        let lock = self.page_lock(page_name);
        let _guard = lock.lock().await;
        self.save_locked(page_name, document, is_published).await
    }

    /// The save path proper; callers must hold the page's lock.
    async fn save_locked(
        &self,
        page_name: &str,
        document: &PageDocument,
        is_published: bool,
    ) -> Result<PageRecord, SyncError> {
        let report = validate_document(document);
        if !report.valid {
            return Err(SyncError::Validation(report));
        }

        let result = self.inner.store.save(page_name, document, is_published).await;

        // The mirror is best-effort: a cache write failure is logged, never
        // allowed to mask the remote outcome.
        if let Err(err) = self.inner.cache.set(page_name, document) {
            warn!(page = page_name, error = %err, "local cache write failed");
        } else if result.is_err() {
            if let Err(err) = self.inner.cache.set_failed(page_name) {
                warn!(page = page_name, error = %err, "failed to flag cache entry");
            }
        }

        result.map_err(SyncError::Store)
    }

    fn page_lock(&self, page_name: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .inner
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(locks.entry(page_name.to_string()).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ComponentInstance;
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Memory store that can be taken offline to exercise failure paths.
    struct FlakyStore {
        inner: MemoryStore,
        offline: AtomicBool,
    }

    impl FlakyStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                offline: AtomicBool::new(false),
            }
        }

        fn set_offline(&self, offline: bool) {
            self.offline.store(offline, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), StoreError> {
            if self.offline.load(Ordering::SeqCst) {
                Err(StoreError::Unavailable("connection refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl PageStore for FlakyStore {
        async fn save(
            &self,
            page_name: &str,
            document: &PageDocument,
            is_published: bool,
        ) -> Result<PageRecord, StoreError> {
            self.check()?;
            self.inner.save(page_name, document, is_published).await
        }

        async fn load(&self, page_name: &str) -> Result<Option<PageRecord>, StoreError> {
            self.check()?;
            self.inner.load(page_name).await
        }

        async fn get_published(&self, page_name: &str) -> Result<Option<PageRecord>, StoreError> {
            self.check()?;
            self.inner.get_published(page_name).await
        }

        async fn get_draft(&self, page_name: &str) -> Result<Option<PageRecord>, StoreError> {
            self.check()?;
            self.inner.get_draft(page_name).await
        }

        async fn publish(&self, page_name: &str) -> Result<PageRecord, StoreError> {
            self.check()?;
            self.inner.publish(page_name).await
        }

        async fn delete(&self, page_name: &str) -> Result<(), StoreError> {
            self.check()?;
            self.inner.delete(page_name).await
        }

        async fn duplicate(
            &self,
            source_name: &str,
            new_name: &str,
        ) -> Result<PageRecord, StoreError> {
            self.check()?;
            self.inner.duplicate(source_name, new_name).await
        }

        async fn history(&self, page_name: &str) -> Result<Vec<PageRecord>, StoreError> {
            self.check()?;
            self.inner.history(page_name).await
        }

        async fn search(&self, term: &str) -> Result<Vec<PageRecord>, StoreError> {
            self.check()?;
            self.inner.search(term).await
        }
    }

    fn orchestrator() -> (tempfile::TempDir, SyncOrchestrator<FlakyStore>) {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::with_dir(dir.path().to_path_buf()).unwrap();
        (dir, SyncOrchestrator::new(FlakyStore::new(), cache))
    }

    fn doc_with(text: &str) -> PageDocument {
        let mut props = serde_json::Map::new();
        props.insert("headline".to_string(), json!(text));
        PageDocument {
            content: vec![ComponentInstance {
                component_type: "hero".to_string(),
                id: "hero-1".to_string(),
                props,
            }],
            root: serde_json::Map::new(),
        }
    }

    fn invalid_doc() -> PageDocument {
        PageDocument {
            content: vec![
                ComponentInstance {
                    component_type: "hero".to_string(),
                    id: "x".to_string(),
                    props: serde_json::Map::new(),
                },
                ComponentInstance {
                    component_type: "cta".to_string(),
                    id: "x".to_string(),
                    props: serde_json::Map::new(),
                },
            ],
            root: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn save_mirrors_into_cache_on_success() {
        let (_dir, sync) = orchestrator();
        let doc = doc_with("one");

        let record = sync.save_with_backup("home", &doc, false).await.unwrap();
        assert_eq!(record.version, 1);

        let entry = sync.cache().get("home").unwrap().unwrap();
        assert_eq!(entry.document, doc);
        assert!(!entry.failed);
    }

    #[tokio::test]
    async fn save_mirrors_into_cache_even_when_remote_fails() {
        let (_dir, sync) = orchestrator();
        sync.store().set_offline(true);
        let doc = doc_with("offline edit");

        let err = sync.save_with_backup("home", &doc, false).await.unwrap_err();
        assert!(matches!(err, SyncError::Store(StoreError::Unavailable(_))));

        // The newest document is visible locally despite the failure.
        let entry = sync.cache().get("home").unwrap().unwrap();
        assert_eq!(entry.document, doc);
        assert!(entry.failed);
    }

    #[tokio::test]
    async fn successful_save_clears_failure_flag() {
        let (_dir, sync) = orchestrator();
        sync.store().set_offline(true);
        let _ = sync.save_with_backup("home", &doc_with("a"), false).await;
        assert!(sync.cache().get("home").unwrap().unwrap().failed);

        sync.store().set_offline(false);
        sync.save_with_backup("home", &doc_with("b"), false)
            .await
            .unwrap();
        let entry = sync.cache().get("home").unwrap().unwrap();
        assert!(!entry.failed);
        assert_eq!(entry.document, doc_with("b"));
    }

    #[tokio::test]
    async fn validation_failure_blocks_all_io() {
        let (_dir, sync) = orchestrator();

        let err = sync
            .save_with_backup("home", &invalid_doc(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));

        // Neither the store nor the cache saw the document.
        assert!(sync.store().load("home").await.unwrap().is_none());
        assert!(sync.cache().get("home").unwrap().is_none());
    }

    #[tokio::test]
    async fn load_prefers_remote_over_cache() {
        let (_dir, sync) = orchestrator();
        sync.cache().set("home", &doc_with("stale")).unwrap();
        sync.store()
            .save("home", &doc_with("fresh"), false)
            .await
            .unwrap();

        let (doc, source) = sync.load_traced("home", &PageDocument::empty()).await;
        assert_eq!(source, LoadSource::Draft);
        assert_eq!(doc, doc_with("fresh"));
    }

    #[tokio::test]
    async fn load_prefers_published_over_draft_tier() {
        let (_dir, sync) = orchestrator();
        sync.store()
            .save("home", &doc_with("live"), true)
            .await
            .unwrap();

        let (doc, source) = sync.load_traced("home", &PageDocument::empty()).await;
        assert_eq!(source, LoadSource::Published);
        assert_eq!(doc, doc_with("live"));
    }

    #[tokio::test]
    async fn load_falls_back_to_cache_when_remote_is_empty() {
        let (_dir, sync) = orchestrator();
        sync.cache()
            .set("surgery-page", &doc_with("cached session"))
            .unwrap();

        let default = doc_with("default");
        let (doc, source) = sync.load_traced("surgery-page", &default).await;
        assert_eq!(source, LoadSource::Cache);
        assert_eq!(doc, doc_with("cached session"));
    }

    #[tokio::test]
    async fn load_falls_back_to_cache_when_remote_errors() {
        let (_dir, sync) = orchestrator();
        sync.cache().set("home", &doc_with("cached")).unwrap();
        sync.store().set_offline(true);

        let (doc, source) = sync.load_traced("home", &PageDocument::empty()).await;
        assert_eq!(source, LoadSource::Cache);
        assert_eq!(doc, doc_with("cached"));
    }

    #[tokio::test]
    async fn load_never_fails_and_ends_at_default() {
        let (_dir, sync) = orchestrator();
        sync.store().set_offline(true);

        let default = doc_with("starter layout");
        let (doc, source) = sync.load_traced("brand-new", &default).await;
        assert_eq!(source, LoadSource::Default);
        assert_eq!(doc, default);
    }

    #[test]
    fn tier_outcome_tags_results() {
        let absent: Result<Option<PageRecord>, StoreError> = Ok(None);
        assert!(matches!(TierOutcome::from(absent), TierOutcome::Absent));

        let failed: Result<Option<PageRecord>, StoreError> =
            Err(StoreError::Unavailable("x".to_string()));
        assert!(matches!(TierOutcome::from(failed), TierOutcome::Failed(_)));
    }
}
