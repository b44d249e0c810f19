//! In-memory [`PageStore`] used by tests and offline tooling.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::document::{PageDocument, PageRecord};

use super::{PageStore, StoreError};

#[derive(Default)]
struct State {
    pages: HashMap<String, PageRecord>,
    revisions: HashMap<String, Vec<PageRecord>>,
}

/// Hash-map backed store with the same upsert/version semantics as the
/// Postgres client.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PageStore for MemoryStore {
    async fn save(
        &self,
        page_name: &str,
        document: &PageDocument,
        is_published: bool,
    ) -> Result<PageRecord, StoreError> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        let record = match state.pages.get(page_name) {
            Some(existing) => PageRecord {
                id: existing.id,
                page_name: page_name.to_string(),
                page_data: document.clone(),
                version: existing.version + 1,
                is_published,
                created_at: existing.created_at,
                updated_at: now,
            },
            None => PageRecord {
                id: Uuid::new_v4(),
                page_name: page_name.to_string(),
                page_data: document.clone(),
                version: 1,
                is_published,
                created_at: now,
                updated_at: now,
            },
        };

        state
            .pages
            .insert(page_name.to_string(), record.clone());
        state
            .revisions
            .entry(page_name.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn load(&self, page_name: &str) -> Result<Option<PageRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state.pages.get(page_name).cloned())
    }

    async fn get_published(&self, page_name: &str) -> Result<Option<PageRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .pages
            .get(page_name)
            .filter(|r| r.is_published)
            .cloned())
    }

    async fn get_draft(&self, page_name: &str) -> Result<Option<PageRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .pages
            .get(page_name)
            .filter(|r| !r.is_published)
            .cloned())
    }

    async fn publish(&self, page_name: &str) -> Result<PageRecord, StoreError> {
        let mut state = self.state.write().await;
        let record = state
            .pages
            .get_mut(page_name)
            .ok_or_else(|| StoreError::PageNotFound(page_name.to_string()))?;
        record.is_published = true;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete(&self, page_name: &str) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.pages.remove(page_name);
        Ok(())
    }

    async fn duplicate(
        &self,
        source_name: &str,
        new_name: &str,
    ) -> Result<PageRecord, StoreError> {
        let mut state = self.state.write().await;
        let source = state
            .pages
            .get(source_name)
            .ok_or_else(|| StoreError::PageNotFound(source_name.to_string()))?
            .clone();
        if state.pages.contains_key(new_name) {
            return Err(StoreError::Conflict(format!(
                "page name already exists: {new_name}"
            )));
        }

        let now = Utc::now();
        let record = PageRecord {
            id: Uuid::new_v4(),
            page_name: new_name.to_string(),
            page_data: source.page_data,
            version: 1,
            is_published: false,
            created_at: now,
            updated_at: now,
        };
        state.pages.insert(new_name.to_string(), record.clone());
        state
            .revisions
            .entry(new_name.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn history(&self, page_name: &str) -> Result<Vec<PageRecord>, StoreError> {
        let state = self.state.read().await;
        let mut revisions = state
            .revisions
            .get(page_name)
            .cloned()
            .unwrap_or_default();
        revisions.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(revisions)
    }

    async fn search(&self, term: &str) -> Result<Vec<PageRecord>, StoreError> {
        let needle = term.to_lowercase();
        let state = self.state.read().await;
        let mut hits = Vec::new();
        for record in state.pages.values() {
            let matches_name = record.page_name.to_lowercase().contains(&needle);
            let matches_data = serde_json::to_string(&record.page_data)?
                .to_lowercase()
                .contains(&needle);
            if matches_name || matches_data {
                hits.push(record.clone());
            }
        }
        hits.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ComponentInstance;
    use serde_json::json;

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

    #[tokio::test]
    async fn save_upserts_and_bumps_version() {
        let store = MemoryStore::new();
        let first = store.save("home", &doc_with("one"), false).await.unwrap();
        let second = store.save("home", &doc_with("two"), false).await.unwrap();

        assert_eq!(first.version, 1);
        assert_eq!(second.version, 2);
        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);

        let loaded = store.load("home").await.unwrap().unwrap();
        assert_eq!(loaded.page_data, doc_with("two"));
    }

    #[tokio::test]
    async fn publish_flips_state_in_place() {
        let store = MemoryStore::new();
        store.save("p1", &doc_with("draft"), false).await.unwrap();
        assert!(store.get_published("p1").await.unwrap().is_none());

        let published = store.publish("p1").await.unwrap();
        assert!(published.is_published);
        assert_eq!(published.page_name, "p1");
        assert_eq!(published.page_data, doc_with("draft"));

        assert!(store.get_published("p1").await.unwrap().is_some());
        assert!(store.get_draft("p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn publish_missing_page_is_an_error() {
        let store = MemoryStore::new();
        let err = store.publish("ghost").await.unwrap_err();
        assert!(matches!(err, StoreError::PageNotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_requires_source() {
        let store = MemoryStore::new();
        let err = store.duplicate("ghost", "copy").await.unwrap_err();
        assert!(matches!(err, StoreError::PageNotFound(_)));

        store.save("home", &doc_with("x"), true).await.unwrap();
        let copy = store.duplicate("home", "home-copy").await.unwrap();
        assert_eq!(copy.page_data, doc_with("x"));
        assert_eq!(copy.version, 1);
        assert!(!copy.is_published, "copies start as drafts");
    }

    #[tokio::test]
    async fn duplicate_into_existing_name_conflicts() {
        let store = MemoryStore::new();
        store.save("a", &doc_with("a"), false).await.unwrap();
        store.save("b", &doc_with("b"), false).await.unwrap();
        let err = store.duplicate("a", "b").await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn backup_derives_target_from_source_name() {
        let store = MemoryStore::new();
        store.save("home", &doc_with("x"), false).await.unwrap();
        let backup = store.backup("home").await.unwrap();
        assert_eq!(
            crate::document::name::backup_source(&backup.page_name),
            Some("home")
        );
    }

    #[tokio::test]
    async fn history_is_newest_first() {
        let store = MemoryStore::new();
        for text in ["one", "two", "three"] {
            store.save("home", &doc_with(text), false).await.unwrap();
        }
        let history = store.history("home").await.unwrap();
        let versions: Vec<i64> = history.iter().map(|r| r.version).collect();
        assert_eq!(versions, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn search_matches_name_and_content() {
        let store = MemoryStore::new();
        store.save("surgery-page", &doc_with("generic"), false).await.unwrap();
        store.save("landing", &doc_with("Laser Surgery"), false).await.unwrap();
        store.save("pricing", &doc_with("plans"), false).await.unwrap();

        let hits = store.search("surgery").await.unwrap();
        let names: Vec<&str> = hits.iter().map(|r| r.page_name.as_str()).collect();
        assert_eq!(hits.len(), 2);
        assert!(names.contains(&"surgery-page"));
        assert!(names.contains(&"landing"));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new();
        store.save("home", &doc_with("x"), false).await.unwrap();
        store.delete("home").await.unwrap();
        store.delete("home").await.unwrap();
        assert!(store.load("home").await.unwrap().is_none());
    }
}
