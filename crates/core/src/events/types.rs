use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events emitted after successful page mutations, consumed by listener
/// surfaces (SSE, cache invalidation).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PageEvent {
    Welcome,
    Saved(SavedEvent),
    Published(PublishedEvent),
    Deleted(DeletedEvent),
    Duplicated(DuplicatedEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedEvent {
    pub page_name: String,
    pub version: i64,
    pub is_published: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedEvent {
    pub page_name: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedEvent {
    pub page_name: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicatedEvent {
    pub source_name: String,
    pub new_name: String,
    pub timestamp: DateTime<Utc>,
}
