use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A single component placed on a page by the visual builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentInstance {
    /// Component type tag, e.g. `"hero"`, `"testimonialGrid"`.
    #[serde(rename = "type")]
    pub component_type: String,
    /// Unique within the owning document.
    pub id: String,
    /// Component properties as set in the builder.
    #[serde(default)]
    pub props: serde_json::Map<String, Value>,
}

/// The editable content document for one page.
///
/// `content` is the ordered component tree; `root` holds page-level
/// properties (title, theme, SEO metadata and the like).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDocument {
    pub content: Vec<ComponentInstance>,
    #[serde(default)]
    pub root: serde_json::Map<String, Value>,
}

impl PageDocument {
    /// An empty document with no components and a bare root.
    pub fn empty() -> Self {
        Self {
            content: Vec::new(),
            root: serde_json::Map::new(),
        }
    }
}

/// Persisted unit in the page store. Maps to the `pages` PostgreSQL table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub id: Uuid,
    /// Unique business key; upsert target.
    pub page_name: String,
    pub page_data: PageDocument,
    /// Monotonically increasing; bumped on every successful save.
    pub version: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn component_type_tag_round_trips() {
        let raw = json!({
            "type": "hero",
            "id": "hero-1",
            "props": { "headline": "Welcome" }
        });
        let component: ComponentInstance = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(component.component_type, "hero");
        assert_eq!(serde_json::to_value(&component).unwrap(), raw);
    }

    #[test]
    fn document_defaults_missing_root() {
        let doc: PageDocument = serde_json::from_value(json!({ "content": [] })).unwrap();
        assert!(doc.root.is_empty());
    }
}
