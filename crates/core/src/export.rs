//! Portable export/import of page documents.
//!
//! The export payload is the one bit-exact external artifact of the engine:
//! a snake_case JSON object `{ page_name, page_data, exported_at, version }`,
//! conventionally written to `{page_name}_{YYYY-MM-DD}.json`. Importing
//! never persists anything — the caller decides whether to save.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::document::name::export_file_name;
use crate::document::PageDocument;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("export payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("export payload is missing required field: {0}")]
    MissingField(&'static str),
}

/// Self-describing export payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageExport {
    pub page_name: String,
    pub page_data: PageDocument,
    pub exported_at: DateTime<Utc>,
    pub version: i64,
}

impl PageExport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Conventional filename for this payload, derived from its export date.
    pub fn file_name(&self) -> String {
        export_file_name(&self.page_name, self.exported_at.date_naive())
    }
}

/// What an import hands back: the name and document, nothing persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PageImport {
    pub page_name: String,
    pub document: PageDocument,
}

/// Build the export payload for a page at its current version.
pub fn export(page_name: &str, document: &PageDocument, version: i64) -> PageExport {
    PageExport {
        page_name: page_name.to_string(),
        page_data: document.clone(),
        exported_at: Utc::now(),
        version,
    }
}

/// Parse an export payload. `page_name` and `page_data` must both be
/// present; anything else about the payload is advisory.
pub fn import(payload: &str) -> Result<PageImport, ImportError> {
    let value: Value = serde_json::from_str(payload)?;

    let page_name = value
        .get("page_name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or(ImportError::MissingField("page_name"))?
        .to_string();
    let page_data = value
        .get("page_data")
        .ok_or(ImportError::MissingField("page_data"))?;
    let document: PageDocument = serde_json::from_value(page_data.clone())?;

    Ok(PageImport {
        page_name,
        document,
    })
}
