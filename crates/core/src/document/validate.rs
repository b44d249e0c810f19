//! Structural validation for page documents.
//!
//! Runs before any persistence I/O; a failing report blocks the save. The
//! check itself never fails — malformed input produces a report, not an
//! error.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model::PageDocument;

/// Outcome of validating a page document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    fn failed(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            write!(f, "valid")
        } else {
            write!(f, "{}", self.errors.join("; "))
        }
    }
}

/// Validate a raw document payload as received from the editing surface.
pub fn validate(document: &Value) -> ValidationReport {
    let mut errors = Vec::new();

    match document.get("content") {
        None => errors.push("document content is missing".to_string()),
        Some(content) => match content.as_array() {
            None => errors.push("document content must be an array of components".to_string()),
            Some(components) => check_components(components, &mut errors),
        },
    }

    match document.get("root") {
        None => errors.push("document root is missing".to_string()),
        Some(root) if !root.is_object() => {
            errors.push("document root must be an object".to_string());
        }
        Some(_) => {}
    }

    if errors.is_empty() {
        ValidationReport::ok()
    } else {
        ValidationReport::failed(errors)
    }
}

/// Validate an already-typed document before saving it.
pub fn validate_document(document: &PageDocument) -> ValidationReport {
    match serde_json::to_value(document) {
        Ok(value) => validate(&value),
        Err(e) => ValidationReport::failed(vec![format!("document is not serializable: {e}")]),
    }
}

fn check_components(components: &[Value], errors: &mut Vec<String>) {
    let mut seen = HashSet::new();
    for (index, component) in components.iter().enumerate() {
        let id = component.get("id").and_then(Value::as_str).unwrap_or("");
        if id.is_empty() {
            errors.push(format!("component at index {index} is missing a non-empty id"));
            continue;
        }
        if !seen.insert(id.to_string()) {
            errors.push(format!("duplicate component id \"{id}\""));
        }
    }
}
