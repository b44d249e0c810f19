//! File-backed local mirror of page documents.
//!
//! One JSON file per page name under the cache directory. Entries keep the
//! last-known document, the time it was written, and whether that write
//! failed to reach the remote store. No expiry — entries persist until
//! explicitly cleared. All I/O is synchronous.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::PageDocument;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache entry is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("cache directory could not be determined")]
    NoCacheDir,
}

/// One cached page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub page_name: String,
    pub document: PageDocument,
    /// ISO-8601 timestamp of the write.
    pub saved_at: DateTime<Utc>,
    /// True when the mirrored save never reached the remote store.
    pub failed: bool,
}

pub struct LocalCache {
    root_dir: PathBuf,
}

impl LocalCache {
    /// Open the cache at its default per-user location.
    /// `PAGEFORGE_CACHE_DIR` overrides the directory explicitly.
    pub fn new() -> Result<Self, CacheError> {
        if let Ok(dir) = std::env::var("PAGEFORGE_CACHE_DIR") {
            let trimmed = dir.trim();
            if !trimmed.is_empty() {
                return Self::with_dir(PathBuf::from(trimmed));
            }
        }
        let dirs = ProjectDirs::from("", "", "pageforge").ok_or(CacheError::NoCacheDir)?;
        Self::with_dir(dirs.data_dir().join("cache"))
    }

    /// Open the cache rooted at an explicit directory.
    pub fn with_dir(root_dir: PathBuf) -> Result<Self, CacheError> {
        fs::create_dir_all(&root_dir)?;
        Ok(Self { root_dir })
    }

    /// Store the latest document for a page, clearing any failure flag.
    pub fn set(&self, page_name: &str, document: &PageDocument) -> Result<(), CacheError> {
        let entry = CacheEntry {
            page_name: page_name.to_string(),
            document: document.clone(),
            saved_at: Utc::now(),
            failed: false,
        };
        self.write_entry(&entry)
    }

    /// Mark the most recent entry for a page as not having reached the
    /// remote store. No-op when nothing is cached for the page.
    pub fn set_failed(&self, page_name: &str) -> Result<(), CacheError> {
        let Some(mut entry) = self.get(page_name)? else {
            return Ok(());
        };
        entry.failed = true;
        self.write_entry(&entry)
    }

    pub fn get(&self, page_name: &str) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.entry_path(page_name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    pub fn clear(&self, page_name: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.entry_path(page_name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Every cached entry, keyed by page name.
    pub fn list_all(&self) -> Result<HashMap<String, CacheEntry>, CacheError> {
        let mut entries = HashMap::new();
        for dir_entry in fs::read_dir(&self.root_dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = fs::read(&path)?;
            let entry: CacheEntry = serde_json::from_slice(&bytes)?;
            entries.insert(entry.page_name.clone(), entry);
        }
        Ok(entries)
    }

    fn write_entry(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        let path = self.entry_path(&entry.page_name);
        fs::write(path, serde_json::to_vec_pretty(entry)?)?;
        Ok(())
    }

    fn entry_path(&self, page_name: &str) -> PathBuf {
        self.root_dir
            .join(format!("{}.json", sanitize_file_name(page_name)))
    }
}

/// Restrict page-name keys to a conservative filename character set so the
/// cache can never write outside its directory. Anything else becomes an
/// underscore; traversal segments collapse.
fn sanitize_file_name(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    while sanitized.contains("..") {
        sanitized = sanitized.replace("..", "_");
    }

    if sanitized.is_empty() {
        "page".to_string()
    } else {
        sanitized
    }
}
