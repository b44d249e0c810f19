/// Page name conventions.
///
/// Page names are the business key of the store and follow conventions:
/// - Working page: `{name}`
/// - Backup copy: `{name}_backup_{YYYYMMDDHHMMSS}`
use chrono::{DateTime, NaiveDate, Utc};

const BACKUP_INFIX: &str = "_backup_";
const BACKUP_STAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const BACKUP_STAMP_LEN: usize = 14;

/// Derive the deterministic backup name for a source page at a point in time.
pub fn backup_name(source: &str, at: DateTime<Utc>) -> String {
    format!("{source}{BACKUP_INFIX}{}", at.format(BACKUP_STAMP_FORMAT))
}

/// If `name` is a backup name, return the source page name it was taken from.
pub fn backup_source(name: &str) -> Option<&str> {
    let idx = name.rfind(BACKUP_INFIX)?;
    let stamp = &name[idx + BACKUP_INFIX.len()..];
    if stamp.len() == BACKUP_STAMP_LEN && stamp.bytes().all(|b| b.is_ascii_digit()) {
        Some(&name[..idx])
    } else {
        None
    }
}

pub fn is_backup(name: &str) -> bool {
    backup_source(name).is_some()
}

/// Conventional filename for an exported page document.
pub fn export_file_name(page_name: &str, date: NaiveDate) -> String {
    format!("{page_name}_{}.json", date.format("%Y-%m-%d"))
}
