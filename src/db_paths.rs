//! Purpose: Shared database-directory and database-name path resolution helpers.
//! Exports: `default_db_dir`, `resolve_named_db_path`, `DB_FILE_EXTENSION`.
//! Role: Keep CLI and API-client path semantics aligned from one source.
//! Invariants: Default database directory remains `~/.tabula/databases`.
//! Invariants: Named database refs must not contain path separators.

use std::path::{Path, PathBuf};

pub(crate) const DB_FILE_EXTENSION: &str = "json";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum DbNameResolveError {
    Empty,
    ContainsPathSeparator,
}

pub(crate) fn default_db_dir() -> PathBuf {
    let home = std::env::var_os("HOME").unwrap_or_default();
    PathBuf::from(home).join(".tabula").join("databases")
}

pub(crate) fn resolve_named_db_path(
    name: &str,
    db_dir: &Path,
) -> Result<PathBuf, DbNameResolveError> {
    if name.is_empty() {
        return Err(DbNameResolveError::Empty);
    }
    if name.contains('/') || (cfg!(windows) && name.contains('\\')) {
        return Err(DbNameResolveError::ContainsPathSeparator);
    }
    if name.ends_with(".json") {
        return Ok(db_dir.join(name));
    }
    Ok(db_dir.join(format!("{name}.{DB_FILE_EXTENSION}")))
}
