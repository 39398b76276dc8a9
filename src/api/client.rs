//! Purpose: Define the public API client surface for local database resolution.
//! Exports: `DbRef`, `LocalClient`, `DatabaseInfo`, and database file lifecycle operations.
//! Role: Stable boundary for front ends; mirrors CLI resolution rules.
//! Invariants: Names resolve to `<db_dir>/<name>.json`; explicit paths are used as given.
//! Invariants: Creating a database never overwrites an existing file.
#![allow(clippy::result_large_err)]

use super::validation::{ValidationReport, validate_document};
use crate::core::codec;
use crate::core::database::Database;
use crate::core::error::{Error, ErrorKind};
use crate::db_paths::{DB_FILE_EXTENSION, DbNameResolveError, default_db_dir, resolve_named_db_path};
use std::path::{Path, PathBuf};

pub type ApiResult<T> = Result<T, Error>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DbRef {
    Name(String),
    Path(PathBuf),
}

impl DbRef {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Treats anything containing a path separator or ending in `.json` as a path.
    pub fn parse(input: &str) -> Self {
        if input.contains('/') || input.ends_with(".json") {
            Self::path(input)
        } else {
            Self::name(input)
        }
    }

    pub fn describe(&self) -> String {
        match self {
            DbRef::Name(name) => name.clone(),
            DbRef::Path(path) => path.to_string_lossy().to_string(),
        }
    }

    fn resolve_local_path(&self, db_dir: &Path) -> ApiResult<PathBuf> {
        match self {
            DbRef::Name(name) => resolve_name(name, db_dir),
            DbRef::Path(path) => Ok(path.clone()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DatabaseInfo {
    pub name: String,
    pub path: PathBuf,
    pub file_size: u64,
    pub tables: Vec<TableInfo>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableInfo {
    pub name: String,
    pub schema: String,
    pub row_count: usize,
}

impl DatabaseInfo {
    fn from_database(db: &Database, path: PathBuf, file_size: u64) -> Self {
        let tables = db
            .tables()
            .map(|table| TableInfo {
                name: table.name().to_string(),
                schema: table.schema().to_string(),
                row_count: table.len(),
            })
            .collect();
        Self {
            name: db.name().to_string(),
            path,
            file_size,
            tables,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LocalClient {
    db_dir: PathBuf,
}

impl LocalClient {
    pub fn new() -> Self {
        Self {
            db_dir: default_db_dir(),
        }
    }

    pub fn with_db_dir(mut self, db_dir: impl Into<PathBuf>) -> Self {
        self.db_dir = db_dir.into();
        self
    }

    pub fn db_dir(&self) -> &Path {
        &self.db_dir
    }

    pub fn resolve(&self, db_ref: &DbRef) -> ApiResult<PathBuf> {
        db_ref.resolve_local_path(&self.db_dir)
    }

    /// Writes a new empty database file named after the ref.
    pub fn create_database(&self, db_ref: &DbRef) -> ApiResult<DatabaseInfo> {
        let path = self.resolve(db_ref)?;
        if path.exists() {
            return Err(Error::new(ErrorKind::AlreadyExists)
                .with_message(format!("database '{}' already exists", db_ref.describe()))
                .with_path(&path));
        }
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to create database directory")
                    .with_path(parent)
                    .with_source(err)
            })?;
        }
        let db = Database::new(database_name(db_ref, &path));
        codec::save(&db, &path)?;
        self.database_info(db_ref)
    }

    pub fn open(&self, db_ref: &DbRef) -> ApiResult<Database> {
        let path = self.existing_path(db_ref)?;
        codec::load(&path)
    }

    pub fn save(&self, db_ref: &DbRef, db: &Database) -> ApiResult<()> {
        let path = self.resolve(db_ref)?;
        codec::save(db, &path)
    }

    pub fn database_info(&self, db_ref: &DbRef) -> ApiResult<DatabaseInfo> {
        let path = self.existing_path(db_ref)?;
        let db = codec::load(&path)?;
        let file_size = std::fs::metadata(&path)
            .map(|meta| meta.len())
            .map_err(|err| Error::new(ErrorKind::Io).with_path(&path).with_source(err))?;
        Ok(DatabaseInfo::from_database(&db, path, file_size))
    }

    pub fn list_databases(&self) -> ApiResult<Vec<PathBuf>> {
        if !self.db_dir.exists() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&self.db_dir).map_err(|err| {
            Error::new(map_io_error_kind(&err))
                .with_message("failed to read database directory")
                .with_path(&self.db_dir)
                .with_source(err)
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to read database directory entry")
                    .with_path(&self.db_dir)
                    .with_source(err)
            })?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(DB_FILE_EXTENSION) {
                continue;
            }
            paths.push(path);
        }
        paths.sort();
        Ok(paths)
    }

    pub fn validate(&self, db_ref: &DbRef) -> ApiResult<ValidationReport> {
        let path = self.existing_path(db_ref)?;
        let report = validate_document(&path)?.with_db_ref(db_ref.describe());
        Ok(report)
    }

    fn existing_path(&self, db_ref: &DbRef) -> ApiResult<PathBuf> {
        let path = self.resolve(db_ref)?;
        if !path.exists() {
            return Err(Error::new(ErrorKind::NotFound)
                .with_message(format!("database '{}' does not exist", db_ref.describe()))
                .with_path(&path));
        }
        Ok(path)
    }
}

impl Default for LocalClient {
    fn default() -> Self {
        Self::new()
    }
}

fn database_name(db_ref: &DbRef, path: &Path) -> String {
    match db_ref {
        DbRef::Name(name) => name.trim_end_matches(".json").to_string(),
        DbRef::Path(_) => path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| db_ref.describe()),
    }
}

fn resolve_name(name: &str, db_dir: &Path) -> ApiResult<PathBuf> {
    resolve_named_db_path(name, db_dir).map_err(map_db_name_resolve_error)
}

fn map_io_error_kind(err: &std::io::Error) -> ErrorKind {
    match err.kind() {
        std::io::ErrorKind::NotFound => ErrorKind::NotFound,
        _ => ErrorKind::Io,
    }
}

fn map_db_name_resolve_error(err: DbNameResolveError) -> Error {
    match err {
        DbNameResolveError::Empty => {
            Error::new(ErrorKind::Usage).with_message("database name cannot be empty")
        }
        DbNameResolveError::ContainsPathSeparator => Error::new(ErrorKind::Usage)
            .with_message("database name must not contain path separators"),
    }
}

#[cfg(test)]
mod tests {
    use super::{DbRef, LocalClient, resolve_name};
    use crate::core::error::ErrorKind;
    use std::path::PathBuf;

    #[test]
    fn dbref_name_resolves_extension() {
        let db_dir = PathBuf::from(".scratch/databases");
        let path = resolve_name("shop", &db_dir).expect("path");
        assert_eq!(path, PathBuf::from(".scratch/databases/shop.json"));
    }

    #[test]
    fn dbref_name_keeps_suffix() {
        let db_dir = PathBuf::from(".scratch/databases");
        let path = resolve_name("shop.json", &db_dir).expect("path");
        assert_eq!(path, PathBuf::from(".scratch/databases/shop.json"));
    }

    #[test]
    fn dbref_name_rejects_slash_and_empty() {
        let db_dir = PathBuf::from(".scratch/databases");
        let err = resolve_name("foo/bar", &db_dir).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
        let err = resolve_name("", &db_dir).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn dbref_parse_distinguishes_paths() {
        assert_eq!(DbRef::parse("shop"), DbRef::name("shop"));
        assert_eq!(DbRef::parse("./shop.json"), DbRef::path("./shop.json"));
        assert_eq!(DbRef::parse("data/shop"), DbRef::path("data/shop"));
    }

    #[test]
    fn local_client_defaults_db_dir() {
        let client = LocalClient::new();
        assert!(client.db_dir().to_string_lossy().contains(".tabula"));
    }

    #[test]
    fn create_open_save_lifecycle() {
        let temp = tempfile::tempdir().expect("tempdir");
        let client = LocalClient::new().with_db_dir(temp.path().join("dbs"));
        let db_ref = DbRef::name("shop");

        let info = client.create_database(&db_ref).expect("create");
        assert_eq!(info.name, "shop");
        assert!(info.tables.is_empty());

        let err = client.create_database(&db_ref).expect_err("exists");
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        let mut db = client.open(&db_ref).expect("open");
        db.create_table_from_declaration("items", "sku:string, qty:int")
            .expect("table")
            .insert_tokens(&["A-1", "4"])
            .expect("row");
        client.save(&db_ref, &db).expect("save");

        let info = client.database_info(&db_ref).expect("info");
        assert_eq!(info.tables.len(), 1);
        assert_eq!(info.tables[0].schema, "sku:string, qty:int");
        assert_eq!(info.tables[0].row_count, 1);

        let listed = client.list_databases().expect("list");
        assert_eq!(listed, vec![temp.path().join("dbs").join("shop.json")]);
    }

    #[test]
    fn missing_database_is_not_found() {
        let temp = tempfile::tempdir().expect("tempdir");
        let client = LocalClient::new().with_db_dir(temp.path());
        let err = client.open(&DbRef::name("ghost")).expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(client.list_databases().expect("list").is_empty());
    }
}
