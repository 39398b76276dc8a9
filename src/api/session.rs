//! Purpose: Explicit context object that owns the database a caller is working on.
//! Exports: `Session`.
//! Role: Operation surface for front ends; resolves table names and reports missing targets.
//! Invariants: At most one database per session; `load` replaces it only on success.
//! Invariants: Every mutation is validate-then-commit; errors leave the session unchanged.
#![allow(clippy::result_large_err)]

use std::path::Path;

use crate::core::codec;
use crate::core::database::Database;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::row::Row;
use crate::core::table::{Difference, Table};

#[derive(Clone, Debug, Default)]
pub struct Session {
    database: Option<Database>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(database: Database) -> Self {
        Self {
            database: Some(database),
        }
    }

    pub fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    pub fn into_database(self) -> Option<Database> {
        self.database
    }

    /// Starts a new, empty database, discarding any current one.
    pub fn create_database(&mut self, name: &str) -> Result<&Database> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::new(ErrorKind::Usage).with_message("database name cannot be empty"));
        }
        Ok(&*self.database.insert(Database::new(name)))
    }

    pub fn create_table(&mut self, name: &str, declaration: &str) -> Result<&Table> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::new(ErrorKind::Usage).with_message("table name cannot be empty"));
        }
        let table = self
            .database_mut()?
            .create_table_from_declaration(name, declaration)?;
        Ok(&*table)
    }

    pub fn table(&self, name: &str) -> Result<&Table> {
        self.current()?
            .table(name)
            .ok_or_else(|| missing_table(name))
    }

    /// Returns the index of the appended row.
    pub fn add_row<S: AsRef<str>>(&mut self, table: &str, raw_tokens: &[S]) -> Result<usize> {
        self.table_mut(table)?.insert_tokens(raw_tokens)
    }

    pub fn replace_row<S: AsRef<str>>(
        &mut self,
        table: &str,
        index: usize,
        raw_tokens: &[S],
    ) -> Result<()> {
        self.table_mut(table)?.replace_tokens(index, raw_tokens)
    }

    pub fn delete_row(&mut self, table: &str, index: usize) -> Result<Row> {
        self.table_mut(table)?.delete_row(index)
    }

    pub fn difference(&self, first: &str, second: &str) -> Result<Difference> {
        let first = self.table(first)?;
        let second = self.table(second)?;
        first.difference(second)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        codec::save(self.current()?, path)
    }

    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<&Database> {
        let database = codec::load(path)?;
        Ok(&*self.database.insert(database))
    }

    fn current(&self) -> Result<&Database> {
        self.database.as_ref().ok_or_else(no_database)
    }

    fn database_mut(&mut self) -> Result<&mut Database> {
        self.database.as_mut().ok_or_else(no_database)
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.database_mut()?
            .table_mut(name)
            .ok_or_else(|| missing_table(name))
    }
}

fn no_database() -> Error {
    Error::new(ErrorKind::NotFound)
        .with_message("no database is open")
        .with_hint("Create or load a database first.")
}

fn missing_table(name: &str) -> Error {
    Error::new(ErrorKind::NotFound)
        .with_message(format!("table '{name}' does not exist"))
        .with_table(name)
}

#[cfg(test)]
mod tests {
    use super::Session;
    use crate::core::error::ErrorKind;
    use crate::core::value::Value;

    fn session_with_people() -> Session {
        let mut session = Session::new();
        session.create_database("crm").expect("db");
        session
            .create_table("people", "id:int, name:string")
            .expect("table");
        session.add_row("people", &["1", "ada"]).expect("row");
        session.add_row("people", &["2", "grace"]).expect("row");
        session
    }

    #[test]
    fn operations_without_database_are_not_found() {
        let mut session = Session::new();
        let err = session.create_table("t", "x:int").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = session.add_row("t", &["1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = session.save("unused.json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn empty_names_are_usage_errors() {
        let mut session = Session::new();
        assert_eq!(session.create_database("  ").unwrap_err().kind(), ErrorKind::Usage);
        session.create_database("db").expect("db");
        assert_eq!(session.create_table("", "x:int").unwrap_err().kind(), ErrorKind::Usage);
    }

    #[test]
    fn missing_table_is_not_found() {
        let mut session = session_with_people();
        let err = session.delete_row("ghosts", 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.table(), Some("ghosts"));
        let err = session.difference("people", "ghosts").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn row_operations_flow_through_named_tables() {
        let mut session = session_with_people();
        session.replace_row("people", 1, &["2", "hopper"]).expect("replace");
        let removed = session.delete_row("people", 0).expect("delete");
        assert_eq!(removed.values()[1], Value::Text("ada".to_string()));

        let people = session.table("people").expect("people");
        assert_eq!(people.len(), 1);
        assert_eq!(people.rows()[0].values()[1], Value::Text("hopper".to_string()));
    }

    #[test]
    fn difference_between_named_tables() {
        let mut session = session_with_people();
        session
            .create_table("alumni", "id:int, name:string")
            .expect("table");
        session.add_row("alumni", &["2", "grace"]).expect("row");
        session.add_row("alumni", &["3", "edsger"]).expect("row");

        let diff = session.difference("people", "alumni").expect("diff");
        assert_eq!(diff.only_in_self.len(), 1);
        assert_eq!(diff.only_in_self[0].values()[0], Value::Integer(1));
        assert_eq!(diff.only_in_other.len(), 1);
        assert_eq!(diff.only_in_other[0].values()[0], Value::Integer(3));
    }

    #[test]
    fn failed_load_keeps_current_database() {
        let temp = tempfile::tempdir().expect("tempdir");
        let bad = temp.path().join("bad.json");
        std::fs::write(&bad, "{ not json").expect("write");

        let mut session = session_with_people();
        let err = session.load(&bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Codec);
        assert_eq!(session.table("people").expect("people").len(), 2);
    }

    #[test]
    fn save_and_load_replace_whole_database() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("crm.json");
        let session = session_with_people();
        session.save(&path).expect("save");

        let mut other = Session::new();
        other.create_database("scratch").expect("db");
        let loaded = other.load(&path).expect("load");
        assert_eq!(loaded.name(), "crm");
        assert_eq!(other.database(), session.database());
    }
}
