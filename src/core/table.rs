//! Purpose: Named schema plus ordered rows, positional mutation, and table difference.
//! Exports: `Table`, `Difference`.
//! Role: Owns row storage; token-level helpers validate before committing.
//! Invariants: Row positions are the only identity; delete shifts later rows down by one.
//! Invariants: `difference` is a per-occurrence membership scan, not a multiset difference.
use tracing::debug;

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::row::{Row, coerce_row};
use crate::core::schema::Schema;

#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    name: String,
    schema: Schema,
    rows: Vec<Row>,
}

/// Rows present on one side and absent (by value) from the other, in original order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Difference {
    pub only_in_self: Vec<Row>,
    pub only_in_other: Vec<Row>,
}

impl Difference {
    pub fn is_empty(&self) -> bool {
        self.only_in_self.is_empty() && self.only_in_other.is_empty()
    }
}

impl Table {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            rows: Vec::new(),
        }
    }

    pub(crate) fn with_rows(name: impl Into<String>, schema: Schema, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            schema,
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends without re-validating; callers coerce against this table's schema first.
    pub fn add_row(&mut self, row: Row) {
        debug_assert!(row.conforms_to(&self.schema), "row does not match schema");
        self.rows.push(row);
        debug!(table = %self.name, index = self.rows.len() - 1, "row added");
    }

    pub fn replace_row(&mut self, index: usize, row: Row) -> Result<()> {
        self.check_index(index)?;
        debug_assert!(row.conforms_to(&self.schema), "row does not match schema");
        self.rows[index] = row;
        debug!(table = %self.name, index, "row replaced");
        Ok(())
    }

    pub fn delete_row(&mut self, index: usize) -> Result<Row> {
        self.check_index(index)?;
        let removed = self.rows.remove(index);
        debug!(table = %self.name, index, remaining = self.rows.len(), "row deleted");
        Ok(removed)
    }

    /// Coerces `raw_tokens` against the schema, then appends.
    pub fn insert_tokens<S: AsRef<str>>(&mut self, raw_tokens: &[S]) -> Result<usize> {
        let row = coerce_row(raw_tokens, &self.schema).map_err(|err| err.with_table(&self.name))?;
        self.add_row(row);
        Ok(self.rows.len() - 1)
    }

    /// Bounds-checks `index` before coercing, so a bad index reports `Index`.
    pub fn replace_tokens<S: AsRef<str>>(&mut self, index: usize, raw_tokens: &[S]) -> Result<()> {
        self.check_index(index)?;
        let row = coerce_row(raw_tokens, &self.schema)
            .map_err(|err| err.with_table(&self.name).with_index(index))?;
        self.replace_row(index, row)
    }

    pub fn difference(&self, other: &Table) -> Result<Difference> {
        if self.schema != other.schema {
            return Err(Error::new(ErrorKind::SchemaMismatch)
                .with_message(format!(
                    "cannot compare '{}' ({}) with '{}' ({})",
                    self.name, self.schema, other.name, other.schema
                ))
                .with_table(&self.name));
        }
        Ok(Difference {
            only_in_self: rows_missing_from(&self.rows, &other.rows),
            only_in_other: rows_missing_from(&other.rows, &self.rows),
        })
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.rows.len() {
            return Err(Error::new(ErrorKind::Index)
                .with_message(format!(
                    "row index {index} is out of range for {} rows",
                    self.rows.len()
                ))
                .with_table(&self.name)
                .with_index(index));
        }
        Ok(())
    }
}

fn rows_missing_from(rows: &[Row], haystack: &[Row]) -> Vec<Row> {
    rows.iter()
        .filter(|row| !haystack.contains(row))
        .cloned()
        .collect()
}
