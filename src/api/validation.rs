//! Purpose: Provide a stable, serializable validation report model for database files.
//! Exports: `ValidationReport`, `ValidationStatus`, `ValidationIssue`, `validate_document`.
//! Role: Shared contract for CLI diagnostics and API users; `load` stops at the first problem,
//! a report lists all of them.
//! Invariants: A report is `Ok` exactly when `codec::load` would succeed on the same bytes.
//! Invariants: Only unreadable files are errors; malformed content becomes issues.

use crate::core::codec::{DatabaseDocument, TableDocument, decode_schema, decode_value};
use crate::core::error::{Error, ErrorKind};
use crate::core::field_type::FieldType;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ValidationStatus {
    Ok,
    Invalid,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Ok => "ok",
            ValidationStatus::Invalid => "invalid",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidationIssue {
    pub code: String,
    pub message: String,
    pub table: Option<String>,
    pub row: Option<usize>,
    pub field: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidationReport {
    pub db_ref: Option<String>,
    pub path: PathBuf,
    pub status: ValidationStatus,
    pub table_count: usize,
    pub row_count: usize,
    pub issues: Vec<ValidationIssue>,
    pub issue_count: usize,
}

impl ValidationReport {
    pub fn ok(path: PathBuf) -> Self {
        Self {
            db_ref: None,
            path,
            status: ValidationStatus::Ok,
            table_count: 0,
            row_count: 0,
            issues: Vec::new(),
            issue_count: 0,
        }
    }

    pub fn with_db_ref(mut self, db_ref: impl Into<String>) -> Self {
        self.db_ref = Some(db_ref.into());
        self
    }

    pub fn set_issues(mut self, issues: Vec<ValidationIssue>) -> Self {
        self.issue_count = issues.len();
        self.issues = issues;
        self.status = if self.issue_count == 0 {
            ValidationStatus::Ok
        } else {
            ValidationStatus::Invalid
        };
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == ValidationStatus::Ok
    }
}

/// Reads and checks a database file, collecting every problem instead of stopping at the first.
pub fn validate_document(path: &Path) -> Result<ValidationReport, Error> {
    let text = std::fs::read_to_string(path).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read database file")
            .with_path(path)
            .with_source(err)
    })?;
    Ok(validate_text(&text, path.to_path_buf()))
}

pub(crate) fn validate_text(text: &str, path: PathBuf) -> ValidationReport {
    let report = ValidationReport::ok(path);
    let document: DatabaseDocument = match serde_json::from_str(text) {
        Ok(document) => document,
        Err(err) => {
            return report.set_issues(vec![issue(
                "document",
                format!("not a database document: {err}"),
            )]);
        }
    };

    let mut issues = Vec::new();
    let mut seen = HashSet::new();
    let mut row_count = 0;
    for table in &document.tables {
        if !seen.insert(table.name.as_str()) {
            issues.push(
                issue(
                    "duplicate_table",
                    format!("table '{}' appears more than once", table.name),
                )
                .in_table(&table.name),
            );
        }
        row_count += table.rows.len();
        check_table(table, &mut issues);
    }

    let mut report = report.set_issues(issues);
    report.table_count = document.tables.len();
    report.row_count = row_count;
    report
}

fn check_table(table: &TableDocument, issues: &mut Vec<ValidationIssue>) {
    // Unknown types are reported per field; rows are only checked against a usable schema.
    let mut schema_ok = true;
    for (field, stored) in &table.schema {
        if FieldType::parse_stored(stored).is_err() {
            schema_ok = false;
            issues.push(
                issue("unknown_type", format!("unknown stored type '{stored}'"))
                    .in_table(&table.name)
                    .on_field(field),
            );
        }
    }
    if !schema_ok {
        return;
    }
    let Ok(schema) = decode_schema(&table.schema) else {
        return;
    };

    for (index, values) in table.rows.iter().enumerate() {
        if values.len() != schema.len() {
            issues.push(
                issue(
                    "row_arity",
                    format!(
                        "row has {} values but the schema declares {} fields",
                        values.len(),
                        schema.len()
                    ),
                )
                .in_table(&table.name)
                .at_row(index),
            );
            continue;
        }
        for (value, field) in values.iter().zip(schema.fields()) {
            if let Err(err) = decode_value(value, field) {
                issues.push(
                    issue("row_value", err.message().unwrap_or("invalid value"))
                        .in_table(&table.name)
                        .at_row(index)
                        .on_field(&field.name),
                );
            }
        }
    }
}

fn issue(code: &str, message: impl Into<String>) -> ValidationIssue {
    ValidationIssue {
        code: code.to_string(),
        message: message.into(),
        table: None,
        row: None,
        field: None,
    }
}

impl ValidationIssue {
    fn in_table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    fn at_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    fn on_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }
}
