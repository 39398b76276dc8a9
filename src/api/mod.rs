//! Purpose: Define the stable public Rust API boundary for Tabula.
//! Exports: Core types and operations needed by the CLI and embedding callers.
//! Role: Public, additive-only surface over the typed table engine and its file codec.
//! Invariants: Front ends go through `Session` or `LocalClient`; neither holds global state.
//! Invariants: Every fallible operation returns the shared `Error`/`ErrorKind` pair.

mod client;
mod session;
mod validation;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::database::Database;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::field_type::FieldType;
pub use crate::core::row::Row;
pub use crate::core::schema::{Field, Schema};
pub use crate::core::table::{Difference, Table};
pub use crate::core::value::{DateInterval, Value};
pub use client::{ApiResult, DatabaseInfo, DbRef, LocalClient, TableInfo};
pub use session::Session;
pub use validation::{ValidationIssue, ValidationReport, ValidationStatus, validate_document};
