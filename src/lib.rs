//! Purpose: Library crate behind the `tabula` CLI: a typed tabular store with JSON persistence.
//! Exports: `core` (types, tables, codec, errors) and `api` (session, client, validation).
//! Role: Callers build schemas, create tables, submit raw row tokens, and save/load databases.
//! Invariants: No process-wide state; every operation acts on an explicit `Database` or `Session`.
//! Invariants: Failed operations leave the target table/database unchanged.
pub mod api;
pub mod core;
pub(crate) mod db_paths;
