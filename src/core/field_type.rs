//! Purpose: Closed set of column kinds and their two textual vocabularies.
//! Exports: `FieldType`.
//! Role: Shared by schema parsing, row coercion, and the persisted document codec.
//! Invariants: Declared names (schema input) and stored names (documents) are separate tables.
//! Invariants: Every stored name written by `stored_name` is accepted by `parse_stored`.
use std::fmt;

use crate::core::error::{Error, ErrorKind, Result};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FieldType {
    Integer,
    Real,
    Char,
    Text,
    Date,
    DateInterval,
}

// Schema declaration vocabulary.
const DECLARED_NAMES: &[(&str, FieldType)] = &[
    ("int", FieldType::Integer),
    ("real", FieldType::Real),
    ("char", FieldType::Char),
    ("string", FieldType::Text),
    ("date", FieldType::Date),
    ("dateInvl", FieldType::DateInterval),
];

// Persisted vocabulary. `str` predates a dedicated char name and always loads as text.
const STORED_NAMES: &[(&str, FieldType)] = &[
    ("int", FieldType::Integer),
    ("float", FieldType::Real),
    ("char", FieldType::Char),
    ("str", FieldType::Text),
    ("date", FieldType::Date),
    ("DateInterval", FieldType::DateInterval),
];

impl FieldType {
    pub const ALL: [FieldType; 6] = [
        FieldType::Integer,
        FieldType::Real,
        FieldType::Char,
        FieldType::Text,
        FieldType::Date,
        FieldType::DateInterval,
    ];

    pub fn parse_declared(token: &str) -> Result<Self> {
        lookup_type(DECLARED_NAMES, token).ok_or_else(|| {
            Error::new(ErrorKind::Schema)
                .with_message(format!("unknown type '{token}'"))
                .with_hint("Use one of: int, real, char, string, date, dateInvl.")
        })
    }

    pub fn declared_name(self) -> &'static str {
        lookup_name(DECLARED_NAMES, self)
    }

    pub fn parse_stored(name: &str) -> Result<Self> {
        lookup_type(STORED_NAMES, name).ok_or_else(|| {
            Error::new(ErrorKind::Codec).with_message(format!("unknown stored type '{name}'"))
        })
    }

    pub fn stored_name(self) -> &'static str {
        lookup_name(STORED_NAMES, self)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.declared_name())
    }
}

fn lookup_type(table: &[(&str, FieldType)], token: &str) -> Option<FieldType> {
    table
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, field_type)| *field_type)
}

fn lookup_name(table: &[(&'static str, FieldType)], field_type: FieldType) -> &'static str {
    table
        .iter()
        .find(|(_, candidate)| *candidate == field_type)
        .map(|(name, _)| *name)
        .unwrap_or_else(|| unreachable!("{field_type:?} missing from name table"))
}
