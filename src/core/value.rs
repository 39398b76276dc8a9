//! Purpose: Typed cell values and the canonical text forms of calendar data.
//! Exports: `Value`, `DateInterval`, `parse_date`, `format_date`, `INTERVAL_SEPARATOR`.
//! Role: The only value representation stored in rows; codec and coercion both build on it.
//! Invariants: Dates render as `YYYY-MM-DD`; intervals render as `<start>;<end>`.
//! Invariants: Intervals are not normalized; `start > end` is stored as given.
use std::fmt;

use time::Date;
use time::macros::format_description;

use crate::core::field_type::FieldType;

pub const INTERVAL_SEPARATOR: char = ';';

pub fn parse_date(text: &str) -> Result<Date, time::error::Parse> {
    Date::parse(text, format_description!("[year]-[month]-[day]"))
}

pub fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct DateInterval {
    pub start: Date,
    pub end: Date,
}

impl DateInterval {
    pub fn new(start: Date, end: Date) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for DateInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{INTERVAL_SEPARATOR}{}",
            format_date(self.start),
            format_date(self.end)
        )
    }
}

/// One cell. Equality is per variant; `Integer(1)` never equals `Real(1.0)`.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Char(char),
    Text(String),
    Date(Date),
    DateInterval(DateInterval),
}

impl Value {
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::Integer(_) => FieldType::Integer,
            Value::Real(_) => FieldType::Real,
            Value::Char(_) => FieldType::Char,
            Value::Text(_) => FieldType::Text,
            Value::Date(_) => FieldType::Date,
            Value::DateInterval(_) => FieldType::DateInterval,
        }
    }

    pub fn conforms_to(&self, field_type: FieldType) -> bool {
        self.field_type() == field_type
    }
}

/// Canonical text form, the same text accepted back by row coercion.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{value}"),
            Value::Real(value) => write!(f, "{value}"),
            Value::Char(value) => write!(f, "{value}"),
            Value::Text(value) => f.write_str(value),
            Value::Date(value) => f.write_str(&format_date(*value)),
            Value::DateInterval(value) => write!(f, "{value}"),
        }
    }
}
