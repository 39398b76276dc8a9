//! Purpose: Convert databases to and from the persisted JSON document and its file.
//! Exports: `DatabaseDocument`, `TableDocument`, `encode`, `decode`, `to_json`, `from_json`, `save`, `load`.
//! Role: The only persistence path; save/load are single blocking whole-file operations.
//! Invariants: `decode(encode(db)) == db` for every database built through validated operations.
//! Invariants: Document layout is `{name, tables: [{name, schema: [[field, type]], rows: [[..]]}]}`.
//! Notes: No temp-file swap; a failed write can leave a truncated file behind.
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use tracing::info;

use crate::core::database::Database;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::field_type::FieldType;
use crate::core::row::Row;
use crate::core::schema::{Field, Schema};
use crate::core::table::Table;
use crate::core::value::{DateInterval, INTERVAL_SEPARATOR, Value, format_date, parse_date};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatabaseDocument {
    pub name: String,
    pub tables: Vec<TableDocument>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableDocument {
    pub name: String,
    /// `(field name, stored type name)` pairs, written as two-element arrays.
    pub schema: Vec<(String, String)>,
    pub rows: Vec<Vec<JsonValue>>,
}

pub fn encode(db: &Database) -> DatabaseDocument {
    DatabaseDocument {
        name: db.name().to_string(),
        tables: db.tables().map(encode_table).collect(),
    }
}

fn encode_table(table: &Table) -> TableDocument {
    TableDocument {
        name: table.name().to_string(),
        schema: table
            .schema()
            .fields()
            .iter()
            .map(|field| (field.name.clone(), field.field_type.stored_name().to_string()))
            .collect(),
        rows: table
            .rows()
            .iter()
            .map(|row| row.values().iter().map(encode_value).collect())
            .collect(),
    }
}

pub fn encode_value(value: &Value) -> JsonValue {
    match value {
        Value::Integer(value) => json!(value),
        Value::Real(value) => json!(value),
        Value::Char(value) => json!(value.to_string()),
        Value::Text(value) => json!(value),
        Value::Date(value) => json!(format_date(*value)),
        Value::DateInterval(value) => json!(value.to_string()),
    }
}

pub fn decode(document: DatabaseDocument) -> Result<Database> {
    let mut tables: Vec<Table> = Vec::with_capacity(document.tables.len());
    for table_doc in document.tables {
        if tables.iter().any(|table| table.name() == table_doc.name) {
            return Err(Error::new(ErrorKind::Codec)
                .with_message(format!("table '{}' appears more than once", table_doc.name))
                .with_table(table_doc.name));
        }
        tables.push(decode_table(table_doc)?);
    }
    Ok(Database::from_tables(document.name, tables))
}

fn decode_table(document: TableDocument) -> Result<Table> {
    let schema = decode_schema(&document.schema).map_err(|err| err.with_table(&document.name))?;
    let rows = document
        .rows
        .iter()
        .enumerate()
        .map(|(index, values)| {
            decode_row(values, &schema)
                .map_err(|err| err.with_table(&document.name).with_index(index))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Table::with_rows(document.name, schema, rows))
}

pub(crate) fn decode_schema(pairs: &[(String, String)]) -> Result<Schema> {
    pairs
        .iter()
        .map(|(name, stored)| {
            FieldType::parse_stored(stored)
                .map(|field_type| Field::new(name.clone(), field_type))
                .map_err(|err| err.with_field(name.clone()))
        })
        .collect::<Result<Vec<_>>>()
        .map(Schema::new)
}

pub(crate) fn decode_row(values: &[JsonValue], schema: &Schema) -> Result<Row> {
    if values.len() != schema.len() {
        return Err(Error::new(ErrorKind::Codec).with_message(format!(
            "stored row has {} values but the schema declares {} fields",
            values.len(),
            schema.len()
        )));
    }
    values
        .iter()
        .zip(schema.fields())
        .map(|(value, field)| decode_value(value, field))
        .collect::<Result<Vec<_>>>()
        .map(Row::new)
}

pub fn decode_value(value: &JsonValue, field: &Field) -> Result<Value> {
    let decoded = match field.field_type {
        FieldType::Integer => value.as_i64().map(Value::Integer),
        FieldType::Real => value.as_f64().map(Value::Real),
        FieldType::Char => value.as_str().and_then(single_char).map(Value::Char),
        FieldType::Text => value.as_str().map(|text| Value::Text(text.to_string())),
        FieldType::Date => match value.as_str() {
            Some(text) => Some(Value::Date(decode_date(text, field)?)),
            None => None,
        },
        FieldType::DateInterval => match value.as_str() {
            Some(text) => Some(Value::DateInterval(decode_interval(text, field)?)),
            None => None,
        },
    };
    decoded.ok_or_else(|| {
        Error::new(ErrorKind::Codec)
            .with_message(format!(
                "stored value {value} does not fit {} field '{}'",
                field.field_type.stored_name(),
                field.name
            ))
            .with_field(field.name.clone())
    })
}

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(ch),
        _ => None,
    }
}

fn decode_date(text: &str, field: &Field) -> Result<time::Date> {
    parse_date(text).map_err(|err| {
        Error::new(ErrorKind::Codec)
            .with_message(format!("stored date '{text}' is malformed"))
            .with_field(field.name.clone())
            .with_source(err)
    })
}

fn decode_interval(text: &str, field: &Field) -> Result<DateInterval> {
    let Some((start, end)) = text.split_once(INTERVAL_SEPARATOR) else {
        return Err(Error::new(ErrorKind::Codec)
            .with_message(format!("stored interval '{text}' has no '{INTERVAL_SEPARATOR}'"))
            .with_field(field.name.clone()));
    };
    Ok(DateInterval::new(
        decode_date(start.trim(), field)?,
        decode_date(end.trim(), field)?,
    ))
}

pub fn to_json(db: &Database) -> Result<String> {
    serde_json::to_string(&encode(db)).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode database document")
            .with_source(err)
    })
}

pub fn from_json(text: &str) -> Result<Database> {
    let document: DatabaseDocument = serde_json::from_str(text).map_err(|err| {
        Error::new(ErrorKind::Codec)
            .with_message(format!("not a database document: {err}"))
            .with_source(err)
    })?;
    decode(document)
}

pub fn save(db: &Database, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let text = to_json(db)?;
    std::fs::write(path, text).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to write database file")
            .with_path(path)
            .with_source(err)
    })?;
    info!(database = %db.name(), path = %path.display(), tables = db.table_count(), "database saved");
    Ok(())
}

pub fn load(path: impl AsRef<Path>) -> Result<Database> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read database file")
            .with_path(path)
            .with_source(err)
    })?;
    let db = from_json(&text).map_err(|err| err.with_path(path))?;
    info!(database = %db.name(), path = %path.display(), tables = db.table_count(), "database loaded");
    Ok(db)
}
