//! Purpose: Row container plus raw-token coercion against a schema.
//! Exports: `Row`, `coerce_row`, `coerce_value`.
//! Role: The only path that turns user text into typed rows.
//! Invariants: A returned row has one value per field and each value matches its field type.
//! Invariants: Coercion is all-or-nothing; the first failing position aborts the row.
use time::Date;

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::field_type::FieldType;
use crate::core::schema::{Field, Schema};
use crate::core::value::{DateInterval, INTERVAL_SEPARATOR, Value, parse_date};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, position: usize) -> Option<&Value> {
        self.values.get(position)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// True when arity and every per-position type match `schema`.
    pub fn conforms_to(&self, schema: &Schema) -> bool {
        self.values.len() == schema.len()
            && self
                .values
                .iter()
                .zip(schema.fields())
                .all(|(value, field)| value.conforms_to(field.field_type))
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

pub fn coerce_row<S: AsRef<str>>(raw_tokens: &[S], schema: &Schema) -> Result<Row> {
    if raw_tokens.len() != schema.len() {
        return Err(Error::new(ErrorKind::RowArity)
            .with_message(format!(
                "row has {} values but the schema declares {} fields",
                raw_tokens.len(),
                schema.len()
            ))
            .with_hint(format!("Expected values for: {schema}")));
    }
    let values = raw_tokens
        .iter()
        .zip(schema.fields())
        .map(|(token, field)| coerce_value(token.as_ref(), field))
        .collect::<Result<Vec<_>>>()?;
    Ok(Row::new(values))
}

pub fn coerce_value(token: &str, field: &Field) -> Result<Value> {
    match field.field_type {
        FieldType::Integer => token
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|err| type_error(field, format!("'{token}' is not an integer")).with_source(err)),
        FieldType::Real => {
            let value = token
                .trim()
                .parse::<f64>()
                .map_err(|err| type_error(field, format!("'{token}' is not a number")).with_source(err))?;
            if !value.is_finite() {
                return Err(type_error(field, format!("'{token}' is not a finite number")));
            }
            Ok(Value::Real(value))
        }
        FieldType::Char => {
            let mut chars = token.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => Ok(Value::Char(ch)),
                _ => Err(type_error(
                    field,
                    format!(
                        "expected a single character, got {} characters",
                        token.chars().count()
                    ),
                )),
            }
        }
        FieldType::Text => Ok(Value::Text(token.to_string())),
        FieldType::Date => coerce_date(token, field).map(Value::Date),
        FieldType::DateInterval => {
            let mut sides = token.split(INTERVAL_SEPARATOR);
            let (Some(start), Some(end), None) = (sides.next(), sides.next(), sides.next()) else {
                return Err(type_error(
                    field,
                    format!("'{token}' must be two dates separated by exactly one '{INTERVAL_SEPARATOR}'"),
                )
                .with_hint("Use `YYYY-MM-DD;YYYY-MM-DD`."));
            };
            let start = coerce_date(start.trim(), field)?;
            let end = coerce_date(end.trim(), field)?;
            Ok(Value::DateInterval(DateInterval::new(start, end)))
        }
    }
}

fn coerce_date(token: &str, field: &Field) -> Result<Date> {
    parse_date(token).map_err(|err| {
        type_error(field, format!("'{token}' is not a YYYY-MM-DD date"))
            .with_source(err)
    })
}

fn type_error(field: &Field, message: String) -> Error {
    Error::new(ErrorKind::RowType)
        .with_message(format!(
            "invalid value for {} field '{}': {message}",
            field.field_type, field.name
        ))
        .with_field(field.name.clone())
}

#[cfg(test)]
mod tests {
    use super::{Row, coerce_row};
    use crate::core::error::ErrorKind;
    use crate::core::schema::Schema;
    use crate::core::value::{DateInterval, Value};
    use time::macros::date;

    fn full_schema() -> Schema {
        Schema::parse("id:int, score:real, initial:char, name:string, born:date, stay:dateInvl")
            .expect("schema")
    }

    #[test]
    fn coerces_every_type() {
        let row = coerce_row(
            &["-7", "2.5", "Z", "  spaced text ", "1990-05-17", "2024-01-01;2024-02-01"],
            &full_schema(),
        )
        .expect("row");
        assert_eq!(
            row.values(),
            &[
                Value::Integer(-7),
                Value::Real(2.5),
                Value::Char('Z'),
                Value::Text("  spaced text ".to_string()),
                Value::Date(date!(1990 - 05 - 17)),
                Value::DateInterval(DateInterval::new(date!(2024 - 01 - 01), date!(2024 - 02 - 01))),
            ]
        );
        assert!(row.conforms_to(&full_schema()));
    }

    #[test]
    fn arity_mismatch_is_reported() {
        let schema = Schema::parse("id:int, name:string").expect("schema");
        let err = coerce_row(&["1"], &schema).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RowArity);
        let err = coerce_row(&["1", "a", "b"], &schema).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RowArity);
    }

    #[test]
    fn char_requires_exactly_one_character() {
        let schema = Schema::parse("c:char").expect("schema");
        let err = coerce_row(&["ab"], &schema).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RowType);
        assert_eq!(err.field(), Some("c"));
        assert!(coerce_row(&[""], &schema).is_err());
        assert_eq!(
            coerce_row(&["a"], &schema).expect("a").values(),
            &[Value::Char('a')]
        );
        assert_eq!(
            coerce_row(&["é"], &schema).expect("accented").values(),
            &[Value::Char('é')]
        );
    }

    #[test]
    fn numeric_text_must_parse() {
        let schema = Schema::parse("n:int, r:real").expect("schema");
        assert_eq!(coerce_row(&["1.5", "1"], &schema).unwrap_err().kind(), ErrorKind::RowType);
        assert_eq!(coerce_row(&["1", "abc"], &schema).unwrap_err().kind(), ErrorKind::RowType);
        assert_eq!(coerce_row(&["1", "NaN"], &schema).unwrap_err().kind(), ErrorKind::RowType);
        assert_eq!(coerce_row(&["1", "inf"], &schema).unwrap_err().kind(), ErrorKind::RowType);
        let row = coerce_row(&[" 42 ", "1e3"], &schema).expect("row");
        assert_eq!(row.values(), &[Value::Integer(42), Value::Real(1000.0)]);
    }

    #[test]
    fn date_errors_keep_parse_source() {
        let schema = Schema::parse("d:date").expect("schema");
        let err = coerce_row(&["2024-13-01"], &schema).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RowType);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn interval_requires_one_separator() {
        let schema = Schema::parse("stay:dateInvl").expect("schema");
        let row = coerce_row(&["2024-01-01 ; 2024-02-01"], &schema).expect("trimmed sides");
        assert_eq!(
            row.values(),
            &[Value::DateInterval(DateInterval::new(
                date!(2024 - 01 - 01),
                date!(2024 - 02 - 01)
            ))]
        );

        for token in ["2024-01-01", "2024-01-01;2024-02-01;2024-03-01", "2024-01-01;nope", ";"] {
            let err = coerce_row(&[token], &schema).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::RowType, "{token:?}");
            assert_eq!(err.field(), Some("stay"));
        }
    }

    #[test]
    fn canonical_tokens_render_back_unchanged() {
        let schema = full_schema();
        let tokens = ["12", "0.25", "q", "hello", "2000-01-31", "2001-02-03;1999-12-31"];
        let row = coerce_row(&tokens, &schema).expect("row");
        let rendered = row.values().iter().map(Value::to_string).collect::<Vec<_>>();
        assert_eq!(rendered, tokens);
    }

    #[test]
    fn empty_row_conforms_only_to_empty_schema() {
        let row = Row::default();
        assert!(row.is_empty());
        assert!(!row.conforms_to(&full_schema()));
    }
}
