//! Purpose: Ordered, named column layout of a table and its declaration grammar.
//! Exports: `Schema`, `Field`.
//! Role: Parsed once from `name:type, ...` input; immutable after table creation.
//! Invariants: Field order is significant for equality and for row positions.
//! Invariants: Field names are not checked for uniqueness.
use std::fmt;

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::field_type::FieldType;

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Parses `id:int, name:string` style declarations.
    pub fn parse(declaration: &str) -> Result<Self> {
        if declaration.trim().is_empty() {
            return Err(Error::new(ErrorKind::Schema)
                .with_message("schema declaration is empty")
                .with_hint("Declare fields as `name:type`, e.g. `id:int, name:string`."));
        }
        let fields = declaration
            .split(',')
            .map(parse_clause)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, position: usize) -> Option<&Field> {
        self.fields.get(position)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Renders the declaration form accepted by [`Schema::parse`].
impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, field) in self.fields.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}:{}", field.name, field.field_type.declared_name())?;
        }
        Ok(())
    }
}

fn parse_clause(clause: &str) -> Result<Field> {
    let Some((name, token)) = clause.split_once(':') else {
        return Err(Error::new(ErrorKind::Schema)
            .with_message(format!("field clause '{}' is missing ':'", clause.trim()))
            .with_hint("Declare fields as `name:type`, e.g. `id:int, name:string`."));
    };
    let name = name.trim();
    let token = token.trim();
    if token.contains(':') {
        return Err(Error::new(ErrorKind::Schema)
            .with_message(format!("field clause '{}' has more than one ':'", clause.trim()))
            .with_field(name));
    }
    if name.is_empty() {
        return Err(Error::new(ErrorKind::Schema)
            .with_message(format!("field of type '{token}' has an empty name")));
    }
    let field_type = FieldType::parse_declared(token).map_err(|err| {
        let mut mapped = Error::new(ErrorKind::Schema)
            .with_message(format!("invalid type '{token}' for field '{name}'"))
            .with_field(name);
        if let Some(hint) = err.hint() {
            mapped = mapped.with_hint(hint);
        }
        mapped
    })?;
    Ok(Field::new(name, field_type))
}

#[cfg(test)]
mod tests {
    use super::{Field, Schema};
    use crate::core::error::ErrorKind;
    use crate::core::field_type::FieldType;

    #[test]
    fn parses_every_declared_type_in_order() {
        let schema =
            Schema::parse("id:int, score : real,initial:char, name:string, born:date, stay:dateInvl")
                .expect("schema");
        let expected = vec![
            Field::new("id", FieldType::Integer),
            Field::new("score", FieldType::Real),
            Field::new("initial", FieldType::Char),
            Field::new("name", FieldType::Text),
            Field::new("born", FieldType::Date),
            Field::new("stay", FieldType::DateInterval),
        ];
        assert_eq!(schema.fields(), expected.as_slice());
        assert_eq!(schema.position("name"), Some(3));
    }

    #[test]
    fn unknown_type_names_field_and_token() {
        let err = Schema::parse("id:int, price:money").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert_eq!(err.field(), Some("price"));
        assert!(err.message().unwrap().contains("money"));
        assert!(err.hint().is_some());
    }

    #[test]
    fn malformed_clauses_are_rejected() {
        for declaration in ["id int", "id:int,", ":int", "a:b:int", "", "   "] {
            let err = Schema::parse(declaration).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Schema, "{declaration:?}");
        }
    }

    #[test]
    fn display_round_trips_through_parse() {
        let schema = Schema::parse(" id : int ,stay:dateInvl").expect("schema");
        assert_eq!(schema.to_string(), "id:int, stay:dateInvl");
        assert_eq!(Schema::parse(&schema.to_string()).expect("reparse"), schema);
    }

    #[test]
    fn equality_is_ordered() {
        let a = Schema::parse("id:int, name:string").expect("a");
        let b = Schema::parse("name:string, id:int").expect("b");
        assert_ne!(a, b);
    }

    #[test]
    fn duplicate_names_are_allowed() {
        let schema = Schema::parse("x:int, x:int").expect("schema");
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.position("x"), Some(0));
    }
}
