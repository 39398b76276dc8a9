// Contract tests for the persisted document: layout, legacy files, and the round-trip law.
use proptest::prelude::*;
use serde_json::json;
use tabula::api::{DateInterval, Field, FieldType, Row, Schema, Session, Value};
use tabula::core::codec::{decode, encode, from_json, load, save, to_json};
use tabula::core::database::Database;
use tabula::core::error::ErrorKind;
use time::{Date, Month};

fn date_strategy() -> impl Strategy<Value = Date> {
    (1i32..=9999, 1u8..=12, 1u8..=28).prop_map(|(year, month, day)| {
        let month = Month::try_from(month).unwrap();
        Date::from_calendar_date(year, month, day).unwrap()
    })
}

fn value_strategy(field_type: FieldType) -> BoxedStrategy<Value> {
    match field_type {
        FieldType::Integer => any::<i64>().prop_map(Value::Integer).boxed(),
        FieldType::Real => any::<f64>()
            .prop_filter("finite", |value| value.is_finite())
            .prop_map(Value::Real)
            .boxed(),
        FieldType::Char => any::<char>().prop_map(Value::Char).boxed(),
        FieldType::Text => any::<String>().prop_map(Value::Text).boxed(),
        FieldType::Date => date_strategy().prop_map(Value::Date).boxed(),
        FieldType::DateInterval => (date_strategy(), date_strategy())
            .prop_map(|(start, end)| Value::DateInterval(DateInterval::new(start, end)))
            .boxed(),
    }
}

fn field_type_strategy() -> impl Strategy<Value = FieldType> {
    prop::sample::select(FieldType::ALL.to_vec())
}

fn table_strategy() -> impl Strategy<Value = (Schema, Vec<Row>)> {
    prop::collection::vec(("[a-z]{1,6}", field_type_strategy()), 1..5).prop_flat_map(|fields| {
        let schema = Schema::new(
            fields
                .iter()
                .map(|(name, field_type)| Field::new(name.clone(), *field_type))
                .collect(),
        );
        let row = fields
            .iter()
            .map(|(_, field_type)| value_strategy(*field_type))
            .collect::<Vec<_>>()
            .prop_map(Row::new);
        (Just(schema), prop::collection::vec(row, 0..6))
    })
}

fn database_strategy() -> impl Strategy<Value = Database> {
    ("[a-z]{0,8}", prop::collection::vec(table_strategy(), 0..4)).prop_map(|(name, tables)| {
        let mut db = Database::new(name);
        for (idx, (schema, rows)) in tables.into_iter().enumerate() {
            let table = db.create_table(format!("t{idx}"), schema).unwrap();
            for row in rows {
                table.add_row(row);
            }
        }
        db
    })
}

proptest! {
    #[test]
    fn decode_inverts_encode(db in database_strategy()) {
        prop_assert_eq!(decode(encode(&db)).unwrap(), db.clone());
        prop_assert_eq!(from_json(&to_json(&db).unwrap()).unwrap(), db);
    }
}

#[test]
fn documented_layout_for_mixed_table() {
    let mut session = Session::new();
    session.create_database("events").unwrap();
    session
        .create_table("log", "id:int, at:date, span:dateInvl")
        .unwrap();
    session
        .add_row("log", &["7", "2024-01-15", "2024-01-15;2024-01-20"])
        .unwrap();
    let document = serde_json::to_value(encode(session.database().unwrap())).unwrap();
    assert_eq!(
        document,
        json!({
            "name": "events",
            "tables": [{
                "name": "log",
                "schema": [["id", "int"], ["at", "date"], ["span", "DateInterval"]],
                "rows": [[7, "2024-01-15", "2024-01-15;2024-01-20"]]
            }]
        })
    );
}

#[test]
fn reals_survive_save_and_load_exactly() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("reals.json");
    let mut db = Database::new("reals");
    let table = db
        .create_table_from_declaration("r", "x:real")
        .unwrap();
    for token in ["0.1", "1e-300", "123456789.123456789", "-0.0", "3"] {
        table.insert_tokens(&[token]).unwrap();
    }
    save(&db, &path).unwrap();
    assert_eq!(load(&path).unwrap(), db);
}

#[test]
fn python_era_document_loads() {
    let text = r#"{"name": "school", "tables": [{"name": "students", "schema": [["name", "str"], ["grade", "str"], ["born", "date"], ["term", "DateInterval"], ["gpa", "float"], ["year", "int"]], "rows": [["ana", "A", "2001-03-04", "2020-09-01; 2021-06-30", 3.5, 1], ["ben", "B", "2000-12-31", "2020-09-01;2021-06-30", 4, 2]]}]}"#;
    let db = from_json(text).unwrap();
    let students = db.table("students").unwrap();
    assert_eq!(students.schema().fields()[1].field_type, FieldType::Text);
    assert_eq!(students.len(), 2);
    assert_eq!(students.rows()[1].values()[4], Value::Real(4.0));
    assert_eq!(students.rows()[0].values()[3], students.rows()[1].values()[3]);

    // Re-encoding normalizes the interval spelling but keeps every value.
    assert_eq!(from_json(&to_json(&db).unwrap()).unwrap(), db);
}

#[test]
fn char_fields_keep_their_type_across_files() {
    let mut db = Database::new("c");
    db.create_table_from_declaration("t", "c:char")
        .unwrap()
        .insert_tokens(&["z"])
        .unwrap();
    let document = serde_json::to_value(encode(&db)).unwrap();
    assert_eq!(document["tables"][0]["schema"], json!([["c", "char"]]));
    let reloaded = decode(serde_json::from_value(document).unwrap()).unwrap();
    assert_eq!(reloaded.table("t").unwrap().rows()[0].values()[0], Value::Char('z'));
}

#[test]
fn truncated_file_is_codec_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("cut.json");
    std::fs::write(&path, r#"{"name": "x", "tables": [{"name": "t", "sch"#).unwrap();
    let err = load(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Codec);
    assert_eq!(err.path(), Some(path.as_path()));
}
