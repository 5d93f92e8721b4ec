// Dynamic row tests: typed access, JSON ingestion/emission, synthetic properties

use odata_expr::row::{ColumnKind, ColumnType, PropertyRegistry, json_to_value, value_to_json};
use odata_expr::{Row, RowError, Value};
use rust_decimal::Decimal;
use serde_json::json;

fn person() -> Row {
    Row::new([
        ("Name", Value::from("Ada")),
        ("Age", Value::Int32(36)),
        ("Nickname", Value::Null),
    ])
}

// ============================================================================
// get<T>
// ============================================================================

#[test]
fn test_get_reads_typed_value() {
    let row = person();
    assert_eq!(row.get::<String>("Name").unwrap(), "Ada");
    assert_eq!(row.get::<i32>("Age").unwrap(), 36);
    assert_eq!(row.get::<Value>("Age").unwrap(), Value::Int32(36));
}

#[test]
fn test_get_is_case_insensitive() {
    let row = person();
    assert_eq!(row.get::<String>("NAME").unwrap(), "Ada");
    assert_eq!(row.get::<i32>("age").unwrap(), 36);
    assert!(row.contains_column("nickname"));
}

#[test]
fn test_missing_column_is_lookup_failure() {
    let err = person().get::<i32>("Height").unwrap_err();
    assert_eq!(
        err,
        RowError::MissingColumn {
            column: "Height".to_string()
        }
    );
    assert_eq!(err.to_string(), "the row does not contain a value for column 'Height'");
}

#[test]
fn test_missing_column_fails_even_for_nullable_reads() {
    assert_eq!(
        person().get::<Option<i32>>("Height").unwrap_err(),
        RowError::MissingColumn {
            column: "Height".to_string()
        }
    );
    assert!(matches!(
        person().get::<Value>("Height"),
        Err(RowError::MissingColumn { .. })
    ));
}

#[test]
fn test_null_reads_as_none_for_nullable_types() {
    let row = person();
    assert_eq!(row.get::<Option<String>>("Nickname").unwrap(), None);
    assert_eq!(row.get::<Option<i32>>("Nickname").unwrap(), None);
    assert_eq!(row.get::<Value>("Nickname").unwrap(), Value::Null);
    assert_eq!(row.get::<Option<i32>>("Age").unwrap(), Some(36));
}

#[test]
fn test_null_into_non_nullable_is_type_mismatch() {
    let err = person().get::<i32>("Nickname").unwrap_err();
    assert!(matches!(err, RowError::TypeMismatch { ref column, .. } if column == "Nickname"));
}

#[test]
fn test_wrong_type_is_type_mismatch() {
    let err = person().get::<i64>("Age").unwrap_err();
    assert_eq!(
        err,
        RowError::TypeMismatch {
            column: "Age".to_string(),
            actual: "36".to_string(),
            expected: ColumnType::primitive(odata_expr::ExpressionType::Int64),
        }
    );
    assert_eq!(err.to_string(), "value '36' for column 'Age' is not of type Int64");
}

#[test]
fn test_get_as_matches_get() {
    let row = person();
    assert_eq!(row.get_as("age", ColumnType::INT32).unwrap(), Value::Int32(36));
    assert_eq!(row.get_as("nickname", ColumnType::STRING.nullable()).unwrap(), Value::Null);
    assert!(matches!(
        row.get_as("nickname", ColumnType::STRING),
        Err(RowError::TypeMismatch { .. })
    ));
    assert!(matches!(
        row.get_as("missing", ColumnType::ANY),
        Err(RowError::MissingColumn { .. })
    ));
}

#[test]
fn test_duplicate_names_last_write_wins() {
    let row = Row::new([("a", Value::Int32(1)), ("b", Value::Int32(2)), ("A", Value::Int32(3))]);
    assert_eq!(row.len(), 2);
    assert_eq!(row.get::<i32>("a").unwrap(), 3);

    let names: Vec<_> = row.iter().map(|(name, _)| name).collect();
    assert_eq!(names, ["A", "b"]);
}

#[test]
fn test_row_display() {
    assert_eq!(person().to_string(), "{Name: Ada, Age: 36, Nickname: null}");
    assert!(Row::default().is_empty());
}

// ============================================================================
// Column types
// ============================================================================

#[test]
fn test_column_type_parsing_and_display() {
    let nullable: ColumnType = "int32?".parse().unwrap();
    assert!(nullable.is_nullable());
    assert_eq!(nullable.to_string(), "Option<Int32>");

    let keyword: ColumnType = "Edm.String".parse().unwrap();
    assert_eq!(keyword, ColumnType::STRING);

    assert_eq!("row".parse::<ColumnType>().unwrap().kind(), ColumnKind::Row);
    assert_eq!("any".parse::<ColumnType>().unwrap(), ColumnType::ANY);
    assert!("complex".parse::<ColumnType>().is_err());
}

// ============================================================================
// JSON
// ============================================================================

#[test]
fn test_row_from_json_object() {
    let row = Row::try_from(json!({
        "id": 7,
        "name": "Widget",
        "price": 2.5,
        "tags": ["a", "b"],
        "maker": { "country": "NZ" },
        "discontinued": null
    }))
    .unwrap();

    assert_eq!(row.get::<i64>("ID").unwrap(), 7);
    assert_eq!(row.get::<f64>("price").unwrap(), 2.5);
    assert_eq!(
        row.get::<Vec<Value>>("tags").unwrap(),
        vec![Value::from("a"), Value::from("b")]
    );
    let maker = row.get::<Row>("maker").unwrap();
    assert_eq!(maker.get::<String>("Country").unwrap(), "NZ");
    assert_eq!(row.get::<Option<bool>>("discontinued").unwrap(), None);
}

#[test]
fn test_non_object_json_is_unsupported_shape() {
    let err = Row::try_from(json!([1, 2])).unwrap_err();
    assert!(matches!(err, RowError::UnsupportedShape { .. }));
}

#[test]
fn test_large_unsigned_integers_become_decimal() {
    let value = json_to_value(json!(u64::MAX)).unwrap();
    assert_eq!(value, Value::Decimal(Decimal::from(u64::MAX)));
}

#[test]
fn test_row_emits_plain_json_object() {
    let source = json!({
        "name": "Widget",
        "count": 3,
        "parts": [{ "id": 1 }, { "id": 2 }],
        "note": null
    });
    let row = Row::try_from(source.clone()).unwrap();
    assert_eq!(serde_json::to_value(&row).unwrap(), source);
    assert_eq!(value_to_json(&Value::Row(row)).unwrap(), source);
}

#[test]
fn test_row_deserializes_from_json_text() {
    let row: Row = serde_json::from_str(r#"{"A": 1, "b": [true]}"#).unwrap();
    assert_eq!(row.get::<i64>("a").unwrap(), 1);
    assert!(serde_json::from_str::<Row>("42").is_err());
}

// ============================================================================
// Synthetic properties
// ============================================================================

#[test]
fn test_property_reads_column() {
    let registry = PropertyRegistry::new();
    let property = registry.property("name", ColumnType::STRING);
    assert_eq!(property.get_value(&person()).unwrap(), Value::from("Ada"));
}

#[test]
fn test_property_read_of_missing_column_fails() {
    let registry = PropertyRegistry::new();
    let property = registry.property("Height", ColumnType::INT32);
    assert!(matches!(
        property.get_value(&person()),
        Err(RowError::MissingColumn { .. })
    ));
}

#[test]
fn test_property_is_read_only() {
    let registry = PropertyRegistry::new();
    let property = registry.property("Age", ColumnType::INT32);
    let mut row = person();
    let err = property.set_value(&mut row, Value::Int32(1)).unwrap_err();
    assert!(matches!(err, RowError::ReadOnlyProperty { .. }));
    assert_eq!(row.get::<i32>("Age").unwrap(), 36);
}

#[test]
fn test_property_display() {
    let registry = PropertyRegistry::new();
    assert_eq!(
        registry.property("Name", ColumnType::STRING).to_string(),
        "Row.get<String>(\"Name\")"
    );
    assert_eq!(
        registry.property("Age", ColumnType::INT32.nullable()).to_string(),
        "Row.get<Option<Int32>>(\"Age\")"
    );
}

#[test]
fn test_property_equality_is_structural() {
    let first = PropertyRegistry::new();
    let second = PropertyRegistry::new();
    let a = first.property("Name", ColumnType::STRING);
    let b = second.property("NAME", ColumnType::STRING);
    assert_eq!(*a, *b);
    assert_ne!(*a, *first.property("Name", ColumnType::STRING.nullable()));
}
