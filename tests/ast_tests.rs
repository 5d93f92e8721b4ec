// AST construction and printing tests
//
// Precedence, literal forms, conversions and construction-time validation
// of query expression nodes.

use chrono::{NaiveDate, NaiveDateTime};
use odata_expr::ast::*;
use odata_expr::Value;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

fn member(name: &str, ty: ExpressionType) -> ODataExpression {
    MemberAccessExpression::root(Member::declared(name, ty)).into()
}

fn flag(name: &str) -> ODataExpression {
    member(name, ExpressionType::Boolean)
}

fn int(name: &str) -> ODataExpression {
    member(name, ExpressionType::Int32)
}

fn bin(left: ODataExpression, op: BinaryOp, right: ODataExpression) -> ODataExpression {
    ODataExpression::binary(left, op, right).unwrap()
}

fn literal(value: impl Into<Value>, ty: ExpressionType) -> String {
    ODataExpression::constant(value, ty).unwrap().to_string()
}

fn datetime(h: u32, m: u32, s: u32, nanos: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 3, 4)
        .unwrap()
        .and_hms_nano_opt(h, m, s, nanos)
        .unwrap()
}

// ============================================================================
// Precedence
// ============================================================================

#[test]
fn test_or_inside_and_is_parenthesized() {
    let expr = bin(bin(flag("A"), BinaryOp::Or, flag("B")), BinaryOp::And, flag("C"));
    assert_eq!(expr.to_string(), "(A or B) and C");
}

#[test]
fn test_and_inside_or_is_not_parenthesized() {
    let expr = bin(bin(flag("A"), BinaryOp::And, flag("B")), BinaryOp::Or, flag("C"));
    assert_eq!(expr.to_string(), "A and B or C");
}

#[test]
fn test_comparisons_under_and_are_bare() {
    let left = bin(int("A"), BinaryOp::Equal, ODataExpression::constant(1, ExpressionType::Int32).unwrap());
    let right = bin(int("B"), BinaryOp::LessThan, ODataExpression::constant(2, ExpressionType::Int32).unwrap());
    let expr = bin(left, BinaryOp::And, right);
    assert_eq!(expr.to_string(), "A eq 1 and B lt 2");
}

#[test]
fn test_or_under_comparison_is_parenthesized() {
    let expr = bin(bin(flag("A"), BinaryOp::Or, flag("B")), BinaryOp::Equal, flag("C"));
    assert_eq!(expr.to_string(), "(A or B) eq C");
}

#[test]
fn test_additive_under_multiplicative_is_parenthesized() {
    let expr = bin(bin(int("a"), BinaryOp::Add, int("b")), BinaryOp::Multiply, int("c"));
    assert_eq!(expr.to_string(), "(a add b) mul c");
}

#[test]
fn test_multiplicative_under_additive_is_bare() {
    let expr = bin(int("a"), BinaryOp::Add, bin(int("b"), BinaryOp::Multiply, int("c")));
    assert_eq!(expr.to_string(), "a add b mul c");
}

#[test]
fn test_arithmetic_under_comparison_is_bare() {
    let expr = bin(bin(int("a"), BinaryOp::Add, int("b")), BinaryOp::GreaterThan, int("c"));
    assert_eq!(expr.to_string(), "a add b gt c");
}

#[test]
fn test_unary_operands_are_never_parenthesized_by_binary_printer() {
    let not_a = ODataExpression::unary(UnaryOp::Not, flag("A"));
    let expr = bin(not_a, BinaryOp::And, flag("B"));
    assert_eq!(expr.to_string(), "not A and B");
}

#[test]
fn test_binary_result_types() {
    let comparison = bin(int("a"), BinaryOp::GreaterThan, int("b"));
    assert_eq!(comparison.ty(), ExpressionType::Boolean);

    let sum = bin(int("a"), BinaryOp::Add, int("b"));
    assert_eq!(sum.ty(), ExpressionType::Int32);
    assert_eq!(sum.kind(), ExpressionKind::BinaryOp);
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_boolean_and_integer_literals() {
    assert_eq!(literal(true, ExpressionType::Boolean), "true");
    assert_eq!(literal(false, ExpressionType::Boolean), "false");
    assert_eq!(literal(-7i16, ExpressionType::Int16), "-7");
    assert_eq!(literal(42, ExpressionType::Int32), "42");
    assert_eq!(literal(42i64, ExpressionType::Int64), "42L");
}

#[test]
fn test_byte_literal_is_two_hex_digits() {
    assert_eq!(literal(10u8, ExpressionType::Byte), "0a");
    assert_eq!(literal(255u8, ExpressionType::Byte), "ff");
}

#[test]
fn test_floating_literals() {
    assert_eq!(literal(2.5f64, ExpressionType::Double), "2.5");
    assert_eq!(literal(f64::NAN, ExpressionType::Double), "NaN");
    assert_eq!(literal(f64::INFINITY, ExpressionType::Double), "INF");
    assert_eq!(literal(f64::NEG_INFINITY, ExpressionType::Double), "-INF");
    assert_eq!(literal(2.5f32, ExpressionType::Single), "2.5f");
    assert_eq!(literal(2.0f32, ExpressionType::Single), "2.0f");
}

#[test]
fn test_single_literal_rounds_midpoints_away_from_zero() {
    assert_eq!(literal(2.25f32, ExpressionType::Single), "2.3f");
    assert_eq!(literal(0.25f32, ExpressionType::Single), "0.3f");
    assert_eq!(literal(-2.25f32, ExpressionType::Single), "-2.3f");
    assert_eq!(literal(0.75f32, ExpressionType::Single), "0.8f");
    assert_eq!(literal(1.04f32, ExpressionType::Single), "1.0f");
}

#[test]
fn test_decimal_literal_keeps_scale() {
    let d = Decimal::from_str("1.50").unwrap();
    assert_eq!(literal(d, ExpressionType::Decimal), "1.50M");
}

#[test]
fn test_datetime_literal_drops_zero_seconds() {
    assert_eq!(
        literal(datetime(5, 6, 0, 0), ExpressionType::DateTime),
        "datetime'2020-03-04T05:06'"
    );
    assert_eq!(
        literal(datetime(5, 6, 7, 0), ExpressionType::DateTime),
        "datetime'2020-03-04T05:06:07'"
    );
}

#[test]
fn test_datetime_literal_fraction_has_seven_digits() {
    assert_eq!(
        literal(datetime(5, 6, 7, 500_000_000), ExpressionType::DateTime),
        "datetime'2020-03-04T05:06:07.5000000'"
    );
    assert_eq!(
        literal(datetime(5, 6, 0, 100), ExpressionType::DateTime),
        "datetime'2020-03-04T05:06:00.0000001'"
    );
}

#[test]
fn test_guid_literal() {
    let g = Uuid::parse_str("0f8fad5b-d9cb-469f-a165-70867728950e").unwrap();
    assert_eq!(
        literal(g, ExpressionType::Guid),
        "guid'0f8fad5b-d9cb-469f-a165-70867728950e'"
    );
}

#[test]
fn test_string_literal_doubles_quotes() {
    assert_eq!(literal("O'Brien", ExpressionType::String), "'O''Brien'");
    assert_eq!(literal("", ExpressionType::String), "''");
}

#[test]
fn test_binary_literal_is_uppercase_hex() {
    assert_eq!(literal(vec![0x0au8, 0xff], ExpressionType::Binary), "X'0AFF'");
}

#[test]
fn test_type_literals() {
    let primitive = TypeRef::Primitive(ExpressionType::Int32);
    assert_eq!(literal(primitive, ExpressionType::Type), "Edm.Int32");

    let named = TypeRef::Named("Shop.Customer".to_string());
    assert_eq!(literal(named, ExpressionType::Type), "'Shop.Customer'");
}

#[test]
fn test_null_literal_for_any_type() {
    for ty in [ExpressionType::Int32, ExpressionType::String, ExpressionType::DateTime] {
        assert_eq!(literal(Value::Null, ty), "null");
    }
}

// ============================================================================
// Members, calls, conversions
// ============================================================================

#[test]
fn test_member_path_is_slash_joined() {
    let customer = MemberAccessExpression::root(Member::declared("Customer", ExpressionType::Complex));
    let name = MemberAccessExpression::new(Some(customer), Member::declared("Name", ExpressionType::String));
    assert_eq!(name.to_string(), "Customer/Name");
    assert_eq!(name.ty(), ExpressionType::String);
}

#[test]
fn test_call_printing() {
    let call = ODataExpression::call(
        Function::SubstringOf,
        vec![
            ODataExpression::constant("ada", ExpressionType::String).unwrap(),
            member("Name", ExpressionType::String),
        ],
        ExpressionType::Boolean,
    );
    assert_eq!(call.to_string(), "substringof('ada', Name)");
    assert_eq!(call.ty(), ExpressionType::Boolean);
}

#[test]
fn test_unary_printing() {
    assert_eq!(ODataExpression::unary(UnaryOp::Not, flag("Active")).to_string(), "not Active");
    let negated = ODataExpression::unary(UnaryOp::Negate, int("Price"));
    assert_eq!(negated.to_string(), "- Price");
    assert_eq!(negated.ty(), ExpressionType::Int32);
}

#[test]
fn test_implicit_convert_prints_operand_only() {
    let widened = ODataExpression::convert(int("Age"), ExpressionType::Int64).unwrap();
    assert_eq!(widened.to_string(), "Age");
    assert_eq!(widened.ty(), ExpressionType::Int64);
}

#[test]
fn test_explicit_convert_prints_cast() {
    let narrowed = ODataExpression::convert(member("Id", ExpressionType::Int64), ExpressionType::Int32).unwrap();
    assert_eq!(narrowed.to_string(), "cast(Id, Edm.Int32)");

    let to_string = ODataExpression::convert(int("Age"), ExpressionType::String).unwrap();
    assert_eq!(to_string.to_string(), "cast(Age, Edm.String)");
}

#[test]
fn test_implicit_widening_table() {
    use ExpressionType::*;
    assert!(Byte.is_implicitly_castable_to(Decimal));
    assert!(Int32.is_implicitly_castable_to(Double));
    assert!(Single.is_implicitly_castable_to(Double));
    assert!(String.is_implicitly_castable_to(String));
    assert!(!Int64.is_implicitly_castable_to(Int32));
    assert!(!Double.is_implicitly_castable_to(Single));
    assert!(!Double.is_implicitly_castable_to(Decimal));
}

#[test]
fn test_sort_keys() {
    let ascending = SortKeyExpression::new(member("Name", ExpressionType::String), SortDirection::Ascending);
    let descending = SortKeyExpression::new(member("Name", ExpressionType::String), SortDirection::Descending);
    assert_eq!(ascending.to_string(), "Name");
    assert_eq!(descending.to_string(), "Name desc");
}

#[test]
fn test_select_columns() {
    let orders = MemberAccessExpression::root(Member::declared("Orders", ExpressionType::Complex));
    let expanded = SelectColumnExpression::new(Some(orders.clone()), true).unwrap();
    assert_eq!(expanded.to_string(), "Orders/*");
    assert_eq!(SelectColumnExpression::column(orders).to_string(), "Orders");
    assert_eq!(SelectColumnExpression::wildcard().to_string(), "*");
    assert_eq!(SelectColumnExpression::wildcard().ty(), ExpressionType::Complex);
}

// ============================================================================
// Construction errors
// ============================================================================

#[test]
fn test_operand_type_mismatch_is_rejected() {
    let err = ODataExpression::binary(
        int("Age"),
        BinaryOp::Equal,
        ODataExpression::constant("36", ExpressionType::String).unwrap(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        ExpressionError::OperandTypeMismatch {
            op: BinaryOp::Equal,
            left: ExpressionType::Int32,
            right: ExpressionType::String,
        }
    );
}

#[test]
fn test_constant_must_match_its_type() {
    let err = ODataExpression::constant(1, ExpressionType::String).unwrap_err();
    assert!(matches!(err, ExpressionError::ConstantTypeMismatch { ty: ExpressionType::String, .. }));

    assert!(ODataExpression::constant(Value::Null, ExpressionType::Complex).is_err());
}

#[test]
fn test_convert_target_must_be_primitive() {
    let err = ODataExpression::convert(int("Age"), ExpressionType::Complex).unwrap_err();
    assert_eq!(err, ExpressionError::NonPrimitiveCast(ExpressionType::Complex));
}

#[test]
fn test_empty_select_column_is_rejected() {
    let err = SelectColumnExpression::new(None, false).unwrap_err();
    assert_eq!(err, ExpressionError::EmptySelectColumn);
}

#[test]
fn test_type_names_parse() {
    assert_eq!("int32".parse::<ExpressionType>().unwrap(), ExpressionType::Int32);
    assert_eq!("Edm.DateTime".parse::<ExpressionType>().unwrap(), ExpressionType::DateTime);
    assert!("Edm.Nope".parse::<ExpressionType>().is_err());
    assert_eq!("substringof".parse::<Function>().unwrap(), Function::SubstringOf);
    assert_eq!("desc".parse::<SortDirection>().unwrap(), SortDirection::Descending);
    assert_eq!("allpages".parse::<InlineCount>().unwrap(), InlineCount::AllPages);
}
