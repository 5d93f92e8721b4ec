use odata_expr::ast::{BinaryOp, ExpressionType, ODataExpression};
use odata_expr::lambda::{Bindings, Evaluator, Expr, Normalizer, denormalize};
use odata_expr::row::PropertyRegistry;
use odata_expr::{Row, Value};
use proptest::prelude::*;

const COLUMNS: [&str; 3] = ["alpha", "beta", "gamma"];

#[derive(Debug, Clone)]
enum Predicate {
    Compare { column: usize, op: BinaryOp, value: i32 },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    fn to_expr(&self) -> Expr {
        match self {
            Predicate::Compare { column, op, value } => Expr::binary(
                Expr::column::<i32>(Expr::row("r"), COLUMNS[*column]),
                *op,
                Expr::constant(*value),
            ),
            Predicate::And(a, b) => a.to_expr().and(b.to_expr()),
            Predicate::Or(a, b) => a.to_expr().or(b.to_expr()),
            Predicate::Not(a) => !a.to_expr(),
        }
    }
}

fn arb_comparison() -> impl Strategy<Value = BinaryOp> {
    prop_oneof![
        Just(BinaryOp::Equal),
        Just(BinaryOp::NotEqual),
        Just(BinaryOp::GreaterThan),
        Just(BinaryOp::GreaterThanOrEqual),
        Just(BinaryOp::LessThan),
        Just(BinaryOp::LessThanOrEqual),
    ]
}

fn arb_predicate() -> impl Strategy<Value = Predicate> {
    let leaf = (0..COLUMNS.len(), arb_comparison(), -50i32..50)
        .prop_map(|(column, op, value)| Predicate::Compare { column, op, value });
    leaf.prop_recursive(4, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Predicate::And(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Predicate::Or(Box::new(a), Box::new(b))),
            inner.prop_map(|a| Predicate::Not(Box::new(a))),
        ]
    })
}

fn arb_row() -> impl Strategy<Value = Row> {
    prop::collection::vec(-60i32..60, COLUMNS.len()).prop_map(|values| {
        COLUMNS
            .iter()
            .zip(values)
            .map(|(name, value)| (name.to_uppercase(), Value::Int32(value)))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_denormalize_inverts_normalize(predicate in arb_predicate()) {
        let registry = PropertyRegistry::new();
        let expr = predicate.to_expr();
        let normalized = Normalizer::new(&registry).normalize(&expr).unwrap();
        prop_assert_eq!(denormalize(&normalized), expr);
        prop_assert!(registry.len() <= COLUMNS.len());
    }

    #[test]
    fn prop_rewrites_evaluate_alike(predicate in arb_predicate(), row in arb_row()) {
        let registry = PropertyRegistry::new();
        let expr = predicate.to_expr();
        let normalized = Normalizer::new(&registry).normalize(&expr).unwrap();
        let bindings = Bindings::new().bind("r", row);
        let evaluator = Evaluator::new();

        let expected = evaluator.evaluate(&expr, &bindings).unwrap();
        prop_assert_eq!(evaluator.evaluate(&normalized, &bindings).unwrap(), expected.clone());
        prop_assert_eq!(evaluator.evaluate(&denormalize(&normalized), &bindings).unwrap(), expected);
    }

    #[test]
    fn prop_string_literal_doubles_every_quote(s in ".*") {
        let literal = ODataExpression::constant(s.as_str(), ExpressionType::String).unwrap().to_string();
        prop_assert!(literal.starts_with('\'') && literal.ends_with('\''));
        let inner = &literal[1..literal.len() - 1];
        prop_assert_eq!(inner.replace("''", "'"), s.clone());
        prop_assert_eq!(inner.matches('\'').count(), 2 * s.matches('\'').count());
    }

    #[test]
    fn prop_tighter_child_is_never_parenthesized(a in 0i32..10, b in 0i32..10, c in 0i32..10) {
        let k = |n: i32| ODataExpression::constant(n, ExpressionType::Int32).unwrap();
        let product = ODataExpression::binary(k(b), BinaryOp::Multiply, k(c)).unwrap();
        let sum = ODataExpression::binary(k(a), BinaryOp::Add, product).unwrap();
        prop_assert_eq!(sum.to_string(), format!("{a} add {b} mul {c}"));
    }
}
