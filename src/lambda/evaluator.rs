use std::cmp::Ordering;
use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use thiserror::Error;

use crate::ast::{BinaryOp, ExpressionType, Member, UnaryOp};
use crate::lambda::expr::{Expr, Method};
use crate::row::{ColumnKind, ColumnType, Row, RowError};
use crate::value::Value;

/// Errors that can occur while evaluating an [`Expr`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A parameter with no value in the bindings
    #[error("parameter '{0}' is not bound")]
    UnboundParameter(String),

    #[error(transparent)]
    Row(#[from] RowError),

    /// Type mismatch or invalid operation for the given type
    #[error("type error: {0}")]
    TypeError(String),

    #[error("division by zero")]
    DivisionByZero,
}

/// Parameter values for one evaluation.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: HashMap<String, Value>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

/// Evaluates expression trees against bound parameters.
///
/// Both forms of a row read evaluate to the same value: a `Row::get::<T>`
/// call goes through [`Row::get_as`], a normalized [`Member::Row`] read goes
/// through [`RowProperty::get_value`](crate::row::RowProperty::get_value) and
/// is then checked against the property's column type.
///
/// Comparisons follow lifted null semantics: `eq` and `ne` treat two nulls as
/// equal, ordering operators are false when either side is null. Numeric
/// operands of different types are widened to a common type first.
#[derive(Debug, Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Evaluator
    }

    pub fn evaluate(&self, expr: &Expr, bindings: &Bindings) -> Result<Value, EvalError> {
        match expr {
            Expr::Parameter { name, .. } => bindings
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::UnboundParameter(name.clone())),
            Expr::Constant { value, .. } | Expr::Captured { value, .. } => Ok(value.clone()),
            Expr::Call {
                method,
                receiver,
                args,
            } => self.eval_call(method, receiver.as_deref(), args, bindings),
            Expr::Member { receiver, member } => {
                let receiver = receiver.as_deref().ok_or_else(|| {
                    EvalError::TypeError(format!("member '{}' has no receiver", member.name()))
                })?;
                let value = self.evaluate(receiver, bindings)?;
                let row = expect_row(&value)?;
                match member {
                    Member::Row(property) => {
                        let raw = property.get_value(row)?;
                        if property.column_type().accepts(&raw) {
                            Ok(raw)
                        } else {
                            Err(RowError::TypeMismatch {
                                column: property.name().to_string(),
                                actual: raw.to_string(),
                                expected: property.column_type(),
                            }
                            .into())
                        }
                    }
                    Member::Declared { name, .. } => row.value(name).cloned().ok_or_else(|| {
                        RowError::MissingColumn {
                            column: name.clone(),
                        }
                        .into()
                    }),
                }
            }
            Expr::Binary { op, left, right } => match op {
                BinaryOp::And | BinaryOp::Or => {
                    let left = expect_bool(&self.evaluate(left, bindings)?, *op)?;
                    // short-circuit: `false and _`, `true or _`
                    if left == (*op == BinaryOp::Or) {
                        return Ok(Value::Boolean(left));
                    }
                    let right = expect_bool(&self.evaluate(right, bindings)?, *op)?;
                    Ok(Value::Boolean(right))
                }
                _ => {
                    let left = self.evaluate(left, bindings)?;
                    let right = self.evaluate(right, bindings)?;
                    apply_binop(*op, &left, &right)
                }
            },
            Expr::Unary { op, operand } => {
                let value = self.evaluate(operand, bindings)?;
                apply_unary(*op, &value)
            }
            Expr::Convert { operand, ty } => {
                let value = self.evaluate(operand, bindings)?;
                convert(value, *ty)
            }
        }
    }

    fn eval_call(
        &self,
        method: &Method,
        receiver: Option<&Expr>,
        args: &[Expr],
        bindings: &Bindings,
    ) -> Result<Value, EvalError> {
        let receiver = receiver
            .map(|r| self.evaluate(r, bindings))
            .transpose()?
            .ok_or_else(|| EvalError::TypeError(format!("{method} called without a receiver")))?;
        let args = args
            .iter()
            .map(|arg| self.evaluate(arg, bindings))
            .collect::<Result<Vec<_>, _>>()?;

        match method {
            Method::RowGet(column_type) => {
                let row = expect_row(&receiver)?;
                let [Value::String(name)] = args.as_slice() else {
                    return Err(EvalError::TypeError(format!(
                        "{method} expects a single string column name"
                    )));
                };
                Ok(row.get_as(name, *column_type)?)
            }
            Method::Named { name, .. } => call_string_method(name, &receiver, &args),
        }
    }
}

fn expect_row(value: &Value) -> Result<&Row, EvalError> {
    value.as_row().ok_or_else(|| {
        EvalError::TypeError(format!("expected a row, got {}", value.type_name()))
    })
}

fn expect_bool(value: &Value, op: BinaryOp) -> Result<bool, EvalError> {
    value.as_bool().ok_or_else(|| {
        EvalError::TypeError(format!("operands of '{op}' must be booleans, got {}", value.type_name()))
    })
}

fn call_string_method(name: &str, receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let text = receiver.as_str().ok_or_else(|| {
        EvalError::TypeError(format!("'{name}' needs a string receiver, got {}", receiver.type_name()))
    })?;
    let string_arg = || match args {
        [Value::String(arg)] => Ok(arg.as_str()),
        _ => Err(EvalError::TypeError(format!("'{name}' expects one string argument"))),
    };

    match name.to_ascii_lowercase().as_str() {
        "startswith" => Ok(Value::Boolean(text.starts_with(string_arg()?))),
        "endswith" => Ok(Value::Boolean(text.ends_with(string_arg()?))),
        "contains" => Ok(Value::Boolean(text.contains(string_arg()?))),
        "tolower" => Ok(Value::String(text.to_lowercase())),
        "toupper" => Ok(Value::String(text.to_uppercase())),
        "trim" => Ok(Value::String(text.trim().to_string())),
        "length" => Ok(Value::Int32(char_count(text)?)),
        "indexof" => {
            let needle = string_arg()?;
            let index = match text.find(needle) {
                Some(byte_index) => char_count(&text[..byte_index])?,
                None => -1,
            };
            Ok(Value::Int32(index))
        }
        _ => Err(EvalError::TypeError(format!("unknown method '{name}'"))),
    }
}

fn char_count(text: &str) -> Result<i32, EvalError> {
    i32::try_from(text.chars().count())
        .map_err(|_| EvalError::TypeError("string length exceeds Int32".to_string()))
}

fn apply_unary(op: UnaryOp, value: &Value) -> Result<Value, EvalError> {
    match (op, value) {
        (UnaryOp::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
        (UnaryOp::Negate, Value::Int16(n)) => n.checked_neg().map(Value::Int16).ok_or_else(|| overflow(op)),
        (UnaryOp::Negate, Value::Int32(n)) => n.checked_neg().map(Value::Int32).ok_or_else(|| overflow(op)),
        (UnaryOp::Negate, Value::Int64(n)) => n.checked_neg().map(Value::Int64).ok_or_else(|| overflow(op)),
        (UnaryOp::Negate, Value::Single(n)) => Ok(Value::Single(-*n)),
        (UnaryOp::Negate, Value::Double(n)) => Ok(Value::Double(-*n)),
        (UnaryOp::Negate, Value::Decimal(d)) => Ok(Value::Decimal(-*d)),
        (op, v) => Err(EvalError::TypeError(format!(
            "cannot apply '{op}' to {}",
            v.type_name()
        ))),
    }
}

fn overflow(op: impl std::fmt::Display) -> EvalError {
    EvalError::TypeError(format!("arithmetic overflow in '{op}'"))
}

fn apply_binop(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    if op.is_comparison() {
        return compare(op, left, right);
    }

    if op == BinaryOp::Add
        && let (Value::String(a), Value::String(b)) = (left, right)
    {
        return Ok(Value::String(format!("{a}{b}")));
    }

    let (left, right) = widen(left, right)?;
    match (&left, &right) {
        (Value::Byte(_) | Value::Int16(_) | Value::Int32(_) | Value::Int64(_), _) => {
            let (Some(a), Some(b)) = (as_i64(&left), as_i64(&right)) else {
                return Err(mismatch(op, &left, &right));
            };
            let result = integer_op(op, a, b)?;
            let ty = left.expression_type().unwrap_or(ExpressionType::Int64);
            from_i64(result, ty).ok_or_else(|| overflow(op))
        }
        (Value::Single(a), Value::Single(b)) => {
            Ok(Value::Single(float_op(op, f64::from(*a), f64::from(*b)) as f32))
        }
        (Value::Double(a), Value::Double(b)) => Ok(Value::Double(float_op(op, *a, *b))),
        (Value::Decimal(a), Value::Decimal(b)) => decimal_op(op, *a, *b).map(Value::Decimal),
        _ => Err(mismatch(op, &left, &right)),
    }
}

fn mismatch(op: BinaryOp, left: &Value, right: &Value) -> EvalError {
    EvalError::TypeError(format!(
        "cannot apply '{op}' to {} and {}",
        left.type_name(),
        right.type_name()
    ))
}

fn integer_op(op: BinaryOp, a: i64, b: i64) -> Result<i64, EvalError> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Subtract => a.checked_sub(b),
        BinaryOp::Multiply => a.checked_mul(b),
        BinaryOp::Divide | BinaryOp::Modulo if b == 0 => return Err(EvalError::DivisionByZero),
        BinaryOp::Divide => a.checked_div(b),
        BinaryOp::Modulo => a.checked_rem(b),
        _ => unreachable!("'{op}' is not arithmetic"),
    };
    result.ok_or_else(|| overflow(op))
}

fn float_op(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Subtract => a - b,
        BinaryOp::Multiply => a * b,
        BinaryOp::Divide => a / b,
        BinaryOp::Modulo => a % b,
        _ => unreachable!("'{op}' is not arithmetic"),
    }
}

fn decimal_op(op: BinaryOp, a: Decimal, b: Decimal) -> Result<Decimal, EvalError> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Subtract => a.checked_sub(b),
        BinaryOp::Multiply => a.checked_mul(b),
        BinaryOp::Divide | BinaryOp::Modulo if b.is_zero() => {
            return Err(EvalError::DivisionByZero);
        }
        BinaryOp::Divide => a.checked_div(b),
        BinaryOp::Modulo => a.checked_rem(b),
        _ => unreachable!("'{op}' is not arithmetic"),
    };
    result.ok_or_else(|| overflow(op))
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    if left.is_null() || right.is_null() {
        let both = left.is_null() && right.is_null();
        return Ok(Value::Boolean(match op {
            BinaryOp::Equal => both,
            BinaryOp::NotEqual => !both,
            _ => false,
        }));
    }

    let (left, right) = widen(left, right)?;
    if std::mem::discriminant(&left) != std::mem::discriminant(&right) {
        return Err(mismatch(op, &left, &right));
    }

    let result = match op {
        BinaryOp::Equal => left == right,
        BinaryOp::NotEqual => left != right,
        _ => {
            let ordering = order(&left, &right).ok_or_else(|| mismatch(op, &left, &right))?;
            match op {
                BinaryOp::GreaterThan => ordering == Some(Ordering::Greater),
                BinaryOp::GreaterThanOrEqual => {
                    matches!(ordering, Some(Ordering::Greater | Ordering::Equal))
                }
                BinaryOp::LessThan => ordering == Some(Ordering::Less),
                BinaryOp::LessThanOrEqual => {
                    matches!(ordering, Some(Ordering::Less | Ordering::Equal))
                }
                _ => unreachable!("'{op}' is not a comparison"),
            }
        }
    };
    Ok(Value::Boolean(result))
}

/// Ordering of two same-typed values. The outer `None` means the type is not
/// ordered at all; the inner `None` is an unordered float pair (NaN).
fn order(left: &Value, right: &Value) -> Option<Option<Ordering>> {
    Some(match (left, right) {
        (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
        (Value::Byte(a), Value::Byte(b)) => Some(a.cmp(b)),
        (Value::Int16(a), Value::Int16(b)) => Some(a.cmp(b)),
        (Value::Int32(a), Value::Int32(b)) => Some(a.cmp(b)),
        (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
        (Value::Single(a), Value::Single(b)) => a.partial_cmp(b),
        (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
        (Value::Decimal(a), Value::Decimal(b)) => Some(a.cmp(b)),
        (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
        (Value::Guid(a), Value::Guid(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Binary(a), Value::Binary(b)) => Some(a.cmp(b)),
        _ => return None,
    })
}

/// Brings two numeric values to a common type along the implicit widening
/// table. Non-numeric pairs are returned unchanged.
fn widen(left: &Value, right: &Value) -> Result<(Value, Value), EvalError> {
    let (Some(lt), Some(rt)) = (left.expression_type(), right.expression_type()) else {
        return Ok((left.clone(), right.clone()));
    };
    if lt == rt || !lt.is_numeric() || !rt.is_numeric() {
        return Ok((left.clone(), right.clone()));
    }

    let target = if lt.is_implicitly_castable_to(rt) {
        rt
    } else if rt.is_implicitly_castable_to(lt) {
        lt
    } else {
        // Decimal against a float: no implicit path either way
        return Err(EvalError::TypeError(format!(
            "no implicit conversion between {lt} and {rt}"
        )));
    };
    let converted = |value: &Value| {
        convert_numeric(value, target).ok_or_else(|| {
            EvalError::TypeError(format!("cannot widen {value} to {target}"))
        })
    };
    Ok((converted(left)?, converted(right)?))
}

/// Applies a [`Expr::Convert`] to an evaluated value.
fn convert(value: Value, ty: ColumnType) -> Result<Value, EvalError> {
    if ty.accepts(&value) {
        return Ok(value);
    }
    let fail = |value: &Value| {
        EvalError::TypeError(format!("cannot convert {} '{value}' to {ty}", value.type_name()))
    };
    match ty.kind() {
        ColumnKind::Primitive(target) if target.is_numeric() && !value.is_null() => {
            convert_numeric(&value, target).ok_or_else(|| fail(&value))
        }
        _ => Err(fail(&value)),
    }
}

/// Converts between numeric types. Narrowing that loses the integer part's
/// range fails; fractional parts truncate toward zero.
fn convert_numeric(value: &Value, target: ExpressionType) -> Option<Value> {
    match value {
        Value::Byte(n) => from_i64(i64::from(*n), target),
        Value::Int16(n) => from_i64(i64::from(*n), target),
        Value::Int32(n) => from_i64(i64::from(*n), target),
        Value::Int64(n) => from_i64(*n, target),
        Value::Single(n) => from_f64(f64::from(*n), target),
        Value::Double(n) => from_f64(*n, target),
        Value::Decimal(d) => from_decimal(*d, target),
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Byte(n) => Some(i64::from(*n)),
        Value::Int16(n) => Some(i64::from(*n)),
        Value::Int32(n) => Some(i64::from(*n)),
        Value::Int64(n) => Some(*n),
        _ => None,
    }
}

fn from_i64(n: i64, target: ExpressionType) -> Option<Value> {
    match target {
        ExpressionType::Byte => u8::try_from(n).ok().map(Value::Byte),
        ExpressionType::Int16 => i16::try_from(n).ok().map(Value::Int16),
        ExpressionType::Int32 => i32::try_from(n).ok().map(Value::Int32),
        ExpressionType::Int64 => Some(Value::Int64(n)),
        ExpressionType::Single => Some(Value::Single(n as f32)),
        ExpressionType::Double => Some(Value::Double(n as f64)),
        ExpressionType::Decimal => Some(Value::Decimal(Decimal::from(n))),
        _ => None,
    }
}

fn from_f64(n: f64, target: ExpressionType) -> Option<Value> {
    match target {
        ExpressionType::Single => Some(Value::Single(n as f32)),
        ExpressionType::Double => Some(Value::Double(n)),
        ExpressionType::Decimal => Decimal::from_f64(n).map(Value::Decimal),
        _ => {
            let truncated = n.trunc();
            if !truncated.is_finite() || truncated < i64::MIN as f64 || truncated > i64::MAX as f64 {
                return None;
            }
            from_i64(truncated as i64, target)
        }
    }
}

fn from_decimal(d: Decimal, target: ExpressionType) -> Option<Value> {
    match target {
        ExpressionType::Decimal => Some(Value::Decimal(d)),
        ExpressionType::Double => d.to_f64().map(Value::Double),
        ExpressionType::Single => d.to_f32().map(Value::Single),
        _ => d.trunc().to_i64().and_then(|n| from_i64(n, target)),
    }
}
