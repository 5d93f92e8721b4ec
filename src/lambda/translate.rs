use thiserror::Error;

use crate::ast::{
    ExpressionError, ExpressionType, Function, MemberAccessExpression, ODataExpression,
    SelectColumnExpression, SortDirection, SortKeyExpression,
};
use crate::lambda::expr::{Expr, Method};
use crate::row::{ColumnKind, ColumnType};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// A node with no query-language counterpart
    #[error("cannot translate {0}")]
    Unsupported(String),

    #[error(transparent)]
    Expression(#[from] ExpressionError),
}

/// Translates a normalized expression into a query AST node.
///
/// The row parameter is the implicit root of member paths, so
/// `r.get::<i32>("Age") > 18` becomes `Age gt 18`. Operands whose types
/// differ are bridged with an implicit-widening convert, which prints as
/// nothing.
///
/// # Examples
///
/// ```
/// use odata_expr::lambda::{Expr, normalize, translate};
///
/// let r = Expr::row("r");
/// let predicate = Expr::column::<String>(r.clone(), "Name")
///     .equal(Expr::constant("Ada".to_string()))
///     .or(Expr::column::<i64>(r, "Id").greater_than(Expr::constant(7)));
///
/// let filter = translate(&normalize(&predicate).unwrap()).unwrap();
/// assert_eq!(filter.to_string(), "Name eq 'Ada' or Id gt 7");
/// ```
pub fn translate(expr: &Expr) -> Result<ODataExpression, TranslateError> {
    match expr {
        Expr::Constant { value, ty } | Expr::Captured { value, ty, .. } => constant(value, *ty),
        Expr::Member { .. } => translate_member(expr).map(ODataExpression::from),
        Expr::Binary { op, left, right } => {
            let (left, right) = widen(translate(left)?, translate(right)?)?;
            Ok(ODataExpression::binary(left, *op, right)?)
        }
        Expr::Unary { op, operand } => Ok(ODataExpression::unary(*op, translate(operand)?)),
        Expr::Convert { operand, ty } => {
            let inner = translate(operand)?;
            let target = ty.expression_type();
            if inner.ty() == target {
                Ok(inner)
            } else {
                Ok(ODataExpression::convert(inner, target)?)
            }
        }
        Expr::Call {
            method: Method::Named { name, .. },
            receiver,
            args,
        } => {
            let receiver = receiver
                .as_deref()
                .ok_or_else(|| TranslateError::Unsupported(format!("{expr}: no receiver")))?;
            let receiver = translate(receiver)?;
            let mut args = args.iter().map(translate).collect::<Result<Vec<_>, _>>()?;
            string_function(name, receiver, &mut args)
                .ok_or_else(|| TranslateError::Unsupported(expr.to_string()))
        }
        Expr::Call {
            method: Method::RowGet(_),
            ..
        } => Err(TranslateError::Unsupported(format!(
            "{expr}: row accessor calls must be normalized first"
        ))),
        Expr::Parameter { name, .. } => Err(TranslateError::Unsupported(format!(
            "bare parameter '{name}'"
        ))),
    }
}

/// Translates a member read into a `/`-separated member path.
pub fn translate_member(expr: &Expr) -> Result<MemberAccessExpression, TranslateError> {
    match expr {
        Expr::Member { receiver, member } => {
            let receiver = match receiver.as_deref() {
                None | Some(Expr::Parameter { .. }) => None,
                Some(inner) => Some(translate_member(inner)?),
            };
            Ok(MemberAccessExpression::new(receiver, member.clone()))
        }
        other => Err(TranslateError::Unsupported(format!(
            "{other} is not a member path"
        ))),
    }
}

pub fn translate_sort_key(
    expr: &Expr,
    direction: SortDirection,
) -> Result<SortKeyExpression, TranslateError> {
    Ok(SortKeyExpression::new(translate(expr)?, direction))
}

pub fn translate_select(expr: &Expr) -> Result<SelectColumnExpression, TranslateError> {
    translate_member(expr).map(SelectColumnExpression::column)
}

fn constant(value: &Value, ty: ColumnType) -> Result<ODataExpression, TranslateError> {
    let ty = match ty.kind() {
        ColumnKind::Primitive(ty) => ty,
        _ => value
            .expression_type()
            .filter(|ty| ty.is_primitive())
            .ok_or_else(|| {
                TranslateError::Unsupported(format!("constant {value} of type {ty}"))
            })?,
    };
    Ok(ODataExpression::constant(value.clone(), ty)?)
}

/// Converts whichever operand implicitly widens to the other's type.
fn widen(
    left: ODataExpression,
    right: ODataExpression,
) -> Result<(ODataExpression, ODataExpression), TranslateError> {
    let (lt, rt) = (left.ty(), right.ty());
    if lt == rt {
        Ok((left, right))
    } else if lt.is_implicitly_castable_to(rt) {
        Ok((ODataExpression::convert(left, rt)?, right))
    } else if rt.is_implicitly_castable_to(lt) {
        Ok((left, ODataExpression::convert(right, lt)?))
    } else {
        Ok((left, right))
    }
}

fn string_function(
    name: &str,
    receiver: ODataExpression,
    args: &mut Vec<ODataExpression>,
) -> Option<ODataExpression> {
    let (function, arguments, return_type) = match (name.to_ascii_lowercase().as_str(), args.len()) {
        ("startswith", 1) => (Function::StartsWith, vec![receiver, args.remove(0)], ExpressionType::Boolean),
        ("endswith", 1) => (Function::EndsWith, vec![receiver, args.remove(0)], ExpressionType::Boolean),
        ("contains", 1) => (Function::SubstringOf, vec![args.remove(0), receiver], ExpressionType::Boolean),
        ("indexof", 1) => (Function::IndexOf, vec![receiver, args.remove(0)], ExpressionType::Int32),
        ("tolower", 0) => (Function::ToLower, vec![receiver], ExpressionType::String),
        ("toupper", 0) => (Function::ToUpper, vec![receiver], ExpressionType::String),
        ("trim", 0) => (Function::Trim, vec![receiver], ExpressionType::String),
        ("length", 0) => (Function::Length, vec![receiver], ExpressionType::Int32),
        _ => return None,
    };
    Some(ODataExpression::call(function, arguments, return_type))
}
