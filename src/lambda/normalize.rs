use std::convert::Infallible;

use thiserror::Error;

use crate::ast::Member;
use crate::lambda::evaluator::{Bindings, Evaluator};
use crate::lambda::expr::{COLUMN_NAME_PARAMETER, Expr, Method};
use crate::row::{ColumnType, PropertyRegistry};
use crate::value::Value;

/// Errors raised when an accessor call cannot be rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// The argument depends on a parameter, or does not evaluate to a string
    #[error(
        "Unable to extract value for parameter '{parameter}' of {method}. Ensure that the value for the parameter can be statically determined"
    )]
    UnresolvedArgument {
        parameter: &'static str,
        method: String,
    },

    /// The argument evaluated to null or to a blank string
    #[error("'{parameter}' value for {method} must not be null or whitespace")]
    BlankArgument {
        parameter: &'static str,
        method: String,
    },
}

/// Rewrites `row.get::<T>(name)` calls into synthetic [`Member::Row`] reads.
///
/// Calls are recognized by [`Method::RowGet`] alone, whatever the receiver
/// is. Every other node is rebuilt with normalized children. A failure
/// anywhere aborts the whole rewrite; no partially normalized tree escapes.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'r> {
    registry: &'r PropertyRegistry,
}

impl<'r> Normalizer<'r> {
    pub fn new(registry: &'r PropertyRegistry) -> Self {
        Normalizer { registry }
    }

    pub fn normalize(&self, expr: &Expr) -> Result<Expr, NormalizeError> {
        match expr {
            Expr::Call {
                method: method @ Method::RowGet(column_type),
                receiver,
                args,
            } => {
                let name = resolve_column_name(method, args)?;
                let property = self.registry.property(&name, *column_type);
                tracing::debug!(%property, "normalized row accessor call");

                let receiver = receiver
                    .as_deref()
                    .map(|r| self.normalize(r))
                    .transpose()?;
                Ok(Expr::member(receiver, Member::Row(property)))
            }
            other => other.try_map_children(|child| self.normalize(child)),
        }
    }
}

/// Normalizes `expr` against the process-wide [`PropertyRegistry`].
pub fn normalize(expr: &Expr) -> Result<Expr, NormalizeError> {
    Normalizer::new(PropertyRegistry::global()).normalize(expr)
}

/// Inverse of [`normalize`]: every synthetic member read becomes a
/// `get::<T>("name")` call on its (denormalized) receiver again.
///
/// Declared members pass through unchanged.
pub fn denormalize(expr: &Expr) -> Expr {
    let rewritten: Result<Expr, Infallible> = match expr {
        Expr::Member {
            receiver,
            member: Member::Row(property),
        } => Ok(Expr::Call {
            method: Method::RowGet(property.column_type()),
            receiver: receiver.as_deref().map(|r| Box::new(denormalize(r))),
            args: vec![Expr::Constant {
                value: Value::String(property.name().to_string()),
                ty: ColumnType::STRING,
            }],
        }),
        other => other.try_map_children(|child| Ok(denormalize(child))),
    };
    match rewritten {
        Ok(expr) => expr,
        Err(never) => match never {},
    }
}

/// Statically evaluates the column-name argument of an accessor call.
fn resolve_column_name(method: &Method, args: &[Expr]) -> Result<String, NormalizeError> {
    let unresolved = || NormalizeError::UnresolvedArgument {
        parameter: COLUMN_NAME_PARAMETER,
        method: method.to_string(),
    };

    let [argument] = args else {
        return Err(unresolved());
    };
    if argument.has_parameters() {
        return Err(unresolved());
    }
    let value = Evaluator::new()
        .evaluate(argument, &Bindings::new())
        .map_err(|_| unresolved())?;

    match value {
        Value::String(name) if !name.trim().is_empty() => Ok(name),
        Value::String(_) | Value::Null => Err(NormalizeError::BlankArgument {
            parameter: COLUMN_NAME_PARAMETER,
            method: method.to_string(),
        }),
        _ => Err(unresolved()),
    }
}
