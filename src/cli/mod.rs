//! CLI support for odata-expr
//!
//! Provides programmatic access to the `odata-expr` commands so they can be
//! embedded in other tools and tested without spawning the binary.

mod query;
mod row;

pub use query::{QueryOptions, build_query, execute_query};
pub use row::{RowOptions, execute_row};

use std::io;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::ast::{ExpressionError, ExpressionType, TypeRef};
use crate::lambda::{EvalError, NormalizeError, TranslateError};
use crate::row::{ColumnKind, ColumnType, RowError};
use crate::value::Value;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// A flag value that could not be parsed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),

    #[error("Row error: {0}")]
    Row(#[from] RowError),

    #[error("Normalize error: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("Translate error: {0}")]
    Translate(#[from] TranslateError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,
}

pub(crate) fn parse_column_type(text: &str) -> Result<ColumnType, CliError> {
    ColumnType::from_str(text).map_err(CliError::InvalidArgument)
}

/// Parses a flag value as a constant of `column_type`. `null` is accepted
/// for nullable types only.
pub(crate) fn parse_value(text: &str, column_type: ColumnType) -> Result<Value, CliError> {
    if text == "null" {
        return if column_type.is_nullable() {
            Ok(Value::Null)
        } else {
            Err(CliError::InvalidArgument(format!(
                "null is not a valid {column_type}; use a nullable type such as '{}?'",
                column_type.expression_type().name().to_ascii_lowercase()
            )))
        };
    }

    let ColumnKind::Primitive(ty) = column_type.kind() else {
        return Err(CliError::InvalidArgument(format!(
            "constants of type {column_type} are not supported"
        )));
    };
    let invalid = |e: &dyn std::fmt::Display| {
        CliError::InvalidArgument(format!("'{text}' is not a valid {ty}: {e}"))
    };

    Ok(match ty {
        ExpressionType::Boolean => Value::Boolean(text.parse().map_err(|e| invalid(&e))?),
        ExpressionType::Byte => Value::Byte(text.parse().map_err(|e| invalid(&e))?),
        ExpressionType::Int16 => Value::Int16(text.parse().map_err(|e| invalid(&e))?),
        ExpressionType::Int32 => Value::Int32(text.parse().map_err(|e| invalid(&e))?),
        ExpressionType::Int64 => Value::Int64(text.parse().map_err(|e| invalid(&e))?),
        ExpressionType::Single => Value::Single(text.parse().map_err(|e| invalid(&e))?),
        ExpressionType::Double => Value::Double(text.parse().map_err(|e| invalid(&e))?),
        ExpressionType::Decimal => {
            Value::Decimal(Decimal::from_str(text).map_err(|e| invalid(&e))?)
        }
        ExpressionType::DateTime => Value::DateTime(parse_datetime(text).map_err(|e| invalid(&e))?),
        ExpressionType::Guid => Value::Guid(Uuid::parse_str(text).map_err(|e| invalid(&e))?),
        ExpressionType::String => Value::String(text.to_string()),
        ExpressionType::Binary => Value::Binary(parse_hex(text).map_err(|e| invalid(&e))?),
        ExpressionType::Type => Value::Type(match ExpressionType::from_str(text) {
            Ok(primitive) if primitive.is_primitive() => TypeRef::Primitive(primitive),
            _ => TypeRef::Named(text.to_string()),
        }),
        ExpressionType::Complex => unreachable!("column types are never Complex primitives"),
    })
}

fn parse_datetime(text: &str) -> chrono::ParseResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M"))
}

fn parse_hex(text: &str) -> Result<Vec<u8>, String> {
    if text.len() % 2 != 0 || !text.is_ascii() {
        return Err("expected an even number of hex digits".to_string());
    }
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&text[i..i + 2], 16).map_err(|e| e.to_string()))
        .collect()
}
