//! Inspect a JSON object as a dynamic row

use crate::lambda::{Bindings, Evaluator, Expr, Method};
use crate::row::{ColumnType, Row, value_to_json};
use crate::value::Value;

use super::{CliError, parse_column_type};

/// Options for the row command
#[derive(Debug, Clone, Default)]
pub struct RowOptions {
    /// JSON object input
    pub input: Option<String>,
    /// Column to read; the whole row when absent
    pub column: Option<String>,
    /// Type to read the column as (`int32`, `string?`, ...); untyped when absent
    pub column_type: Option<String>,
    /// Pretty-print the output
    pub pretty: bool,
}

/// Reads the input as a row and returns it, or one of its columns, as JSON.
///
/// A typed read converts numerically, so a JSON integer (stored as `Int64`)
/// can be read as any numeric type that holds it.
pub fn execute_row(options: &RowOptions) -> Result<serde_json::Value, CliError> {
    let json_str = options.input.as_ref().ok_or(CliError::NoInput)?;
    let token: serde_json::Value = serde_json::from_str(json_str)?;
    let row = Row::try_from(token)?;

    let Some(column) = &options.column else {
        return Ok(value_to_json(&Value::Row(row))?);
    };

    let mut read = Expr::Call {
        method: Method::RowGet(ColumnType::ANY),
        receiver: Some(Box::new(Expr::row("row"))),
        args: vec![Expr::constant(column.clone())],
    };
    if let Some(column_type) = &options.column_type {
        read = Expr::convert(read, parse_column_type(column_type)?);
    }

    let bindings = Bindings::new().bind("row", row);
    let value = Evaluator::new().evaluate(&read, &bindings)?;
    Ok(value_to_json(&value)?)
}
