//! Build a query string from command-line filters and options

use crate::ast::{InlineCount, QueryExpression, SelectColumnExpression, SortDirection};
use crate::lambda::{
    Expr, Method, Normalizer, translate, translate_select, translate_sort_key,
};
use crate::row::{ColumnType, PropertyRegistry};

use super::{CliError, parse_column_type, parse_value};

/// Name of the row parameter the generated predicates are written against
const ROW_PARAMETER: &str = "row";

/// Options for the query command
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Equality filters, `COLUMN:TYPE=VALUE`, combined with `and`
    pub equals: Vec<String>,
    /// Sort keys, `COLUMN:TYPE[:desc]`
    pub order_by: Vec<String>,
    pub top: Option<u32>,
    pub skip: u32,
    pub format: Option<String>,
    pub inline_count: InlineCount,
    /// Projected columns, `COLUMN` or `*`
    pub select: Vec<String>,
}

/// Builds the query described by `options`.
///
/// Every column reference is written as a `row.get::<T>(name)` predicate,
/// normalized, then translated, so the output is exactly what a hand-built
/// predicate over the same columns would produce.
pub fn build_query(options: &QueryOptions) -> Result<QueryExpression, CliError> {
    let registry = PropertyRegistry::global();
    let normalizer = Normalizer::new(registry);

    let mut predicate: Option<Expr> = None;
    for spec in &options.equals {
        let (column, value) = spec.split_once('=').ok_or_else(|| {
            CliError::InvalidArgument(format!("'{spec}' is not of the form COLUMN:TYPE=VALUE"))
        })?;
        let (name, column_type, _) = split_column(column)?;
        let column_type = column_type.unwrap_or(ColumnType::STRING);
        let comparison = column_read(name, column_type).equal(Expr::Constant {
            value: parse_value(value, column_type)?,
            ty: column_type,
        });
        predicate = Some(match predicate {
            Some(previous) => previous.and(comparison),
            None => comparison,
        });
    }

    let base = QueryExpression::default();
    let mut update = base
        .update()
        .skip(options.skip)
        .inline_count(options.inline_count);

    if let Some(predicate) = predicate {
        update = update.filter(translate(&normalizer.normalize(&predicate)?)?);
    }

    let order_by = options
        .order_by
        .iter()
        .map(|spec| -> Result<_, CliError> {
            let (name, column_type, direction) = split_column(spec)?;
            let read = column_read(name, column_type.unwrap_or(ColumnType::STRING));
            Ok(translate_sort_key(&normalizer.normalize(&read)?, direction)?)
        })
        .collect::<Result<Vec<_>, CliError>>()?;
    if !order_by.is_empty() {
        update = update.order_by(order_by);
    }

    let select = options
        .select
        .iter()
        .map(|spec| -> Result<_, CliError> {
            if spec.trim() == "*" {
                return Ok(SelectColumnExpression::wildcard());
            }
            let (name, column_type, _) = split_column(spec)?;
            let read = column_read(name, column_type.unwrap_or(ColumnType::ANY));
            Ok(translate_select(&normalizer.normalize(&read)?)?)
        })
        .collect::<Result<Vec<_>, CliError>>()?;
    if !select.is_empty() {
        update = update.select(select);
    }

    if let Some(top) = options.top {
        update = update.top(top);
    }
    if let Some(format) = &options.format {
        update = update.format(format.clone());
    }

    Ok(update.apply()?)
}

/// Builds the query and renders it as a query string.
pub fn execute_query(options: &QueryOptions) -> Result<String, CliError> {
    let query = build_query(options)?;
    Ok(query.to_string())
}

/// `row.get::<T>("name")` with `T` chosen at runtime.
fn column_read(name: &str, column_type: ColumnType) -> Expr {
    Expr::Call {
        method: Method::RowGet(column_type),
        receiver: Some(Box::new(Expr::row(ROW_PARAMETER))),
        args: vec![Expr::constant(name.to_string())],
    }
}

/// Splits `COLUMN[:TYPE[:DIRECTION]]`.
fn split_column(spec: &str) -> Result<(&str, Option<ColumnType>, SortDirection), CliError> {
    let mut parts = spec.split(':');
    let name = parts.next().unwrap_or_default().trim();
    if name.is_empty() {
        return Err(CliError::InvalidArgument(format!("'{spec}' has no column name")));
    }
    let column_type = parts.next().map(parse_column_type).transpose()?;
    let direction = parts
        .next()
        .map(str::parse::<SortDirection>)
        .transpose()
        .map_err(CliError::InvalidArgument)?
        .unwrap_or_default();
    if parts.next().is_some() {
        return Err(CliError::InvalidArgument(format!(
            "'{spec}' has too many ':'-separated parts"
        )));
    }
    Ok((name, column_type, direction))
}
