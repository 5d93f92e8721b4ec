use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::ast::{
    ExpressionError, ExpressionType, InlineCount, ODataExpression, SelectColumnExpression,
    SortKeyExpression,
};

/// Characters left as-is in query parameter values.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'*')
    .remove(b'(')
    .remove(b')');

const LIST_SEPARATOR: &str = ",";

/// Root of a query: filter, ordering, paging, format, inline count and
/// projection.
///
/// Queries are immutable; [`QueryExpression::update`] derives a modified copy.
/// `Display` renders the URL query string (`?$filter=...&$top=...`).
///
/// # Examples
///
/// ```
/// use odata_expr::ast::QueryExpression;
///
/// let query = QueryExpression::default()
///     .update()
///     .skip(5)
///     .top(10)
///     .apply()
///     .unwrap();
/// assert_eq!(query.to_string(), "?$top=10&$skip=5");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryExpression {
    filter: Option<ODataExpression>,
    order_by: Vec<SortKeyExpression>,
    top: Option<u32>,
    skip: u32,
    format: Option<String>,
    inline_count: InlineCount,
    select: Vec<SelectColumnExpression>,
}

impl QueryExpression {
    pub fn filter(&self) -> Option<&ODataExpression> {
        self.filter.as_ref()
    }

    pub fn order_by(&self) -> &[SortKeyExpression] {
        &self.order_by
    }

    /// Row limit; `None` means no limit
    pub fn top(&self) -> Option<u32> {
        self.top
    }

    pub fn skip(&self) -> u32 {
        self.skip
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn inline_count(&self) -> InlineCount {
        self.inline_count
    }

    pub fn select(&self) -> &[SelectColumnExpression] {
        &self.select
    }

    pub fn ty(&self) -> ExpressionType {
        ExpressionType::Complex
    }

    /// Starts a copy-with-changes of this query. Fields not touched on the
    /// returned builder keep their current values.
    pub fn update(&self) -> QueryUpdate<'_> {
        QueryUpdate {
            query: self,
            filter: None,
            order_by: None,
            top: None,
            skip: None,
            format: None,
            inline_count: None,
            select: None,
        }
    }

    /// Query parameters for the fields that are set, in wire order.
    ///
    /// Values are unencoded.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(filter) = &self.filter {
            params.push(("$filter", filter.to_string()));
        }
        if !self.order_by.is_empty() {
            params.push(("$orderby", join(&self.order_by)));
        }
        if let Some(top) = self.top {
            params.push(("$top", top.to_string()));
        }
        if self.skip != 0 {
            params.push(("$skip", self.skip.to_string()));
        }
        if let Some(format) = &self.format {
            params.push(("$format", format.clone()));
        }
        if self.inline_count != InlineCount::None {
            params.push(("$inlinecount", self.inline_count.keyword().to_string()));
        }
        if !self.select.is_empty() {
            params.push(("$select", join(&self.select)));
        }
        params
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

impl fmt::Display for QueryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self.to_params();
        tracing::debug!(params = params.len(), "serializing query");

        f.write_str("?")?;
        for (i, (name, value)) in params.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{name}={}", FormValue(value))?;
        }
        Ok(())
    }
}

/// A query parameter value in form encoding: space as `+`, other escaped
/// bytes as lowercase `%xx`.
struct FormValue<'a>(&'a str);

impl fmt::Display for FormValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in utf8_percent_encode(self.0, QUERY_VALUE) {
            // '%' is itself escaped, so only escapes start with it
            match chunk {
                "%20" => f.write_str("+")?,
                escaped if escaped.starts_with('%') => {
                    f.write_str(&escaped.to_ascii_lowercase())?
                }
                literal => f.write_str(literal)?,
            }
        }
        Ok(())
    }
}

/// Pending changes to a [`QueryExpression`].
///
/// Every field starts as "keep"; setting it replaces the value and the
/// `clear_*` methods reset optional fields explicitly, so omitting `top`
/// and clearing it to "no limit" stay distinct.
#[derive(Debug)]
#[must_use = "call `apply` to build the updated query"]
pub struct QueryUpdate<'q> {
    query: &'q QueryExpression,
    filter: Option<Option<ODataExpression>>,
    order_by: Option<Vec<SortKeyExpression>>,
    top: Option<Option<u32>>,
    skip: Option<u32>,
    format: Option<Option<String>>,
    inline_count: Option<InlineCount>,
    select: Option<Vec<SelectColumnExpression>>,
}

impl QueryUpdate<'_> {
    pub fn filter(mut self, filter: ODataExpression) -> Self {
        self.filter = Some(Some(filter));
        self
    }

    pub fn clear_filter(mut self) -> Self {
        self.filter = Some(None);
        self
    }

    pub fn order_by(mut self, order_by: impl IntoIterator<Item = SortKeyExpression>) -> Self {
        self.order_by = Some(order_by.into_iter().collect());
        self
    }

    pub fn top(mut self, top: u32) -> Self {
        self.top = Some(Some(top));
        self
    }

    /// Removes the row limit.
    pub fn clear_top(mut self) -> Self {
        self.top = Some(None);
        self
    }

    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(Some(format.into()));
        self
    }

    pub fn clear_format(mut self) -> Self {
        self.format = Some(None);
        self
    }

    pub fn inline_count(mut self, inline_count: InlineCount) -> Self {
        self.inline_count = Some(inline_count);
        self
    }

    pub fn select(mut self, select: impl IntoIterator<Item = SelectColumnExpression>) -> Self {
        self.select = Some(select.into_iter().collect());
        self
    }

    /// Builds the new query. The source query is left untouched.
    pub fn apply(self) -> Result<QueryExpression, ExpressionError> {
        let current = self.query;
        let filter = self.filter.unwrap_or_else(|| current.filter.clone());
        if let Some(filter) = &filter
            && filter.ty() != ExpressionType::Boolean
        {
            return Err(ExpressionError::NonBooleanFilter(filter.ty()));
        }

        Ok(QueryExpression {
            filter,
            order_by: self.order_by.unwrap_or_else(|| current.order_by.clone()),
            top: self.top.unwrap_or(current.top),
            skip: self.skip.unwrap_or(current.skip),
            format: self.format.unwrap_or_else(|| current.format.clone()),
            inline_count: self.inline_count.unwrap_or(current.inline_count),
            select: self.select.unwrap_or_else(|| current.select.clone()),
        })
    }
}
