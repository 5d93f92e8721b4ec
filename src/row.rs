//! Schema-less rows with typed, null-aware access.
//!
//! A [`Row`] maps column names to already-decoded [`Value`]s. Names compare
//! case-insensitively. [`Row::get`] is the single generic accessor that
//! predicate code is written against; the [`lambda`](crate::lambda) rewrite
//! recognizes calls to it and swaps them for synthetic [`RowProperty`] reads.

mod column;
mod json;
mod property;

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

pub use column::{ColumnKind, ColumnType, ColumnValue};
pub use json::{json_to_value, value_to_json};
pub use property::{PropertyRegistry, RowProperty};

use crate::value::Value;

/// Errors raised by row reads and row ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    /// The row has no column with this name
    #[error("the row does not contain a value for column '{column}'")]
    MissingColumn { column: String },

    /// The stored value cannot be read as the requested type
    #[error("value '{actual}' for column '{column}' is not of type {expected}")]
    TypeMismatch {
        column: String,
        actual: String,
        expected: ColumnType,
    },

    /// Synthetic row properties cannot be written
    #[error("{property} is read-only")]
    ReadOnlyProperty { property: String },

    /// Structured input with a shape rows cannot hold
    #[error("cannot convert {shape} into a row value")]
    UnsupportedShape { shape: String },
}

/// Case-insensitive lookup key for a column name.
pub(crate) fn column_key(name: &str) -> String {
    name.to_lowercase()
}

/// An immutable, case-insensitive mapping from column name to value.
///
/// Columns keep their insertion order. When the same name appears more than
/// once (under case-insensitive comparison), the last value wins: it keeps
/// the first occurrence's position but takes the later name spelling and
/// value.
///
/// # Examples
///
/// ```
/// use odata_expr::{Row, Value};
///
/// let row = Row::new([("Name", Value::from("Ada")), ("Age", Value::Int32(36))]);
/// assert_eq!(row.get::<String>("name").unwrap(), "Ada");
/// assert_eq!(row.get::<Option<i32>>("AGE").unwrap(), Some(36));
/// assert!(row.get::<i64>("age").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

impl Row {
    pub fn new<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut row = Row::default();
        for (name, value) in values {
            let name = name.into();
            match row.index.get(&column_key(&name)) {
                Some(&position) => row.columns[position] = (name, value),
                None => {
                    row.index.insert(column_key(&name), row.columns.len());
                    row.columns.push((name, value));
                }
            }
        }
        row
    }

    /// Reads `column_name` as `T`.
    ///
    /// Fails with [`RowError::MissingColumn`] when the column is absent and
    /// with [`RowError::TypeMismatch`] when the stored value is not a `T`,
    /// including a null read into a non-nullable `T`. Nullable targets
    /// (`Option<_>`, [`Value`]) read null as their null value.
    pub fn get<T: ColumnValue>(&self, column_name: &str) -> Result<T, RowError> {
        let value = self.lookup(column_name)?;
        let result = if value.is_null() {
            T::from_null()
        } else {
            T::from_value(value)
        };
        result.ok_or_else(|| RowError::TypeMismatch {
            column: column_name.to_string(),
            actual: value.to_string(),
            expected: T::column_type(),
        })
    }

    /// Runtime-typed twin of [`Row::get`]: same lookup and type contract,
    /// with the target type supplied as a value.
    pub fn get_as(&self, column_name: &str, column_type: ColumnType) -> Result<Value, RowError> {
        let value = self.lookup(column_name)?;
        if column_type.accepts(value) {
            Ok(value.clone())
        } else {
            Err(RowError::TypeMismatch {
                column: column_name.to_string(),
                actual: value.to_string(),
                expected: column_type,
            })
        }
    }

    /// Raw stored value, if the column exists.
    pub fn value(&self, column_name: &str) -> Option<&Value> {
        self.index
            .get(&column_key(column_name))
            .map(|&position| &self.columns[position].1)
    }

    pub fn contains_column(&self, column_name: &str) -> bool {
        self.index.contains_key(&column_key(column_name))
    }

    /// Columns in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn lookup(&self, column_name: &str) -> Result<&Value, RowError> {
        self.value(column_name).ok_or_else(|| RowError::MissingColumn {
            column: column_name.to_string(),
        })
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Row::new(iter)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        write!(f, "}}")
    }
}
