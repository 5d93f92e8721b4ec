use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::ast::{ExpressionType, TypeRef};
use crate::row::Row;

/// An already-decoded value held by a [`Row`], carried by a constant, or
/// produced by evaluation.
///
/// Every primitive variant corresponds to exactly one [`ExpressionType`];
/// rows and lists are the recursive structured shapes and both map to
/// [`ExpressionType::Complex`].
///
/// # Examples
///
/// ```
/// use odata_expr::Value;
/// use odata_expr::ast::ExpressionType;
///
/// let v = Value::Int32(42);
/// assert_eq!(v.expression_type(), Some(ExpressionType::Int32));
/// assert_eq!(Value::Null.expression_type(), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value
    Null,

    Boolean(bool),

    Byte(u8),

    Int16(i16),

    Int32(i32),

    Int64(i64),

    /// 32-bit floating point
    Single(f32),

    /// 64-bit floating point
    Double(f64),

    /// Exact decimal, scale preserved
    Decimal(Decimal),

    /// Zone-less timestamp with 100ns tick resolution on the wire
    DateTime(NaiveDateTime),

    Guid(Uuid),

    String(String),

    Binary(Vec<u8>),

    /// A type used as a value (the target of `cast` / `isof`)
    Type(TypeRef),

    /// Nested row
    Row(Row),

    /// Ordered list of values
    List(Vec<Value>),
}

impl Value {
    /// The wire type of this value, or `None` for null.
    pub fn expression_type(&self) -> Option<ExpressionType> {
        use Value::*;
        let ty = match self {
            Null => return None,
            Boolean(_) => ExpressionType::Boolean,
            Byte(_) => ExpressionType::Byte,
            Int16(_) => ExpressionType::Int16,
            Int32(_) => ExpressionType::Int32,
            Int64(_) => ExpressionType::Int64,
            Single(_) => ExpressionType::Single,
            Double(_) => ExpressionType::Double,
            Decimal(_) => ExpressionType::Decimal,
            DateTime(_) => ExpressionType::DateTime,
            Guid(_) => ExpressionType::Guid,
            String(_) => ExpressionType::String,
            Binary(_) => ExpressionType::Binary,
            Type(_) => ExpressionType::Type,
            Row(_) | List(_) => ExpressionType::Complex,
        };
        Some(ty)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Human-readable name of the value's shape, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Row(_) => "row",
            Value::List(_) => "list",
            other => match other.expression_type() {
                Some(ty) => ty.name(),
                None => "null",
            },
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_row(&self) -> Option<&Row> {
        match self {
            Value::Row(row) => Some(row),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Byte(n) => write!(f, "{n}"),
            Value::Int16(n) => write!(f, "{n}"),
            Value::Int32(n) => write!(f, "{n}"),
            Value::Int64(n) => write!(f, "{n}"),
            Value::Single(n) => write!(f, "{n}"),
            Value::Double(n) => write!(f, "{n}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::Guid(g) => write!(f, "{g}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Binary(bytes) => {
                for b in bytes {
                    write!(f, "{b:02X}")?;
                }
                Ok(())
            }
            Value::Type(ty) => write!(f, "{ty}"),
            Value::Row(row) => write!(f, "{row}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    bool => Boolean,
    u8 => Byte,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Single,
    f64 => Double,
    Decimal => Decimal,
    NaiveDateTime => DateTime,
    Uuid => Guid,
    String => String,
    Vec<u8> => Binary,
    TypeRef => Type,
    Row => Row,
    Vec<Value> => List,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
