use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::ast::{ExpressionType, TypeRef};
use crate::row::Row;
use crate::value::Value;

/// What a column read produces, before nullability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// A primitive value of one wire type
    Primitive(ExpressionType),
    /// A nested row
    Row,
    /// A list of values
    List,
    /// Any value at all, null included
    Any,
}

/// The runtime type of a row read: a kind plus whether null is acceptable.
///
/// `ColumnType` is the reified form of the `T` in [`Row::get::<T>`]; the
/// rewrite layer keys synthetic properties by it, so `get::<i32>` and
/// `get::<Option<i32>>` are different reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnType {
    kind: ColumnKind,
    nullable: bool,
}

impl ColumnType {
    pub const BOOLEAN: ColumnType = ColumnType::primitive(ExpressionType::Boolean);
    pub const INT32: ColumnType = ColumnType::primitive(ExpressionType::Int32);
    pub const STRING: ColumnType = ColumnType::primitive(ExpressionType::String);
    pub const ROW: ColumnType = ColumnType::of(ColumnKind::Row);
    pub const LIST: ColumnType = ColumnType::of(ColumnKind::List);
    pub const ANY: ColumnType = ColumnType {
        kind: ColumnKind::Any,
        nullable: true,
    };

    pub const fn of(kind: ColumnKind) -> Self {
        ColumnType {
            kind,
            nullable: matches!(kind, ColumnKind::Any),
        }
    }

    pub const fn primitive(ty: ExpressionType) -> Self {
        Self::of(ColumnKind::Primitive(ty))
    }

    /// Same kind, accepting null.
    pub const fn nullable(self) -> Self {
        ColumnType {
            kind: self.kind,
            nullable: true,
        }
    }

    /// Same kind, rejecting null.
    pub const fn non_nullable(self) -> Self {
        ColumnType {
            kind: self.kind,
            nullable: matches!(self.kind, ColumnKind::Any),
        }
    }

    pub fn kind(self) -> ColumnKind {
        self.kind
    }

    pub fn is_nullable(self) -> bool {
        self.nullable
    }

    /// Wire type of the read. Rows, lists and untyped reads are `Complex`.
    pub fn expression_type(self) -> ExpressionType {
        match self.kind {
            ColumnKind::Primitive(ty) => ty,
            ColumnKind::Row | ColumnKind::List | ColumnKind::Any => ExpressionType::Complex,
        }
    }

    /// Whether `value` can be returned from a read of this type as-is.
    pub fn accepts(self, value: &Value) -> bool {
        match (self.kind, value) {
            (_, Value::Null) => self.nullable,
            (ColumnKind::Any, _) => true,
            (ColumnKind::Row, Value::Row(_)) | (ColumnKind::List, Value::List(_)) => true,
            (ColumnKind::Primitive(ty), other) => {
                ty != ExpressionType::Complex && other.expression_type() == Some(ty)
            }
            _ => false,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.kind {
            ColumnKind::Primitive(ty) => ty.name(),
            ColumnKind::Row => "Row",
            ColumnKind::List => "List",
            ColumnKind::Any => return f.write_str("Value"),
        };
        if self.nullable {
            write!(f, "Option<{name}>")
        } else {
            f.write_str(name)
        }
    }
}

impl FromStr for ColumnType {
    type Err = String;

    /// `int32`, `Edm.Int32`, `row`, `list`, `any`; a trailing `?` makes the
    /// type nullable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (base, nullable) = match trimmed.strip_suffix('?') {
            Some(base) => (base, true),
            None => (trimmed, false),
        };
        let column_type = match base.to_ascii_lowercase().as_str() {
            "row" => ColumnType::ROW,
            "list" => ColumnType::LIST,
            "any" | "value" => ColumnType::ANY,
            _ => {
                let ty: ExpressionType = base.parse()?;
                if ty == ExpressionType::Complex {
                    return Err(format!("'{s}' is not a column type"));
                }
                ColumnType::primitive(ty)
            }
        };
        Ok(if nullable {
            column_type.nullable()
        } else {
            column_type
        })
    }
}

/// A Rust type that a row column can be read as.
///
/// Implemented for every primitive's Rust counterpart, for [`Row`],
/// `Vec<Value>` (lists), [`Value`] (anything), and `Option<T>` as the
/// nullable form of any of those.
pub trait ColumnValue: Sized {
    fn column_type() -> ColumnType;

    /// Converts a non-null stored value, or `None` if it is not a `Self`.
    fn from_value(value: &Value) -> Option<Self>;

    /// The null value of `Self`, or `None` if `Self` cannot be null.
    fn from_null() -> Option<Self> {
        None
    }

    fn into_value(self) -> Value;
}

macro_rules! primitive_column {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ColumnValue for $ty {
                fn column_type() -> ColumnType {
                    ColumnType::primitive(ExpressionType::$variant)
                }

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }
        )*
    };
}

primitive_column! {
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
}

impl ColumnValue for Row {
    fn column_type() -> ColumnType {
        ColumnType::ROW
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_row().cloned()
    }

    fn into_value(self) -> Value {
        Value::Row(self)
    }
}

impl ColumnValue for Vec<Value> {
    fn column_type() -> ColumnType {
        ColumnType::LIST
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => Some(items.clone()),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::List(self)
    }
}

impl ColumnValue for Value {
    fn column_type() -> ColumnType {
        ColumnType::ANY
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }

    fn from_null() -> Option<Self> {
        Some(Value::Null)
    }

    fn into_value(self) -> Value {
        self
    }
}

impl<T: ColumnValue> ColumnValue for Option<T> {
    fn column_type() -> ColumnType {
        T::column_type().nullable()
    }

    fn from_value(value: &Value) -> Option<Self> {
        T::from_value(value).map(Some)
    }

    fn from_null() -> Option<Self> {
        Some(None)
    }

    fn into_value(self) -> Value {
        self.map_or(Value::Null, ColumnValue::into_value)
    }
}
