use std::fmt;
use std::str::FromStr;

/// Static result type of a query expression node.
///
/// The primitive types mirror the protocol's `Edm.*` primitives. `Type` is the
/// type of a type literal (the second argument of `cast` / `isof`), and
/// `Complex` is the type of anything structured: a query, a wildcard select,
/// a navigation to a nested row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExpressionType {
    Binary,
    Boolean,
    Byte,
    DateTime,
    Decimal,
    Double,
    Guid,
    Int16,
    Int32,
    Int64,
    Single,
    String,
    Type,
    Complex,
}

impl ExpressionType {
    pub const ALL: [ExpressionType; 14] = [
        ExpressionType::Binary,
        ExpressionType::Boolean,
        ExpressionType::Byte,
        ExpressionType::DateTime,
        ExpressionType::Decimal,
        ExpressionType::Double,
        ExpressionType::Guid,
        ExpressionType::Int16,
        ExpressionType::Int32,
        ExpressionType::Int64,
        ExpressionType::Single,
        ExpressionType::String,
        ExpressionType::Type,
        ExpressionType::Complex,
    ];

    pub fn is_primitive(self) -> bool {
        !matches!(self, ExpressionType::Type | ExpressionType::Complex)
    }

    pub fn is_numeric(self) -> bool {
        use ExpressionType::*;
        matches!(self, Byte | Int16 | Int32 | Int64 | Single | Double | Decimal)
    }

    pub fn name(self) -> &'static str {
        use ExpressionType::*;
        match self {
            Binary => "Binary",
            Boolean => "Boolean",
            Byte => "Byte",
            DateTime => "DateTime",
            Decimal => "Decimal",
            Double => "Double",
            Guid => "Guid",
            Int16 => "Int16",
            Int32 => "Int32",
            Int64 => "Int64",
            Single => "Single",
            String => "String",
            Type => "Type",
            Complex => "Complex",
        }
    }

    /// The `Edm.*` keyword of a primitive type.
    ///
    /// # Panics
    ///
    /// On `Type` and `Complex`, which have no keyword. Every node that prints
    /// a keyword validates primitiveness when it is constructed.
    pub fn keyword(self) -> &'static str {
        use ExpressionType::*;
        match self {
            Binary => "Edm.Binary",
            Boolean => "Edm.Boolean",
            Byte => "Edm.Byte",
            DateTime => "Edm.DateTime",
            Decimal => "Edm.Decimal",
            Double => "Edm.Double",
            Guid => "Edm.Guid",
            Int16 => "Edm.Int16",
            Int32 => "Edm.Int32",
            Int64 => "Edm.Int64",
            Single => "Edm.Single",
            String => "Edm.String",
            Type | Complex => unreachable!("unexpected case: {self:?} has no type keyword"),
        }
    }

    /// Whether a value of this type can stand in for `target` without an
    /// explicit cast (identity or numeric widening).
    pub fn is_implicitly_castable_to(self, target: ExpressionType) -> bool {
        use ExpressionType::*;
        if self == target {
            return true;
        }
        match self {
            Byte => matches!(target, Int16 | Int32 | Int64 | Single | Double | Decimal),
            Int16 => matches!(target, Int32 | Int64 | Single | Double | Decimal),
            Int32 => matches!(target, Int64 | Single | Double | Decimal),
            Int64 => matches!(target, Single | Double | Decimal),
            Single => target == Double,
            _ => false,
        }
    }
}

impl fmt::Display for ExpressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExpressionType {
    type Err = String;

    /// Accepts both bare names (`int32`) and keywords (`Edm.Int32`),
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bare = trimmed
            .strip_prefix("Edm.")
            .or_else(|| trimmed.strip_prefix("edm."))
            .unwrap_or(trimmed);
        ExpressionType::ALL
            .iter()
            .copied()
            .find(|ty| ty.name().eq_ignore_ascii_case(bare))
            .ok_or_else(|| format!("unknown type '{s}'"))
    }
}

/// A type carried as a value: either a primitive or a named (fully-qualified)
/// complex type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Primitive(ExpressionType),
    Named(String),
}

impl TypeRef {
    /// The type's literal form: a bare keyword for primitives, a quoted name otherwise.
    pub fn to_literal(&self) -> String {
        match self {
            TypeRef::Primitive(ty) if ty.is_primitive() => ty.keyword().to_string(),
            TypeRef::Primitive(ty) => format!("'{}'", ty.name()),
            TypeRef::Named(name) => format!("'{name}'"),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(ty) if ty.is_primitive() => f.write_str(ty.keyword()),
            TypeRef::Primitive(ty) => f.write_str(ty.name()),
            TypeRef::Named(name) => f.write_str(name),
        }
    }
}
