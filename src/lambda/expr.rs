use std::fmt;
use std::ops::Not;

use crate::ast::{BinaryOp, ExpressionType, Member, UnaryOp};
use crate::row::{ColumnType, ColumnValue};
use crate::value::Value;

/// Name of the column-name parameter of `Row::get`, as reported in errors
pub const COLUMN_NAME_PARAMETER: &str = "column_name";

/// The method invoked by an [`Expr::Call`].
#[derive(Debug, Clone, PartialEq)]
pub enum Method {
    /// `Row::get::<T>`, instantiated at `T`'s column type
    RowGet(ColumnType),

    /// Any other method, identified by name
    Named { name: String, return_type: ColumnType },
}

impl Method {
    pub fn return_type(&self) -> ColumnType {
        match self {
            Method::RowGet(ty) => *ty,
            Method::Named { return_type, .. } => *return_type,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::RowGet(ty) => write!(f, "Row::get::<{ty}>"),
            Method::Named { name, .. } => f.write_str(name),
        }
    }
}

/// A predicate or projection written against dynamic rows, before it is
/// turned into a query.
///
/// This is the generic tree that user code builds: parameters, constants,
/// captured locals, method calls (notably [`Row::get`](crate::Row::get)),
/// member reads, and operators. [`normalize`](super::normalize) rewrites
/// accessor calls into [`Member::Row`] reads; [`translate`](super::translate)
/// turns the normalized tree into query AST nodes.
///
/// # Examples
///
/// ```
/// use odata_expr::lambda::Expr;
///
/// // r => r.get::<i32>("Age") >= 18
/// let r = Expr::row("r");
/// let adult = Expr::column::<i32>(r, "Age").greater_or_equal(Expr::constant(18));
/// assert_eq!(adult.to_string(), "(r.get::<Int32>(\"Age\") ge 18)");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A lambda parameter, bound at evaluation time
    Parameter { name: String, ty: ColumnType },

    /// A literal value
    Constant { value: Value, ty: ColumnType },

    /// A closed-over local: named, but with its value fixed when the
    /// expression was built
    Captured { name: String, value: Value, ty: ColumnType },

    Call {
        method: Method,
        receiver: Option<Box<Expr>>,
        args: Vec<Expr>,
    },

    Member {
        receiver: Option<Box<Expr>>,
        member: Member,
    },

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    Unary { op: UnaryOp, operand: Box<Expr> },

    Convert { operand: Box<Expr>, ty: ColumnType },
}

impl Expr {
    pub fn parameter(name: impl Into<String>, ty: ColumnType) -> Self {
        Expr::Parameter {
            name: name.into(),
            ty,
        }
    }

    /// A row-typed parameter
    pub fn row(name: impl Into<String>) -> Self {
        Self::parameter(name, ColumnType::ROW)
    }

    pub fn constant<T: ColumnValue>(value: T) -> Self {
        Expr::Constant {
            value: value.into_value(),
            ty: T::column_type(),
        }
    }

    pub fn null(ty: ColumnType) -> Self {
        Expr::Constant {
            value: Value::Null,
            ty: ty.nullable(),
        }
    }

    pub fn captured<T: ColumnValue>(name: impl Into<String>, value: T) -> Self {
        Expr::Captured {
            name: name.into(),
            value: value.into_value(),
            ty: T::column_type(),
        }
    }

    /// `receiver.get::<T>(column_name)`
    pub fn row_get<T: ColumnValue>(receiver: Expr, column_name: Expr) -> Self {
        Expr::Call {
            method: Method::RowGet(T::column_type()),
            receiver: Some(Box::new(receiver)),
            args: vec![column_name],
        }
    }

    /// `receiver.get::<T>("name")`
    pub fn column<T: ColumnValue>(receiver: Expr, name: &str) -> Self {
        Self::row_get::<T>(receiver, Self::constant(name.to_string()))
    }

    pub fn method(
        name: impl Into<String>,
        receiver: Expr,
        args: Vec<Expr>,
        return_type: ColumnType,
    ) -> Self {
        Expr::Call {
            method: Method::Named {
                name: name.into(),
                return_type,
            },
            receiver: Some(Box::new(receiver)),
            args,
        }
    }

    pub fn member(receiver: Option<Expr>, member: Member) -> Self {
        Expr::Member {
            receiver: receiver.map(Box::new),
            member,
        }
    }

    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn convert(operand: Expr, ty: ColumnType) -> Self {
        Expr::Convert {
            operand: Box::new(operand),
            ty,
        }
    }

    pub fn equal(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::Equal, other)
    }

    pub fn not_equal(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::NotEqual, other)
    }

    pub fn greater_than(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::GreaterThan, other)
    }

    pub fn greater_or_equal(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::GreaterThanOrEqual, other)
    }

    pub fn less_than(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::LessThan, other)
    }

    pub fn less_or_equal(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::LessThanOrEqual, other)
    }

    pub fn and(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::And, other)
    }

    pub fn or(self, other: Expr) -> Self {
        Self::binary(self, BinaryOp::Or, other)
    }

    /// Static type of the expression's result.
    pub fn column_type(&self) -> ColumnType {
        match self {
            Expr::Parameter { ty, .. } | Expr::Constant { ty, .. } | Expr::Captured { ty, .. } => {
                *ty
            }
            Expr::Call { method, .. } => method.return_type(),
            Expr::Member { member, .. } => match member {
                Member::Row(property) => property.column_type(),
                Member::Declared { ty, .. } => declared_column_type(*ty),
            },
            Expr::Binary { op, left, .. } => {
                if op.is_boolean_op() {
                    ColumnType::BOOLEAN
                } else {
                    left.column_type()
                }
            }
            Expr::Unary { operand, .. } => operand.column_type(),
            Expr::Convert { ty, .. } => *ty,
        }
    }

    /// Whether any parameter occurs in the expression, i.e. whether its value
    /// depends on what it is evaluated against.
    pub fn has_parameters(&self) -> bool {
        match self {
            Expr::Parameter { .. } => true,
            Expr::Constant { .. } | Expr::Captured { .. } => false,
            Expr::Call { receiver, args, .. } => {
                receiver.as_deref().is_some_and(Expr::has_parameters)
                    || args.iter().any(Expr::has_parameters)
            }
            Expr::Member { receiver, .. } => receiver.as_deref().is_some_and(Expr::has_parameters),
            Expr::Binary { left, right, .. } => left.has_parameters() || right.has_parameters(),
            Expr::Unary { operand, .. } | Expr::Convert { operand, .. } => operand.has_parameters(),
        }
    }

    /// Rebuilds this node with every direct child replaced by `f(child)`.
    ///
    /// Leaves are returned as clones. The first error aborts the rebuild.
    pub fn try_map_children<E>(
        &self,
        mut f: impl FnMut(&Expr) -> Result<Expr, E>,
    ) -> Result<Expr, E> {
        let mut boxed = |e: &Expr| f(e).map(Box::new);
        Ok(match self {
            Expr::Parameter { .. } | Expr::Constant { .. } | Expr::Captured { .. } => self.clone(),
            Expr::Call {
                method,
                receiver,
                args,
            } => {
                let receiver = receiver.as_deref().map(&mut boxed).transpose()?;
                let args = args
                    .iter()
                    .map(|arg| boxed(arg).map(|b| *b))
                    .collect::<Result<Vec<_>, E>>()?;
                Expr::Call {
                    method: method.clone(),
                    receiver,
                    args,
                }
            }
            Expr::Member { receiver, member } => Expr::Member {
                receiver: receiver.as_deref().map(&mut boxed).transpose()?,
                member: member.clone(),
            },
            Expr::Binary { op, left, right } => Expr::Binary {
                op: *op,
                left: boxed(left)?,
                right: boxed(right)?,
            },
            Expr::Unary { op, operand } => Expr::Unary {
                op: *op,
                operand: boxed(operand)?,
            },
            Expr::Convert { operand, ty } => Expr::Convert {
                operand: boxed(operand)?,
                ty: *ty,
            },
        })
    }
}

fn declared_column_type(ty: ExpressionType) -> ColumnType {
    match ty {
        ExpressionType::Complex => ColumnType::ANY,
        primitive => ColumnType::primitive(primitive),
    }
}

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::unary(UnaryOp::Not, self)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Parameter { name, .. } | Expr::Captured { name, .. } => f.write_str(name),
            Expr::Constant { value, .. } => match value {
                Value::String(s) => write!(f, "{s:?}"),
                other => write!(f, "{other}"),
            },
            Expr::Call {
                method,
                receiver,
                args,
            } => {
                if let Some(receiver) = receiver {
                    write!(f, "{receiver}.")?;
                }
                match method {
                    Method::RowGet(ty) => write!(f, "get::<{ty}>(")?,
                    Method::Named { name, .. } => write!(f, "{name}(")?,
                }
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Expr::Member { receiver, member } => {
                if let Some(receiver) = receiver {
                    write!(f, "{receiver}.")?;
                }
                f.write_str(member.name())
            }
            Expr::Binary { op, left, right } => write!(f, "({left} {op} {right})"),
            Expr::Unary { op, operand } => write!(f, "{op}({operand})"),
            Expr::Convert { operand, ty } => write!(f, "({operand} as {ty})"),
        }
    }
}
