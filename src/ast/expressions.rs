use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::ast::literals::format_literal;
use crate::ast::{BinaryOp, ExpressionType, Function, QueryExpression, SortDirection, UnaryOp};
use crate::row::RowProperty;
use crate::value::Value;

/// Errors raised while constructing query expression nodes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    /// Binary operands disagree on their static type
    #[error("operands of '{op}' must have equal types (left: {left}, right: {right})")]
    OperandTypeMismatch {
        op: BinaryOp,
        left: ExpressionType,
        right: ExpressionType,
    },

    /// A constant's value does not inhabit its declared type
    #[error("value '{value}' is not a valid {ty} constant")]
    ConstantTypeMismatch { value: String, ty: ExpressionType },

    /// Cast target is `Type` or `Complex`
    #[error("cannot cast to non-primitive type {0}")]
    NonPrimitiveCast(ExpressionType),

    #[error("a select column needs a member path or the all-columns wildcard")]
    EmptySelectColumn,

    #[error("query filter must be Boolean, got {0}")]
    NonBooleanFilter(ExpressionType),
}

/// Discriminant of an [`ODataExpression`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionKind {
    BinaryOp,
    UnaryOp,
    Call,
    Constant,
    MemberAccess,
    Convert,
    SortKey,
    SelectColumn,
    Query,
}

/// A node of the query AST.
///
/// Nodes are immutable once built; every constructor that can observe an
/// inconsistency validates eagerly, so a tree that exists is printable.
/// `Display` renders the wire form.
#[derive(Debug, Clone, PartialEq)]
pub enum ODataExpression {
    BinaryOp(BinaryOpExpression),
    UnaryOp(UnaryOpExpression),
    Call(CallExpression),
    Constant(ConstantExpression),
    MemberAccess(MemberAccessExpression),
    Convert(ConvertExpression),
    SortKey(SortKeyExpression),
    SelectColumn(SelectColumnExpression),
    Query(Box<QueryExpression>),
}

impl ODataExpression {
    pub fn kind(&self) -> ExpressionKind {
        match self {
            ODataExpression::BinaryOp(_) => ExpressionKind::BinaryOp,
            ODataExpression::UnaryOp(_) => ExpressionKind::UnaryOp,
            ODataExpression::Call(_) => ExpressionKind::Call,
            ODataExpression::Constant(_) => ExpressionKind::Constant,
            ODataExpression::MemberAccess(_) => ExpressionKind::MemberAccess,
            ODataExpression::Convert(_) => ExpressionKind::Convert,
            ODataExpression::SortKey(_) => ExpressionKind::SortKey,
            ODataExpression::SelectColumn(_) => ExpressionKind::SelectColumn,
            ODataExpression::Query(_) => ExpressionKind::Query,
        }
    }

    /// Static result type
    pub fn ty(&self) -> ExpressionType {
        match self {
            ODataExpression::BinaryOp(e) => e.ty(),
            ODataExpression::UnaryOp(e) => e.ty(),
            ODataExpression::Call(e) => e.ty(),
            ODataExpression::Constant(e) => e.ty(),
            ODataExpression::MemberAccess(e) => e.ty(),
            ODataExpression::Convert(e) => e.ty(),
            ODataExpression::SortKey(e) => e.ty(),
            ODataExpression::SelectColumn(e) => e.ty(),
            ODataExpression::Query(_) => ExpressionType::Complex,
        }
    }

    pub fn binary(
        left: ODataExpression,
        op: BinaryOp,
        right: ODataExpression,
    ) -> Result<Self, ExpressionError> {
        BinaryOpExpression::new(left, op, right).map(Self::BinaryOp)
    }

    pub fn unary(op: UnaryOp, operand: ODataExpression) -> Self {
        Self::UnaryOp(UnaryOpExpression::new(op, operand))
    }

    pub fn call(
        function: Function,
        arguments: Vec<ODataExpression>,
        return_type: ExpressionType,
    ) -> Self {
        Self::Call(CallExpression::new(function, arguments, return_type))
    }

    pub fn constant(value: impl Into<Value>, ty: ExpressionType) -> Result<Self, ExpressionError> {
        ConstantExpression::new(value.into(), ty).map(Self::Constant)
    }

    pub fn convert(expression: ODataExpression, ty: ExpressionType) -> Result<Self, ExpressionError> {
        ConvertExpression::new(expression, ty).map(Self::Convert)
    }
}

impl fmt::Display for ODataExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ODataExpression::BinaryOp(e) => e.fmt(f),
            ODataExpression::UnaryOp(e) => e.fmt(f),
            ODataExpression::Call(e) => e.fmt(f),
            ODataExpression::Constant(e) => e.fmt(f),
            ODataExpression::MemberAccess(e) => e.fmt(f),
            ODataExpression::Convert(e) => e.fmt(f),
            ODataExpression::SortKey(e) => e.fmt(f),
            ODataExpression::SelectColumn(e) => e.fmt(f),
            ODataExpression::Query(e) => e.fmt(f),
        }
    }
}

macro_rules! into_expression {
    ($($node:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$node> for ODataExpression {
                fn from(node: $node) -> Self {
                    ODataExpression::$variant(node)
                }
            }
        )*
    };
}

into_expression! {
    BinaryOpExpression => BinaryOp,
    UnaryOpExpression => UnaryOp,
    CallExpression => Call,
    ConstantExpression => Constant,
    MemberAccessExpression => MemberAccess,
    ConvertExpression => Convert,
    SortKeyExpression => SortKey,
    SelectColumnExpression => SelectColumn,
}

impl From<QueryExpression> for ODataExpression {
    fn from(query: QueryExpression) -> Self {
        ODataExpression::Query(Box::new(query))
    }
}

// ============================================================================
// Operators
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOpExpression {
    left: Box<ODataExpression>,
    op: BinaryOp,
    right: Box<ODataExpression>,
}

impl BinaryOpExpression {
    /// Both operands must share a static type.
    pub fn new(
        left: ODataExpression,
        op: BinaryOp,
        right: ODataExpression,
    ) -> Result<Self, ExpressionError> {
        if left.ty() != right.ty() {
            return Err(ExpressionError::OperandTypeMismatch {
                op,
                left: left.ty(),
                right: right.ty(),
            });
        }
        Ok(BinaryOpExpression {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    pub fn left(&self) -> &ODataExpression {
        &self.left
    }

    pub fn operator(&self) -> BinaryOp {
        self.op
    }

    pub fn right(&self) -> &ODataExpression {
        &self.right
    }

    pub fn ty(&self) -> ExpressionType {
        if self.op.is_boolean_op() {
            ExpressionType::Boolean
        } else {
            self.left.ty()
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, operand: &ODataExpression) -> fmt::Result {
        match operand {
            ODataExpression::BinaryOp(child) if self.op.needs_parens(child.op) => {
                write!(f, "({operand})")
            }
            _ => write!(f, "{operand}"),
        }
    }
}

impl fmt::Display for BinaryOpExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_operand(f, &self.left)?;
        write!(f, " {} ", self.op)?;
        self.fmt_operand(f, &self.right)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOpExpression {
    op: UnaryOp,
    operand: Box<ODataExpression>,
}

impl UnaryOpExpression {
    pub fn new(op: UnaryOp, operand: ODataExpression) -> Self {
        UnaryOpExpression {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn operator(&self) -> UnaryOp {
        self.op
    }

    pub fn operand(&self) -> &ODataExpression {
        &self.operand
    }

    pub fn ty(&self) -> ExpressionType {
        self.operand.ty()
    }
}

impl fmt::Display for UnaryOpExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.operand)
    }
}

// ============================================================================
// Calls and constants
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    function: Function,
    arguments: Vec<ODataExpression>,
    return_type: ExpressionType,
}

impl CallExpression {
    pub fn new(function: Function, arguments: Vec<ODataExpression>, return_type: ExpressionType) -> Self {
        CallExpression {
            function,
            arguments,
            return_type,
        }
    }

    pub fn function(&self) -> Function {
        self.function
    }

    pub fn arguments(&self) -> &[ODataExpression] {
        &self.arguments
    }

    pub fn ty(&self) -> ExpressionType {
        self.return_type
    }
}

impl fmt::Display for CallExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.function)?;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ")")
    }
}

/// A typed literal, or a typed null.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantExpression {
    value: Value,
    ty: ExpressionType,
}

impl ConstantExpression {
    pub fn new(value: Value, ty: ExpressionType) -> Result<Self, ExpressionError> {
        let valid = ty != ExpressionType::Complex
            && (value.is_null() || value.expression_type() == Some(ty));
        if !valid {
            return Err(ExpressionError::ConstantTypeMismatch {
                value: value.to_string(),
                ty,
            });
        }
        Ok(ConstantExpression { value, ty })
    }

    /// Constant typed after its own (non-null) value.
    pub fn of(value: Value) -> Result<Self, ExpressionError> {
        let ty = value.expression_type().unwrap_or(ExpressionType::Complex);
        Self::new(value, ty)
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn ty(&self) -> ExpressionType {
        self.ty
    }
}

impl fmt::Display for ConstantExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_literal(&self.value, self.ty))
    }
}

// ============================================================================
// Members
// ============================================================================

/// The member read by a [`MemberAccessExpression`].
#[derive(Debug, Clone)]
pub enum Member {
    /// A statically declared property
    Declared { name: String, ty: ExpressionType },

    /// A synthetic column of a dynamic row
    Row(Arc<RowProperty>),
}

impl Member {
    pub fn declared(name: impl Into<String>, ty: ExpressionType) -> Self {
        Member::Declared {
            name: name.into(),
            ty,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Member::Declared { name, .. } => name,
            Member::Row(property) => property.name(),
        }
    }

    pub fn expression_type(&self) -> ExpressionType {
        match self {
            Member::Declared { ty, .. } => *ty,
            Member::Row(property) => property.column_type().expression_type(),
        }
    }

    pub fn row_property(&self) -> Option<&Arc<RowProperty>> {
        match self {
            Member::Row(property) => Some(property),
            Member::Declared { .. } => None,
        }
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Member::Declared { name: a, ty: ta }, Member::Declared { name: b, ty: tb }) => {
                a == b && ta == tb
            }
            (Member::Row(a), Member::Row(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

/// `receiver/member`, or a bare member when there is no receiver.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberAccessExpression {
    expression: Option<Box<MemberAccessExpression>>,
    member: Member,
}

impl MemberAccessExpression {
    pub fn new(expression: Option<MemberAccessExpression>, member: Member) -> Self {
        MemberAccessExpression {
            expression: expression.map(Box::new),
            member,
        }
    }

    /// Member of the implicit root.
    pub fn root(member: Member) -> Self {
        Self::new(None, member)
    }

    pub fn expression(&self) -> Option<&MemberAccessExpression> {
        self.expression.as_deref()
    }

    pub fn member(&self) -> &Member {
        &self.member
    }

    pub fn ty(&self) -> ExpressionType {
        self.member.expression_type()
    }
}

impl fmt::Display for MemberAccessExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(receiver) = &self.expression {
            write!(f, "{receiver}/")?;
        }
        f.write_str(self.member.name())
    }
}

// ============================================================================
// Conversions, sorting, projection
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertExpression {
    expression: Box<ODataExpression>,
    ty: ExpressionType,
}

impl ConvertExpression {
    pub fn new(expression: ODataExpression, ty: ExpressionType) -> Result<Self, ExpressionError> {
        if !ty.is_primitive() {
            return Err(ExpressionError::NonPrimitiveCast(ty));
        }
        Ok(ConvertExpression {
            expression: Box::new(expression),
            ty,
        })
    }

    pub fn expression(&self) -> &ODataExpression {
        &self.expression
    }

    pub fn ty(&self) -> ExpressionType {
        self.ty
    }

    /// Whether the conversion is implicit and prints as its operand alone.
    pub fn is_implicit(&self) -> bool {
        self.expression.ty().is_implicitly_castable_to(self.ty)
    }
}

impl fmt::Display for ConvertExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_implicit() {
            write!(f, "{}", self.expression)
        } else {
            write!(f, "cast({}, {})", self.expression, self.ty.keyword())
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKeyExpression {
    expression: Box<ODataExpression>,
    direction: SortDirection,
}

impl SortKeyExpression {
    pub fn new(expression: ODataExpression, direction: SortDirection) -> Self {
        SortKeyExpression {
            expression: Box::new(expression),
            direction,
        }
    }

    pub fn expression(&self) -> &ODataExpression {
        &self.expression
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn ty(&self) -> ExpressionType {
        self.expression.ty()
    }
}

impl fmt::Display for SortKeyExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)?;
        if self.direction == SortDirection::Descending {
            write!(f, " {}", self.direction.keyword())?;
        }
        Ok(())
    }
}

/// One `$select` entry: `path`, `path/*`, or `*`.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumnExpression {
    expression: Option<MemberAccessExpression>,
    all_columns: bool,
}

impl SelectColumnExpression {
    pub fn new(
        expression: Option<MemberAccessExpression>,
        all_columns: bool,
    ) -> Result<Self, ExpressionError> {
        if expression.is_none() && !all_columns {
            return Err(ExpressionError::EmptySelectColumn);
        }
        Ok(SelectColumnExpression {
            expression,
            all_columns,
        })
    }

    pub fn column(expression: MemberAccessExpression) -> Self {
        SelectColumnExpression {
            expression: Some(expression),
            all_columns: false,
        }
    }

    pub fn wildcard() -> Self {
        SelectColumnExpression {
            expression: None,
            all_columns: true,
        }
    }

    pub fn expression(&self) -> Option<&MemberAccessExpression> {
        self.expression.as_ref()
    }

    pub fn all_columns(&self) -> bool {
        self.all_columns
    }

    pub fn ty(&self) -> ExpressionType {
        self.expression
            .as_ref()
            .map_or(ExpressionType::Complex, MemberAccessExpression::ty)
    }
}

impl fmt::Display for SelectColumnExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(expression) = &self.expression {
            write!(f, "{expression}")?;
            if self.all_columns {
                f.write_str("/")?;
            }
        }
        if self.all_columns {
            f.write_str("*")?;
        }
        Ok(())
    }
}
