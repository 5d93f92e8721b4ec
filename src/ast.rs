//! # Query Expression AST
//!
//! Typed nodes of an OData query and their exact wire serialization.
//!
//! ## Architecture Overview
//!
//! - **[types]** - Static result types and type literals
//! - **[operators]** - Binary/unary operators, functions, sort direction, inline count
//! - **[expressions]** - Expression nodes and their construction-time validation
//! - **[literals]** - Lexical forms of constants
//! - **[query]** - The root query node, functional updates, and query-string rendering
//!
//! ## Quick Start
//!
//! ```
//! use odata_expr::ast::*;
//!
//! let price = MemberAccessExpression::root(Member::declared("Price", ExpressionType::Int32));
//! let filter = ODataExpression::binary(
//!     price.into(),
//!     BinaryOp::GreaterThan,
//!     ODataExpression::constant(100, ExpressionType::Int32).unwrap(),
//! )
//! .unwrap();
//!
//! let query = QueryExpression::default().update().filter(filter).top(5).apply().unwrap();
//! assert_eq!(query.to_string(), "?$filter=Price+gt+100&$top=5");
//! ```
//!
//! ## Printing Rules
//!
//! ### Precedence
//!
//! A binary operand is parenthesized only when it is itself a binary
//! operation of a looser precedence class than its parent:
//!
//! ```text
//! And(Or(A, B), C)  →  (A or B) and C
//! Or(And(A, B), C)  →  A and B or C
//! ```
//!
//! ### Literals
//!
//! | Type     | Form                                   |
//! |----------|----------------------------------------|
//! | Boolean  | `true` / `false`                       |
//! | Byte     | two hex digits                         |
//! | DateTime | `datetime'2020-03-04T05:06:07.5000000'` |
//! | Decimal  | `1.50M`                                |
//! | Double   | `2.5`                                  |
//! | Guid     | `guid'…'`                              |
//! | Int64    | `42L`                                  |
//! | Single   | `2.5f` (one fractional digit)          |
//! | String   | `'O''Brien'`                           |
//! | null     | `null`                                 |
//!
//! ### Query String
//!
//! Parameters appear in the fixed order `$filter, $orderby, $top, $skip,
//! $format, $inlinecount, $select`, each only when set (`$skip` only when
//! non-zero, `$inlinecount` only when not `none`), with percent-encoded values.
pub mod expressions;
pub mod literals;
pub mod operators;
pub mod query;
pub mod types;

pub use expressions::{
    BinaryOpExpression, CallExpression, ConstantExpression, ConvertExpression, ExpressionError,
    ExpressionKind, Member, MemberAccessExpression, ODataExpression, SelectColumnExpression,
    SortKeyExpression, UnaryOpExpression,
};
pub use operators::{BinaryOp, Function, InlineCount, SortDirection, UnaryOp};
pub use query::{QueryExpression, QueryUpdate};
pub use types::{ExpressionType, TypeRef};
