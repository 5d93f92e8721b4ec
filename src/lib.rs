pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod lambda;
pub mod row;
pub mod value;

pub use ast::{ExpressionError, ExpressionType, ODataExpression, QueryExpression};
pub use lambda::{EvalError, Expr, NormalizeError, TranslateError, denormalize, normalize, translate};
pub use row::{ColumnType, ColumnValue, PropertyRegistry, Row, RowError, RowProperty};
pub use value::Value;
