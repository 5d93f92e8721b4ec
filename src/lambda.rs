//! Predicate trees over dynamic rows, and the rewrites between their two
//! forms.
//!
//! User code builds an [`Expr`] with `row.get::<T>(name)` calls. [`normalize`]
//! replaces each call with a read of the synthetic [`RowProperty`] for
//! `(name, T)`, which [`translate`] can then print as a plain member path.
//! [`denormalize`] restores the calls so the tree can be run against a real
//! [`Row`] by the [`Evaluator`].
//!
//! ```
//! use odata_expr::lambda::{Bindings, Evaluator, Expr, denormalize, normalize};
//! use odata_expr::{Row, Value};
//!
//! let predicate = Expr::column::<i32>(Expr::row("r"), "Age").greater_than(Expr::constant(30));
//! let normalized = normalize(&predicate).unwrap();
//! let restored = denormalize(&normalized);
//!
//! let row = Row::new([("age", Value::Int32(36))]);
//! let bindings = Bindings::new().bind("r", row);
//! assert_eq!(Evaluator::new().evaluate(&restored, &bindings).unwrap(), Value::Boolean(true));
//! ```
//!
//! [`RowProperty`]: crate::row::RowProperty
//! [`Row`]: crate::row::Row

mod evaluator;
mod expr;
mod normalize;
mod translate;

pub use evaluator::{Bindings, EvalError, Evaluator};
pub use expr::{COLUMN_NAME_PARAMETER, Expr, Method};
pub use normalize::{NormalizeError, Normalizer, denormalize, normalize};
pub use translate::{
    TranslateError, translate, translate_member, translate_select, translate_sort_key,
};
