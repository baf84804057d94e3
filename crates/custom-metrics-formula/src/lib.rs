//! # custom-metrics-formula
//!
//! Formula compiler for custom metrics.
//!
//! A custom metric is an arithmetic formula over named report fields, such as
//! `(results * 15) / spend`. This crate provides:
//! - Formula parsing (text → AST) with a closed arithmetic grammar
//! - Compilation against a [`FieldSet`](custom_metrics_core::FieldSet)
//! - Evaluation of compiled formulas against rows of field values
//!
//! ## Example
//!
//! ```rust
//! use custom_metrics_core::{FieldSet, Row};
//! use custom_metrics_formula::{compile, FormulaErrorKind};
//!
//! let fields = FieldSet::new(["spend", "results"]).unwrap();
//!
//! let cost_per_result = compile("spend / results", &fields).unwrap();
//! let row = Row::from_pairs([("spend", 50.0), ("results", 10.0)]);
//! assert_eq!(cost_per_result.evaluate(&row), 5.0);
//!
//! let err = compile("spend / reach", &fields).unwrap_err();
//! assert_eq!(err.kind(), FormulaErrorKind::UnknownField);
//! ```

pub mod ast;
pub mod compile;
pub mod error;
pub mod evaluator;
pub mod parser;

pub use ast::{BinaryOperator, FieldRef, FormulaExpr, UnaryOperator};
pub use compile::{compile, CompiledFormula};
pub use error::{
    EvalError, EvalResult, FormulaError, FormulaErrorKind, FormulaResult, SyntaxErrorKind,
};
pub use evaluator::{evaluate, try_evaluate};
pub use parser::{parse_formula, MAX_DEPTH, MAX_HEIGHT};
