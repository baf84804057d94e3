//! # custom-metrics
//!
//! User-defined metrics for ad-performance reports.
//!
//! A custom metric is a name plus an arithmetic formula over report fields,
//! such as "Blended ROAS" = `(results * 15) / spend`. This crate ties the
//! pieces together:
//!
//! - Compiling formulas against the fields a report exposes
//! - The probe that rejects formulas which do not produce a finite number
//! - The create/edit workflow behind a metric builder form
//! - Applying a set of metrics to many rows at once
//!
//! ## Example
//!
//! ```rust
//! use custom_metrics::prelude::*;
//!
//! let fields = FieldSet::new(["spend", "results"]).unwrap();
//!
//! let mut builder = MetricBuilder::new(fields);
//! builder.set_name("Blended ROAS");
//! let metric = builder.submit().unwrap();
//! assert_eq!(metric.formula, "(results * 15) / spend");
//!
//! builder.set_formula("results / (spend - spend)");
//! let err = builder.submit().unwrap_err();
//! assert_eq!(err.kind(), FailureKind::NonFiniteResult);
//! assert_eq!(builder.error(), Some("Formula did not evaluate to a number."));
//! ```

pub mod builder;
pub mod calculation;
pub mod error;
pub mod prelude;
pub mod probe;

pub use builder::{EditorMode, MetricBuilder};
pub use calculation::{CalculationResult, CalculationStats, MetricColumn, MetricSet};
pub use error::{
    FailureKind, MetricError, MetricFailure, MetricResult, INVALID_FORMULA_MESSAGE,
    NON_FINITE_MESSAGE,
};
pub use probe::{probe, probe_with, validate_formula, PROBE_VALUE};

// Re-export core types
pub use custom_metrics_core::{
    is_field_name, FieldSet, FieldValues, Metric, Row, DEFAULT_FORMULA, DEFAULT_METRIC_NAME,
};

// Re-export formula types
pub use custom_metrics_formula::{
    compile, parse_formula, CompiledFormula, EvalError, FormulaError, FormulaErrorKind,
    FormulaExpr, SyntaxErrorKind,
};

/// CSV report adapter
#[cfg(feature = "csv")]
pub use custom_metrics_csv as csv;
