//! Prelude module for convenient imports
//!
//! ```rust
//! use custom_metrics::prelude::*;
//! ```

pub use crate::{
    compile, validate_formula, CompiledFormula, EditorMode, FailureKind, FieldSet, FieldValues,
    FormulaError, Metric, MetricBuilder, MetricError, MetricSet, Row,
};
