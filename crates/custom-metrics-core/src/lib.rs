//! # custom-metrics-core
//!
//! Core data structures for custom metrics.
//!
//! This crate provides the vocabulary shared by the formula compiler, the
//! CSV adapter and the metric builder:
//!
//! - [`FieldSet`] - the ordered set of field names a formula may reference
//! - [`Row`] - one record of numeric field values
//! - [`FieldValues`] - lookup trait the evaluator reads rows through
//! - [`Metric`] - a named formula as handed to the persistence layer

pub mod error;
pub mod field;
pub mod metric;
pub mod row;

pub use error::{Error, Result};
pub use field::{is_field_name, FieldSet};
pub use metric::{Metric, DEFAULT_FORMULA, DEFAULT_METRIC_NAME};
pub use row::{FieldValues, Row};
