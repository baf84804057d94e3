//! Probe for formulas that compile but do not produce a number
//!
//! Division by zero is legal arithmetic, so the compiler accepts
//! `results / (spend - spend)`. Before a formula is saved as a metric it is
//! evaluated once against a sample row, and rejected if the result is NaN
//! or infinite.

use crate::error::{MetricError, MetricResult};
use custom_metrics_core::{FieldSet, FieldValues};
use custom_metrics_formula::{compile, CompiledFormula};

/// Value every field takes in the sample row
pub const PROBE_VALUE: f64 = 1.0;

/// Evaluate against a row with every field set to [`PROBE_VALUE`]
pub fn probe(compiled: &CompiledFormula, fields: &FieldSet) -> MetricResult<f64> {
    probe_with(compiled, &fields.sample_row(PROBE_VALUE))
}

/// Evaluate against a caller-chosen sample row and require a finite result
pub fn probe_with<R: FieldValues + ?Sized>(
    compiled: &CompiledFormula,
    row: &R,
) -> MetricResult<f64> {
    let value = compiled.evaluate(row);
    if value.is_finite() {
        Ok(value)
    } else {
        tracing::debug!(formula = compiled.source(), value, "probe produced a non-finite result");
        Err(MetricError::NonFiniteResult { value })
    }
}

/// Compile a formula and probe it, as done before saving a metric
pub fn validate_formula(formula: &str, fields: &FieldSet) -> MetricResult<CompiledFormula> {
    let compiled = compile(formula, fields)?;
    probe(&compiled, fields)?;
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use custom_metrics_core::Row;

    fn fields() -> FieldSet {
        FieldSet::new(["spend", "results"]).unwrap()
    }

    #[test]
    fn test_probe_accepts_finite() {
        let compiled = compile("(results * 15) / spend", &fields()).unwrap();
        assert_eq!(probe(&compiled, &fields()), Ok(15.0));
    }

    #[test]
    fn test_probe_rejects_zero_division_on_sample_row() {
        let compiled = compile("results / spend", &fields()).unwrap();
        let row = Row::from_pairs([("spend", 0.0), ("results", 1.0)]);

        let err = probe_with(&compiled, &row).unwrap_err();
        assert_eq!(err.kind(), FailureKind::NonFiniteResult);
        assert_eq!(err.user_message(), "Formula did not evaluate to a number.");
        assert_eq!(err.position(), None);
    }

    #[test]
    fn test_probe_rejects_nan() {
        let compiled = compile("(spend - results) / (spend - results)", &fields()).unwrap();
        match probe(&compiled, &fields()) {
            Err(MetricError::NonFiniteResult { value }) => assert!(value.is_nan()),
            other => panic!("Expected NonFiniteResult, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_formula_keeps_kinds_apart() {
        let fields = fields();
        assert!(validate_formula("results / spend", &fields).is_ok());

        let err = validate_formula("results / ", &fields).unwrap_err();
        assert_eq!(err.kind(), FailureKind::SyntaxError);
        assert_eq!(err.user_message(), "Invalid formula. Use available fields and operators.");

        let err = validate_formula("results / reach", &fields).unwrap_err();
        assert_eq!(err.kind(), FailureKind::UnknownField);
        assert_eq!(err.position(), Some(10));

        let err = validate_formula("results / (spend - 1)", &fields).unwrap_err();
        assert_eq!(err.kind(), FailureKind::NonFiniteResult);
    }
}
