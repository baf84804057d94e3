//! Formula evaluator
//!
//! Walks a formula AST against a row of field values. Field references are
//! resolved on every evaluation, never captured at compile time, so the same
//! tree can be applied to any number of rows.

use crate::ast::{FieldRef, FormulaExpr, UnaryOperator};
use crate::error::{EvalError, EvalResult};
use custom_metrics_core::FieldValues;
use std::convert::Infallible;

/// Evaluate an expression against a row
///
/// A field with no value in the row reads as `NaN`, which propagates to the
/// result and fails any finiteness check the caller applies.
pub fn evaluate<R: FieldValues + ?Sized>(expr: &FormulaExpr, row: &R) -> f64 {
    let lookup = |field: &FieldRef| -> Result<f64, Infallible> {
        Ok(row.value(&field.name).unwrap_or(f64::NAN))
    };
    match walk(expr, &lookup) {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

/// Evaluate an expression, failing on the first field missing from the row
pub fn try_evaluate<R: FieldValues + ?Sized>(expr: &FormulaExpr, row: &R) -> EvalResult<f64> {
    let lookup = |field: &FieldRef| {
        row.value(&field.name).ok_or_else(|| EvalError::MissingField {
            name: field.name.clone(),
        })
    };
    walk(expr, &lookup)
}

fn walk<E, L>(expr: &FormulaExpr, lookup: &L) -> Result<f64, E>
where
    L: Fn(&FieldRef) -> Result<f64, E>,
{
    match expr {
        FormulaExpr::Number(n) => Ok(*n),
        FormulaExpr::Field(field) => lookup(field),
        FormulaExpr::BinaryOp { op, left, right } => {
            let left_val = walk(left, lookup)?;
            let right_val = walk(right, lookup)?;
            Ok(op.apply(left_val, right_val))
        }
        FormulaExpr::UnaryOp {
            op: UnaryOperator::Negate,
            operand,
        } => Ok(-walk(operand, lookup)?),
    }
}
