//! Formula compilation
//!
//! [`compile`] turns formula text into a [`CompiledFormula`]: a validated,
//! immutable tree that can be evaluated against any number of rows, from any
//! number of threads.

use crate::ast::FormulaExpr;
use crate::error::{EvalResult, FormulaResult};
use crate::evaluator;
use crate::parser::parse_with_fields;
use custom_metrics_core::{FieldSet, FieldValues, Row};
use std::fmt;
use std::sync::Arc;

/// Compile a formula against the fields it may reference
///
/// # Example
/// ```rust
/// use custom_metrics_core::{FieldSet, Row};
/// use custom_metrics_formula::compile;
///
/// let fields = FieldSet::new(["spend", "results"]).unwrap();
/// let formula = compile("(results * 15) / spend", &fields).unwrap();
///
/// let row = Row::from_pairs([("spend", 100.0), ("results", 20.0)]);
/// assert_eq!(formula.evaluate(&row), 3.0);
/// ```
pub fn compile(formula: &str, fields: &FieldSet) -> FormulaResult<CompiledFormula> {
    match parse_with_fields(formula, fields) {
        Ok(expr) => {
            let compiled = CompiledFormula::from_expr(formula, expr);
            tracing::trace!(
                formula,
                fields = ?compiled.referenced_fields(),
                "compiled formula"
            );
            Ok(compiled)
        }
        Err(err) => {
            tracing::debug!(formula, error = %err, "formula rejected");
            Err(err)
        }
    }
}

/// A validated formula, ready to evaluate
///
/// Holds no reference to the [`FieldSet`] it was compiled against; the names
/// it needs are copied into the tree. Cloning is cheap.
#[derive(Clone)]
pub struct CompiledFormula {
    source: Arc<str>,
    expr: Arc<FormulaExpr>,
    fields: Arc<[String]>,
}

impl CompiledFormula {
    fn from_expr(source: &str, expr: FormulaExpr) -> Self {
        let fields = expr.referenced_fields();
        Self {
            source: source.into(),
            expr: Arc::new(expr),
            fields: fields.into(),
        }
    }

    /// Evaluate against a row; missing fields read as `NaN`
    pub fn evaluate<R: FieldValues + ?Sized>(&self, row: &R) -> f64 {
        evaluator::evaluate(&self.expr, row)
    }

    /// Evaluate against a row, failing if a referenced field is missing
    pub fn try_evaluate<R: FieldValues + ?Sized>(&self, row: &R) -> EvalResult<f64> {
        evaluator::try_evaluate(&self.expr, row)
    }

    /// Convert into a plain closure over [`Row`]s
    pub fn into_fn(self) -> impl Fn(&Row) -> f64 + Send + Sync + Clone + 'static {
        move |row: &Row| self.evaluate(row)
    }

    /// Formula text as given to [`compile`]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parsed expression tree
    pub fn expr(&self) -> &FormulaExpr {
        &self.expr
    }

    /// Distinct fields the formula reads, in order of first appearance
    pub fn referenced_fields(&self) -> &[String] {
        &self.fields
    }
}

impl fmt::Debug for CompiledFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledFormula")
            .field("source", &self.source)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Displays the canonical form of the formula
impl fmt::Display for CompiledFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)
    }
}
