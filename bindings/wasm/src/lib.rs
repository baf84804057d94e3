//! WebAssembly bindings for custom-metrics
//!
//! Exposes formula compilation to the dashboard's JavaScript, so the metric
//! builder form validates formulas with the same grammar the reporting
//! pipeline evaluates them with.

use std::collections::HashMap;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use custom_metrics::{compile, CompiledFormula, FailureKind, FieldSet, MetricError};

// =============================================================================
// Error Conversion
// =============================================================================

fn kind_name(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::SyntaxError => "SyntaxError",
        FailureKind::UnknownField => "UnknownField",
        FailureKind::NonFiniteResult => "NonFiniteResult",
    }
}

/// JS `Error` carrying the user-facing message plus `kind`, `detail` and `position`
fn to_js_error(err: &MetricError) -> JsValue {
    let js_err = js_sys::Error::new(err.user_message());
    let obj: &JsValue = js_err.as_ref();
    // Setting properties on a fresh Error object cannot fail
    let _ = js_sys::Reflect::set(obj, &"kind".into(), &kind_name(err.kind()).into());
    let _ = js_sys::Reflect::set(obj, &"detail".into(), &err.to_string().into());
    if let Some(position) = err.position() {
        let _ = js_sys::Reflect::set(obj, &"position".into(), &(position as f64).into());
    }
    js_err.into()
}

fn field_set(base_fields: Vec<String>) -> Result<FieldSet, JsValue> {
    FieldSet::new(base_fields).map_err(|e| js_sys::Error::new(&e.to_string()).into())
}

// =============================================================================
// MetricEvaluator - compiled formula handle
// =============================================================================

/// A validated formula that can be applied to report rows.
#[wasm_bindgen]
pub struct MetricEvaluator {
    inner: CompiledFormula,
}

#[wasm_bindgen]
impl MetricEvaluator {
    /// Evaluate against a row object such as `{ spend: 100, results: 20 }`.
    ///
    /// Fields missing from the row read as `NaN`.
    pub fn evaluate(&self, row: JsValue) -> Result<f64, JsError> {
        let row: HashMap<String, f64> = serde_wasm_bindgen::from_value(row)
            .map_err(|e| JsError::new(&format!("Row must map field names to numbers: {}", e)))?;
        Ok(self.inner.evaluate(&row))
    }

    /// Fields the formula reads, in order of first appearance
    #[wasm_bindgen(getter, js_name = referencedFields)]
    pub fn referenced_fields(&self) -> Vec<String> {
        self.inner.referenced_fields().to_vec()
    }

    /// Formula text as compiled
    #[wasm_bindgen(getter)]
    pub fn source(&self) -> String {
        self.inner.source().to_string()
    }

    /// Canonical form of the formula
    #[wasm_bindgen(js_name = toString)]
    pub fn to_string_js(&self) -> String {
        self.inner.to_string()
    }
}

fn compile_metric(formula: &str, fields: &FieldSet) -> Result<CompiledFormula, MetricError> {
    Ok(compile(formula, fields)?)
}

/// Compile a formula, throwing on syntax errors and unknown fields.
///
/// No sample row is evaluated: a formula such as `results / (spend - 1)`
/// compiles. Use `validateMetric` before saving a metric.
#[wasm_bindgen(js_name = createMetricEvaluator)]
pub fn create_metric_evaluator(
    formula: &str,
    base_fields: Vec<String>,
) -> Result<MetricEvaluator, JsValue> {
    let fields = field_set(base_fields)?;
    let inner = compile_metric(formula, &fields).map_err(|e| to_js_error(&e))?;
    Ok(MetricEvaluator { inner })
}

// =============================================================================
// validateMetric - non-throwing check for live form feedback
// =============================================================================

#[derive(Serialize)]
struct ValidationReport {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<usize>,
}

impl ValidationReport {
    fn from_result(result: Result<(), MetricError>) -> Self {
        match result {
            Ok(()) => Self {
                ok: true,
                kind: None,
                message: None,
                detail: None,
                position: None,
            },
            Err(err) => Self {
                ok: false,
                kind: Some(kind_name(err.kind())),
                message: Some(err.user_message()),
                detail: Some(err.to_string()),
                position: err.position(),
            },
        }
    }
}

/// Check a formula without throwing: `{ ok, kind?, message?, detail?, position? }`.
#[wasm_bindgen(js_name = validateMetric)]
pub fn validate_metric(formula: &str, base_fields: Vec<String>) -> Result<JsValue, JsValue> {
    let fields = field_set(base_fields)?;
    let result = custom_metrics::validate_formula(formula, &fields).map(|_| ());
    serde_wasm_bindgen::to_value(&ValidationReport::from_result(result))
        .map_err(|e| js_sys::Error::new(&e.to_string()).into())
}
