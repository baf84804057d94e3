//! Metric builder workflow
//!
//! State behind a "create / edit custom metric" form. The builder owns the
//! text the user is editing and the last error message. Validation goes
//! through [`validate_formula`], so a metric only leaves the builder once
//! its formula compiles and passes the probe.

use crate::error::MetricResult;
use crate::probe::validate_formula;
use custom_metrics_core::{FieldSet, Metric, DEFAULT_FORMULA, DEFAULT_METRIC_NAME};

/// Whether the form is creating a new metric or editing a saved one
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditorMode {
    #[default]
    Composing,
    EditingExisting(Metric),
}

/// Create/edit state for one custom metric
#[derive(Debug, Clone)]
pub struct MetricBuilder {
    fields: FieldSet,
    mode: EditorMode,
    name: String,
    formula: String,
    error: Option<String>,
}

impl MetricBuilder {
    /// Start composing a new metric
    pub fn new(fields: FieldSet) -> Self {
        let mut builder = Self {
            fields,
            mode: EditorMode::Composing,
            name: String::new(),
            formula: String::new(),
            error: None,
        };
        builder.load(None);
        builder
    }

    /// Start editing a saved metric
    pub fn editing(fields: FieldSet, metric: Metric) -> Self {
        let mut builder = Self::new(fields);
        builder.load(Some(metric));
        builder
    }

    /// Switch to a different metric, or back to composing with `None`
    ///
    /// Name, formula and error are all reset from the new target.
    pub fn load(&mut self, initial: Option<Metric>) {
        match initial {
            Some(metric) => {
                self.name = metric.name.clone();
                self.formula = if metric.formula.is_empty() {
                    DEFAULT_FORMULA.to_string()
                } else {
                    metric.formula.clone()
                };
                self.mode = EditorMode::EditingExisting(metric);
            }
            None => {
                self.name.clear();
                self.formula = DEFAULT_FORMULA.to_string();
                self.mode = EditorMode::Composing;
            }
        }
        self.error = None;
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, EditorMode::EditingExisting(_))
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    pub fn set_formula(&mut self, formula: impl Into<String>) {
        self.formula = formula.into();
    }

    /// Message from the last failed submit, cleared by a successful one
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Form heading
    pub fn title(&self) -> &'static str {
        if self.is_editing() {
            "Edit Custom Metric"
        } else {
            "Create Custom Metric"
        }
    }

    /// Label of the submit button
    pub fn submit_label(&self) -> &'static str {
        if self.is_editing() {
            "Update Metric"
        } else {
            "Save Metric"
        }
    }

    /// Append a field name to the formula
    ///
    /// A space is inserted first unless the formula is empty or already ends
    /// with one. Returns `false`, leaving the formula alone, for names that
    /// are not in the field set.
    pub fn insert_field(&mut self, field: &str) -> bool {
        if !self.fields.contains(field) {
            return false;
        }
        if !self.formula.is_empty() && !self.formula.ends_with(' ') {
            self.formula.push(' ');
        }
        self.formula.push_str(field);
        true
    }

    /// Validate and produce the metric, accepting it unconditionally
    pub fn submit(&mut self) -> MetricResult<Metric> {
        self.submit_with(|_| true)
    }

    /// Validate and produce the metric, letting `on_submit` accept or decline it
    ///
    /// On a validation failure the user-facing message is stored and the
    /// error returned. Otherwise the metric is passed to `on_submit`; if it
    /// returns `true` a new metric's inputs are reset for the next one, and
    /// an edit is re-targeted at the saved metric.
    pub fn submit_with<F>(&mut self, on_submit: F) -> MetricResult<Metric>
    where
        F: FnOnce(&Metric) -> bool,
    {
        if let Err(err) = validate_formula(&self.formula, &self.fields) {
            self.error = Some(err.user_message().to_string());
            return Err(err);
        }

        let name = self.name.trim();
        let metric = Metric::new(
            if name.is_empty() { DEFAULT_METRIC_NAME } else { name },
            self.formula.trim(),
        );

        let accepted = on_submit(&metric);
        if accepted {
            match self.mode {
                EditorMode::Composing => {
                    self.name.clear();
                    self.formula = DEFAULT_FORMULA.to_string();
                }
                EditorMode::EditingExisting(_) => {
                    self.mode = EditorMode::EditingExisting(metric.clone());
                }
            }
        }
        self.error = None;

        Ok(metric)
    }

    /// Abandon the current edit and start a fresh metric
    pub fn cancel(&mut self) {
        self.load(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FailureKind, INVALID_FORMULA_MESSAGE, NON_FINITE_MESSAGE};
    use pretty_assertions::assert_eq;

    fn fields() -> FieldSet {
        FieldSet::new(["spend", "results", "clicks"]).unwrap()
    }

    #[test]
    fn test_new_uses_defaults() {
        let builder = MetricBuilder::new(fields());
        assert_eq!(builder.mode(), &EditorMode::Composing);
        assert_eq!(builder.name(), "");
        assert_eq!(builder.formula(), DEFAULT_FORMULA);
        assert_eq!(builder.error(), None);
        assert_eq!(builder.title(), "Create Custom Metric");
        assert_eq!(builder.submit_label(), "Save Metric");
    }

    #[test]
    fn test_insert_field_spacing() {
        let mut builder = MetricBuilder::new(fields());
        builder.set_formula("");
        assert!(builder.insert_field("results"));
        assert_eq!(builder.formula(), "results");

        builder.set_formula(builder.formula().to_string() + " /");
        assert!(builder.insert_field("spend"));
        assert_eq!(builder.formula(), "results / spend");

        builder.set_formula("clicks * ");
        assert!(builder.insert_field("spend"));
        assert_eq!(builder.formula(), "clicks * spend");

        assert!(!builder.insert_field("reach"));
        assert_eq!(builder.formula(), "clicks * spend");
    }

    #[test]
    fn test_submit_new_metric_resets_inputs() {
        let mut builder = MetricBuilder::new(fields());
        builder.set_name("  Cost per click ");
        builder.set_formula(" spend / clicks ");

        let metric = builder.submit().unwrap();
        assert_eq!(metric, Metric::new("Cost per click", "spend / clicks"));
        assert_eq!(builder.name(), "");
        assert_eq!(builder.formula(), DEFAULT_FORMULA);
        assert_eq!(builder.error(), None);
    }

    #[test]
    fn test_submit_defaults_blank_name() {
        let mut builder = MetricBuilder::new(fields());
        builder.set_name("   ");
        let metric = builder.submit().unwrap();
        assert_eq!(metric.name, DEFAULT_METRIC_NAME);
    }

    #[test]
    fn test_submit_invalid_formula_keeps_inputs() {
        let mut builder = MetricBuilder::new(fields());
        builder.set_name("Broken");
        builder.set_formula("results /");

        let err = builder.submit().unwrap_err();
        assert_eq!(err.kind(), FailureKind::SyntaxError);
        assert_eq!(builder.error(), Some(INVALID_FORMULA_MESSAGE));
        assert_eq!(builder.name(), "Broken");
        assert_eq!(builder.formula(), "results /");

        builder.set_formula("results - results * 0 / 0");
        let err = builder.submit().unwrap_err();
        assert_eq!(err.kind(), FailureKind::NonFiniteResult);
        assert_eq!(builder.error(), Some(NON_FINITE_MESSAGE));

        builder.set_formula("results / spend");
        assert!(builder.submit().is_ok());
        assert_eq!(builder.error(), None);
    }

    #[test]
    fn test_declined_submit_keeps_inputs() {
        let mut builder = MetricBuilder::new(fields());
        builder.set_name("Duplicate");
        builder.set_formula("results / spend");

        let metric = builder.submit_with(|_| false).unwrap();
        assert_eq!(metric.name, "Duplicate");
        assert_eq!(builder.name(), "Duplicate");
        assert_eq!(builder.formula(), "results / spend");
    }

    #[test]
    fn test_editing_existing_metric() {
        let saved = Metric::new("ROAS", "results * 15 / spend");
        let mut builder = MetricBuilder::editing(fields(), saved.clone());
        assert!(builder.is_editing());
        assert_eq!(builder.title(), "Edit Custom Metric");
        assert_eq!(builder.submit_label(), "Update Metric");
        assert_eq!(builder.name(), "ROAS");
        assert_eq!(builder.formula(), "results * 15 / spend");

        builder.set_formula("results * 20 / spend");
        let updated = builder.submit().unwrap();
        assert_eq!(updated, Metric::new("ROAS", "results * 20 / spend"));

        // Edits are not reset after saving
        assert_eq!(builder.formula(), "results * 20 / spend");
        assert_eq!(builder.mode(), &EditorMode::EditingExisting(updated));
    }

    #[test]
    fn test_load_and_cancel() {
        let mut builder = MetricBuilder::new(fields());
        builder.set_formula("spend +");
        assert!(builder.submit().is_err());

        builder.load(Some(Metric::new("CPC", "spend / clicks")));
        assert_eq!(builder.error(), None);
        assert_eq!(builder.formula(), "spend / clicks");

        builder.cancel();
        assert_eq!(builder.mode(), &EditorMode::Composing);
        assert_eq!(builder.name(), "");
        assert_eq!(builder.formula(), DEFAULT_FORMULA);
    }
}
