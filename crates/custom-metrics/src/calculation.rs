//! Batch calculation of metrics over report rows

use crate::error::{MetricFailure, MetricResult};
use crate::probe::validate_formula;
use custom_metrics_core::{FieldSet, FieldValues, Metric};
use custom_metrics_formula::CompiledFormula;

/// Statistics from a calculation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalculationStats {
    /// Rows evaluated
    pub rows: usize,
    /// Values produced (rows × metrics)
    pub values: usize,
    /// Values that came out NaN or infinite
    pub non_finite: usize,
}

/// Values of one metric, one per row
#[derive(Debug, Clone, PartialEq)]
pub struct MetricColumn {
    pub name: String,
    pub values: Vec<f64>,
}

/// Output of [`MetricSet::calculate`]
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationResult {
    /// One column per metric, in the order the metrics were added
    pub columns: Vec<MetricColumn>,
    pub stats: CalculationStats,
}

/// A group of validated metrics over one field set
#[derive(Debug, Clone)]
pub struct MetricSet {
    fields: FieldSet,
    metrics: Vec<(Metric, CompiledFormula)>,
}

impl MetricSet {
    /// Create an empty set for the given fields
    pub fn new(fields: FieldSet) -> Self {
        Self {
            fields,
            metrics: Vec::new(),
        }
    }

    /// Validate every metric, collecting all failures rather than stopping at the first
    pub fn from_metrics<I>(fields: FieldSet, metrics: I) -> Result<Self, Vec<MetricFailure>>
    where
        I: IntoIterator<Item = Metric>,
    {
        let mut set = Self::new(fields);
        let mut failures = Vec::new();

        for metric in metrics {
            if let Err(error) = set.add(metric.clone()) {
                failures.push(MetricFailure { metric, error });
            }
        }

        if failures.is_empty() {
            Ok(set)
        } else {
            Err(failures)
        }
    }

    /// Validate a metric (compile plus probe) and add it to the set
    pub fn add(&mut self, metric: Metric) -> MetricResult<()> {
        let compiled = validate_formula(&metric.formula, &self.fields)?;
        self.metrics.push((metric, compiled));
        Ok(())
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    /// Metrics in the order they were added
    pub fn metrics(&self) -> impl Iterator<Item = &Metric> + '_ {
        self.metrics.iter().map(|(metric, _)| metric)
    }

    /// Compiled formula of the named metric
    pub fn get(&self, name: &str) -> Option<&CompiledFormula> {
        self.metrics
            .iter()
            .find(|(metric, _)| metric.name == name)
            .map(|(_, compiled)| compiled)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Evaluate every metric against every row
    ///
    /// Non-finite values are kept in the output and counted in the stats;
    /// one bad row does not stop the run.
    pub fn calculate<R: FieldValues>(&self, rows: &[R]) -> CalculationResult {
        let mut stats = CalculationStats {
            rows: rows.len(),
            ..Default::default()
        };

        let columns = self
            .metrics
            .iter()
            .map(|(metric, compiled)| {
                let values: Vec<f64> = rows.iter().map(|row| compiled.evaluate(row)).collect();
                stats.values += values.len();
                stats.non_finite += values.iter().filter(|v| !v.is_finite()).count();
                MetricColumn {
                    name: metric.name.clone(),
                    values,
                }
            })
            .collect();

        tracing::debug!(
            metrics = self.metrics.len(),
            rows = stats.rows,
            non_finite = stats.non_finite,
            "calculated metrics"
        );

        CalculationResult { columns, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use custom_metrics_core::Row;
    use pretty_assertions::assert_eq;

    fn fields() -> FieldSet {
        FieldSet::new(["spend", "results", "clicks"]).unwrap()
    }

    #[test]
    fn test_calculate_columns() {
        let set = MetricSet::from_metrics(
            fields(),
            [
                Metric::new("CPR", "spend / results"),
                Metric::new("CPC", "spend / clicks"),
            ],
        )
        .unwrap();

        let rows = vec![
            Row::from_pairs([("spend", 100.0), ("results", 4.0), ("clicks", 50.0)]),
            Row::from_pairs([("spend", 30.0), ("results", 0.0), ("clicks", 60.0)]),
        ];
        let result = set.calculate(&rows);

        assert_eq!(result.columns.len(), 2);
        assert_eq!(result.columns[0].name, "CPR");
        assert_eq!(result.columns[0].values[0], 25.0);
        assert!(result.columns[0].values[1].is_infinite());
        assert_eq!(result.columns[1].values, vec![2.0, 0.5]);
        assert_eq!(
            result.stats,
            CalculationStats {
                rows: 2,
                values: 4,
                non_finite: 1,
            }
        );
    }

    #[test]
    fn test_from_metrics_reports_every_failure() {
        let failures = MetricSet::from_metrics(
            fields(),
            [
                Metric::new("ok", "spend / clicks"),
                Metric::new("typo", "spend / clikcs"),
                Metric::new("broken", "spend /"),
                Metric::new("zero", "spend / (clicks - 1)"),
            ],
        )
        .unwrap_err();

        let kinds: Vec<(&str, FailureKind)> = failures
            .iter()
            .map(|f| (f.metric.name.as_str(), f.error.kind()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("typo", FailureKind::UnknownField),
                ("broken", FailureKind::SyntaxError),
                ("zero", FailureKind::NonFiniteResult),
            ]
        );
        assert_eq!(
            failures[0].to_string(),
            "Metric 'typo' is invalid: Unknown field 'clikcs' at position 8"
        );
    }

    #[test]
    fn test_get_and_empty_rows() {
        let mut set = MetricSet::new(fields());
        assert!(set.is_empty());
        set.add(Metric::new("CPC", "spend / clicks")).unwrap();

        assert!(set.get("CPC").is_some());
        assert!(set.get("ROAS").is_none());

        let result = set.calculate::<Row>(&[]);
        assert_eq!(result.stats, CalculationStats::default());
        assert!(result.columns[0].values.is_empty());
    }
}
