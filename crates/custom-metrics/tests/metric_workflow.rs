//! End-to-end tests: building, validating and applying custom metrics

use custom_metrics::csv::{CsvReadOptions, CsvWriteOptions, LineTerminator, RowReader, RowWriter};
use custom_metrics::prelude::*;
use custom_metrics::{probe_with, validate_formula, FailureKind, MetricColumn, PROBE_VALUE};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashMap;

fn ad_fields() -> FieldSet {
    FieldSet::new(["spend", "results", "impressions", "clicks", "purchase_value"]).unwrap()
}

/// A formula that divides by a zero field is caught before it can be saved
#[test]
fn test_zero_division_probe_blocks_save() {
    let fields = FieldSet::new(["spend", "results"]).unwrap();
    let compiled = compile("results / spend", &fields).unwrap();

    let mut sample: HashMap<String, f64> = HashMap::new();
    sample.insert("spend".into(), 0.0);
    sample.insert("results".into(), 1.0);

    let err = probe_with(&compiled, &sample).unwrap_err();
    assert_eq!(err.kind(), FailureKind::NonFiniteResult);
    assert_eq!(err.user_message(), "Formula did not evaluate to a number.");
}

/// Compile errors keep their kind all the way to the caller
#[test]
fn test_failure_kinds() {
    let fields = ad_fields();

    let unknown = validate_formula("purchase_value / cost", &fields).unwrap_err();
    assert_eq!(unknown.kind(), FailureKind::UnknownField);
    assert!(matches!(
        unknown,
        MetricError::Formula(FormulaError::UnknownField { ref name, position: 17 }) if name == "cost"
    ));

    let syntax = validate_formula("(purchase_value / spend", &fields).unwrap_err();
    assert_eq!(syntax.kind(), FailureKind::SyntaxError);
    assert_eq!(syntax.position(), Some(0));
}

/// The builder produces metrics that a metric set accepts and applies
#[test]
fn test_builder_to_metric_set() {
    let fields = ad_fields();
    let mut saved = Vec::new();

    let mut builder = MetricBuilder::new(fields.clone());
    builder.set_name("ROAS");
    builder.set_formula("purchase_value / spend");
    saved.push(builder.submit().unwrap());

    builder.set_name("CTR %");
    builder.set_formula("");
    builder.insert_field("clicks");
    builder.set_formula(format!("{} / impressions * 100", builder.formula()));
    saved.push(builder.submit().unwrap());

    let set = MetricSet::from_metrics(fields, saved).unwrap();
    let rows = [Row::from_pairs([
        ("spend", 200.0),
        ("results", 10.0),
        ("impressions", 8000.0),
        ("clicks", 120.0),
        ("purchase_value", 700.0),
    ])];
    let result = set.calculate(&rows);

    assert_eq!(
        result.columns,
        vec![
            MetricColumn {
                name: "ROAS".into(),
                values: vec![3.5],
            },
            MetricColumn {
                name: "CTR %".into(),
                values: vec![1.5],
            },
        ]
    );
}

/// Report export in, derived columns out
#[test]
fn test_report_pipeline() {
    let report = "\
Campaign,Amount Spent,Results,Purchase Value
Spring,400,20,\"1,600\"
Summer,0,0,0
";
    let table = RowReader::read(report.as_bytes(), &CsvReadOptions::default()).unwrap();

    let set = MetricSet::from_metrics(
        table.fields.clone(),
        [
            Metric::new("Cost per result", "amount_spent / results"),
            Metric::new("ROAS", "purchase_value / amount_spent"),
        ],
    )
    .unwrap();
    let result = set.calculate(&table.rows);
    assert_eq!(result.stats.non_finite, 2);

    let columns: Vec<(&str, &[f64])> = result
        .columns
        .iter()
        .map(|c| (c.name.as_str(), c.values.as_slice()))
        .collect();

    let mut out = Vec::new();
    let options = CsvWriteOptions {
        line_terminator: LineTerminator::LF,
        ..Default::default()
    };
    RowWriter::write(&mut out, &table, &columns, &options).unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "\
Campaign,Amount Spent,Results,Purchase Value,Cost per result,ROAS
Spring,400,20,\"1,600\",20,4
Summer,0,0,0,,
"
    );
}

const SAMPLE_FIELDS: &[&str] = &["spend", "results", "clicks"];

/// Valid formulas over `SAMPLE_FIELDS`; small literals make zero divisors likely
fn sample_formula() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        (0u32..4).prop_map(|n| n.to_string()),
        prop::sample::select(SAMPLE_FIELDS).prop_map(str::to_string),
    ];
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (
                inner.clone(),
                prop::sample::select(vec!['+', '-', '*', '/']),
                inner.clone()
            )
                .prop_map(|(left, op, right)| format!("({left} {op} {right})")),
            inner.prop_map(|e| format!("-{e}")),
        ]
    })
}

proptest! {
    /// Validation accepts exactly the formulas that are finite on the sample row
    #[test]
    fn validation_matches_sample_row(text in sample_formula()) {
        let fields = FieldSet::new(SAMPLE_FIELDS.iter().copied()).unwrap();
        let compiled = compile(&text, &fields).unwrap();
        let sample = compiled.evaluate(&fields.sample_row(PROBE_VALUE));

        match validate_formula(&text, &fields) {
            Ok(valid) => {
                let value = valid.evaluate(&fields.sample_row(PROBE_VALUE));
                prop_assert!(sample.is_finite());
                prop_assert_eq!(value.to_bits(), sample.to_bits());
            }
            Err(err) => {
                prop_assert!(!sample.is_finite());
                prop_assert_eq!(err.kind(), FailureKind::NonFiniteResult);
                prop_assert_eq!(err.position(), None);
            }
        }
    }
}
