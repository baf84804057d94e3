//! cmetric - check custom metric formulas and apply them to report exports

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use custom_metrics::csv::{CsvReadOptions, CsvWriteOptions, RowReader, RowTable, RowWriter};
use custom_metrics::prelude::*;
use custom_metrics::{probe, MetricFailure};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cmetric")]
#[command(
    author,
    version,
    about = "Check custom metric formulas and apply them to report exports"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a formula against a set of fields
    Check {
        /// Formula to check, e.g. "(results * 15) / spend"
        formula: String,

        /// Comma-separated field names
        #[arg(short, long, value_delimiter = ',', conflicts_with = "input")]
        fields: Vec<String>,

        /// Take the field names from a CSV report's header
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Field delimiter of --input (default: comma)
        #[arg(short, long, default_value = ",")]
        delimiter: char,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the fields a CSV report exposes to formulas
    Fields {
        /// Input CSV report
        input: PathBuf,

        /// Field delimiter (default: comma)
        #[arg(short, long, default_value = ",")]
        delimiter: char,
    },

    /// Append metric columns to a CSV report
    Eval {
        /// Input CSV report
        input: PathBuf,

        /// Metric as NAME=FORMULA (repeatable)
        #[arg(short, long = "metric")]
        metrics: Vec<String>,

        /// JSON file holding an array of {"name", "formula"} objects
        #[arg(long)]
        metrics_file: Option<PathBuf>,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Field delimiter (default: comma)
        #[arg(short, long, default_value = ",")]
        delimiter: char,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Check {
            formula,
            fields,
            input,
            delimiter,
            json,
        } => check(&formula, fields, input.as_deref(), delimiter, json),
        Commands::Fields { input, delimiter } => list_fields(&input, delimiter),
        Commands::Eval {
            input,
            metrics,
            metrics_file,
            output,
            delimiter,
        } => eval(
            &input,
            &metrics,
            metrics_file.as_deref(),
            output.as_deref(),
            delimiter,
        ),
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_options(delimiter: char) -> Result<CsvReadOptions> {
    let delimiter = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .with_context(|| format!("Delimiter '{}' must be a single ASCII character", delimiter))?;
    Ok(CsvReadOptions {
        delimiter,
        ..Default::default()
    })
}

fn read_table(input: &Path, delimiter: char) -> Result<RowTable> {
    RowReader::read_file(input, &read_options(delimiter)?)
        .with_context(|| format!("Failed to read '{}'", input.display()))
}

/// Result of `check`, printed as text or JSON
#[derive(Debug, Serialize)]
struct CheckReport {
    ok: bool,
    formula: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    canonical: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    probe: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<usize>,
}

fn check_report(formula: &str, fields: &FieldSet) -> CheckReport {
    let mut report = CheckReport {
        ok: false,
        formula: formula.to_string(),
        canonical: None,
        fields: Vec::new(),
        probe: None,
        kind: None,
        message: None,
        position: None,
    };

    let outcome = compile(formula, fields).map_err(MetricError::from).and_then(|compiled| {
        report.canonical = Some(compiled.to_string());
        report.fields = compiled.referenced_fields().to_vec();
        probe(&compiled, fields)
    });

    match outcome {
        Ok(value) => {
            report.ok = true;
            report.probe = Some(value);
        }
        Err(err) => {
            report.kind = Some(match err.kind() {
                FailureKind::SyntaxError => "SyntaxError",
                FailureKind::UnknownField => "UnknownField",
                FailureKind::NonFiniteResult => "NonFiniteResult",
            });
            report.message = Some(err.to_string());
            report.position = err.position();
        }
    }

    report
}

/// Fields for `check`: the header of `--input` if given, else `--fields`
fn check_fields(fields: Vec<String>, input: Option<&Path>, delimiter: char) -> Result<FieldSet> {
    match input {
        Some(path) => Ok(read_table(path, delimiter)?.fields),
        None => FieldSet::new(fields).context("Invalid --fields list"),
    }
}

fn check(
    formula: &str,
    fields: Vec<String>,
    input: Option<&Path>,
    delimiter: char,
    json: bool,
) -> Result<()> {
    let fields = check_fields(fields, input, delimiter)?;

    let report = check_report(formula, &fields);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.ok {
        println!("OK: {}", report.canonical.as_deref().unwrap_or(formula));
        println!("Fields: {}", report.fields.join(", "));
        if let Some(value) = report.probe {
            println!("Sample value: {}", value);
        }
    } else {
        eprintln!("{}", report.message.as_deref().unwrap_or("invalid formula"));
        if let Some(position) = report.position {
            eprintln!("  {}", formula);
            eprintln!("  {}^", " ".repeat(position));
        }
    }

    if !report.ok {
        bail!("Formula rejected");
    }
    Ok(())
}

fn list_fields(input: &Path, delimiter: char) -> Result<()> {
    let table = read_table(input, delimiter)?;

    for (idx, name) in table.fields.iter().enumerate() {
        println!("{}\t{}", idx, name);
    }
    if !table.skipped_columns.is_empty() {
        eprintln!("Skipped non-numeric columns: {}", table.skipped_columns.join(", "));
    }

    Ok(())
}

/// Parse a `NAME=FORMULA` argument
fn parse_metric_arg(arg: &str) -> Result<Metric> {
    let (name, formula) = arg
        .split_once('=')
        .with_context(|| format!("Expected NAME=FORMULA, got '{}'", arg))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("Metric name is empty in '{}'", arg);
    }
    Ok(Metric::new(name, formula.trim()))
}

fn load_metrics(args: &[String], metrics_file: Option<&Path>) -> Result<Vec<Metric>> {
    let mut metrics = Vec::new();

    if let Some(path) = metrics_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        let saved: Vec<Metric> = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse metrics in '{}'", path.display()))?;
        metrics.extend(saved);
    }

    for arg in args {
        metrics.push(parse_metric_arg(arg)?);
    }

    if metrics.is_empty() {
        bail!("No metrics given; use --metric NAME=FORMULA or --metrics-file");
    }
    Ok(metrics)
}

fn report_failures(failures: &[MetricFailure]) {
    for failure in failures {
        eprintln!("{}", failure);
        if let Some(position) = failure.error.position() {
            eprintln!("  {}", failure.metric.formula);
            eprintln!("  {}^", " ".repeat(position));
        }
    }
}

fn eval(
    input: &Path,
    metric_args: &[String],
    metrics_file: Option<&Path>,
    output: Option<&Path>,
    delimiter: char,
) -> Result<()> {
    let metrics = load_metrics(metric_args, metrics_file)?;
    let table = read_table(input, delimiter)?;

    let set = match MetricSet::from_metrics(table.fields.clone(), metrics) {
        Ok(set) => set,
        Err(failures) => {
            report_failures(&failures);
            bail!("{} metric(s) rejected", failures.len());
        }
    };

    tracing::info!(
        metrics = set.len(),
        rows = table.len(),
        input = %input.display(),
        "evaluating metrics"
    );
    let result = set.calculate(&table.rows);
    let columns: Vec<(&str, &[f64])> = result
        .columns
        .iter()
        .map(|column| (column.name.as_str(), column.values.as_slice()))
        .collect();

    let write_options = CsvWriteOptions {
        delimiter: read_options(delimiter)?.delimiter,
        ..Default::default()
    };

    match output {
        Some(path) => {
            RowWriter::write_file(path, &table, &columns, &write_options)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            eprintln!("Wrote {} rows to '{}'", table.len(), path.display());
        }
        None => {
            RowWriter::write(io::stdout().lock(), &table, &columns, &write_options)
                .context("Failed to write to stdout")?;
        }
    }

    eprintln!(
        "Calculated {} values ({} not finite)",
        result.stats.values, result.stats.non_finite
    );

    Ok(())
}
