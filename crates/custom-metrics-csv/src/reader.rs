//! CSV reader

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::options::CsvReadOptions;
use custom_metrics_core::{is_field_name, FieldSet, Row};

/// Report rows loaded from CSV
#[derive(Debug, Clone, Default)]
pub struct RowTable {
    /// Header cells as they appear in the file
    pub headers: Vec<String>,
    /// Cell text of every record, for writing the table back out
    pub records: Vec<Vec<String>>,
    /// Fields available to formulas, in column order
    pub fields: FieldSet,
    /// Numeric values of the field columns, one row per record
    pub rows: Vec<Row>,
    /// Headers of columns that did not become fields
    pub skipped_columns: Vec<String>,
}

impl RowTable {
    /// Number of records
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no records
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// CSV report reader
pub struct RowReader;

impl RowReader {
    /// Read a CSV file into a row table
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<RowTable> {
        let file = File::open(path)?;
        Self::read(file, options)
    }

    /// Read CSV with a header row into a row table
    pub fn read<R: Read>(reader: R, options: &CsvReadOptions) -> CsvResult<RowTable> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();

        let mut records = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        let names: Vec<String> = headers
            .iter()
            .map(|header| {
                if options.sanitize_headers {
                    sanitize_header(header)
                } else {
                    header.trim().to_string()
                }
            })
            .collect();

        // Pick the columns that become fields
        let mut columns: Vec<(usize, &str)> = Vec::new();
        let mut skipped_columns = Vec::new();
        let mut seen = HashSet::new();
        for (col, name) in names.iter().enumerate() {
            if !is_field_name(name) || !seen.insert(name.as_str()) {
                skipped_columns.push(headers[col].clone());
                continue;
            }
            match Self::first_non_numeric(&records, col) {
                None => columns.push((col, name)),
                Some(row) if options.strict_numbers => {
                    return Err(CsvError::Parse {
                        row: row + 2,
                        column: col + 1,
                        message: format!("'{}' is not a number", records[row][col]),
                    });
                }
                Some(_) => skipped_columns.push(headers[col].clone()),
            }
        }

        for header in &skipped_columns {
            tracing::warn!(column = %header, "column is not a numeric field, skipping");
        }

        let fields = FieldSet::new(columns.iter().map(|(_, name)| *name))?;

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|(col, name)| {
                        let value = record.get(*col).and_then(|cell| parse_number(cell));
                        (name.to_string(), value.unwrap_or(0.0))
                    })
                    .collect::<Row>()
            })
            .collect();

        tracing::debug!(
            records = records.len(),
            fields = fields.len(),
            skipped = skipped_columns.len(),
            "read report rows"
        );

        Ok(RowTable {
            headers,
            records,
            fields,
            rows,
            skipped_columns,
        })
    }

    /// Index of the first record whose cell in `col` is not numeric
    fn first_non_numeric(records: &[Vec<String>], col: usize) -> Option<usize> {
        records.iter().position(|record| {
            record
                .get(col)
                .map_or(false, |cell| parse_number(cell).is_none())
        })
    }
}

/// Parse a report cell as a number
///
/// Blank cells read as 0. A leading `$` and thousands separators are
/// ignored. Non-finite spellings such as `inf` or `NaN` are rejected.
pub fn parse_number(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Some(0.0);
    }

    let (negative, rest) = match cell.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cell),
    };
    let rest = rest.strip_prefix('$').unwrap_or(rest);
    let digits: String = rest.chars().filter(|c| *c != ',').collect();

    let value: f64 = digits.parse().ok()?;
    if !value.is_finite() || digits.starts_with(&['+', '-'][..]) {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// Turn a report header into a field name
///
/// Lowercases letters and collapses every run of other characters into a
/// single `_`. A name that would start with a digit gets a leading `_`.
pub fn sanitize_header(header: &str) -> String {
    let mut out = String::with_capacity(header.len());
    let mut pending_sep = false;

    for c in header.trim().chars() {
        if c.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }

    if out.starts_with(|c: char| c.is_numeric()) {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use custom_metrics_core::FieldValues;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sanitize_header() {
        assert_eq!(sanitize_header("Amount Spent (USD)"), "amount_spent_usd");
        assert_eq!(sanitize_header("  Results "), "results");
        assert_eq!(sanitize_header("cost__per__result"), "cost_per_result");
        assert_eq!(sanitize_header("3-second video plays"), "_3_second_video_plays");
        assert_eq!(sanitize_header("CTR (%)"), "ctr");
        assert_eq!(sanitize_header("%"), "");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("12.5"), Some(12.5));
        assert_eq!(parse_number(" 1,234.50 "), Some(1234.5));
        assert_eq!(parse_number("$99"), Some(99.0));
        assert_eq!(parse_number("-$4.25"), Some(-4.25));
        assert_eq!(parse_number(""), Some(0.0));

        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("--3"), None);
    }

    #[test]
    fn test_read_skips_text_columns() {
        let data = "\
Campaign name,Amount Spent (USD),Results,Link clicks
Spring sale,\"1,200.00\",48,310
Retargeting,300,,95
";
        let table = RowReader::read(data.as_bytes(), &CsvReadOptions::default()).unwrap();

        assert_eq!(table.fields.names(), &["amount_spent_usd", "results", "link_clicks"]);
        assert_eq!(table.skipped_columns, vec!["Campaign name".to_string()]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].value("amount_spent_usd"), Some(1200.0));
        assert_eq!(table.rows[1].value("results"), Some(0.0));
        assert_eq!(table.records[1][0], "Retargeting");
    }

    #[test]
    fn test_read_strict_numbers() {
        let data = "spend,results\n10,4\n12,lots\n";
        let options = CsvReadOptions {
            strict_numbers: true,
            ..Default::default()
        };
        match RowReader::read(data.as_bytes(), &options) {
            Err(CsvError::Parse { row, column, .. }) => {
                assert_eq!(row, 3);
                assert_eq!(column, 2);
            }
            other => panic!("Expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_read_duplicate_headers() {
        let data = "Spend,spend,Clicks\n1,2,3\n";
        let table = RowReader::read(data.as_bytes(), &CsvReadOptions::default()).unwrap();
        assert_eq!(table.fields.names(), &["spend", "clicks"]);
        assert_eq!(table.skipped_columns, vec!["spend".to_string()]);
        assert_eq!(table.rows[0].value("spend"), Some(1.0));
    }

    #[test]
    fn test_read_without_sanitizing() {
        let data = "spend,Amount Spent\n1,2\n";
        let options = CsvReadOptions {
            sanitize_headers: false,
            ..Default::default()
        };
        let table = RowReader::read(data.as_bytes(), &options).unwrap();
        assert_eq!(table.fields.names(), &["spend"]);
        assert_eq!(table.skipped_columns, vec!["Amount Spent".to_string()]);
    }
}
