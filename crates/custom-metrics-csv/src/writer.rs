//! CSV writer

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::options::{CsvWriteOptions, LineTerminator};
use crate::reader::RowTable;

/// CSV writer for tables with derived metric columns
pub struct RowWriter;

impl RowWriter {
    /// Write a table plus derived columns to a CSV file
    pub fn write_file<P, S, V>(
        path: P,
        table: &RowTable,
        columns: &[(S, V)],
        options: &CsvWriteOptions,
    ) -> CsvResult<()>
    where
        P: AsRef<Path>,
        S: AsRef<str>,
        V: AsRef<[f64]>,
    {
        let file = File::create(path)?;
        Self::write(file, table, columns, options)
    }

    /// Write a table plus derived columns to a writer
    ///
    /// Each derived column is a `(name, values)` pair with one value per
    /// record of the table.
    pub fn write<W, S, V>(
        writer: W,
        table: &RowTable,
        columns: &[(S, V)],
        options: &CsvWriteOptions,
    ) -> CsvResult<()>
    where
        W: Write,
        S: AsRef<str>,
        V: AsRef<[f64]>,
    {
        for (name, values) in columns {
            let actual = values.as_ref().len();
            if actual != table.records.len() {
                return Err(CsvError::ColumnLength {
                    name: name.as_ref().to_string(),
                    expected: table.records.len(),
                    actual,
                });
            }
        }

        let terminator = match options.line_terminator {
            LineTerminator::LF => csv::Terminator::Any(b'\n'),
            LineTerminator::CRLF => csv::Terminator::CRLF,
        };

        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .terminator(terminator)
            .from_writer(writer);

        let mut header: Vec<&str> = table.headers.iter().map(String::as_str).collect();
        header.extend(columns.iter().map(|(name, _)| name.as_ref()));
        csv_writer.write_record(&header)?;

        for (idx, cells) in table.records.iter().enumerate() {
            let mut record = cells.clone();
            for (_, values) in columns {
                record.push(format_number(values.as_ref()[idx], &options.non_finite));
            }
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

/// Format a metric value for a CSV cell
pub fn format_number(value: f64, non_finite: &str) -> String {
    if !value.is_finite() {
        return non_finite.to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
