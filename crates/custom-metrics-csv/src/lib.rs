//! # custom-metrics-csv
//!
//! CSV adapter for custom metrics: reads report exports into rows of field
//! values and writes them back out with derived metric columns appended.

mod error;
mod options;
mod reader;
mod writer;

pub use error::{CsvError, CsvResult};
pub use options::{CsvReadOptions, CsvWriteOptions, LineTerminator};
pub use reader::{parse_number, sanitize_header, RowReader, RowTable};
pub use writer::{format_number, RowWriter};
