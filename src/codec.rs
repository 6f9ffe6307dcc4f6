//! Conversion between delimited text and column data, backed by polars.
//!
//! Every column is read as text (schema inference disabled) so cells reach the
//! store exactly as they appear in the file. Missing cells become empty strings
//! and blank lines are not records.

use std::io::Cursor;

use polars::prelude::*;
use rayon::prelude::*;
use tracing::trace;

use crate::domain::ViewerError;
use crate::store::Dataset;

pub struct CsvCodec {
    delimiter: u8,
}

impl CsvCodec {
    pub fn new(delimiter: u8) -> Self {
        CsvCodec { delimiter }
    }

    /// Parses `text` into `(header, cells)` pairs. The first line is the header.
    pub fn parse(&self, text: &str) -> Result<Vec<(String, Vec<String>)>, ViewerError> {
        let text = drop_blank_lines(text);
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let separator = self.delimiter;
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .map_parse_options(move |opts| opts.with_separator(separator))
            .into_reader_with_file_handle(Cursor::new(text.as_bytes().to_vec()))
            .finish()
            .map_err(|e| ViewerError::ParseFailure(e.to_string()))?;
        trace!("Parsed frame of shape {:?}", df.shape());

        let columns: Result<Vec<_>, PolarsError> =
            df.get_columns().par_iter().map(Self::column_cells).collect();
        Ok(columns?)
    }

    fn column_cells(column: &Column) -> Result<(String, Vec<String>), PolarsError> {
        let col = column.cast(&DataType::String)?;
        let series = col.str()?;
        let data = series
            .into_iter()
            .map(|value| value.unwrap_or_default().to_string())
            .collect();
        Ok((column.name().to_string(), data))
    }

    /// Writes the header and the given dataset rows, in the order given.
    pub fn serialize(&self, dataset: &Dataset, rows: &[usize]) -> Result<String, ViewerError> {
        if dataset.ncolumns() == 0 {
            return Ok(String::new());
        }
        let columns: Vec<Column> = dataset
            .columns()
            .iter()
            .map(|c| {
                let cells: Vec<&str> = rows.iter().map(|&r| c.data[r].as_str()).collect();
                Column::new(c.name.as_str().into(), cells)
            })
            .collect();
        let mut df = DataFrame::new(columns)?;

        let mut buf = Vec::new();
        CsvWriter::new(&mut buf)
            .include_header(true)
            .with_separator(self.delimiter)
            .finish(&mut df)?;
        String::from_utf8(buf).map_err(|e| ViewerError::IoError(std::io::Error::other(e)))
    }
}

/// Removes lines that are empty (or only `\r`) outside a quoted field.
fn drop_blank_lines(text: &str) -> String {
    let mut kept = String::with_capacity(text.len());
    let mut in_quotes = false;
    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        if !in_quotes && content.is_empty() {
            continue;
        }
        kept.push_str(line);
        if content.bytes().filter(|&b| b == b'"').count() % 2 == 1 {
            in_quotes = !in_quotes;
        }
    }
    kept
}
