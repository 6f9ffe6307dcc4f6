use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::codec::CsvCodec;
use crate::domain::ViewerError;
use crate::source::FileSource;

/// One column of a loaded file. Cells are kept as the source text, never typed.
pub struct Column {
    pub idx: usize,
    pub name: String,
    pub data: Vec<String>,
    folded: Vec<String>, // Lower-cased cells, used by the search filter
}

impl Column {
    pub fn new(idx: usize, name: impl Into<String>, data: Vec<String>) -> Self {
        let folded = data.iter().map(|s| s.to_lowercase()).collect();
        Column {
            idx,
            name: name.into(),
            data,
            folded,
        }
    }

    pub(crate) fn folded(&self, row: usize) -> &str {
        &self.folded[row]
    }

    pub fn as_string(&self) -> String {
        format!("{} \"{}\", # rows {}", self.idx, self.name, self.data.len())
    }
}

/// The rows of one successful load, stored column-major.
pub struct Dataset {
    name: String,
    delimiter: u8,
    columns: Vec<Column>,
    nrows: usize,
}

impl Dataset {
    pub fn empty() -> Self {
        Dataset {
            name: String::new(),
            delimiter: b',',
            columns: Vec::new(),
            nrows: 0,
        }
    }

    /// Builds a dataset from `(header, cells)` pairs in header order.
    /// Short columns are padded with empty cells so every record shares the
    /// same keys. A dataset without records has no columns either.
    pub fn from_columns(
        name: impl Into<String>,
        delimiter: u8,
        columns: Vec<(String, Vec<String>)>,
    ) -> Self {
        let nrows = columns.iter().map(|(_, c)| c.len()).max().unwrap_or(0);
        let columns = if nrows == 0 {
            Vec::new()
        } else {
            columns
                .into_par_iter()
                .enumerate()
                .map(|(idx, (header, mut data))| {
                    data.resize(nrows, String::new());
                    Column::new(idx, header, data)
                })
                .collect()
        };
        Dataset {
            name: name.into(),
            delimiter,
            columns,
            nrows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncolumns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nrows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.columns
            .get(column)
            .and_then(|c| c.data.get(row))
            .map(String::as_str)
    }

    pub fn record(&self, row: usize) -> Option<Record<'_>> {
        (row < self.nrows).then_some(Record { dataset: self, row })
    }

    /// Records in dataset order.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        (0..self.nrows).map(move |row| Record { dataset: self, row })
    }
}

/// Borrowed view of one row: column name to raw cell text, in header order.
#[derive(Clone, Copy)]
pub struct Record<'a> {
    dataset: &'a Dataset,
    row: usize,
}

impl<'a> Record<'a> {
    /// Position of this record in the dataset.
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.dataset
            .column_by_name(column)
            .map(|c| c.data[self.row].as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &'a str> + 'a {
        let row = self.row;
        self.dataset.columns.iter().map(move |c| c.data[row].as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let row = self.row;
        self.dataset
            .columns
            .iter()
            .map(move |c| (c.name.as_str(), c.data[row].as_str()))
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.values().map(str::to_string).collect()
    }
}

/// Owns the current dataset. A load either replaces it whole or leaves it as is.
pub struct RecordStore {
    dataset: Arc<Dataset>,
    generation: u64,
}

impl Default for RecordStore {
    fn default() -> Self {
        RecordStore {
            dataset: Arc::new(Dataset::empty()),
            generation: 0,
        }
    }
}

impl RecordStore {
    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    /// Number of successful loads so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[instrument(skip_all, fields(name = %source.name, bytes = source.text.len()))]
    pub fn load(&mut self, source: &FileSource) -> Result<Arc<Dataset>, ViewerError> {
        let start_time = Instant::now();
        let codec = CsvCodec::new(source.delimiter);
        let columns = codec.parse(&source.text)?;
        let dataset = Dataset::from_columns(source.name.clone(), source.delimiter, columns);

        info!(
            "Loading {} rows x {} columns took {}ms ...",
            dataset.nrows(),
            dataset.ncolumns(),
            start_time.elapsed().as_millis()
        );
        for c in dataset.columns() {
            debug!("Column: {}", c.as_string());
        }

        self.dataset = Arc::new(dataset);
        self.generation += 1;
        Ok(Arc::clone(&self.dataset))
    }
}
