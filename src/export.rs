use std::path::Path;

use tracing::{info, instrument};

use crate::codec::CsvCodec;
use crate::domain::ViewerError;
use crate::store::Dataset;

/// Delimited text for every row of a view, plus the name to save it under.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportBlob {
    pub file_name: String,
    pub text: String,
}

/// Serializes `rows` (in the order given) with the dataset's header order and
/// delimiter. Pagination plays no part: callers pass the whole view.
#[instrument(skip(dataset, rows), fields(name = dataset.name(), rows = rows.len()))]
pub fn export(dataset: &Dataset, rows: &[usize]) -> Result<ExportBlob, ViewerError> {
    let text = CsvCodec::new(dataset.delimiter()).serialize(dataset, rows)?;
    let file_name = export_file_name(dataset.name());
    info!("Exported {} rows ({} bytes) as {}", rows.len(), text.len(), file_name);
    Ok(ExportBlob { file_name, text })
}

/// `<stem>_filtered.<ext>`; names without an extension get `.csv`.
pub fn export_file_name(original: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("export");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("csv");
    format!("{stem}_filtered.{ext}")
}
