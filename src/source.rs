use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, trace};

use crate::domain::ViewerError;

/// Delimited text flavours recognised from a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    CSV,
    TSV,
    PSV,
}

impl FileType {
    pub fn delimiter(self) -> u8 {
        match self {
            FileType::CSV => b',',
            FileType::TSV => b'\t',
            FileType::PSV => b'|',
        }
    }
}

/// A file handed over by whatever acquired it: display name plus its text.
#[derive(Debug, Clone)]
pub struct FileSource {
    pub name: String,
    pub text: String,
    pub delimiter: u8,
}

impl FileSource {
    /// Source with the delimiter guessed from `name`.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let name = name.into();
        let delimiter = detect_file_type(Path::new(&name)).delimiter();
        FileSource {
            name,
            text: text.into(),
            delimiter,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn from_path(path: &Path) -> Result<Self, ViewerError> {
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ViewerError::FileNotFound,
            ErrorKind::PermissionDenied => ViewerError::PermissionDenied,
            _ => ViewerError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(ViewerError::UnknownFileType);
        }
        debug!("Reading {} ({} bytes)", path.display(), metadata.len());

        let bytes = fs::read(path)?;
        let text = String::from_utf8(bytes)
            .map_err(|e| ViewerError::ParseFailure(format!("file is not valid UTF-8: {e}")))?;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string();

        Ok(FileSource::new(name, text))
    }
}

pub fn detect_file_type(path: &Path) -> FileType {
    let file_type = match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("TSV") | Some("TAB") => FileType::TSV,
        Some("PSV") => FileType::PSV,
        _ => FileType::CSV,
    };
    trace!("Detected {:?} for {}", file_type, path.display());
    file_type
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_delimiter_from_extension() {
        assert_eq!(detect_file_type(Path::new("data.csv")), FileType::CSV);
        assert_eq!(detect_file_type(Path::new("data.TSV")), FileType::TSV);
        assert_eq!(detect_file_type(Path::new("data.tab")), FileType::TSV);
        assert_eq!(detect_file_type(Path::new("data.psv")), FileType::PSV);
        assert_eq!(detect_file_type(Path::new("README")), FileType::CSV);
    }

    #[test]
    fn source_picks_delimiter_from_name() {
        assert_eq!(FileSource::new("a.tsv", "x").delimiter, b'\t');
        assert_eq!(FileSource::new("a.csv", "x").with_delimiter(b';').delimiter, b';');
    }

    #[test]
    fn missing_file_is_reported() {
        let err = FileSource::from_path(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, ViewerError::FileNotFound));
    }
}
