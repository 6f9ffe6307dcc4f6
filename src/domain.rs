use std::fmt;
use std::io::Error;

use derive_setters::Setters;
use polars::error::PolarsError;

use crate::source::FileSource;

pub const HELP_TEXT: &str = "\
Commands:
  search <query>   Keep rows where any cell contains <query> (case-insensitive)
  clear            Clear the search
  sort <column>    Sort by column name or 1-based number, repeat to flip
  next | prev      Move to the next / previous page
  page <n>         Jump to page <n>
  size <n>         Set the number of rows per page
  stats <column>   Show statistics for a column of the filtered rows
  export [path]    Write the filtered rows as delimited text
  show             Print the current page
  help             Show this help
  quit             Leave the viewer";

#[derive(Debug)]
pub enum ViewerError {
    IoError(Error),
    PolarsError(PolarsError),
    ParseFailure(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
    InvalidPageSize,
    InvalidCommand(String),
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerError::IoError(e) => write!(f, "io error: {e}"),
            ViewerError::PolarsError(e) => write!(f, "polars error: {e}"),
            ViewerError::ParseFailure(msg) => write!(f, "error parsing file: {msg}"),
            ViewerError::FileNotFound => write!(f, "file not found"),
            ViewerError::PermissionDenied => write!(f, "permission denied"),
            ViewerError::UnknownFileType => write!(f, "unknown file type"),
            ViewerError::InvalidPageSize => write!(f, "page size must be at least 1"),
            ViewerError::InvalidCommand(cmd) => write!(f, "invalid command: {cmd}"),
        }
    }
}

impl std::error::Error for ViewerError {}

impl From<Error> for ViewerError {
    fn from(err: Error) -> Self {
        ViewerError::IoError(err)
    }
}

impl From<PolarsError> for ViewerError {
    fn from(err: PolarsError) -> Self {
        ViewerError::PolarsError(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn indicator(self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

/// Active sort: the column position in header order and its direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: usize,
    pub direction: SortDirection,
}

/// Every user action the session understands. Each one is a discrete call into
/// the model; the host decides when to repaint.
#[derive(Debug)]
pub enum Message {
    Load(FileSource),
    Search(String),
    ClearSearch,
    Sort(usize),
    NextPage,
    PreviousPage,
    GoToPage(usize),
    SetPageSize(usize),
    Quit,
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct ViewerConfig {
    pub page_size: usize,
    pub top_values: usize,
    #[setters(strip_option)]
    pub delimiter: Option<u8>,
    pub max_column_width: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            page_size: 100,
            top_values: 10,
            delimiter: None,
            max_column_width: 40,
        }
    }
}
