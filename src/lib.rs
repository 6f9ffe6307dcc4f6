//! In-memory engine behind a tabular file viewer.
//!
//! A [`model::Model`] owns the loaded [`store::Dataset`] and the view state.
//! Every change re-derives the visible rows from the full dataset (filter, then
//! sort), and the paginator, statistics engine and exporter all read that view.

pub mod codec;
pub mod controller;
pub mod domain;
pub mod export;
pub mod model;
pub mod numeric;
pub mod paginator;
pub mod pipeline;
pub mod source;
pub mod stats;
pub mod store;
pub mod ui;

pub use domain::{Message, SortDirection, SortSpec, ViewerConfig, ViewerError};
pub use model::{Model, Status, UIData, ViewState};
pub use source::FileSource;
