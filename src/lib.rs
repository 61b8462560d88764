pub mod api;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod labels;
pub mod record;
pub mod table;

pub use error::ApiError;
pub use record::{Record, Searchable};
pub use table::{RowRenderer, SearchableTable, Selection, TableOptions, TableView};
