//! sitedata-core: data loading and page post-processing for static-site builds
//!
//! This library provides functionality to:
//! - Load CSV files into typed tables (multi-row headers, per-column type
//!   inference, row and column views, numeric ranges)
//! - Discover data files and pages under site directories
//! - Inject script and stylesheet tags for dependencies declared in pages

pub mod dependency;
pub mod error;
pub mod infer;
pub mod loader;
pub mod parser;
pub mod scanner;
pub mod table;

pub use dependency::{inject_dependencies, inject_file, Element, HtmlPage, PageDocument, PageElement};
pub use error::{Error, Result};
pub use infer::{is_numeric, Numeric};
pub use loader::{
    load_csv, load_dir, load_str, load_table, DuplicatePolicy, LoadOptions, Shape, HEADER_SEPARATOR,
    NAME_JOINER,
};
pub use scanner::scan_directory;
pub use table::{Cell, ColumnType, LoadedTable, NumericRange, RowMap, Table, TableSummary};
