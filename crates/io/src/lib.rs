// Spreadsheet I/O for the reconciliation engine

pub mod error;
pub mod loader;
pub mod ppd;
pub mod sheet;
pub mod xlsx;

pub use error::IoError;
pub use loader::XlsxLoader;
pub use xlsx::export_table;
