use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("cannot open {path}: {message}")]
    Open { path: String, message: String },

    #[error("sheet '{sheet}' not found in {path}")]
    SheetNotFound { path: String, sheet: String },

    #[error("{path}: header row {row} is past the end of the sheet ({rows} rows)")]
    HeaderRow { path: String, row: usize, rows: usize },

    #[error("missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("cannot write {path}: {message}")]
    Write { path: String, message: String },
}

impl IoError {
    /// File or sheet absent, as opposed to present but unreadable.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::SheetNotFound { .. })
    }
}
