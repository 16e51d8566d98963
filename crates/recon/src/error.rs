use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// YAML / TOML parse or deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (missing field list, bad source labels, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// A matrix name does not start with one of the configured source labels.
    #[error("matrix '{matrix}': no source prefix among {sources:?}")]
    UnknownSource { matrix: String, sources: Vec<String> },
    /// A pair could not be compared because one side failed to load.
    #[error("matrix '{matrix}': {source}")]
    Load {
        matrix: String,
        #[source]
        source: LoadError,
    },
    /// A pair ended up with fewer than two usable matrices.
    #[error("pair '{pair}': comparison needs two matrices, {usable} usable")]
    IncompletePair { pair: String, usable: usize },
    /// Reference table could not be parsed.
    #[error("reference table: {0}")]
    ReferenceTable(String),
    #[error("IO error: {0}")]
    Io(String),
}

/// Failure reported by a [`crate::engine::MatrixLoader`].
#[derive(Debug, Error)]
pub enum LoadError {
    /// Backing file or sheet is absent.
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Other(String),
}

impl LoadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
