use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use stimatrix_recon::normalize::clean_header;
use stimatrix_recon::{LoadError, Matrix, MatrixConfig, MatrixLoader, Record};
use tracing::{info, warn};

use crate::error::IoError;
use crate::sheet::read_sheet;

/// Loads matrices from workbooks under `<base_dir>/<excel_dir>`.
#[derive(Debug, Clone)]
pub struct XlsxLoader {
    base_dir: PathBuf,
}

impl XlsxLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    /// Resolve workbook paths relative to the directory holding the config file.
    pub fn for_config(config_path: &Path) -> Self {
        Self::new(config_path.parent().unwrap_or(Path::new(".")))
    }

    pub fn workbook_path(&self, config: &MatrixConfig, file: &str) -> PathBuf {
        self.base_dir.join(&config.excel_dir).join(file)
    }
}

impl MatrixLoader for XlsxLoader {
    fn load(&self, config: &MatrixConfig, matrix_name: &str) -> Result<Matrix, LoadError> {
        let entry = config
            .matrix(matrix_name)
            .ok_or_else(|| LoadError::NotFound(format!("matrix '{matrix_name}' is not declared")))?;

        let path = self.workbook_path(config, &entry.file);
        info!(
            matrix = %matrix_name,
            file = %path.display(),
            sheet = entry.sheet.as_deref().unwrap_or("<first>"),
            header_row = entry.header_row,
            "reading matrix"
        );

        let data = read_sheet(&path, entry.sheet.as_deref(), entry.header_row).map_err(to_load_error)?;
        let headers = canonical_headers(matrix_name, &data.headers, &entry.column_mapping);
        let records = data.rows.into_iter().map(Record::new).collect();

        Ok(Matrix::new(matrix_name, entry.source(), headers, records))
    }
}

fn to_load_error(e: IoError) -> LoadError {
    if e.is_not_found() {
        LoadError::NotFound(e.to_string())
    } else {
        LoadError::Other(e.to_string())
    }
}

/// Clean raw headers, then apply the configured remapping. Mapping keys are
/// matched after the same cleanup.
pub fn canonical_headers(
    matrix_name: &str,
    raw: &[String],
    mapping: &BTreeMap<String, String>,
) -> Vec<String> {
    let mapping: BTreeMap<String, &String> =
        mapping.iter().map(|(k, v)| (clean_header(k), v)).collect();

    let headers: Vec<String> = raw
        .iter()
        .map(|h| {
            let cleaned = clean_header(h);
            match mapping.get(&cleaned) {
                Some(target) => {
                    info!(matrix = %matrix_name, from = %cleaned, to = %target, "column remapped");
                    (*target).clone()
                }
                None => cleaned,
            }
        })
        .collect();

    let mut seen = std::collections::HashSet::new();
    for h in headers.iter().filter(|h| !h.is_empty()) {
        if !seen.insert(h.as_str()) {
            warn!(matrix = %matrix_name, column = %h, "duplicate column, first occurrence is used");
        }
    }
    headers
}
