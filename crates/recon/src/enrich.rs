use std::collections::HashMap;
use std::path::Path;

use tracing::{info, warn};

use crate::config::ReferenceTableConfig;
use crate::consolidate::ConsolidatedRow;
use crate::error::ReconError;

/// Title and revision of one referenced document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEntry {
    pub title: String,
    pub revision: String,
}

/// Read-only lookup keyed by `<numeric id>_<alternate id>`.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    entries: HashMap<String, ReferenceEntry>,
}

impl ReferenceTable {
    pub fn from_delimited(data: &str, config: &ReferenceTableConfig) -> Result<Self, ReconError> {
        let data = data.strip_prefix('\u{feff}').unwrap_or(data);
        let delimiter = u8::try_from(config.delimiter).map_err(|_| {
            ReconError::ReferenceTable(format!("delimiter {:?} is not a single byte", config.delimiter))
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(data.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ReconError::ReferenceTable(e.to_string()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let idx = |name: &str| -> Result<usize, ReconError> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| ReconError::ReferenceTable(format!("missing column '{name}'")))
        };
        let id_idx = idx(&config.id_column)?;
        let alt_idx = idx(&config.alternate_id_column)?;
        let title_idx = idx(&config.title_column)?;
        let rev_idx = idx(&config.revision_column)?;

        let mut entries = HashMap::new();
        for record in reader.records() {
            let record = record.map_err(|e| ReconError::ReferenceTable(e.to_string()))?;
            let field = |i: usize| record.get(i).unwrap_or("").trim().to_string();
            entries.insert(
                format!("{}_{}", field(id_idx), field(alt_idx)),
                ReferenceEntry {
                    title: field(title_idx),
                    revision: field(rev_idx),
                },
            );
        }

        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&ReferenceEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `"<id> - <title> (Rev <revision>)"` when known, the raw id otherwise.
    pub fn display(&self, id: &str) -> String {
        match self.get(id) {
            Some(e) => format!("{id} - {} (Rev {})", e.title, e.revision),
            None => id.to_string(),
        }
    }
}

/// Annotate every contributing identifier with its title and revision.
pub fn enrich(mut rows: Vec<ConsolidatedRow>, table: &ReferenceTable) -> Vec<ConsolidatedRow> {
    for row in &mut rows {
        row.enriched = Some(row.references.iter().map(|r| table.display(r)).collect());
    }
    rows
}

/// Load the reference table at `path` and enrich `rows` with it.
///
/// A missing or unreadable table is not an error: it is logged and the rows
/// are returned as they came in.
pub fn enrich_from_path(
    rows: Vec<ConsolidatedRow>,
    path: &Path,
    config: &ReferenceTableConfig,
) -> Vec<ConsolidatedRow> {
    if !path.exists() {
        warn!(path = %path.display(), "reference table not found, skipping enrichment");
        return rows;
    }

    let table = match read_text(path).and_then(|text| ReferenceTable::from_delimited(&text, config)) {
        Ok(t) => t,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot load reference table, skipping enrichment");
            return rows;
        }
    };

    info!(path = %path.display(), entries = table.len(), "enriching references");
    enrich(rows, &table)
}

/// Read a text file as UTF-8, falling back to Windows-1252 for files saved
/// by Excel with a legacy code page.
pub fn read_text(path: &Path) -> Result<String, ReconError> {
    let bytes = std::fs::read(path)
        .map_err(|e| ReconError::Io(format!("cannot read {}: {e}", path.display())))?;
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}
