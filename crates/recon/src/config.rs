use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MatrixConfig {
    pub id_column: String,
    #[serde(default)]
    pub secondary_keys: Vec<String>,
    pub fields_to_compare: Vec<String>,
    pub sources: Vec<String>,
    #[serde(default = "default_document_fields")]
    pub document_fields: Vec<String>,
    #[serde(default)]
    pub documents: DocumentConfig,
    #[serde(default = "default_requirement_flag")]
    pub requirement_flag_column: Option<String>,
    #[serde(default = "default_excel_dir")]
    pub excel_dir: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub reference_table: ReferenceTableConfig,
    pub matrices: Vec<MatrixEntry>,
}

fn default_document_fields() -> Vec<String> {
    vec!["CAF_Comments".into(), "MOP_design".into(), "MOP_test".into()]
}

fn default_requirement_flag() -> Option<String> {
    Some("isRequirement".into())
}

fn default_excel_dir() -> String {
    "excel_files".into()
}

fn default_output_dir() -> String {
    "output".into()
}

// ---------------------------------------------------------------------------
// Matrices
// ---------------------------------------------------------------------------

/// One matrix sheet: `<source>_<family>` plus where to find it.
#[derive(Debug, Clone, Deserialize)]
pub struct MatrixEntry {
    pub name: String,
    pub file: String,
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default)]
    pub header_row: usize,
    #[serde(default)]
    pub column_mapping: BTreeMap<String, String>,
}

impl MatrixEntry {
    /// Source label prefix (`GE` in `GE_LocPas`).
    pub fn source(&self) -> &str {
        self.name.split_once('_').map(|(s, _)| s).unwrap_or(&self.name)
    }

    /// Family label shared by the same matrix across sources (`LocPas`).
    pub fn family(&self) -> Option<&str> {
        self.name.split_once('_').map(|(_, f)| f).filter(|f| !f.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Documents + reference table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentConfig {
    #[serde(default = "default_true")]
    pub case_sensitive: bool,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self { case_sensitive: true }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReferenceTableConfig {
    pub path: String,
    pub delimiter: char,
    pub id_column: String,
    pub alternate_id_column: String,
    pub title_column: String,
    pub revision_column: String,
}

impl Default for ReferenceTableConfig {
    fn default() -> Self {
        Self {
            path: "PPD_export_DOORS.csv".into(),
            delimiter: '\t',
            id_column: "N°".into(),
            alternate_id_column: "Référence ALSTOM".into(),
            title_column: "Titre".into(),
            revision_column: "Révision".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl MatrixConfig {
    pub fn from_yaml(input: &str) -> Result<Self, ReconError> {
        let config: MatrixConfig =
            serde_yaml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: MatrixConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file. `.toml` files go through TOML, anything
    /// else is treated as YAML.
    pub fn load(path: &Path) -> Result<Self, ReconError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| ReconError::Io(format!("cannot read {}: {e}", path.display())))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&input),
            _ => Self::from_yaml(&input),
        }
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.id_column.trim().is_empty() {
            return Err(ReconError::ConfigValidation("id_column must not be empty".into()));
        }

        if self.fields_to_compare.is_empty() {
            return Err(ReconError::ConfigValidation(
                "fields_to_compare must list at least one field".into(),
            ));
        }

        if self.sources.len() != 2 {
            return Err(ReconError::ConfigValidation(format!(
                "exactly 2 sources are required, got {}",
                self.sources.len()
            )));
        }
        if self.sources[0] == self.sources[1] {
            return Err(ReconError::ConfigValidation(format!(
                "sources must be distinct, got '{}' twice",
                self.sources[0]
            )));
        }

        if self.matrices.is_empty() {
            return Err(ReconError::ConfigValidation("no matrices declared".into()));
        }

        let mut seen = HashSet::new();
        for m in &self.matrices {
            if !seen.insert(m.name.as_str()) {
                return Err(ReconError::ConfigValidation(format!(
                    "duplicate matrix name '{}'",
                    m.name
                )));
            }
            if !self.sources.iter().any(|s| s == m.source()) {
                return Err(ReconError::UnknownSource {
                    matrix: m.name.clone(),
                    sources: self.sources.clone(),
                });
            }
            if m.family().is_none() {
                return Err(ReconError::ConfigValidation(format!(
                    "matrix '{}': name must be <source>_<family>",
                    m.name
                )));
            }
        }

        Ok(())
    }

    /// Tuple key columns: identifier first, then secondary discriminators.
    pub fn key_columns(&self) -> Vec<String> {
        std::iter::once(self.id_column.clone())
            .chain(self.secondary_keys.iter().cloned())
            .collect()
    }

    pub fn matrix(&self, name: &str) -> Option<&MatrixEntry> {
        self.matrices.iter().find(|m| m.name == name)
    }

    /// Every 2-combination of matrices sharing a family, names sorted.
    pub fn matrix_pairs(&self) -> Vec<MatrixPair> {
        let mut families: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for m in &self.matrices {
            if let Some(family) = m.family() {
                families.entry(family).or_default().push(m.name.as_str());
            }
        }

        let mut pairs = Vec::new();
        for (family, mut names) in families {
            names.sort_unstable();
            for (i, left) in names.iter().enumerate() {
                for right in &names[i + 1..] {
                    pairs.push(MatrixPair {
                        family: family.to_string(),
                        left: left.to_string(),
                        right: right.to_string(),
                    });
                }
            }
        }
        pairs
    }
}

/// Two matrices of the same family to compare. `family` is the pair tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixPair {
    pub family: String,
    pub left: String,
    pub right: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
