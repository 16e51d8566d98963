//! Document reference extraction and per-field document divergence.
//!
//! Free-text fields carry document identifiers (`DID0123456789`,
//! `CMD123456`, `PM000123`, `SETC4567890`). When such a field diverges
//! between two sources, the token sets of both sides are compared instead of
//! the raw text.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::divergence::FieldDivergenceTable;
use crate::error::ReconError;
use crate::model::{RecordKey, Table};

const DOCUMENT_PATTERN: &str = r"(?:DID[0-9]{10}|CMD[0-9]{6,}|PM[0-9]{6,}|SETC[0-9]{6,})";

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DocumentExtractor {
    pattern: Regex,
    case_sensitive: bool,
}

impl DocumentExtractor {
    pub fn new(case_sensitive: bool) -> Result<Self, ReconError> {
        let pattern = RegexBuilder::new(DOCUMENT_PATTERN)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|e| ReconError::ConfigValidation(format!("document pattern: {e}")))?;
        Ok(Self { pattern, case_sensitive })
    }

    /// Lazy scan over the tokens of `text`, in order of appearance, with
    /// duplicates. Calling again restarts the scan.
    pub fn tokens<'t>(&'t self, text: &'t str) -> impl Iterator<Item = &'t str> + 't {
        self.pattern.find_iter(text).map(|m| m.as_str())
    }

    /// Distinct tokens of a field value, sorted. Null yields the empty set.
    ///
    /// In case-insensitive mode tokens are upper-cased so `did…` and `DID…`
    /// collapse to one token.
    pub fn extract(&self, value: Option<&str>) -> BTreeSet<String> {
        let Some(text) = value else {
            return BTreeSet::new();
        };
        self.tokens(text)
            .map(|t| {
                if self.case_sensitive {
                    t.to_string()
                } else {
                    t.to_uppercase()
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Token sets of both sides for one (identifier, field). At least one side is
/// non-empty: construction returns `None` otherwise, so there is nothing to
/// classify when neither side cites a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSets {
    left: BTreeSet<String>,
    right: BTreeSet<String>,
}

impl DocumentSets {
    pub fn new(left: BTreeSet<String>, right: BTreeSet<String>) -> Option<Self> {
        if left.is_empty() && right.is_empty() {
            None
        } else {
            Some(Self { left, right })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Identical,
    Different,
    /// Holds the label of the source with no tokens.
    AbsentIn(String),
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identical => write!(f, "Identical"),
            Self::Different => write!(f, "Different"),
            Self::AbsentIn(source) => write!(f, "Absent in {source}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: DocumentStatus,
    /// One `<label>: <tokens>` line per side with exclusive tokens.
    pub difference: String,
}

/// Classify two token sets. Absence on one side wins over `Different`.
pub fn classify(sets: &DocumentSets, left_label: &str, right_label: &str) -> Classification {
    let only_left: Vec<&str> = sets.left.difference(&sets.right).map(String::as_str).collect();
    let only_right: Vec<&str> = sets.right.difference(&sets.left).map(String::as_str).collect();

    let mut lines = Vec::new();
    if !only_left.is_empty() {
        lines.push(format!("{left_label}: {}", only_left.join(", ")));
    }
    if !only_right.is_empty() {
        lines.push(format!("{right_label}: {}", only_right.join(", ")));
    }

    let status = if sets.left.is_empty() {
        DocumentStatus::AbsentIn(left_label.to_string())
    } else if sets.right.is_empty() {
        DocumentStatus::AbsentIn(right_label.to_string())
    } else if lines.is_empty() {
        DocumentStatus::Identical
    } else {
        DocumentStatus::Different
    };

    Classification {
        status,
        difference: lines.join("\n"),
    }
}

// ---------------------------------------------------------------------------
// Per-pair pass
// ---------------------------------------------------------------------------

/// A non-identical document divergence for one (identifier, field).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentDivergence {
    pub key: RecordKey,
    pub field: String,
    pub status: DocumentStatus,
    pub difference: String,
    #[serde(skip)]
    pub left_tokens: BTreeSet<String>,
    #[serde(skip)]
    pub right_tokens: BTreeSet<String>,
}

/// Divergences sharing (field, status, difference) within one pair, with the
/// identifiers that exhibit them. `references` is multi-valued on purpose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DivergenceGroup {
    pub field: String,
    pub status: DocumentStatus,
    pub difference: String,
    pub references: Vec<String>,
}

impl DivergenceGroup {
    pub fn nb_references(&self) -> usize {
        self.references.len()
    }
}

/// Run extraction and classification over the document fields of a pair's
/// field divergences. Identical token sets are dropped.
pub fn analyse(
    table: &FieldDivergenceTable,
    document_fields: &[String],
    extractor: &DocumentExtractor,
) -> Vec<DocumentDivergence> {
    table
        .entries()
        .filter(|(_, d)| document_fields.contains(&d.field))
        .filter_map(|(key, d)| {
            let sets = DocumentSets::new(
                extractor.extract(Some(d.left.as_str())),
                extractor.extract(Some(d.right.as_str())),
            )?;
            let c = classify(&sets, &table.left_label, &table.right_label);
            if c.status == DocumentStatus::Identical {
                return None;
            }
            Some(DocumentDivergence {
                key: key.clone(),
                field: d.field.clone(),
                status: c.status,
                difference: c.difference,
                left_tokens: sets.left,
                right_tokens: sets.right,
            })
        })
        .collect()
}

/// Group a pair's document divergences by (field, status, difference),
/// most widely shared pattern first.
pub fn group(divergences: &[DocumentDivergence]) -> Vec<DivergenceGroup> {
    let mut groups: BTreeMap<(&str, &DocumentStatus, &str), Vec<String>> = BTreeMap::new();
    for d in divergences {
        groups
            .entry((d.field.as_str(), &d.status, d.difference.as_str()))
            .or_default()
            .push(d.key.id().to_string());
    }

    let mut out: Vec<DivergenceGroup> = groups
        .into_iter()
        .map(|((field, status, difference), references)| DivergenceGroup {
            field: field.to_string(),
            status: status.clone(),
            difference: difference.to_string(),
            references,
        })
        .collect();
    out.sort_by(|a, b| b.nb_references().cmp(&a.nb_references()));
    out
}

pub fn groups_table(groups: &[DivergenceGroup], id_column: &str) -> Table {
    let mut table = Table::new(vec![
        "Champ".into(),
        "État".into(),
        "Différence".into(),
        id_column.into(),
        "nb_references".into(),
    ]);
    for g in groups {
        table.push(vec![
            g.field.clone(),
            g.status.to_string(),
            g.difference.clone(),
            g.references.join(", "),
            g.nb_references().to_string(),
        ]);
    }
    table
}
