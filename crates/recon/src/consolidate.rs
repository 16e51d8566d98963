use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::documents::{DivergenceGroup, DocumentStatus};
use crate::model::Table;

/// One identifier exhibiting one divergence pattern in one pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DivergenceEntry {
    pub tag: String,
    pub field: String,
    pub status: DocumentStatus,
    pub difference: String,
    pub reference: String,
}

/// A divergence pattern across the whole run with its contributing
/// identifiers, deduplicated and sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsolidatedRow {
    pub tag: String,
    pub field: String,
    pub status: DocumentStatus,
    pub difference: String,
    pub references: Vec<String>,
    /// Display form of `references` after enrichment, same order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enriched: Option<Vec<String>>,
}

impl ConsolidatedRow {
    pub fn nb_references(&self) -> usize {
        self.references.len()
    }
}

/// Expand grouped per-pair results into one entry per contributing identifier.
pub fn explode(per_pair: &[(String, Vec<DivergenceGroup>)]) -> Vec<DivergenceEntry> {
    per_pair
        .iter()
        .flat_map(|(tag, groups)| {
            groups.iter().flat_map(move |g| {
                g.references.iter().map(move |r| DivergenceEntry {
                    tag: tag.clone(),
                    field: g.field.clone(),
                    status: g.status.clone(),
                    difference: g.difference.clone(),
                    reference: r.clone(),
                })
            })
        })
        .collect()
}

/// Group entries by (tag, field, status, difference) and rank the patterns by
/// number of distinct identifiers, most widespread first.
pub fn consolidate(entries: &[DivergenceEntry]) -> Vec<ConsolidatedRow> {
    let mut groups: BTreeMap<(&str, &str, &DocumentStatus, &str), BTreeSet<&str>> = BTreeMap::new();
    for e in entries {
        groups
            .entry((e.tag.as_str(), e.field.as_str(), &e.status, e.difference.as_str()))
            .or_default()
            .insert(e.reference.as_str());
    }

    let mut rows: Vec<ConsolidatedRow> = groups
        .into_iter()
        .map(|((tag, field, status, difference), refs)| ConsolidatedRow {
            tag: tag.to_string(),
            field: field.to_string(),
            status: status.clone(),
            difference: difference.to_string(),
            references: refs.into_iter().map(String::from).collect(),
            enriched: None,
        })
        .collect();
    rows.sort_by(|a, b| b.nb_references().cmp(&a.nb_references()));
    rows
}

pub fn consolidated_table(rows: &[ConsolidatedRow], id_column: &str) -> Table {
    let with_enriched = rows.iter().any(|r| r.enriched.is_some());

    let mut headers: Vec<String> = vec![
        "STI".into(),
        "Champ".into(),
        "État".into(),
        "Différence".into(),
        id_column.into(),
        "nb_references".into(),
    ];
    if with_enriched {
        headers.push(format!("{id_column} enrichie"));
    }

    let mut table = Table::new(headers);
    for r in rows {
        let mut cells = vec![
            r.tag.clone(),
            r.field.clone(),
            r.status.to_string(),
            r.difference.clone(),
            r.references.join(", "),
            r.nb_references().to_string(),
        ];
        if with_enriched {
            cells.push(r.enriched.as_ref().map(|e| e.join("\n")).unwrap_or_default());
        }
        table.push(cells);
    }
    table
}
