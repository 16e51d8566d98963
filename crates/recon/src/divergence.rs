use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::keyset::CommonRows;
use crate::model::{Matrix, Record, RecordKey, Table};
use crate::normalize::comparable;

/// One field where two paired records disagree. Values are the raw text of
/// each side (null rendered as empty).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDiff {
    pub field: String,
    pub left: String,
    pub right: String,
}

/// All differing fields of one identifier. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDivergence {
    pub key: RecordKey,
    pub diffs: Vec<FieldDiff>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldDivergenceTable {
    pub left_label: String,
    pub right_label: String,
    pub fields: Vec<String>,
    pub rows: Vec<FieldDivergence>,
    /// Key groups that did not hold exactly one record per side.
    pub skipped_groups: usize,
}

impl FieldDivergenceTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Long form: one entry per (identifier, field) divergence.
    pub fn entries(&self) -> impl Iterator<Item = (&RecordKey, &FieldDiff)> + '_ {
        self.rows
            .iter()
            .flat_map(|r| r.diffs.iter().map(move |d| (&r.key, d)))
    }

    pub fn left_header(&self, field: &str) -> String {
        format!("{field} ({})", self.left_label)
    }

    pub fn right_header(&self, field: &str) -> String {
        format!("{field} ({})", self.right_label)
    }

    /// Wide table: key columns, then a `<field> (<source>)` column pair for
    /// every field that diverged at least once.
    pub fn to_table(&self, key_columns: &[String]) -> Table {
        let diverged: Vec<&String> = self
            .fields
            .iter()
            .filter(|f| self.entries().any(|(_, d)| &d.field == *f))
            .collect();

        let mut headers = key_columns.to_vec();
        for f in &diverged {
            headers.push(self.left_header(f));
            headers.push(self.right_header(f));
        }

        let mut table = Table::new(headers);
        for row in &self.rows {
            let mut cells = row.key.0.clone();
            for f in &diverged {
                match row.diffs.iter().find(|d| &d.field == *f) {
                    Some(d) => {
                        cells.push(d.left.clone());
                        cells.push(d.right.clone());
                    }
                    None => {
                        cells.push(String::new());
                        cells.push(String::new());
                    }
                }
            }
            table.push(cells);
        }
        table
    }
}

enum Side {
    Left,
    Right,
}

/// Compare the configured fields of every common identifier.
///
/// Groups must hold exactly one record per side; any other cardinality is
/// skipped with a warning and counted in `skipped_groups`.
pub fn detect(
    left: &Matrix,
    right: &Matrix,
    common: &CommonRows<'_>,
    fields: &[String],
) -> FieldDivergenceTable {
    let left_acc: Vec<_> = fields.iter().map(|f| left.accessor(f)).collect();
    let right_acc: Vec<_> = fields.iter().map(|f| right.accessor(f)).collect();

    let mut groups: BTreeMap<&RecordKey, Vec<(Side, &Record)>> = BTreeMap::new();
    for (key, rec) in &common.left {
        groups.entry(key).or_default().push((Side::Left, *rec));
    }
    for (key, rec) in &common.right {
        groups.entry(key).or_default().push((Side::Right, *rec));
    }

    let mut rows = Vec::new();
    let mut skipped_groups = 0;

    for (key, group) in groups {
        let (l, r) = match group.as_slice() {
            [(Side::Left, l), (Side::Right, r)] => (*l, *r),
            _ => {
                warn!(
                    pair = %format!("{}/{}", left.name, right.name),
                    key = %key,
                    rows = group.len(),
                    "skipping key group: expected one record per source"
                );
                skipped_groups += 1;
                continue;
            }
        };

        let diffs: Vec<FieldDiff> = fields
            .iter()
            .enumerate()
            .filter_map(|(i, field)| {
                let lv = left_acc[i].get(l);
                let rv = right_acc[i].get(r);
                if comparable(lv) == comparable(rv) {
                    return None;
                }
                Some(FieldDiff {
                    field: field.clone(),
                    left: lv.unwrap_or("").to_string(),
                    right: rv.unwrap_or("").to_string(),
                })
            })
            .collect();

        if !diffs.is_empty() {
            rows.push(FieldDivergence { key: key.clone(), diffs });
        }
    }

    debug!(
        left = %left.name,
        right = %right.name,
        divergent = rows.len(),
        skipped = skipped_groups,
        "field comparison done"
    );

    FieldDivergenceTable {
        left_label: left.source.clone(),
        right_label: right.source.clone(),
        fields: fields.to_vec(),
        rows,
        skipped_groups,
    }
}
