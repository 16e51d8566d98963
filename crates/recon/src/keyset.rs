use std::collections::BTreeSet;

use serde::Serialize;
use tracing::warn;

use crate::model::{FieldAccessor, Matrix, Record, RecordKey, Table};
use crate::normalize::record_key;

/// Per-source side of a key-set reconciliation.
#[derive(Debug, Clone, Serialize)]
pub struct SourceKeys {
    pub label: String,
    /// Distinct non-null keys in the source.
    pub total: usize,
    /// Keys absent from the union of all other sources.
    pub exclusive: BTreeSet<RecordKey>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeySetSummary {
    pub sources: Vec<SourceKeys>,
    /// Keys present in every source.
    pub common: BTreeSet<RecordKey>,
}

/// Common records of a two-source comparison, each tagged with its key.
#[derive(Debug, Clone, Default)]
pub struct CommonRows<'a> {
    pub left: Vec<(RecordKey, &'a Record)>,
    pub right: Vec<(RecordKey, &'a Record)>,
}

/// Resolve key accessors, or `None` (with a warning) if a key column is missing.
pub fn key_accessors(matrix: &Matrix, key_columns: &[String]) -> Option<Vec<FieldAccessor>> {
    let missing: Vec<&str> = key_columns
        .iter()
        .filter(|c| !matrix.has_column(c))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        warn!(matrix = %matrix.name, ?missing, "key columns missing, matrix contributes no keys");
        return None;
    }
    Some(key_columns.iter().map(|c| matrix.accessor(c)).collect())
}

/// Distinct normalized keys of one matrix. Null keys never enter the set.
pub fn key_set(matrix: &Matrix, key_columns: &[String]) -> BTreeSet<RecordKey> {
    let Some(accessors) = key_accessors(matrix, key_columns) else {
        return BTreeSet::new();
    };
    matrix
        .records()
        .iter()
        .filter_map(|r| record_key(r, &accessors))
        .collect()
}

/// Reconcile the key sets of two or more labeled matrices.
pub fn reconcile(matrices: &[&Matrix], key_columns: &[String]) -> KeySetSummary {
    let sets: Vec<BTreeSet<RecordKey>> =
        matrices.iter().map(|m| key_set(m, key_columns)).collect();

    let common = match sets.split_first() {
        Some((first, rest)) => first
            .iter()
            .filter(|k| rest.iter().all(|s| s.contains(*k)))
            .cloned()
            .collect(),
        None => BTreeSet::new(),
    };

    let sources = matrices
        .iter()
        .enumerate()
        .map(|(i, m)| SourceKeys {
            label: m.name.clone(),
            total: sets[i].len(),
            exclusive: exclusive_keys(i, &sets),
        })
        .collect();

    KeySetSummary { sources, common }
}

fn exclusive_keys(i: usize, sets: &[BTreeSet<RecordKey>]) -> BTreeSet<RecordKey> {
    sets[i]
        .iter()
        .filter(|k| {
            sets.iter()
                .enumerate()
                .all(|(j, s)| j == i || !s.contains(*k))
        })
        .cloned()
        .collect()
}

/// Records of `left` and `right` whose key is in `common`, in input order.
pub fn common_rows<'a>(
    left: &'a Matrix,
    right: &'a Matrix,
    key_columns: &[String],
    common: &BTreeSet<RecordKey>,
) -> CommonRows<'a> {
    CommonRows {
        left: rows_in(left, key_columns, common),
        right: rows_in(right, key_columns, common),
    }
}

/// One row per key, one column per key component.
pub fn keys_table(keys: &BTreeSet<RecordKey>, key_columns: &[String]) -> Table {
    let mut table = Table::new(key_columns.to_vec());
    for k in keys {
        table.push(k.0.clone());
    }
    table
}

fn rows_in<'a>(
    matrix: &'a Matrix,
    key_columns: &[String],
    keys: &BTreeSet<RecordKey>,
) -> Vec<(RecordKey, &'a Record)> {
    let Some(accessors) = key_accessors(matrix, key_columns) else {
        return Vec::new();
    };
    matrix
        .records()
        .iter()
        .filter_map(|r| record_key(r, &accessors).map(|k| (k, r)))
        .filter(|(k, _)| keys.contains(k))
        .collect()
}
