use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A cell as loaded from a matrix: rendered text, or `None` when empty.
pub type Cell = Option<String>;

/// One row of a matrix. Values are positional, aligned with `Matrix::columns`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub values: Vec<Cell>,
}

impl Record {
    pub fn new(values: Vec<Cell>) -> Self {
        Self { values }
    }
}

/// One tabular source, loaded once per run and never mutated afterward.
///
/// Column names are already canonical (cleaned and remapped by the loader).
#[derive(Debug, Clone)]
pub struct Matrix {
    pub name: String,
    pub source: String,
    columns: Vec<String>,
    index: HashMap<String, usize>,
    records: Vec<Record>,
}

impl Matrix {
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        columns: Vec<String>,
        records: Vec<Record>,
    ) -> Self {
        // First occurrence wins on duplicate headers.
        let mut index = HashMap::new();
        for (i, c) in columns.iter().enumerate() {
            index.entry(c.clone()).or_insert(i);
        }
        Self {
            name: name.into(),
            source: source.into(),
            columns,
            index,
            records,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Resolve a field name once; the accessor is then used per record.
    pub fn accessor(&self, field: &str) -> FieldAccessor {
        FieldAccessor(self.index.get(field).copied())
    }
}

/// Resolved position of a named field in one matrix. A field absent from the
/// matrix resolves to an accessor that yields `None` for every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAccessor(Option<usize>);

impl FieldAccessor {
    pub fn get<'r>(&self, record: &'r Record) -> Option<&'r str> {
        self.0
            .and_then(|i| record.values.get(i))
            .and_then(|c| c.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Normalized tuple key. Components are trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecordKey(pub Vec<String>);

impl RecordKey {
    /// The identifier component (first key column).
    pub fn id(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or("")
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" / "))
    }
}

// ---------------------------------------------------------------------------
// Output tables
// ---------------------------------------------------------------------------

/// Plain header + string rows, the shape handed to the export collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers, rows: Vec::new() }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
