//! Record normalization: key canonicalization, comparison form of field
//! values, header cleanup and the requirement-flag split.
//!
//! Field comparison is string-normalized on purpose: both sides are rendered
//! to text and trimmed before comparing, never compared as typed values.
//! Numeric cells are rendered by the loader (`3.0` becomes `3`), so a number
//! stored as text on one side and as a number on the other compares equal,
//! while `"1.0"` typed as text still differs from `"1"`.

use crate::model::{FieldAccessor, Matrix, Record, RecordKey};

/// Values of the requirement flag column that mark a row as a requirement.
const REQUIREMENT_VALUES: &[&str] = &["true", "vrai", "1", "yes", "requis"];

/// Trim a key component. Empty or missing components are null.
pub fn key_component(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Build the tuple key of a record. Any null component excludes the record.
pub fn record_key(record: &Record, key_fields: &[FieldAccessor]) -> Option<RecordKey> {
    key_fields
        .iter()
        .map(|acc| key_component(acc.get(record)))
        .collect::<Option<Vec<_>>>()
        .map(RecordKey)
}

/// Comparison form of a field value: null renders as empty, then trimmed.
pub fn comparable(value: Option<&str>) -> &str {
    value.unwrap_or("").trim()
}

/// Clean a raw header: trim, newlines to spaces, whitespace runs collapsed.
pub fn clean_header(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether a requirement flag value (trimmed, case-insensitive) marks a requirement.
pub fn is_requirement(value: Option<&str>) -> bool {
    let v = value.unwrap_or("").trim().to_lowercase();
    REQUIREMENT_VALUES.contains(&v.as_str())
}

/// Keep only requirement rows when the flag column exists.
///
/// Returns the filtered matrix and the number of non-requirement rows removed.
/// Without the flag column every row counts as a requirement.
pub fn split_requirements(matrix: Matrix, flag_column: Option<&str>) -> (Matrix, usize) {
    let Some(flag) = flag_column.filter(|f| matrix.has_column(f)) else {
        return (matrix, 0);
    };
    let acc = matrix.accessor(flag);
    let (keep, drop): (Vec<Record>, Vec<Record>) = matrix
        .records()
        .iter()
        .cloned()
        .partition(|r| is_requirement(acc.get(r)));
    let dropped = drop.len();
    let filtered = Matrix::new(
        matrix.name.clone(),
        matrix.source.clone(),
        matrix.columns().to_vec(),
        keep,
    );
    (filtered, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(vals: &[Option<&str>]) -> Record {
        Record::new(vals.iter().map(|v| v.map(String::from)).collect())
    }

    #[test]
    fn key_component_trims_and_nulls_blanks() {
        assert_eq!(key_component(Some("  R1 ")), Some("R1".into()));
        assert_eq!(key_component(Some("   ")), None);
        assert_eq!(key_component(None), None);
    }

    #[test]
    fn tuple_key_with_null_component_is_excluded() {
        let m = Matrix::new(
            "GE_A",
            "GE",
            vec!["Reference".into(), "Requirement".into()],
            vec![rec(&[Some("R1"), None]), rec(&[Some(" R2"), Some("Q2 ")])],
        );
        let keys = [m.accessor("Reference"), m.accessor("Requirement")];
        assert_eq!(record_key(&m.records()[0], &keys), None);
        assert_eq!(
            record_key(&m.records()[1], &keys),
            Some(RecordKey(vec!["R2".into(), "Q2".into()]))
        );
    }

    #[test]
    fn comparable_treats_null_as_empty() {
        assert_eq!(comparable(None), "");
        assert_eq!(comparable(Some(" Open\n")), "Open");
    }

    #[test]
    fn clean_header_collapses_whitespace() {
        assert_eq!(clean_header("  MOP\ndesign  "), "MOP design");
        assert_eq!(clean_header("CAF   Comments"), "CAF Comments");
    }

    #[test]
    fn requirement_split() {
        let m = Matrix::new(
            "GE_A",
            "GE",
            vec!["Reference".into(), "isRequirement".into()],
            vec![
                rec(&[Some("R1"), Some("Vrai")]),
                rec(&[Some("R2"), Some("no")]),
                rec(&[Some("R3"), Some(" 1 ")]),
                rec(&[Some("R4"), None]),
            ],
        );
        let (kept, dropped) = split_requirements(m, Some("isRequirement"));
        assert_eq!(kept.len(), 2);
        assert_eq!(dropped, 2);
    }

    #[test]
    fn requirement_split_without_flag_column_keeps_all() {
        let m = Matrix::new("GE_A", "GE", vec!["Reference".into()], vec![rec(&[Some("R1")])]);
        let (kept, dropped) = split_requirements(m, Some("isRequirement"));
        assert_eq!(kept.len(), 1);
        assert_eq!(dropped, 0);
    }
}
