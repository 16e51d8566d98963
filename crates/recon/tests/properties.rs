// Property-based tests for key-set reconciliation and consolidation.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::BTreeSet;

use proptest::prelude::*;
use stimatrix_recon::consolidate::{consolidate, explode};
use stimatrix_recon::divergence::detect;
use stimatrix_recon::documents::{DivergenceGroup, DocumentStatus};
use stimatrix_recon::keyset::{common_rows, key_set, reconcile};
use stimatrix_recon::model::{Matrix, Record, RecordKey};

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Identifier: small alphabet so sides overlap often; blanks exercise null keys.
fn arb_id() -> impl Strategy<Value = String> {
    prop_oneof![
        8 => r"R[0-9]{1,2}",
        1 => Just("".to_string()),
        1 => Just("  ".to_string()),
    ]
}

fn arb_value() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => r"[a-c]{0,2}",
        1 => Just(" a ".to_string()),
    ]
}

fn arb_rows() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec((arb_id(), arb_value()), 0..30)
}

fn matrix(name: &str, source: &str, rows: &[(String, String)]) -> Matrix {
    Matrix::new(
        name,
        source,
        vec!["Reference".into(), "Status".into()],
        rows.iter()
            .map(|(id, v)| Record::new(vec![Some(id.clone()), Some(v.clone())]))
            .collect(),
    )
}

fn key_cols() -> Vec<String> {
    vec!["Reference".to_string()]
}

fn arb_status() -> impl Strategy<Value = DocumentStatus> {
    prop_oneof![
        Just(DocumentStatus::Different),
        Just(DocumentStatus::AbsentIn("GE".into())),
        Just(DocumentStatus::AbsentIn("H2".into())),
    ]
}

fn arb_groups() -> impl Strategy<Value = Vec<(String, Vec<DivergenceGroup>)>> {
    let group = (
        prop_oneof![Just("CAF_Comments"), Just("MOP_test")],
        arb_status(),
        prop_oneof![Just("GE: CMD100000"), Just("H2: PM200000")],
        prop::collection::vec(r"R[0-9]", 1..5),
    )
        .prop_map(|(field, status, diff, refs)| DivergenceGroup {
            field: field.to_string(),
            status,
            difference: diff.to_string(),
            references: refs,
        });
    prop::collection::vec(
        (prop_oneof![Just("PMR"), Just("LocPas")], prop::collection::vec(group, 0..4))
            .prop_map(|(tag, groups)| (tag.to_string(), groups)),
        0..4,
    )
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config())]

    #[test]
    fn common_is_intersection_and_exclusives_disjoint(a in arb_rows(), b in arb_rows()) {
        let ma = matrix("GE_X", "GE", &a);
        let mb = matrix("H2_X", "H2", &b);
        let summary = reconcile(&[&ma, &mb], &key_cols());

        let ka = key_set(&ma, &key_cols());
        let kb = key_set(&mb, &key_cols());
        let expected: BTreeSet<RecordKey> = ka.intersection(&kb).cloned().collect();
        prop_assert_eq!(&summary.common, &expected);

        let ea = &summary.sources[0].exclusive;
        let eb = &summary.sources[1].exclusive;
        prop_assert!(ea.is_disjoint(eb));
        prop_assert!(ea.is_disjoint(&summary.common));
        prop_assert!(eb.is_disjoint(&summary.common));
        prop_assert_eq!(ea.len() + summary.common.len(), ka.len());
        prop_assert!(summary.common.iter().all(|k| !k.id().is_empty()));
    }

    #[test]
    fn divergences_only_on_common_keys(a in arb_rows(), b in arb_rows()) {
        let ma = matrix("GE_X", "GE", &a);
        let mb = matrix("H2_X", "H2", &b);
        let summary = reconcile(&[&ma, &mb], &key_cols());
        let common = common_rows(&ma, &mb, &key_cols(), &summary.common);
        let out = detect(&ma, &mb, &common, &["Status".to_string()]);

        for row in &out.rows {
            prop_assert!(summary.common.contains(&row.key));
            prop_assert!(!row.diffs.is_empty());
            for d in &row.diffs {
                prop_assert_ne!(d.left.trim(), d.right.trim());
            }
        }
        prop_assert!(out.rows.len() + out.skipped_groups <= summary.common.len());
    }

    #[test]
    fn consolidation_preserves_identifiers_and_ranks(per_pair in arb_groups()) {
        let entries = explode(&per_pair);
        let rows = consolidate(&entries);

        let input: BTreeSet<(String, String)> = per_pair
            .iter()
            .flat_map(|(tag, groups)| {
                groups.iter().flat_map(move |g| {
                    g.references.iter().map(move |r| (tag.clone(), r.clone()))
                })
            })
            .collect();
        let output: BTreeSet<(String, String)> = rows
            .iter()
            .flat_map(|row| row.references.iter().map(move |r| (row.tag.clone(), r.clone())))
            .collect();
        prop_assert_eq!(input, output);

        for row in &rows {
            let mut sorted = row.references.clone();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(&sorted, &row.references);
        }
        prop_assert!(rows.windows(2).all(|w| w[0].nb_references() >= w[1].nb_references()));
        prop_assert_eq!(consolidate(&entries), rows);
    }
}
