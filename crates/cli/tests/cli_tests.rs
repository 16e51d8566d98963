// Integration tests for the stimatrix binary.
//
// Fixtures are generated per test in a temp dir: a config file next to an
// excel_files/ directory holding one workbook per source.
//
// Run with: cargo test -p stimatrix-cli --test cli_tests -- --nocapture

use std::path::Path;
use std::process::{Command, Output};

use calamine::{open_workbook_auto, Reader};
use rust_xlsxwriter::Workbook;

fn stimatrix() -> Command {
    Command::new(env!("CARGO_BIN_EXE_stimatrix"))
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

const CONFIG: &str = r#"
id_column: Reference
fields_to_compare: [Status, CAF_Comments, MOP_test]
sources: [GE, H2]
matrices:
  - name: GE_PMR
    file: ge.xlsx
    sheet: PMR
  - name: H2_PMR
    file: h2.xlsx
    sheet: PMR
    column_mapping:
      "Réf": Reference
"#;

fn write_matrix(path: &Path, id_header: &str, rows: &[[&str; 5]]) {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet().set_name("PMR").unwrap();
    let headers = [id_header, "Status", "CAF_Comments", "MOP_test", "isRequirement"];
    for (col, h) in headers.iter().enumerate() {
        ws.write_string(0, col as u16, *h).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (col, v) in row.iter().enumerate() {
            if !v.is_empty() {
                ws.write_string(r as u32 + 1, col as u16, *v).unwrap();
            }
        }
    }
    wb.save(path).unwrap();
}

/// GE and H2 share R1..R3; R1 and R2 lose their CAF document on the H2 side.
fn fixture(dir: &Path) -> std::path::PathBuf {
    std::fs::create_dir(dir.join("excel_files")).unwrap();
    write_matrix(
        &dir.join("excel_files/ge.xlsx"),
        "Reference",
        &[
            ["R1", "Open", "see DID0000000001", "", "yes"],
            ["R2", "Open", "DID0000000001", "CMD100000", "yes"],
            ["R3", "Open", "", "", "yes"],
            ["R4", "Open", "", "", "yes"],
            ["N1", "Info", "", "", "no"],
        ],
    );
    write_matrix(
        &dir.join("excel_files/h2.xlsx"),
        "Réf",
        &[
            ["R1", "Open", "", "", "yes"],
            ["R2", "Open", "", "CMD100000", "yes"],
            ["R3", "Closed", "", "", "yes"],
            ["R5", "Open", "", "", "yes"],
        ],
    );
    let config = dir.join("stimatrix.yaml");
    std::fs::write(&config, CONFIG).unwrap();
    config
}

const PPD_HEADERS: [&str; 12] = [
    "Titre", "N°ATSA", "Indice de révision", "Métier", "Type de document", "N°SNCF",
    "N°Fournisseur", "Nom Fournisseur", "N° Bordereau", "Date d'envoi",
    "Date du retour SNCF", "Statut du retour SNCF",
];

/// PPD sheet with its headers on row 3; each row gives title, reference, revision.
fn write_ppd(path: &Path, rows: &[[&str; 3]]) {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet().set_name("PPD").unwrap();
    for (col, h) in PPD_HEADERS.iter().enumerate() {
        ws.write_string(3, col as u16, *h).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (col, v) in row.iter().enumerate() {
            if !v.is_empty() {
                ws.write_string(r as u32 + 4, col as u16, *v).unwrap();
            }
        }
    }
    wb.save(path).unwrap();
}

// ===========================================================================
// Usage and configuration errors
// ===========================================================================

#[test]
fn run_without_config_is_usage_error() {
    let output = stimatrix().arg("run").output().expect("stimatrix run");
    assert_eq!(output.status.code(), Some(2), "stderr: {}", stderr(&output));
}

#[test]
fn validate_rejects_bad_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bad.yaml");
    std::fs::write(&config, "id_column: Reference\nsources: [GE]\nmatrices: []\n").unwrap();

    let output = stimatrix()
        .args(["validate", "--config", config.to_str().unwrap()])
        .output()
        .expect("stimatrix validate");
    assert_eq!(output.status.code(), Some(3), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("error:"));
}

#[test]
fn validate_accepts_good_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture(dir.path());

    let output = stimatrix()
        .args(["validate", "--config", config.to_str().unwrap()])
        .output()
        .expect("stimatrix validate");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("1 pair(s)"));
}

#[test]
fn missing_config_file_is_runtime_error() {
    let output = stimatrix()
        .args(["run", "--config", "/definitely/not/here.yaml"])
        .output()
        .expect("stimatrix run");
    assert_eq!(output.status.code(), Some(4), "stderr: {}", stderr(&output));
}

// ===========================================================================
// Full runs
// ===========================================================================

#[test]
fn run_exports_and_prints_json_summary() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture(dir.path());

    let output = stimatrix()
        .args(["run", "--config", config.to_str().unwrap(), "--json"])
        .output()
        .expect("stimatrix run");
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let pair = &summary["pairs"][0];
    assert_eq!(pair["family"], "PMR");
    assert_eq!(pair["common"], 3);
    assert_eq!(pair["field_divergences"], 3);
    assert_eq!(pair["document_divergences"], 2);
    assert_eq!(summary["consolidated_rows"], 1);
    assert_eq!(summary["consolidated"][0]["references"], serde_json::json!(["R1", "R2"]));
    assert_eq!(summary["consolidated"][0]["status"]["absent_in"], "H2");

    let out = dir.path().join("output");
    for file in [
        "entries_common_PMR.xlsx",
        "entries_unique_to_GE_PMR.xlsx",
        "entries_unique_to_H2_PMR.xlsx",
        "comparison_GE_PMR-H2_PMR.xlsx",
        "res_ana_div_GE_PMR-H2_PMR.xlsx",
        "analyse_doc_consolidee.xlsx",
    ] {
        assert!(out.join(file).exists(), "{file} missing");
    }

    let mut wb = open_workbook_auto(out.join("analyse_doc_consolidee.xlsx")).unwrap();
    let range = wb.worksheet_range("Analyse consolidée").unwrap();
    let header: Vec<String> = range.rows().next().unwrap().iter().map(|c| c.to_string()).collect();
    assert_eq!(
        header,
        vec!["STI", "Champ", "État", "Différence", "Reference", "nb_references"]
    );
    let first: Vec<String> = range.rows().nth(1).unwrap().iter().map(|c| c.to_string()).collect();
    assert_eq!(first[0], "PMR");
    assert_eq!(first[2], "Absent in H2");
    assert_eq!(first[4], "R1, R2");
    assert_eq!(first[5], "2");
}

#[test]
fn run_without_matching_reference_keeps_identifiers() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture(dir.path());
    std::fs::write(
        dir.path().join("PPD_export_DOORS.csv"),
        "\u{feff}N°\tRéférence ALSTOM\tTitre\tRévision\n12\tX\tTitle\tA\n",
    )
    .unwrap();

    let output = stimatrix()
        .args(["run", "--config", config.to_str().unwrap(), "--json", "--no-export"])
        .output()
        .expect("stimatrix run");
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["consolidated"][0]["enriched"], serde_json::json!(["R1", "R2"]));
    assert!(!dir.path().join("output").exists());
}

#[test]
fn ppd_export_feeds_run_enrichment() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("stimatrix.yaml");
    std::fs::write(&config, CONFIG).unwrap();
    std::fs::create_dir(dir.path().join("excel_files")).unwrap();
    write_matrix(
        &dir.path().join("excel_files/ge.xlsx"),
        "Reference",
        &[["1_ATSA-001", "Open", "DID0000000001", "", "yes"]],
    );
    write_matrix(
        &dir.path().join("excel_files/h2.xlsx"),
        "Réf",
        &[["1_ATSA-001", "Open", "", "", "yes"]],
    );

    let input = dir.path().join("PPD.xlsx");
    write_ppd(&input, &[["Brake plan", "ATSA-001", "B"]]);
    let output = stimatrix()
        .args([
            "ppd-export",
            "--input",
            input.to_str().unwrap(),
            "--output",
            dir.path().join("PPD_export_DOORS.csv").to_str().unwrap(),
        ])
        .output()
        .expect("stimatrix ppd-export");
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let output = stimatrix()
        .args(["run", "--config", config.to_str().unwrap(), "--json", "--no-export"])
        .output()
        .expect("stimatrix run");
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["consolidated"][0]["references"], serde_json::json!(["1_ATSA-001"]));
    assert_eq!(
        summary["consolidated"][0]["enriched"],
        serde_json::json!(["1_ATSA-001 - Brake plan (Rev B)"])
    );
}

#[test]
fn run_without_divergence_writes_no_consolidated_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("excel_files")).unwrap();
    let rows = [["R1", "Open", "DID0000000001", "", "yes"]];
    write_matrix(&dir.path().join("excel_files/ge.xlsx"), "Reference", &rows);
    write_matrix(&dir.path().join("excel_files/h2.xlsx"), "Réf", &rows);
    let config = dir.path().join("stimatrix.yaml");
    std::fs::write(&config, CONFIG).unwrap();

    let output = stimatrix()
        .args(["run", "--config", config.to_str().unwrap()])
        .output()
        .expect("stimatrix run");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("no document divergence found"));
    assert!(dir.path().join("output/entries_common_PMR.xlsx").exists());
    assert!(!dir.path().join("output/analyse_doc_consolidee.xlsx").exists());
}

#[test]
fn run_with_missing_workbooks_fails_every_pair() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("stimatrix.yaml");
    std::fs::write(&config, CONFIG).unwrap();

    let output = stimatrix()
        .args(["run", "--config", config.to_str().unwrap()])
        .output()
        .expect("stimatrix run");
    assert_eq!(output.status.code(), Some(4), "stderr: {}", stderr(&output));
    let err = stderr(&output);
    assert!(err.contains("pair analysis failed"));
    assert!(err.contains("hint:"));
}

#[test]
fn run_writes_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture(dir.path());
    let log = dir.path().join("run.log");

    let output = stimatrix()
        .args([
            "run",
            "--config",
            config.to_str().unwrap(),
            "--no-export",
            "--log-file",
            log.to_str().unwrap(),
        ])
        .output()
        .expect("stimatrix run");
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let text = std::fs::read_to_string(&log).unwrap();
    assert!(text.contains("reading matrix"));
    assert!(text.contains("column remapped"));
    assert!(text.contains("requirement split"));
    assert!(!stderr(&output).contains("reading matrix"));
}

// ===========================================================================
// PPD export
// ===========================================================================

#[test]
fn ppd_export_writes_reference_table() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("PPD.xlsx");

    write_ppd(&input, &[["Brake plan", "R1", ""], ["Placeholder", "## TBD", ""]]);

    let out = dir.path().join("PPD_export_DOORS.csv");
    let output = stimatrix()
        .args([
            "ppd-export",
            "--input",
            input.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
        ])
        .output()
        .expect("stimatrix ppd-export");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("1 placeholder row(s) dropped"));

    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.starts_with('\u{feff}'));
    assert_eq!(text.lines().count(), 2);
    assert!(dir.path().join("PPD_export_DOORS.xlsx").exists());
}

#[test]
fn ppd_export_missing_input_is_runtime_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = stimatrix()
        .args([
            "ppd-export",
            "--input",
            dir.path().join("nope.xlsx").to_str().unwrap(),
            "--output",
            dir.path().join("out.csv").to_str().unwrap(),
        ])
        .output()
        .expect("stimatrix ppd-export");
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("hint:"));
}
