//! Result workbooks written by `stimatrix run`.
//!
//! Per pair (into `output_dir`):
//! - `entries_common_<family>.xlsx`       keys present in both matrices
//! - `entries_unique_to_<matrix>.xlsx`    keys only one matrix has
//! - `comparison_<A>-<B>.xlsx`            field divergences (when any)
//! - `res_ana_div_<A>-<B>.xlsx`           grouped document divergences (when any)
//!
//! Per run: `analyse_doc_consolidee.xlsx`, only when something diverged.

use std::path::{Path, PathBuf};

use stimatrix_io::{export_table, IoError};
use stimatrix_recon::consolidate::consolidated_table;
use stimatrix_recon::documents::groups_table;
use stimatrix_recon::keyset::keys_table;
use stimatrix_recon::{MatrixConfig, PairReport, RunOutput};

pub const CONSOLIDATED_FILE: &str = "analyse_doc_consolidee.xlsx";
pub const CONSOLIDATED_SHEET: &str = "Analyse consolidée";

pub fn export_pair(report: &PairReport, config: &MatrixConfig, out_dir: &Path) -> Result<Vec<PathBuf>, IoError> {
    let key_columns = config.key_columns();
    let pair = format!("{}-{}", report.pair.left, report.pair.right);
    let mut written = Vec::new();

    let path = out_dir.join(format!("entries_common_{}.xlsx", report.pair.family));
    export_table(&keys_table(&report.keys.common, &key_columns), "entries_common", &path)?;
    written.push(path);

    for source in &report.keys.sources {
        let path = out_dir.join(format!("entries_unique_to_{}.xlsx", source.label));
        export_table(&keys_table(&source.exclusive, &key_columns), &source.label, &path)?;
        written.push(path);
    }

    if !report.divergences.is_empty() {
        let path = out_dir.join(format!("comparison_{pair}.xlsx"));
        export_table(&report.divergences.to_table(&key_columns), "comparison", &path)?;
        written.push(path);
    }

    if !report.groups.is_empty() {
        let path = out_dir.join(format!("res_ana_div_{pair}.xlsx"));
        export_table(&groups_table(&report.groups, &config.id_column), "res_ana_div", &path)?;
        written.push(path);
    }

    Ok(written)
}

/// Every workbook of a run. The consolidated workbook is skipped when the
/// run found no document divergence.
pub fn export_run(output: &RunOutput, config: &MatrixConfig, out_dir: &Path) -> Result<Vec<PathBuf>, IoError> {
    let mut written = Vec::new();
    for report in &output.pairs {
        written.extend(export_pair(report, config, out_dir)?);
    }

    if output.has_divergences() {
        let path = out_dir.join(CONSOLIDATED_FILE);
        export_table(
            &consolidated_table(&output.consolidated, &config.id_column),
            CONSOLIDATED_SHEET,
            &path,
        )?;
        written.push(path);
    }

    Ok(written)
}
