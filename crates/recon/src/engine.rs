use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::{info, warn};

use crate::config::{MatrixConfig, MatrixPair};
use crate::consolidate::{consolidate, explode, ConsolidatedRow};
use crate::divergence::{detect, FieldDivergenceTable};
use crate::documents::{analyse, group, DivergenceGroup, DocumentDivergence, DocumentExtractor};
use crate::enrich::enrich_from_path;
use crate::error::{LoadError, ReconError};
use crate::keyset::{common_rows, key_accessors, reconcile, KeySetSummary};
use crate::model::Matrix;
use crate::normalize::split_requirements;

/// Input collaborator: yields one materialized matrix with canonical column
/// names (cleaned headers, configured remapping applied).
pub trait MatrixLoader {
    fn load(&self, config: &MatrixConfig, matrix_name: &str) -> Result<Matrix, LoadError>;
}

/// Everything computed for one successfully compared pair.
#[derive(Debug, Clone)]
pub struct PairReport {
    pub pair: MatrixPair,
    pub keys: KeySetSummary,
    pub divergences: FieldDivergenceTable,
    pub documents: Vec<DocumentDivergence>,
    pub groups: Vec<DivergenceGroup>,
    /// Non-requirement rows dropped per matrix before comparison.
    pub non_requirements: Vec<(String, usize)>,
}

#[derive(Debug, Clone)]
pub struct PairFailure {
    pub pair: MatrixPair,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    pub pairs: Vec<PairReport>,
    pub failures: Vec<PairFailure>,
    /// Ranked divergence patterns across all pairs. Empty when nothing diverged.
    pub consolidated: Vec<ConsolidatedRow>,
    /// Document tokens cited per source, across every analysed divergence.
    pub document_tokens: BTreeMap<String, BTreeSet<String>>,
}

impl RunOutput {
    pub fn has_divergences(&self) -> bool {
        !self.consolidated.is_empty()
    }
}

/// Compare every same-family matrix pair, consolidate the document
/// divergences and, when `reference_table` is given, enrich them.
///
/// A pair that fails to load or lacks key columns is logged and recorded in
/// `failures`; the other pairs still run.
pub fn run(
    config: &MatrixConfig,
    loader: &dyn MatrixLoader,
    reference_table: Option<&Path>,
) -> Result<RunOutput, ReconError> {
    let extractor = DocumentExtractor::new(config.documents.case_sensitive)?;
    let mut output = RunOutput::default();

    for pair in config.matrix_pairs() {
        match compare_pair(config, loader, &pair, &extractor) {
            Ok(report) => output.pairs.push(report),
            Err(e) => {
                warn!(left = %pair.left, right = %pair.right, error = %e, "pair analysis failed");
                output.failures.push(PairFailure {
                    pair,
                    error: e.to_string(),
                });
            }
        }
    }

    for report in &output.pairs {
        for d in &report.documents {
            output
                .document_tokens
                .entry(report.divergences.left_label.clone())
                .or_default()
                .extend(d.left_tokens.iter().cloned());
            output
                .document_tokens
                .entry(report.divergences.right_label.clone())
                .or_default()
                .extend(d.right_tokens.iter().cloned());
        }
    }

    let per_pair: Vec<(String, Vec<DivergenceGroup>)> = output
        .pairs
        .iter()
        .filter(|r| !r.groups.is_empty())
        .map(|r| (r.pair.family.clone(), r.groups.clone()))
        .collect();

    if per_pair.is_empty() {
        info!("no document divergence found");
        return Ok(output);
    }

    let consolidated = consolidate(&explode(&per_pair));
    output.consolidated = match reference_table {
        Some(path) => enrich_from_path(consolidated, path, &config.reference_table),
        None => consolidated,
    };

    info!(
        rows = output.consolidated.len(),
        pairs = output.pairs.len(),
        "consolidated divergences"
    );
    for (source, tokens) in &output.document_tokens {
        info!(%source, count = tokens.len(), ?tokens, "documents cited");
    }

    Ok(output)
}

/// Load, reconcile and compare one pair of matrices.
pub fn compare_pair(
    config: &MatrixConfig,
    loader: &dyn MatrixLoader,
    pair: &MatrixPair,
    extractor: &DocumentExtractor,
) -> Result<PairReport, ReconError> {
    let key_columns = config.key_columns();
    let mut matrices = Vec::with_capacity(2);
    let mut non_requirements = Vec::new();

    for name in [&pair.left, &pair.right] {
        info!(matrix = %name, "loading matrix");
        let matrix = loader.load(config, name).map_err(|source| ReconError::Load {
            matrix: name.clone(),
            source,
        })?;

        if key_accessors(&matrix, &key_columns).is_none() {
            continue;
        }

        let (matrix, dropped) =
            split_requirements(matrix, config.requirement_flag_column.as_deref());
        info!(
            matrix = %name,
            requirements = matrix.len(),
            non_requirements = dropped,
            "requirement split"
        );
        non_requirements.push((name.clone(), dropped));
        matrices.push(matrix);
    }

    let [left, right] = <[Matrix; 2]>::try_from(matrices).map_err(|m| ReconError::IncompletePair {
        pair: pair.family.clone(),
        usable: m.len(),
    })?;

    let keys = reconcile(&[&left, &right], &key_columns);
    for s in &keys.sources {
        info!(matrix = %s.label, total = s.total, exclusive = s.exclusive.len(), "key set");
    }
    info!(family = %pair.family, common = keys.common.len(), "common entries");

    let common = common_rows(&left, &right, &key_columns, &keys.common);
    let divergences = detect(&left, &right, &common, &config.fields_to_compare);
    if divergences.skipped_groups > 0 {
        warn!(
            family = %pair.family,
            skipped = divergences.skipped_groups,
            "key groups skipped during field comparison"
        );
    }

    let (documents, groups) = if divergences.is_empty() {
        info!(family = %pair.family, "no field divergence");
        (Vec::new(), Vec::new())
    } else {
        let impacted: BTreeSet<&str> = divergences.rows.iter().map(|r| r.key.id()).collect();
        info!(family = %pair.family, impacted = impacted.len(), "requirements impacted");
        let documents = analyse(&divergences, &config.document_fields, extractor);
        let groups = group(&documents);
        (documents, groups)
    };

    Ok(PairReport {
        pair: pair.clone(),
        keys,
        divergences,
        documents,
        groups,
        non_requirements,
    })
}
