use serde::Serialize;

use crate::consolidate::ConsolidatedRow;
use crate::engine::RunOutput;

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceCount {
    pub matrix: String,
    pub total: usize,
    pub exclusive: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairSummary {
    pub family: String,
    pub left: String,
    pub right: String,
    pub sources: Vec<SourceCount>,
    pub common: usize,
    pub field_divergences: usize,
    pub skipped_groups: usize,
    pub document_divergences: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureSummary {
    pub family: String,
    pub left: String,
    pub right: String,
    pub error: String,
}

/// Serializable digest of a run, for `--json` output.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub meta: RunMeta,
    pub pairs: Vec<PairSummary>,
    pub failures: Vec<FailureSummary>,
    pub consolidated_rows: usize,
    pub consolidated: Vec<ConsolidatedRow>,
}

pub fn summarize(output: &RunOutput) -> RunSummary {
    let pairs = output
        .pairs
        .iter()
        .map(|r| PairSummary {
            family: r.pair.family.clone(),
            left: r.pair.left.clone(),
            right: r.pair.right.clone(),
            sources: r
                .keys
                .sources
                .iter()
                .map(|s| SourceCount {
                    matrix: s.label.clone(),
                    total: s.total,
                    exclusive: s.exclusive.len(),
                })
                .collect(),
            common: r.keys.common.len(),
            field_divergences: r.divergences.rows.len(),
            skipped_groups: r.divergences.skipped_groups,
            document_divergences: r.documents.len(),
        })
        .collect();

    let failures = output
        .failures
        .iter()
        .map(|f| FailureSummary {
            family: f.pair.family.clone(),
            left: f.pair.left.clone(),
            right: f.pair.right.clone(),
            error: f.error.clone(),
        })
        .collect();

    RunSummary {
        meta: RunMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        pairs,
        failures,
        consolidated_rows: output.consolidated.len(),
        consolidated: output.consolidated.clone(),
    }
}
