//! `stimatrix run` / `stimatrix validate`: config-driven matrix comparison.

use std::path::{Path, PathBuf};

use stimatrix_io::XlsxLoader;
use stimatrix_recon::{summarize, MatrixConfig, ReconError, RunOutput};
use tracing::info;

use crate::exit_codes::{EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_RUNTIME};
use crate::logging::{with_logging, LogOptions};
use crate::report::export_run;
use crate::CliError;

pub struct RunArgs {
    pub config: PathBuf,
    pub json: bool,
    pub no_export: bool,
    pub log: LogOptions,
}

fn runtime_err(msg: impl Into<String>) -> CliError {
    CliError { code: EXIT_RUNTIME, message: msg.into(), hint: None }
}

fn config_err(e: ReconError) -> CliError {
    let code = match e {
        ReconError::Io(_) => EXIT_RUNTIME,
        _ => EXIT_INVALID_CONFIG,
    };
    let hint = matches!(e, ReconError::UnknownSource { .. })
        .then(|| "matrix names must be <source>_<family> with a source from `sources`".to_string());
    CliError { code, message: e.to_string(), hint }
}

fn load_config(path: &Path) -> Result<MatrixConfig, CliError> {
    MatrixConfig::load(path).map_err(config_err)
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let config = load_config(&args.config)?;

    // Workbooks, outputs and the reference table resolve relative to the config file
    let base_dir = args.config.parent().unwrap_or_else(|| Path::new("."));
    let loader = XlsxLoader::for_config(&args.config);
    let reference_table = base_dir.join(&config.reference_table.path);
    let output_dir = base_dir.join(&config.output_dir);

    let output = with_logging(&args.log, || -> Result<RunOutput, CliError> {
        info!(
            config = %args.config.display(),
            pairs = config.matrix_pairs().len(),
            "run started"
        );

        let output = stimatrix_recon::run(&config, &loader, Some(reference_table.as_path()))
            .map_err(|e| runtime_err(e.to_string()))?;

        if args.no_export {
            info!("export skipped (--no-export)");
        } else {
            let written = export_run(&output, &config, &output_dir).map_err(|e| runtime_err(e.to_string()))?;
            info!(files = written.len(), dir = %output_dir.display(), "results exported");
        }
        Ok(output)
    })??;

    if args.json {
        let json = serde_json::to_string_pretty(&summarize(&output)).map_err(|e| CliError {
            code: EXIT_ERROR,
            message: format!("JSON serialization error: {e}"),
            hint: None,
        })?;
        println!("{json}");
    }

    // Human summary to stderr
    eprintln!(
        "{} pair(s) compared, {} failed, {} consolidated divergence pattern(s)",
        output.pairs.len(),
        output.failures.len(),
        output.consolidated.len(),
    );
    for failure in &output.failures {
        eprintln!(
            "  skipped {}-{}: {}",
            failure.pair.left, failure.pair.right, failure.error
        );
    }

    if output.pairs.is_empty() && !output.failures.is_empty() {
        return Err(CliError {
            code: EXIT_RUNTIME,
            message: "no matrix pair could be compared".into(),
            hint: Some(format!(
                "check that the workbooks exist under {}",
                base_dir.join(&config.excel_dir).display()
            )),
        });
    }

    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    eprintln!(
        "valid: {} matrix(es), {} pair(s), comparing {} field(s) on '{}'",
        config.matrices.len(),
        config.matrix_pairs().len(),
        config.fields_to_compare.len(),
        config.id_column,
    );
    Ok(())
}
