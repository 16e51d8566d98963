//! `stimatrix ppd-export`: PPD workbook to DOORS reference table.

use std::path::PathBuf;

use stimatrix_io::ppd::{export, PpdOptions};

use crate::exit_codes::EXIT_RUNTIME;
use crate::logging::{with_logging, LogOptions};
use crate::CliError;

pub struct PpdArgs {
    pub input: PathBuf,
    pub sheet: String,
    pub header_row: usize,
    pub output: PathBuf,
    pub log: LogOptions,
}

pub fn cmd_ppd_export(args: PpdArgs) -> Result<(), CliError> {
    let options = PpdOptions {
        sheet: args.sheet,
        header_row: args.header_row,
    };

    let result = with_logging(&args.log, || export(&args.input, &options, &args.output))?
        .map_err(|e| CliError {
            code: EXIT_RUNTIME,
            message: e.to_string(),
            hint: e
                .is_not_found()
                .then(|| "check --input and --sheet (default sheet is PPD)".to_string()),
        })?;

    eprintln!(
        "exported {} row(s) to {} and {} ({} placeholder row(s) dropped)",
        result.rows,
        result.csv_path.display(),
        result.xlsx_path.display(),
        result.dropped_placeholders,
    );
    Ok(())
}
