// stimatrix - requirement matrix reconciliation (CLI)

mod exit_codes;
mod logging;
mod ppd;
mod report;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use exit_codes::EXIT_SUCCESS;
use logging::LogOptions;

#[derive(Parser)]
#[command(name = "stimatrix")]
#[command(about = "Compare requirement matrices across sources and rank document divergences")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LogArgs {
    /// Log filter (error, warn, info, debug, trace); defaults to RUST_LOG, then info
    #[arg(long)]
    log_level: Option<String>,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl From<LogArgs> for LogOptions {
    fn from(args: LogArgs) -> Self {
        Self { level: args.log_level, file: args.log_file }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compare every matrix pair of a config and export the results
    #[command(after_help = "\
Examples:
  stimatrix run --config stimatrix.yaml
  stimatrix run --config stimatrix.yaml --json --no-export
  stimatrix run --config stimatrix.yaml --log-file run.log --log-level debug")]
    Run {
        /// Path to the YAML (or .toml) configuration file
        #[arg(long)]
        config: PathBuf,

        /// Print a JSON run summary to stdout
        #[arg(long)]
        json: bool,

        /// Compare only, write no workbook
        #[arg(long)]
        no_export: bool,

        #[command(flatten)]
        log: LogArgs,
    },

    /// Parse and validate a configuration without running
    #[command(after_help = "\
Examples:
  stimatrix validate --config stimatrix.yaml")]
    Validate {
        /// Path to the YAML (or .toml) configuration file
        #[arg(long)]
        config: PathBuf,
    },

    /// Convert the PPD workbook into the DOORS reference table
    #[command(after_help = "\
Examples:
  stimatrix ppd-export --input PPD.xlsx --output PPD_export_DOORS.csv
  stimatrix ppd-export --input PPD.xlsx --sheet PPD --header-row 3 --output out/PPD_export_DOORS.csv")]
    PpdExport {
        /// PPD workbook
        #[arg(long)]
        input: PathBuf,

        /// Sheet holding the document list
        #[arg(long, default_value = "PPD")]
        sheet: String,

        /// 0-based row holding the column headers
        #[arg(long, default_value_t = 3)]
        header_row: usize,

        /// Tab-delimited output; an .xlsx copy is written next to it
        #[arg(long)]
        output: PathBuf,

        #[command(flatten)]
        log: LogArgs,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { config, json, no_export, log } => run::cmd_run(run::RunArgs {
            config,
            json,
            no_export,
            log: log.into(),
        }),
        Commands::Validate { config } => run::cmd_validate(config),
        Commands::PpdExport { input, sheet, header_row, output, log } => {
            ppd::cmd_ppd_export(ppd::PpdArgs {
                input,
                sheet,
                header_row,
                output,
                log: log.into(),
            })
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}
