//! Per-run logger.
//!
//! The subscriber is built from the command's flags and installed only for
//! the duration of the run with `tracing::subscriber::with_default`; nothing
//! is registered globally.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::exit_codes::{EXIT_RUNTIME, EXIT_USAGE};
use crate::CliError;

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Filter directive (`info`, `debug`, `stimatrix_recon=debug`...).
    /// Falls back to `RUST_LOG`, then `info`.
    pub level: Option<String>,
    /// Append to this file instead of writing to stderr.
    pub file: Option<PathBuf>,
}

fn filter(options: &LogOptions) -> Result<EnvFilter, CliError> {
    match &options.level {
        Some(level) => EnvFilter::try_new(level).map_err(|e| CliError {
            code: EXIT_USAGE,
            message: format!("invalid --log-level '{level}': {e}"),
            hint: Some("use one of error, warn, info, debug, trace".to_string()),
        }),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))),
    }
}

fn writer(options: &LogOptions) -> Result<BoxMakeWriter, CliError> {
    match &options.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| CliError {
                    code: EXIT_RUNTIME,
                    message: format!("cannot open log file {}: {e}", path.display()),
                    hint: None,
                })?;
            Ok(BoxMakeWriter::new(Mutex::new(file)))
        }
        None => Ok(BoxMakeWriter::new(std::io::stderr)),
    }
}

/// Run `f` with a subscriber configured from `options`.
pub fn with_logging<T>(options: &LogOptions, f: impl FnOnce() -> T) -> Result<T, CliError> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter(options)?)
        .with_writer(writer(options)?)
        .with_ansi(false)
        .with_target(false)
        .finish();

    Ok(tracing::subscriber::with_default(subscriber, f))
}
