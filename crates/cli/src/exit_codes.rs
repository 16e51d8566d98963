//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Codes
//!
//! | Code | Description                                              |
//! |------|----------------------------------------------------------|
//! | 0    | Success (including runs that found no divergence)        |
//! | 1    | General error (unspecified)                              |
//! | 2    | CLI usage error (bad args, missing `--config`)           |
//! | 3    | Invalid configuration (parse or validation failure)      |
//! | 4    | Runtime or I/O failure (unreadable input, failed export) |
//!
//! A pair that cannot be compared is not an exit condition on its own: it is
//! logged and reported, and the remaining pairs run. Code 4 is used when no
//! pair at all could be compared.

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
/// clap exits with this code on its own parse errors.
pub const EXIT_USAGE: u8 = 2;

/// Configuration file is malformed or fails validation.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Reading inputs, writing outputs, or every pair failed.
pub const EXIT_RUNTIME: u8 = 4;
