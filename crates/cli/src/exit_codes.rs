//! CLI Exit Code Registry
//!
//! Single source of truth for `rewardsync` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                               |
//! |------|-------------------------------------------------------|
//! | 0    | Success                                               |
//! | 1    | General error (unspecified)                           |
//! | 2    | Usage error (bad arguments)                           |
//! | 60   | Invalid config (TOML syntax, thresholds, weights)     |
//! | 61   | Input parse error (no data rows, malformed quoting)   |
//! | 62   | Input validation error (no source, no feeds)          |
//! | 63   | Runtime I/O (cannot read or write a file)             |
//! | 64   | Unmatched transactions (only with --fail-on-unmatched)|

use rewardsync_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, malformed `PROGRAM=FILE` pairs.
pub const EXIT_USAGE: u8 = 2;

/// Config failed to parse or validate.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 60;

/// A source or candidate feed is structurally invalid.
pub const EXIT_RECON_PARSE: u8 = 61;

/// Inputs parsed but cannot be reconciled (no source rows, no feeds).
pub const EXIT_RECON_VALIDATION: u8 = 62;

/// File read/write failure.
pub const EXIT_RECON_IO: u8 = 63;

/// Run completed but left transactions unmatched and `--fail-on-unmatched` was set.
pub const EXIT_RECON_UNMATCHED: u8 = 64;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::Parse { .. } => EXIT_RECON_PARSE,
        ReconError::Validation(_) => EXIT_RECON_VALIDATION,
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_RECON_INVALID_CONFIG,
        ReconError::Export(_) => EXIT_ERROR,
    }
}
