//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Scripts rely on them, so a code's meaning never changes once released.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain     | Description                              |
//! |---------|------------|------------------------------------------|
//! | 0       | Universal  | Success                                  |
//! | 1       | Universal  | General error (unspecified)              |
//! | 2       | Universal  | CLI usage error (bad args)               |
//! | 3-9     | load       | Load / reconciliation codes              |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `recon_exit_code` or the command that raises it

use bimgraph_recon::ReconError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options (clap's own code).
#[allow(dead_code)]
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Load (3-9)
// =============================================================================

/// `load --strict` finished but produced findings.
pub const EXIT_LOAD_FINDINGS: u8 = 3;

/// A configured sheet or a required column is absent.
pub const EXIT_LOAD_SCHEMA: u8 = 4;

/// Config could not be parsed or failed validation.
pub const EXIT_LOAD_CONFIG: u8 = 5;

/// A file could not be read or written.
pub const EXIT_LOAD_IO: u8 = 6;

/// Map a ReconError to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::MissingSheet { .. } | ReconError::MissingColumn { .. } => EXIT_LOAD_SCHEMA,
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_LOAD_CONFIG,
        ReconError::Io(_) => EXIT_LOAD_IO,
    }
}
