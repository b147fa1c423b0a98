//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3       | Universal        | File I/O error                           |
//! | 60-69   | ledger           | Task-ledger run codes                    |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-3)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// File could not be read or written (config, stdout).
pub const EXIT_IO: u8 = 3;

// =============================================================================
// Ledger (60-69)
// =============================================================================

/// Config failed to parse or validate (bad TOML, unknown key, bad regex).
pub const EXIT_LEDGER_INVALID_CONFIG: u8 = 60;

/// Every snapshot document was skipped; there is nothing to render.
pub const EXIT_LEDGER_NO_RECORDS: u8 = 61;

/// The ledger was computed but the output file could not be written.
pub const EXIT_LEDGER_RENDER: u8 = 62;
