//! Stable exit codes for docfill CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid definition, config, usage, or any other error.
pub const INVALID: i32 = 1;
/// `docfill fill` was not given every INPUT field.
pub const MISSING_INPUTS: i32 = 2;
/// A field could not be generated (budget exhausted or backend failure).
pub const GENERATION_FAILED: i32 = 3;
