//! Exit codes for the CLI
//!
//! Standard exit codes used by the benchlens CLI for CI/CD integration.
//!
//! # Exit Code Reference
//!
//! | Code | Constant | Meaning | Example |
//! |------|----------|---------|---------|
//! | 0 | `SUCCESS` | Success | Every selected check passed or was informational |
//! | 1 | `FAILED_CHECKS` | Failed checks | A scored check is FAIL, or a catalog has problems |
//! | 2 | `WARNINGS` | Warnings | A check is WARN and `--fail-on-warn` was given |
//! | 3 | `ERROR` | Runtime error | Catalog not found, invalid configuration |
//! | 4 | `INVALID_ARGS` | Invalid arguments | `--group` together with `--check` |

/// Success - no failed checks, or the command completed normally.
pub const SUCCESS: i32 = 0;

/// At least one check ended in FAIL.
///
/// Also used by `validate` when a catalog contains unusable definitions.
pub const FAILED_CHECKS: i32 = 1;

/// At least one check ended in WARN and `--fail-on-warn` was given.
pub const WARNINGS: i32 = 2;

/// Runtime error (catalog not found, invalid YAML or TOML, write failure).
pub const ERROR: i32 = 3;

/// Invalid combination of arguments.
pub const INVALID_ARGS: i32 = 4;
