//! CLI Exit Code Registry
//!
//! Single source of truth for `incimap` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                          |
//! |------|--------------------------------------------------|
//! | 0    | Success                                          |
//! | 1    | General error (unspecified)                      |
//! | 2    | Usage error (bad args, no input file configured) |
//! | 3    | Config could not be parsed or validated          |
//! | 4    | Runtime error (unreadable CSV, write failure)    |
//! | 5    | No incident resolved (`--require-matches`)       |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Config TOML failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// IO / CSV failure while loading inputs or writing outputs.
pub const EXIT_RUNTIME: u8 = 4;

/// `--require-matches` was passed and no incident received coordinates.
pub const EXIT_NO_MATCHES: u8 = 5;
