//! Stable exit codes for woof CLI commands.

/// Command succeeded (including a loop that ran out of iterations).
pub const OK: i32 = 0;
/// Invalid arguments, config, task files, or any other fatal error.
pub const INVALID: i32 = 1;
/// `woof run` stopped after too many failed agent runs in a row, or an
/// interactive session exited non-zero.
pub const AGENT_FAILED: i32 = 3;
/// An interactive prompt was cancelled with Ctrl-C or Escape.
pub const CANCELLED: i32 = 130;
