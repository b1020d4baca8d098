//! Drive AI coding-agent CLIs through a queue of markdown task files.
//!
//! - **[`core`]**: pure logic (backend command lines, settings, frontmatter,
//!   completion marker). No I/O.
//! - **[`io`]**: side effects (config and task files, child processes,
//!   notifications).
//! - **[`ui`]**: a small raw-mode terminal toolkit (framed lines, prompts,
//!   spinner).
//!
//! [`looping`] is the iteration state machine; [`run`] and [`init`] implement
//! the CLI commands on top of it.

pub mod core;
pub mod exit_codes;
pub mod init;
pub mod io;
pub mod logging;
pub mod looping;
pub mod run;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod ui;
