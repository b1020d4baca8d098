//! Deterministic, pure logic shared by the orchestrator.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! values and return deterministic outputs suitable for tests.

pub mod backend;
pub mod frontmatter;
pub mod marker;
pub mod plan;
pub mod settings;
