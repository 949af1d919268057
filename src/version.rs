//! Harness version information.
//!
//! Exposes the crate version as a single constant so the CLI and the JSON
//! report agree on the same value.

/// The functest version string (for example, `0.1.0`).
pub const FUNCTEST_VERSION: &str = env!("CARGO_PKG_VERSION");
