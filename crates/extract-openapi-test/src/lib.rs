//! Test harness for the `extract-openapi` binary.
//!
//! Regression tests run the built binary against the shared fixtures in
//! `tests/fixtures`, including a mock HTTP server for remote sources.

#[cfg(test)]
pub mod cli;
