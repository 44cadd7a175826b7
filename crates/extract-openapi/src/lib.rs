//! Library side of the `extract-openapi` binary.
//!
//! Loads an OpenAPI document from a file or URL, keeps only the requested
//! paths and operations along with the schemas they reach, and writes the
//! result as YAML or JSON.

pub mod extract;
pub mod source;

pub use extract::{extract, ExtractOptions, ExtractReport, RunError};
pub use source::{load_source, Source, SourceError, DEFAULT_TIMEOUT};
