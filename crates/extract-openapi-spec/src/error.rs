use thiserror::Error;

/// Errors produced while reading a document (E1001, E1002, E1004).
///
/// An unresolved `$ref` (E1003) is only a warning: the reference is kept verbatim.
#[derive(Debug, Error)]
pub enum ParseError {
    /// E1001: Input is not an OpenAPI 3.x document.
    #[error("E1001: not a valid OpenAPI 3.x document")]
    UnknownFormat,

    /// E1001: Input is an OpenAPI document of a version this tool does not read.
    #[error("E1001: unsupported OpenAPI version: {0} (only 3.x supported)")]
    UnsupportedVersion(String),

    /// E1002: YAML/JSON parse error.
    #[error("E1002: parse error: {0}")]
    ParseError(String),

    /// E1004: Structural error in the document.
    #[error("E1004: schema error: {0}")]
    SchemaError(String),

    /// I/O error reading the document file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced while writing a document.
#[derive(Debug, Error)]
pub enum WriteError {
    /// YAML serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A string that does not name an HTTP operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operation kind '{0}'")]
pub struct UnknownOperationKind(pub String);
