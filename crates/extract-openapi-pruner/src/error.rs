use extract_openapi_spec::OperationKind;
use thiserror::Error;

/// Errors produced while pruning a document.
///
/// Validation errors are raised before the document is touched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PruneError {
    /// E2001: Filter paths that the document does not declare.
    #[error("E2001: path(s) not found in the document: {}", .0.join(", "))]
    UnknownPaths(Vec<String>),

    /// E2002: Filter operations that the path does not declare.
    #[error("E2002: operation(s) not found in the document: {}", format_operations(.0))]
    UnknownOperations(Vec<(String, OperationKind)>),

    /// E2003: A removal the invariants guarantee could not be applied.
    #[error("E2003: internal consistency error: {0}")]
    Inconsistency(String),
}

fn format_operations(operations: &[(String, OperationKind)]) -> String {
    operations
        .iter()
        .map(|(path, kind)| format!("{} {}", kind.as_str().to_uppercase(), path))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors produced while parsing `path[=op[,op...]]` filter specs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// E2010: More than one `=` in a spec.
    #[error(
        "E2010: invalid path filter specification: '{0}'. \
         Expected: path[=operation1[,operation2,...]]"
    )]
    InvalidSpec(String),

    /// E2011: The same path given twice.
    #[error("E2011: duplicate path filter specification: '{path}' in '{spec}'")]
    DuplicatePath { path: String, spec: String },

    /// E2012: Operation name that is not an HTTP method.
    #[error("E2012: unknown operation '{operation}' in '{spec}'")]
    UnknownOperationKind { operation: String, spec: String },

    /// E2013: Spec with an empty path.
    #[error("E2013: empty path in filter specification: '{0}'")]
    EmptyPath(String),
}
