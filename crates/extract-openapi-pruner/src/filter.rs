//! Path/operation filter.
//!
//! A filter maps each path to keep onto either every operation of that path
//! or an explicit set of operation kinds. On the command line a filter entry
//! is written `path[=operation1[,operation2,...]]`.

use std::collections::BTreeSet;

use extract_openapi_spec::OperationKind;
use indexmap::IndexMap;

use crate::error::FilterError;

/// Which operations of a selected path survive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationSelection {
    /// No restriction: every operation of the path is kept.
    All,
    /// Only these operation kinds are kept.
    Only(BTreeSet<OperationKind>),
}

impl OperationSelection {
    /// Whether an operation of this kind survives.
    pub fn keeps(&self, kind: OperationKind) -> bool {
        match self {
            OperationSelection::All => true,
            OperationSelection::Only(kinds) => kinds.contains(&kind),
        }
    }
}

/// Paths (and optionally operations) to keep, in the order they were given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathFilter {
    entries: IndexMap<String, OperationSelection>,
}

impl PathFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a list of `path[=op[,op...]]` specs, rejecting duplicates.
    pub fn parse_specs<I, S>(specs: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::new();
        for spec in specs {
            let spec = spec.as_ref();
            let (path, selection) = parse_spec(spec)?;
            if filter.entries.contains_key(&path) {
                return Err(FilterError::DuplicatePath {
                    path,
                    spec: spec.to_string(),
                });
            }
            filter.entries.insert(path, selection);
        }
        Ok(filter)
    }

    /// Keep every operation of `path`.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.entries.insert(path.into(), OperationSelection::All);
        self
    }

    /// Keep only the given operations of `path`.
    pub fn with_operations(
        mut self,
        path: impl Into<String>,
        kinds: impl IntoIterator<Item = OperationKind>,
    ) -> Self {
        self.entries
            .insert(path.into(), OperationSelection::Only(kinds.into_iter().collect()));
        self
    }

    /// Whether the path is selected.
    pub fn contains_path(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Iterate over `(path, selection)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OperationSelection)> {
        self.entries.iter().map(|(path, sel)| (path.as_str(), sel))
    }

    /// Number of selected paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no path is selected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse one `path[=op[,op...]]` spec.
pub fn parse_spec(spec: &str) -> Result<(String, OperationSelection), FilterError> {
    let parts: Vec<&str> = spec.split('=').collect();
    let (path, operations) = match parts.as_slice() {
        [path] => (*path, None),
        [path, operations] => (*path, Some(*operations)),
        _ => return Err(FilterError::InvalidSpec(spec.to_string())),
    };

    if path.is_empty() {
        return Err(FilterError::EmptyPath(spec.to_string()));
    }

    let selection = match operations {
        None => OperationSelection::All,
        Some(operations) => OperationSelection::Only(
            operations
                .split(',')
                .map(|op| {
                    op.parse::<OperationKind>()
                        .map_err(|_| FilterError::UnknownOperationKind {
                            operation: op.to_string(),
                            spec: spec.to_string(),
                        })
                })
                .collect::<Result<_, _>>()?,
        ),
    };

    Ok((path.to_string(), selection))
}
