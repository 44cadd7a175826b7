//! Operation selection: keeps the filtered paths and operations, then the
//! tags they still use.

use std::collections::HashSet;

use extract_openapi_spec::{Document, OperationKind};

use crate::error::PruneError;
use crate::filter::{OperationSelection, PathFilter};

/// What [`select`] removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionSummary {
    /// Paths dropped because the filter does not name them.
    pub paths_removed: usize,
    /// Operations dropped from selected paths.
    pub operations_removed: usize,
    /// Document-level tags no retained operation refers to.
    pub tags_removed: usize,
}

/// Remove every path and operation the filter does not select, then every
/// tag no surviving operation uses.
///
/// The whole filter is validated first; on error the document is untouched.
pub fn select(
    document: &mut Document,
    filter: &PathFilter,
) -> Result<SelectionSummary, PruneError> {
    validate(document, filter)?;

    let mut summary = SelectionSummary::default();

    let unselected: Vec<String> = document
        .paths
        .keys()
        .filter(|path| !filter.contains_path(path))
        .cloned()
        .collect();
    for path in unselected {
        if document.paths.shift_remove(&path).is_none() {
            return Err(PruneError::Inconsistency(format!(
                "can't remove path '{}'",
                path
            )));
        }
        summary.paths_removed += 1;
    }

    for (path, selection) in filter.iter() {
        let OperationSelection::Only(_) = selection else {
            continue;
        };
        let item = document.paths.get_mut(path).ok_or_else(|| {
            PruneError::Inconsistency(format!("selected path '{}' disappeared", path))
        })?;

        let unselected: Vec<OperationKind> = item
            .operations
            .keys()
            .copied()
            .filter(|kind| !selection.keeps(*kind))
            .collect();
        for kind in unselected {
            if item.operations.shift_remove(&kind).is_none() {
                return Err(PruneError::Inconsistency(format!(
                    "can't remove operation '{}' for path '{}'",
                    kind, path
                )));
            }
            summary.operations_removed += 1;
        }
    }

    summary.tags_removed = retain_used_tags(document);

    tracing::debug!(
        paths_removed = summary.paths_removed,
        operations_removed = summary.operations_removed,
        tags_removed = summary.tags_removed,
        "operations selected"
    );

    Ok(summary)
}

/// Check every filter path and every named operation against the document.
fn validate(document: &Document, filter: &PathFilter) -> Result<(), PruneError> {
    let unknown_paths: Vec<String> = filter
        .iter()
        .map(|(path, _)| path)
        .filter(|path| !document.paths.contains_key(*path))
        .map(|path| path.to_string())
        .collect();
    if !unknown_paths.is_empty() {
        return Err(PruneError::UnknownPaths(unknown_paths));
    }

    let mut unknown_operations = Vec::new();
    for (path, selection) in filter.iter() {
        let OperationSelection::Only(kinds) = selection else {
            continue;
        };
        let Some(item) = document.paths.get(path) else {
            continue;
        };
        for kind in kinds {
            if !item.operations.contains_key(kind) {
                unknown_operations.push((path.to_string(), *kind));
            }
        }
    }
    if !unknown_operations.is_empty() {
        return Err(PruneError::UnknownOperations(unknown_operations));
    }

    Ok(())
}

/// Drop document-level tags that no remaining operation refers to, keeping
/// the original order. Returns how many were dropped.
fn retain_used_tags(document: &mut Document) -> usize {
    let used: HashSet<&str> = document
        .paths
        .values()
        .flat_map(|item| item.operations.values())
        .flat_map(|operation| operation.tags.iter().map(String::as_str))
        .collect();

    let before = document.tags.len();
    document.tags.retain(|tag| used.contains(tag.name.as_str()));
    before - document.tags.len()
}
