//! Schema reachability: finds the named schemas the retained operations
//! depend on and drops the rest from `components.schemas`. Component
//! parameters, request bodies and responses no retained operation refers to
//! are dropped as well.
//!
//! Traversal rule for a candidate schema:
//! - a named definition is marked, and if it was not marked before, each of
//!   its properties and its alias target become candidates;
//! - otherwise, an array whose `items` is a named definition marks `items`
//!   the same way (inline items are not descended);
//! - otherwise every `allOf`/`oneOf`/`anyOf` member, the `not` schema, the
//!   `$ref` target and every property becomes a candidate.
//!
//! Marks are keyed by [`SchemaId`], so cycles terminate and the result does
//! not depend on visiting order.

use std::collections::HashSet;

use extract_openapi_spec::{Document, MediaType, Parameter, Referable, SchemaArena, SchemaId};
use indexmap::IndexMap;

use crate::error::PruneError;

/// What [`shake`] found and removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShakeSummary {
    /// Schemas used directly by retained operations.
    pub seeds: usize,
    /// Named schemas kept.
    pub schemas_kept: usize,
    /// Named schemas removed.
    pub schemas_removed: usize,
    /// Component parameters, request bodies and responses removed.
    pub components_removed: usize,
}

/// Remove every named schema that no retained operation can reach, and
/// every component parameter, request body or response no retained
/// operation refers to.
pub fn shake(document: &mut Document) -> Result<ShakeSummary, PruneError> {
    let seeds = collect_seeds(document)?;
    let reachable = reachable_schemas(&document.schemas, seeds.iter().copied());

    let used = referenced_components(document);
    let components = &mut document.components;
    let components_removed =
        retain_referenced(&mut components.parameters, &used.parameters, "parameter")?
            + retain_referenced(
                &mut components.request_bodies,
                &used.request_bodies,
                "request body",
            )?
            + retain_referenced(&mut components.responses, &used.responses, "response")?;

    let reachable_names: HashSet<String> = components
        .schemas
        .iter()
        .filter(|(_, id)| reachable.contains(*id))
        .map(|(name, _)| name.clone())
        .collect();
    let schemas_removed = retain_referenced(&mut components.schemas, &reachable_names, "schema")?;

    let summary = ShakeSummary {
        seeds: seeds.len(),
        schemas_kept: components.schemas.len(),
        schemas_removed,
        components_removed,
    };

    tracing::debug!(
        seeds = summary.seeds,
        schemas_kept = summary.schemas_kept,
        schemas_removed = summary.schemas_removed,
        components_removed = summary.components_removed,
        "schemas shaken"
    );

    Ok(summary)
}

/// Drop the entries of a components table whose names are not in `used`.
fn retain_referenced<T>(
    table: &mut IndexMap<String, T>,
    used: &HashSet<String>,
    kind: &str,
) -> Result<usize, PruneError> {
    let unused: Vec<String> = table
        .keys()
        .filter(|name| !used.contains(*name))
        .cloned()
        .collect();
    for name in &unused {
        if table.shift_remove(name).is_none() {
            return Err(PruneError::Inconsistency(format!(
                "can't remove {} '{}'",
                kind, name
            )));
        }
    }
    Ok(unused.len())
}

/// Names of the non-schema components the retained operations refer to.
#[derive(Debug, Default)]
struct ComponentRefs {
    parameters: HashSet<String>,
    request_bodies: HashSet<String>,
    responses: HashSet<String>,
}

fn referenced_components(document: &Document) -> ComponentRefs {
    let mut refs = ComponentRefs::default();
    for item in document.paths.values() {
        let operations = item.operations.values();
        let params = item
            .parameters
            .iter()
            .chain(operations.clone().flat_map(|op| &op.parameters));
        refs.parameters.extend(params.filter_map(ref_name));
        refs.request_bodies.extend(
            operations
                .clone()
                .filter_map(|op| op.request_body.as_ref())
                .filter_map(ref_name),
        );
        refs.responses
            .extend(operations.flat_map(|op| op.responses.values()).filter_map(ref_name));
    }
    refs
}

fn ref_name<T>(referable: &Referable<T>) -> Option<String> {
    match referable {
        Referable::Ref(name) => Some(name.clone()),
        Referable::Item(_) => None,
    }
}

/// Schemas used directly by the retained paths: path-level and operation
/// parameter schemas, and the content schemas of parameters, request bodies
/// and responses. Component `$ref`s are followed.
pub fn collect_seeds(document: &Document) -> Result<Vec<SchemaId>, PruneError> {
    let mut seeds = Vec::new();

    for (path, item) in &document.paths {
        for param in &item.parameters {
            let param = document.resolve_parameter(param).ok_or_else(|| {
                PruneError::Inconsistency(format!("unresolved parameter in {}", path))
            })?;
            parameter_schemas(param, &mut seeds);
        }

        for (kind, operation) in &item.operations {
            let location = format!("{} {}", kind.as_str().to_uppercase(), path);

            for param in &operation.parameters {
                let param = document.resolve_parameter(param).ok_or_else(|| {
                    PruneError::Inconsistency(format!("unresolved parameter in {}", location))
                })?;
                parameter_schemas(param, &mut seeds);
            }

            if let Some(body) = &operation.request_body {
                let body = document.resolve_request_body(body).ok_or_else(|| {
                    PruneError::Inconsistency(format!("unresolved request body in {}", location))
                })?;
                content_schemas(&body.content, &mut seeds);
            }

            for (status, response) in &operation.responses {
                let response = document.resolve_response(response).ok_or_else(|| {
                    PruneError::Inconsistency(format!(
                        "unresolved response {} in {}",
                        status, location
                    ))
                })?;
                content_schemas(&response.content, &mut seeds);
            }
        }
    }

    Ok(seeds)
}

fn parameter_schemas(param: &Parameter, seeds: &mut Vec<SchemaId>) {
    seeds.extend(param.schema);
    content_schemas(&param.content, seeds);
}

fn content_schemas(content: &IndexMap<String, MediaType>, seeds: &mut Vec<SchemaId>) {
    seeds.extend(content.values().filter_map(|media| media.schema));
}

/// Compute the set of named schemas reachable from `seeds`.
///
/// Uses an explicit worklist, so deep or cyclic schema graphs cannot
/// exhaust the stack.
pub fn reachable_schemas(
    arena: &SchemaArena,
    seeds: impl IntoIterator<Item = SchemaId>,
) -> HashSet<SchemaId> {
    let mut marked = HashSet::new();
    let mut pending: Vec<SchemaId> = seeds.into_iter().collect();

    while let Some(id) = pending.pop() {
        let Some(schema) = arena.get(id) else {
            continue;
        };

        if schema.is_named() {
            mark(arena, id, &mut marked, &mut pending);
        } else if let Some(items) = schema.items.filter(|items| is_named(arena, *items)) {
            mark(arena, items, &mut marked, &mut pending);
        } else {
            pending.extend(schema.all_of.iter().copied());
            pending.extend(schema.one_of.iter().copied());
            pending.extend(schema.any_of.iter().copied());
            pending.extend(schema.not);
            pending.extend(schema.alias);
            pending.extend(schema.properties.values().copied());
        }
    }

    marked
}

fn is_named(arena: &SchemaArena, id: SchemaId) -> bool {
    arena.get(id).is_some_and(|schema| schema.is_named())
}

/// Mark a named schema; the first time, queue its properties and alias target.
fn mark(
    arena: &SchemaArena,
    id: SchemaId,
    marked: &mut HashSet<SchemaId>,
    pending: &mut Vec<SchemaId>,
) {
    if !marked.insert(id) {
        return;
    }
    if let Some(schema) = arena.get(id) {
        pending.extend(schema.properties.values().copied());
        pending.extend(schema.alias);
    }
}
