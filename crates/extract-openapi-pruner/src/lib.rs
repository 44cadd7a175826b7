//! Reduces an OpenAPI document to a selected set of paths and operations.
//!
//! Runs in two passes over a parsed [`Document`]:
//! 1. [`select`] drops unselected paths and operations, then unused tags;
//! 2. [`shake`] drops every named schema the remaining operations cannot
//!    reach, and the component parameters, request bodies and responses they
//!    no longer refer to.
//!
//! The document is only ever shrunk. Filter validation happens before the
//! first removal, so a failed run leaves the document as it was.

pub mod error;
pub mod filter;
pub mod reachability;
pub mod selector;

pub use error::{FilterError, PruneError};
pub use filter::{parse_spec, OperationSelection, PathFilter};
pub use reachability::{collect_seeds, reachable_schemas, shake, ShakeSummary};
pub use selector::{select, SelectionSummary};

use extract_openapi_spec::Document;

/// Result of a full [`prune`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneSummary {
    /// What the operation selection removed.
    pub selection: SelectionSummary,
    /// What the schema shake found and removed.
    pub shake: ShakeSummary,
}

/// Select the filtered paths and operations, then drop unreachable schemas.
pub fn prune(document: &mut Document, filter: &PathFilter) -> Result<PruneSummary, PruneError> {
    let selection = select(document, filter)?;
    let shake = shake(document)?;
    Ok(PruneSummary { selection, shake })
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract_openapi_spec::{
        parse_document, to_value, write_document, OperationKind, OutputFormat,
    };

    const PETSTORE: &str = include_str!("../../../tests/fixtures/petstore.yaml");

    const STORE: &str = r##"
openapi: "3.0.3"
info:
  title: Store
  version: "1.0.0"
tags:
  - name: orders
  - name: customers
paths:
  /a:
    get:
      tags: [orders]
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Order'
    post:
      tags: [orders]
      requestBody:
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/NewOrder'
      responses:
        "201":
          description: created
  /b:
    get:
      tags: [customers]
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Customer'
components:
  schemas:
    Order:
      type: object
      properties:
        customer:
          $ref: '#/components/schemas/Customer'
        lines:
          type: array
          items:
            $ref: '#/components/schemas/Line'
    NewOrder:
      type: object
      properties:
        lines:
          type: array
          items:
            $ref: '#/components/schemas/Line'
    Line:
      type: object
      properties:
        sku:
          type: string
    Customer:
      type: object
      properties:
        name:
          type: string
    Unused:
      type: string
"##;

    fn schema_names(doc: &Document) -> Vec<&str> {
        doc.components.schemas.keys().map(String::as_str).collect()
    }

    #[test]
    fn prune_single_operation() {
        let mut doc = parse_document(STORE).unwrap();
        let filter = PathFilter::parse_specs(["/a=get"]).unwrap();

        let summary = prune(&mut doc, &filter).unwrap();

        assert_eq!(doc.paths.keys().collect::<Vec<_>>(), vec!["/a"]);
        assert_eq!(
            doc.paths["/a"].operations.keys().copied().collect::<Vec<_>>(),
            vec![OperationKind::Get]
        );
        assert_eq!(schema_names(&doc), vec!["Order", "Line", "Customer"]);
        assert_eq!(doc.tags.len(), 1);
        assert_eq!(summary.selection.paths_removed, 1);
        assert_eq!(summary.selection.operations_removed, 1);
        assert_eq!(summary.shake.schemas_removed, 2);
    }

    #[test]
    fn prune_unrestricted_path() {
        let mut doc = parse_document(STORE).unwrap();
        let filter = PathFilter::parse_specs(["/a"]).unwrap();

        prune(&mut doc, &filter).unwrap();

        assert_eq!(doc.paths["/a"].operations.len(), 2);
        assert_eq!(
            schema_names(&doc),
            vec!["Order", "NewOrder", "Line", "Customer"]
        );
    }

    #[test]
    fn unknown_path_leaves_document_untouched() {
        let mut doc = parse_document(STORE).unwrap();
        let before = to_value(&doc);
        let filter = PathFilter::parse_specs(["/a", "/c"]).unwrap();

        let err = prune(&mut doc, &filter).unwrap_err();

        assert_eq!(err, PruneError::UnknownPaths(vec!["/c".into()]));
        assert_eq!(to_value(&doc), before);
    }

    #[test]
    fn prune_is_idempotent() {
        let mut doc = parse_document(STORE).unwrap();
        let filter = PathFilter::parse_specs(["/a=post", "/b"]).unwrap();

        prune(&mut doc, &filter).unwrap();
        let once = to_value(&doc);
        let second = prune(&mut doc, &filter).unwrap();

        assert_eq!(to_value(&doc), once);
        assert_eq!(second.selection, SelectionSummary::default());
        assert_eq!(second.shake.schemas_removed, 0);
    }

    #[test]
    fn pruned_output_parses_back_without_dangling_refs() {
        let mut doc = parse_document(PETSTORE).unwrap();
        let filter = PathFilter::parse_specs(["/pets/{petId}=get"]).unwrap();
        let summary = prune(&mut doc, &filter).unwrap();

        let yaml = write_document(&doc, OutputFormat::Yaml).unwrap();
        let reparsed = parse_document(&yaml).unwrap();

        assert_eq!(to_value(&reparsed), to_value(&doc));
        assert_eq!(schema_names(&reparsed), vec!["Pet", "Category", "User"]);
        assert!(reparsed.components.parameters.is_empty());
        assert!(reparsed.components.responses.is_empty());
        assert_eq!(summary.shake.components_removed, 2);
        // Nothing left in the written text points at a removed component.
        for removed in ["NewPet", "Order", "Error", "Limit"] {
            assert!(!yaml.contains(removed), "{} still in output", removed);
        }
    }

    #[test]
    fn referenced_components_survive_pruning() {
        let mut doc = parse_document(PETSTORE).unwrap();
        let filter = PathFilter::parse_specs(["/pets=get"]).unwrap();

        prune(&mut doc, &filter).unwrap();

        assert!(doc.components.parameters.contains_key("Limit"));
        assert!(doc.components.responses.contains_key("Error"));
        assert_eq!(schema_names(&doc), vec!["Pet", "Category", "User", "Error"]);
    }
}
