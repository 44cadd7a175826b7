//! OpenAPI 3.x document graph.
//!
//! Reads YAML/JSON documents into a [`Document`] whose schemas live in an
//! arena, so that every `$ref` to a named schema shares the identity of the
//! definition it points to. The writer turns the graph back into YAML or JSON.

pub mod error;
pub mod model;
pub mod parser;
pub mod writer;

pub use error::{ParseError, UnknownOperationKind, WriteError};
pub use model::{
    Components, Document, MediaType, Operation, OperationKind, Parameter, PathItem, Referable,
    RequestBody, Response, Schema, SchemaArena, SchemaId, Tag,
};
pub use parser::{parse_document, parse_document_file};
pub use writer::{to_value, write_document, OutputFormat};
