//! In-memory OpenAPI document graph.
//!
//! Every schema node lives in the document's [`SchemaArena`] and is addressed
//! by a [`SchemaId`]. Named definitions from `components.schemas` are
//! allocated once; every `$ref` to them resolves to that same id, so node
//! identity (not structural equality) tells two uses of a definition apart
//! from two look-alike inline schemas.

use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::UnknownOperationKind;

/// A parsed OpenAPI 3.x document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// The `openapi` version string (e.g. "3.0.3").
    pub openapi: String,
    /// Path template -> path item, in document order.
    pub paths: IndexMap<String, PathItem>,
    /// Document-level tag declarations, in document order.
    pub tags: Vec<Tag>,
    /// The `components` object.
    pub components: Components,
    /// Storage for every schema node reachable from the document.
    pub schemas: SchemaArena,
    /// Every other root field (info, servers, security, extensions, ...), verbatim.
    pub extra: Map<String, Value>,
}

impl Document {
    /// Total number of operations across all paths.
    pub fn operation_count(&self) -> usize {
        self.paths.values().map(|item| item.operations.len()).sum()
    }

    /// Resolve a parameter that may be a `$ref` into `components.parameters`.
    pub fn resolve_parameter<'a>(
        &'a self,
        param: &'a Referable<Parameter>,
    ) -> Option<&'a Parameter> {
        match param {
            Referable::Item(param) => Some(param),
            Referable::Ref(name) => self.components.parameters.get(name),
        }
    }

    /// Resolve a request body that may be a `$ref` into `components.requestBodies`.
    pub fn resolve_request_body<'a>(
        &'a self,
        body: &'a Referable<RequestBody>,
    ) -> Option<&'a RequestBody> {
        match body {
            Referable::Item(body) => Some(body),
            Referable::Ref(name) => self.components.request_bodies.get(name),
        }
    }

    /// Resolve a response that may be a `$ref` into `components.responses`.
    pub fn resolve_response<'a>(
        &'a self,
        response: &'a Referable<Response>,
    ) -> Option<&'a Response> {
        match response {
            Referable::Item(response) => Some(response),
            Referable::Ref(name) => self.components.responses.get(name),
        }
    }
}

/// The `components` object.
///
/// Only the tables that can lead to schemas are modeled; everything else
/// (security schemes, examples, headers, ...) is kept verbatim in `extra`.
#[derive(Debug, Clone, Default)]
pub struct Components {
    /// Named schema definitions: name -> arena id.
    pub schemas: IndexMap<String, SchemaId>,
    /// Reusable parameters.
    pub parameters: IndexMap<String, Parameter>,
    /// Reusable request bodies.
    pub request_bodies: IndexMap<String, RequestBody>,
    /// Reusable responses.
    pub responses: IndexMap<String, Response>,
    /// Every other components table, verbatim.
    pub extra: Map<String, Value>,
}

impl Components {
    /// True when there is nothing left to write.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
            && self.parameters.is_empty()
            && self.request_bodies.is_empty()
            && self.responses.is_empty()
            && self.extra.is_empty()
    }
}

/// A document-level tag declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    /// The tag name operations refer to.
    pub name: String,
    /// description, externalDocs, extensions.
    pub extra: Map<String, Value>,
}

/// A path item: the operations available on one path template.
#[derive(Debug, Clone, Default)]
pub struct PathItem {
    /// Operations keyed by HTTP method, in document order.
    pub operations: IndexMap<OperationKind, Operation>,
    /// Path-level parameters shared by every operation of the path.
    pub parameters: Vec<Referable<Parameter>>,
    /// summary, description, servers, extensions.
    pub extra: Map<String, Value>,
}

/// The HTTP methods an OpenAPI path item can hold.
///
/// Includes `query` from OpenAPI 3.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationKind {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
    Query,
}

impl OperationKind {
    /// Every operation kind, in the order the OpenAPI specification lists them.
    pub const ALL: [OperationKind; 9] = [
        OperationKind::Get,
        OperationKind::Put,
        OperationKind::Post,
        OperationKind::Delete,
        OperationKind::Options,
        OperationKind::Head,
        OperationKind::Patch,
        OperationKind::Trace,
        OperationKind::Query,
    ];

    /// The lowercase key used in a path item.
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Get => "get",
            OperationKind::Put => "put",
            OperationKind::Post => "post",
            OperationKind::Delete => "delete",
            OperationKind::Options => "options",
            OperationKind::Head => "head",
            OperationKind::Patch => "patch",
            OperationKind::Trace => "trace",
            OperationKind::Query => "query",
        }
    }

    /// Exact match against a path item key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == key)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = UnknownOperationKind;

    /// Case-insensitive, so `GET` and `get` both work on the command line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownOperationKind(s.to_string()))
    }
}

/// A single operation under a path.
#[derive(Debug, Clone, Default)]
pub struct Operation {
    /// Tag names, in document order.
    pub tags: Vec<String>,
    /// Operation-level parameters.
    pub parameters: Vec<Referable<Parameter>>,
    /// The request body, if any.
    pub request_body: Option<Referable<RequestBody>>,
    /// Status code (or `default`) -> response, in document order.
    pub responses: IndexMap<String, Referable<Response>>,
    /// operationId, summary, security, callbacks, extensions, ...
    pub extra: Map<String, Value>,
}

/// Either an inline object or a `$ref` to a named entry of the matching
/// components table.
#[derive(Debug, Clone, PartialEq)]
pub enum Referable<T> {
    /// Component name (the last segment of the `$ref`).
    Ref(String),
    /// Inline object.
    Item(T),
}

/// A parameter object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameter {
    /// The `schema` field.
    pub schema: Option<SchemaId>,
    /// The `content` field: media type -> media type object.
    pub content: IndexMap<String, MediaType>,
    /// name, in, required, style, examples, ...
    pub extra: Map<String, Value>,
}

/// A request body object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestBody {
    /// Media type -> media type object.
    pub content: IndexMap<String, MediaType>,
    /// description, required, extensions.
    pub extra: Map<String, Value>,
}

/// A response object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    /// Media type -> media type object.
    pub content: IndexMap<String, MediaType>,
    /// description, headers, links, extensions.
    pub extra: Map<String, Value>,
}

/// A media type object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaType {
    /// The `schema` field.
    pub schema: Option<SchemaId>,
    /// example, examples, encoding, extensions.
    pub extra: Map<String, Value>,
}

/// Stable identity of a schema node inside a [`SchemaArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(usize);

impl SchemaId {
    /// Position of the node in its arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A schema node.
///
/// The structural keywords that can lead to other schemas are modeled as
/// arena ids; every other keyword is kept verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    /// Component name when this node is a definition in `components.schemas`.
    pub name: Option<String>,
    /// OpenAPI 3.1 boolean schema (`true` / `false`).
    pub boolean: Option<bool>,
    /// `properties`: property name -> schema.
    pub properties: IndexMap<String, SchemaId>,
    /// `items` of an array schema.
    pub items: Option<SchemaId>,
    /// `allOf` members.
    pub all_of: Vec<SchemaId>,
    /// `oneOf` members.
    pub one_of: Vec<SchemaId>,
    /// `anyOf` members.
    pub any_of: Vec<SchemaId>,
    /// `not`.
    pub not: Option<SchemaId>,
    /// Target of a `$ref` to a named definition, when this node is an alias
    /// (`Foo: {$ref: Bar}`) or a reference carrying sibling keywords.
    pub alias: Option<SchemaId>,
    /// Every other keyword, verbatim.
    pub extra: Map<String, Value>,
    /// Keys in the order they appeared in the source.
    pub key_order: Vec<String>,
}

impl Schema {
    /// True for definitions from `components.schemas`.
    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }
}

/// Append-only storage for schema nodes.
///
/// Nodes are never freed: pruning only drops entries from
/// `components.schemas`, so ids stay valid for the whole invocation.
#[derive(Debug, Clone, Default)]
pub struct SchemaArena {
    nodes: Vec<Schema>,
}

impl SchemaArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node and return its id.
    pub fn alloc(&mut self, schema: Schema) -> SchemaId {
        self.nodes.push(schema);
        SchemaId(self.nodes.len() - 1)
    }

    /// Get a node by id.
    pub fn get(&self, id: SchemaId) -> Option<&Schema> {
        self.nodes.get(id.0)
    }

    /// Get a node mutably by id.
    pub fn get_mut(&mut self, id: SchemaId) -> Option<&mut Schema> {
        self.nodes.get_mut(id.0)
    }

    /// Number of nodes ever allocated.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if no node was allocated.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Index<SchemaId> for SchemaArena {
    type Output = Schema;

    fn index(&self, id: SchemaId) -> &Schema {
        &self.nodes[id.0]
    }
}
