//! Serializes a [`Document`] back to YAML or JSON.
//!
//! Named definitions are written as `$ref`s at every use site and in full
//! under `components.schemas`. Modeled fields are emitted in the usual
//! OpenAPI order; verbatim fields keep their source order.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::WriteError;
use crate::model::{
    Document, MediaType, Operation, Parameter, PathItem, Referable, RequestBody, Response,
    SchemaArena, SchemaId,
};

/// Root fields written before `paths`.
const LEADING_ROOT_FIELDS: &[&str] = &["info", "jsonSchemaDialect", "servers"];

/// Textual output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// YAML (default).
    #[default]
    Yaml,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Serialize a document to text in the given format.
pub fn write_document(document: &Document, format: OutputFormat) -> Result<String, WriteError> {
    let value = to_value(document);
    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(&value)?),
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(&value)?;
            out.push('\n');
            Ok(out)
        }
    }
}

/// Convert a document into a JSON value tree.
pub fn to_value(document: &Document) -> Value {
    let writer = Writer {
        arena: &document.schemas,
    };
    let mut root = Map::new();

    root.insert("openapi".into(), Value::String(document.openapi.clone()));
    for key in LEADING_ROOT_FIELDS {
        if let Some(value) = document.extra.get(*key) {
            root.insert((*key).to_string(), value.clone());
        }
    }

    let paths = document
        .paths
        .iter()
        .map(|(path, item)| (path.clone(), writer.path_item(item)))
        .collect();
    root.insert("paths".into(), Value::Object(paths));

    if !document.components.is_empty() {
        root.insert("components".into(), writer.components(document));
    }

    if !document.tags.is_empty() {
        let tags = document
            .tags
            .iter()
            .map(|tag| {
                let mut obj = Map::new();
                obj.insert("name".into(), Value::String(tag.name.clone()));
                obj.extend(tag.extra.clone());
                Value::Object(obj)
            })
            .collect();
        root.insert("tags".into(), Value::Array(tags));
    }

    for (key, value) in &document.extra {
        if !root.contains_key(key) {
            root.insert(key.clone(), value.clone());
        }
    }

    Value::Object(root)
}

/// Encode a component name as a JSON pointer segment.
fn escape(name: &str) -> String {
    name.replace('~', "~0").replace('/', "~1")
}

fn reference(prefix: &str, name: &str) -> Value {
    let mut obj = Map::new();
    obj.insert("$ref".into(), Value::String(format!("{}{}", prefix, escape(name))));
    Value::Object(obj)
}

struct Writer<'a> {
    arena: &'a SchemaArena,
}

impl Writer<'_> {
    fn components(&self, document: &Document) -> Value {
        let components = &document.components;
        let mut obj = Map::new();

        if !components.schemas.is_empty() {
            let schemas = components
                .schemas
                .iter()
                .map(|(name, id)| (name.clone(), self.schema_body(*id)))
                .collect();
            obj.insert("schemas".into(), Value::Object(schemas));
        }
        if !components.responses.is_empty() {
            let responses = components
                .responses
                .iter()
                .map(|(name, response)| (name.clone(), self.response(response)))
                .collect();
            obj.insert("responses".into(), Value::Object(responses));
        }
        if !components.parameters.is_empty() {
            let parameters = components
                .parameters
                .iter()
                .map(|(name, param)| (name.clone(), self.parameter(param)))
                .collect();
            obj.insert("parameters".into(), Value::Object(parameters));
        }
        if !components.request_bodies.is_empty() {
            let bodies = components
                .request_bodies
                .iter()
                .map(|(name, body)| (name.clone(), self.request_body(body)))
                .collect();
            obj.insert("requestBodies".into(), Value::Object(bodies));
        }
        obj.extend(components.extra.clone());

        Value::Object(obj)
    }

    fn path_item(&self, item: &PathItem) -> Value {
        let mut obj = item.extra.clone();
        for (kind, operation) in &item.operations {
            obj.insert(kind.as_str().to_string(), self.operation(operation));
        }
        if !item.parameters.is_empty() {
            obj.insert("parameters".into(), self.parameters(&item.parameters));
        }
        Value::Object(obj)
    }

    fn operation(&self, operation: &Operation) -> Value {
        let mut obj = Map::new();
        if !operation.tags.is_empty() {
            let tags = operation.tags.iter().cloned().map(Value::String).collect();
            obj.insert("tags".into(), Value::Array(tags));
        }
        obj.extend(operation.extra.clone());
        if !operation.parameters.is_empty() {
            obj.insert("parameters".into(), self.parameters(&operation.parameters));
        }
        if let Some(body) = &operation.request_body {
            let value = match body {
                Referable::Ref(name) => reference("#/components/requestBodies/", name),
                Referable::Item(body) => self.request_body(body),
            };
            obj.insert("requestBody".into(), value);
        }
        let responses = operation
            .responses
            .iter()
            .map(|(status, response)| {
                let value = match response {
                    Referable::Ref(name) => reference("#/components/responses/", name),
                    Referable::Item(response) => self.response(response),
                };
                (status.clone(), value)
            })
            .collect();
        obj.insert("responses".into(), Value::Object(responses));
        Value::Object(obj)
    }

    fn parameters(&self, params: &[Referable<Parameter>]) -> Value {
        params
            .iter()
            .map(|param| match param {
                Referable::Ref(name) => reference("#/components/parameters/", name),
                Referable::Item(param) => self.parameter(param),
            })
            .collect()
    }

    fn parameter(&self, param: &Parameter) -> Value {
        let mut obj = param.extra.clone();
        if let Some(schema) = param.schema {
            obj.insert("schema".into(), self.schema(schema));
        }
        if !param.content.is_empty() {
            obj.insert("content".into(), self.content(&param.content));
        }
        Value::Object(obj)
    }

    fn request_body(&self, body: &RequestBody) -> Value {
        let mut obj = body.extra.clone();
        if !body.content.is_empty() {
            obj.insert("content".into(), self.content(&body.content));
        }
        Value::Object(obj)
    }

    fn response(&self, response: &Response) -> Value {
        let mut obj = response.extra.clone();
        if !response.content.is_empty() {
            obj.insert("content".into(), self.content(&response.content));
        }
        Value::Object(obj)
    }

    fn content(&self, content: &IndexMap<String, MediaType>) -> Value {
        let entries = content
            .iter()
            .map(|(media_type, media)| {
                let mut obj = Map::new();
                if let Some(schema) = media.schema {
                    obj.insert("schema".into(), self.schema(schema));
                }
                obj.extend(media.extra.clone());
                (media_type.clone(), Value::Object(obj))
            })
            .collect();
        Value::Object(entries)
    }

    /// A schema at a use site: named definitions become `$ref`s.
    fn schema(&self, id: SchemaId) -> Value {
        match self.arena.get(id).and_then(|s| s.name.as_deref()) {
            Some(name) => reference("#/components/schemas/", name),
            None => self.schema_body(id),
        }
    }

    /// The full body of a schema node, keys in source order.
    fn schema_body(&self, id: SchemaId) -> Value {
        let Some(schema) = self.arena.get(id) else {
            return Value::Object(Map::new());
        };
        if let Some(b) = schema.boolean {
            return Value::Bool(b);
        }

        let list = |ids: &[SchemaId]| Value::Array(ids.iter().map(|id| self.schema(*id)).collect());

        let mut obj = Map::new();
        for key in &schema.key_order {
            let value = match key.as_str() {
                "properties" => Some(Value::Object(
                    schema
                        .properties
                        .iter()
                        .map(|(prop, id)| (prop.clone(), self.schema(*id)))
                        .collect(),
                )),
                "$ref" if schema.alias.is_some() => {
                    schema.alias.and_then(|id| self.schema(id).get("$ref").cloned())
                }
                "items" if schema.items.is_some() => schema.items.map(|id| self.schema(id)),
                "allOf" => Some(list(&schema.all_of)),
                "oneOf" => Some(list(&schema.one_of)),
                "anyOf" => Some(list(&schema.any_of)),
                "not" => schema.not.map(|id| self.schema(id)),
                _ => schema.extra.get(key).cloned(),
            };
            if let Some(value) = value {
                obj.insert(key.clone(), value);
            }
        }
        Value::Object(obj)
    }
}
