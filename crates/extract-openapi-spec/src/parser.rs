//! OpenAPI 3.x reader: YAML or JSON text into a [`Document`] graph.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::model::{
    Components, Document, MediaType, Operation, OperationKind, Parameter, PathItem, Referable,
    RequestBody, Response, Schema, SchemaArena, SchemaId, Tag,
};

const SCHEMAS_PREFIX: &str = "#/components/schemas/";
const PARAMETERS_PREFIX: &str = "#/components/parameters/";
const REQUEST_BODIES_PREFIX: &str = "#/components/requestBodies/";
const RESPONSES_PREFIX: &str = "#/components/responses/";

/// Parse an OpenAPI 3.x document from a YAML/JSON string.
pub fn parse_document(input: &str) -> Result<Document, ParseError> {
    // Parse YAML (also handles JSON since JSON is valid YAML)
    let root: Value =
        serde_yaml::from_str(input).map_err(|e| ParseError::ParseError(e.to_string()))?;

    let root_obj = root
        .as_object()
        .ok_or_else(|| ParseError::ParseError("document root must be an object".into()))?;

    let openapi = detect_version(root_obj)?;

    let components_obj = match root_obj.get("components") {
        Some(value) => Some(
            value
                .as_object()
                .ok_or_else(|| ParseError::SchemaError("'components' must be an object".into()))?,
        ),
        None => None,
    };

    let mut reader = Reader::new(components_obj)?;
    let components = reader.read_components(components_obj)?;
    let paths = reader.read_paths(root_obj)?;
    let tags = read_tags(root_obj)?;

    let extra = root_obj
        .iter()
        .filter(|(k, _)| !matches!(k.as_str(), "openapi" | "paths" | "tags" | "components"))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Ok(Document {
        openapi,
        paths,
        tags,
        components,
        schemas: reader.arena,
        extra,
    })
}

/// Parse a document from a file path.
pub fn parse_document_file(path: &std::path::Path) -> Result<Document, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_document(&content)
}

/// Extract the `openapi` version, rejecting anything but 3.x.
fn detect_version(root: &Map<String, Value>) -> Result<String, ParseError> {
    if let Some(version) = root.get("openapi").and_then(|v| v.as_str()) {
        if !version.starts_with("3.") {
            return Err(ParseError::UnsupportedVersion(version.to_string()));
        }
        Ok(version.to_string())
    } else if let Some(version) = root.get("swagger").and_then(|v| v.as_str()) {
        Err(ParseError::UnsupportedVersion(version.to_string()))
    } else {
        Err(ParseError::UnknownFormat)
    }
}

/// Decode a JSON pointer segment.
fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Names declared in a components table, used to check `$ref`s before the
/// table itself is read.
fn table_names(components: Option<&Map<String, Value>>, table: &str) -> HashSet<String> {
    components
        .and_then(|c| c.get(table))
        .and_then(|v| v.as_object())
        .map(|t| t.keys().cloned().collect())
        .unwrap_or_default()
}

fn as_object<'a>(value: &'a Value, location: &str) -> Result<&'a Map<String, Value>, ParseError> {
    value
        .as_object()
        .ok_or_else(|| ParseError::SchemaError(format!("{} must be an object", location)))
}

fn as_array<'a>(value: &'a Value, location: &str) -> Result<&'a Vec<Value>, ParseError> {
    value
        .as_array()
        .ok_or_else(|| ParseError::SchemaError(format!("{} must be an array", location)))
}

/// The `$ref` string of an object, if it is a reference object.
fn ref_of(obj: &Map<String, Value>) -> Option<&str> {
    obj.get("$ref").and_then(|v| v.as_str())
}

/// Parse document-level tags.
fn read_tags(root: &Map<String, Value>) -> Result<Vec<Tag>, ParseError> {
    let Some(tags) = root.get("tags") else {
        return Ok(Vec::new());
    };

    as_array(tags, "'tags'")?
        .iter()
        .enumerate()
        .map(|(idx, tag)| {
            let location = format!("tag #{}", idx + 1);
            let obj = as_object(tag, &location)?;
            let name = obj
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ParseError::SchemaError(format!("{} is missing 'name'", location)))?
                .to_string();
            let extra = obj
                .iter()
                .filter(|(k, _)| k.as_str() != "name")
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            Ok(Tag { name, extra })
        })
        .collect()
}

/// Reading state: the schema arena and the component names `$ref`s may target.
struct Reader {
    arena: SchemaArena,
    named: IndexMap<String, SchemaId>,
    parameter_names: HashSet<String>,
    request_body_names: HashSet<String>,
    response_names: HashSet<String>,
}

impl Reader {
    /// Allocate one node per named schema up front so that references can
    /// resolve to it before (or while) its body is read.
    fn new(components: Option<&Map<String, Value>>) -> Result<Self, ParseError> {
        let mut arena = SchemaArena::new();
        let mut named = IndexMap::new();

        if let Some(schemas) = components.and_then(|c| c.get("schemas")) {
            for name in as_object(schemas, "'components.schemas'")?.keys() {
                let id = arena.alloc(Schema {
                    name: Some(name.clone()),
                    ..Schema::default()
                });
                named.insert(name.clone(), id);
            }
        }

        Ok(Self {
            arena,
            named,
            parameter_names: table_names(components, "parameters"),
            request_body_names: table_names(components, "requestBodies"),
            response_names: table_names(components, "responses"),
        })
    }

    fn read_components(
        &mut self,
        components: Option<&Map<String, Value>>,
    ) -> Result<Components, ParseError> {
        let mut result = Components::default();
        let Some(components) = components else {
            return Ok(result);
        };

        for (key, value) in components {
            match key.as_str() {
                "schemas" => {
                    for (name, body) in as_object(value, "'components.schemas'")? {
                        self.read_named_schema(name, body)?;
                    }
                    result.schemas = self.named.clone();
                }
                "parameters" => {
                    for (name, param) in as_object(value, "'components.parameters'")? {
                        let location = format!("components.parameters.{}", name);
                        let obj = as_object(param, &location)?;
                        if ref_of(obj).is_some() {
                            return Err(ParseError::SchemaError(format!(
                                "{} is a $ref; chained component references are not supported",
                                location
                            )));
                        }
                        result
                            .parameters
                            .insert(name.clone(), self.read_parameter_object(obj, &location)?);
                    }
                }
                "requestBodies" => {
                    for (name, body) in as_object(value, "'components.requestBodies'")? {
                        let location = format!("components.requestBodies.{}", name);
                        let obj = as_object(body, &location)?;
                        if ref_of(obj).is_some() {
                            return Err(ParseError::SchemaError(format!(
                                "{} is a $ref; chained component references are not supported",
                                location
                            )));
                        }
                        result
                            .request_bodies
                            .insert(name.clone(), self.read_request_body_object(obj, &location)?);
                    }
                }
                "responses" => {
                    for (name, response) in as_object(value, "'components.responses'")? {
                        let location = format!("components.responses.{}", name);
                        let obj = as_object(response, &location)?;
                        if ref_of(obj).is_some() {
                            return Err(ParseError::SchemaError(format!(
                                "{} is a $ref; chained component references are not supported",
                                location
                            )));
                        }
                        result
                            .responses
                            .insert(name.clone(), self.read_response_object(obj, &location)?);
                    }
                }
                _ => {
                    result.extra.insert(key.clone(), value.clone());
                }
            }
        }

        Ok(result)
    }

    /// Parse OpenAPI 3.x paths.
    fn read_paths(
        &mut self,
        root: &Map<String, Value>,
    ) -> Result<IndexMap<String, PathItem>, ParseError> {
        let mut paths = IndexMap::new();

        let Some(paths_value) = root.get("paths") else {
            return Ok(paths); // No paths is valid (empty API)
        };

        for (path, item) in as_object(paths_value, "'paths'")? {
            let location = format!("path item for '{}'", path);
            let item = self.read_path_item(as_object(item, &location)?, path)?;
            paths.insert(path.clone(), item);
        }

        Ok(paths)
    }

    fn read_path_item(
        &mut self,
        obj: &Map<String, Value>,
        path: &str,
    ) -> Result<PathItem, ParseError> {
        let mut item = PathItem::default();

        for (key, value) in obj {
            if let Some(kind) = OperationKind::from_key(key) {
                let location = format!("operation {} {}", kind.as_str().to_uppercase(), path);
                let operation = self.read_operation(as_object(value, &location)?, &location)?;
                item.operations.insert(kind, operation);
            } else if key == "parameters" {
                let location = format!("parameters of '{}'", path);
                item.parameters = self.read_parameters(value, &location)?;
            } else {
                item.extra.insert(key.clone(), value.clone());
            }
        }

        Ok(item)
    }

    fn read_operation(
        &mut self,
        obj: &Map<String, Value>,
        location: &str,
    ) -> Result<Operation, ParseError> {
        let mut operation = Operation::default();

        for (key, value) in obj {
            match key.as_str() {
                "tags" => {
                    operation.tags = as_array(value, &format!("tags of {}", location))?
                        .iter()
                        .map(|tag| {
                            tag.as_str().map(|s| s.to_string()).ok_or_else(|| {
                                ParseError::SchemaError(format!(
                                    "tags of {} must be strings",
                                    location
                                ))
                            })
                        })
                        .collect::<Result<_, _>>()?;
                }
                "parameters" => {
                    operation.parameters =
                        self.read_parameters(value, &format!("parameters of {}", location))?;
                }
                "requestBody" => {
                    let body_location = format!("requestBody of {}", location);
                    let body_obj = as_object(value, &body_location)?;
                    operation.request_body = Some(match ref_of(body_obj) {
                        Some(ref_str) => match resolve_component(
                            ref_str,
                            REQUEST_BODIES_PREFIX,
                            &self.request_body_names,
                            &body_location,
                        ) {
                            Some(name) => Referable::Ref(name),
                            None => Referable::Item(RequestBody {
                                extra: body_obj.clone(),
                                ..RequestBody::default()
                            }),
                        },
                        None => Referable::Item(
                            self.read_request_body_object(body_obj, &body_location)?,
                        ),
                    });
                }
                "responses" => {
                    for (status, response) in
                        as_object(value, &format!("responses of {}", location))?
                    {
                        let response_location = format!("response {} of {}", status, location);
                        let response_obj = as_object(response, &response_location)?;
                        let response = match ref_of(response_obj) {
                            Some(ref_str) => match resolve_component(
                                ref_str,
                                RESPONSES_PREFIX,
                                &self.response_names,
                                &response_location,
                            ) {
                                Some(name) => Referable::Ref(name),
                                None => Referable::Item(Response {
                                    extra: response_obj.clone(),
                                    ..Response::default()
                                }),
                            },
                            None => Referable::Item(
                                self.read_response_object(response_obj, &response_location)?,
                            ),
                        };
                        operation.responses.insert(status.clone(), response);
                    }
                }
                _ => {
                    operation.extra.insert(key.clone(), value.clone());
                }
            }
        }

        Ok(operation)
    }

    fn read_parameters(
        &mut self,
        value: &Value,
        location: &str,
    ) -> Result<Vec<Referable<Parameter>>, ParseError> {
        as_array(value, location)?
            .iter()
            .enumerate()
            .map(|(idx, param)| {
                let param_location = format!("parameter #{} in {}", idx + 1, location);
                let obj = as_object(param, &param_location)?;
                match ref_of(obj) {
                    Some(ref_str) => Ok(match resolve_component(
                        ref_str,
                        PARAMETERS_PREFIX,
                        &self.parameter_names,
                        &param_location,
                    ) {
                        Some(name) => Referable::Ref(name),
                        None => Referable::Item(Parameter {
                            extra: obj.clone(),
                            ..Parameter::default()
                        }),
                    }),
                    None => Ok(Referable::Item(
                        self.read_parameter_object(obj, &param_location)?,
                    )),
                }
            })
            .collect()
    }

    fn read_parameter_object(
        &mut self,
        obj: &Map<String, Value>,
        location: &str,
    ) -> Result<Parameter, ParseError> {
        let mut param = Parameter::default();
        for (key, value) in obj {
            match key.as_str() {
                "schema" => param.schema = Some(self.read_schema(value, location)?),
                "content" => param.content = self.read_content(value, location)?,
                _ => {
                    param.extra.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(param)
    }

    fn read_request_body_object(
        &mut self,
        obj: &Map<String, Value>,
        location: &str,
    ) -> Result<RequestBody, ParseError> {
        let mut body = RequestBody::default();
        for (key, value) in obj {
            match key.as_str() {
                "content" => body.content = self.read_content(value, location)?,
                _ => {
                    body.extra.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(body)
    }

    fn read_response_object(
        &mut self,
        obj: &Map<String, Value>,
        location: &str,
    ) -> Result<Response, ParseError> {
        let mut response = Response::default();
        for (key, value) in obj {
            match key.as_str() {
                "content" => response.content = self.read_content(value, location)?,
                _ => {
                    response.extra.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(response)
    }

    /// Parse a `content` map: media type -> media type object.
    fn read_content(
        &mut self,
        value: &Value,
        location: &str,
    ) -> Result<IndexMap<String, MediaType>, ParseError> {
        let mut content = IndexMap::new();
        for (media_type, media) in as_object(value, &format!("content of {}", location))? {
            let media_location = format!("'{}' content of {}", media_type, location);
            let mut parsed = MediaType::default();
            for (key, value) in as_object(media, &media_location)? {
                match key.as_str() {
                    "schema" => parsed.schema = Some(self.read_schema(value, &media_location)?),
                    _ => {
                        parsed.extra.insert(key.clone(), value.clone());
                    }
                }
            }
            content.insert(media_type.clone(), parsed);
        }
        Ok(content)
    }

    /// Read the body of a named definition into its pre-allocated node.
    fn read_named_schema(&mut self, name: &str, value: &Value) -> Result<(), ParseError> {
        let location = format!("components.schemas.{}", name);
        let id = self
            .named
            .get(name)
            .copied()
            .ok_or_else(|| ParseError::SchemaError(format!("{} has no node", location)))?;

        let mut body = self.read_schema_body(value, &location)?;
        body.name = Some(name.to_string());

        let node = self
            .arena
            .get_mut(id)
            .ok_or_else(|| ParseError::SchemaError(format!("{} has no node", location)))?;
        *node = body;
        Ok(())
    }

    /// Read a schema at a use site: a bare `$ref` resolves to the
    /// definition's node, anything else gets a fresh node.
    fn read_schema(&mut self, value: &Value, location: &str) -> Result<SchemaId, ParseError> {
        if let Some(obj) = value.as_object() {
            if obj.len() == 1 {
                if let Some(id) = ref_of(obj).and_then(|r| self.lookup_schema_ref(r)) {
                    return Ok(id);
                }
            }
        }
        let schema = self.read_schema_body(value, location)?;
        Ok(self.arena.alloc(schema))
    }

    fn lookup_schema_ref(&self, ref_str: &str) -> Option<SchemaId> {
        let name = ref_str
            .strip_prefix(SCHEMAS_PREFIX)
            .filter(|rest| !rest.contains('/'))
            .map(unescape)?;
        self.named.get(&name).copied()
    }

    fn read_schema_body(&mut self, value: &Value, location: &str) -> Result<Schema, ParseError> {
        let obj = match value {
            Value::Bool(b) => {
                return Ok(Schema {
                    boolean: Some(*b),
                    ..Schema::default()
                })
            }
            Value::Object(obj) => obj,
            _ => {
                return Err(ParseError::SchemaError(format!(
                    "schema in {} must be an object",
                    location
                )))
            }
        };

        let mut schema = Schema {
            key_order: obj.keys().cloned().collect(),
            ..Schema::default()
        };

        for (key, value) in obj {
            match key.as_str() {
                // `$ref` with siblings, or a named alias (`Foo: {$ref: Bar}`).
                "$ref" => match value.as_str().and_then(|r| self.lookup_schema_ref(r)) {
                    Some(target) => schema.alias = Some(target),
                    None => {
                        warn_unresolved(value.as_str().unwrap_or_default(), location);
                        schema.extra.insert(key.clone(), value.clone());
                    }
                },
                "properties" => {
                    for (prop, prop_schema) in
                        as_object(value, &format!("properties in {}", location))?
                    {
                        let prop_location = format!("property '{}' in {}", prop, location);
                        let id = self.read_schema(prop_schema, &prop_location)?;
                        schema.properties.insert(prop.clone(), id);
                    }
                }
                // Tuple-style `items: [...]` is kept verbatim.
                "items" if !value.is_array() => {
                    let items_location = format!("items in {}", location);
                    schema.items = Some(self.read_schema(value, &items_location)?);
                }
                "allOf" => schema.all_of = self.read_schema_list(value, "allOf", location)?,
                "oneOf" => schema.one_of = self.read_schema_list(value, "oneOf", location)?,
                "anyOf" => schema.any_of = self.read_schema_list(value, "anyOf", location)?,
                "not" => {
                    let not_location = format!("not in {}", location);
                    schema.not = Some(self.read_schema(value, &not_location)?);
                }
                _ => {
                    schema.extra.insert(key.clone(), value.clone());
                }
            }
        }

        Ok(schema)
    }

    fn read_schema_list(
        &mut self,
        value: &Value,
        keyword: &str,
        location: &str,
    ) -> Result<Vec<SchemaId>, ParseError> {
        let list_location = format!("{} in {}", keyword, location);
        as_array(value, &list_location)?
            .iter()
            .map(|member| self.read_schema(member, &list_location))
            .collect()
    }
}

/// Resolve a `$ref` into one of the non-schema components tables.
///
/// Returns `None` (after a warning) when the target is missing or not local;
/// the caller then keeps the reference verbatim.
fn resolve_component(
    ref_str: &str,
    prefix: &str,
    names: &HashSet<String>,
    location: &str,
) -> Option<String> {
    let name = ref_str
        .strip_prefix(prefix)
        .filter(|rest| !rest.contains('/'))
        .map(unescape)
        .filter(|name| names.contains(name));
    if name.is_none() {
        warn_unresolved(ref_str, location);
    }
    name
}

fn warn_unresolved(reference: &str, location: &str) {
    tracing::warn!(
        reference = %reference,
        location = %location,
        "E1003: unresolved $ref kept verbatim"
    );
}
