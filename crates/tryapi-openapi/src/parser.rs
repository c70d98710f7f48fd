//! OpenAPI document parser.
//!
//! Loads an OpenAPI 3.x document from JSON or YAML, inlines its local
//! references and flattens it into an [`ApiDocument`].

use crate::dereference::inline_local_refs;
use crate::error::{OpenApiError, Result};
use indexmap::IndexMap;
use openapiv3::{APIKeyLocation, Info, Server};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, instrument, warn};
use tryapi_core::{
    ApiDocument, ApiKeyLocation, Example, HttpMethod, MediaTypeExamples, OperationDescriptor,
    Parameter, ParameterLocation, RequestBody, ResponseDescriptor, SecurityScheme,
    SecuritySchemeKind, SecuritySchemeMatrix,
};
use url::Url;

/// Parser for OpenAPI documents.
#[derive(Debug, Clone)]
pub struct OpenApiParser {
    /// Document with local references inlined
    document: Value,
    /// Where the document was fetched from, for relative server URLs
    source_url: Option<Url>,
}

impl OpenApiParser {
    /// Load and parse a document from a file.
    ///
    /// Supports both JSON and YAML formats.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Load and parse a document from a URL.
    pub async fn from_url(url: &str) -> Result<Self> {
        let content = Self::fetch(url).await?;
        Ok(Self::from_str(&content)?.with_source_url(url))
    }

    /// Download the raw text of a document.
    pub async fn fetch(url: &str) -> Result<String> {
        let response = reqwest::get(url).await?.error_for_status()?;
        Ok(response.text().await?)
    }

    /// Resolve relative server URLs against `url`.
    pub fn with_source_url(mut self, url: &str) -> Self {
        self.source_url = Url::parse(url).ok();
        self
    }

    /// Parse a document from a string.
    ///
    /// Automatically detects JSON or YAML format.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        // Try JSON first
        let raw: Value = serde_json::from_str(content)
            .or_else(|_| serde_yaml::from_str(content))
            .map_err(|e| OpenApiError::ParseError(e.to_string()))?;

        check_version(&raw)?;

        Ok(Self {
            document: inline_local_refs(&raw),
            source_url: None,
        })
    }

    /// The document with local references inlined.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Flatten the document into an [`ApiDocument`].
    #[instrument(skip(self))]
    pub fn parse(&self) -> Result<ApiDocument> {
        let info: Info = serde_json::from_value(
            self.document
                .get("info")
                .cloned()
                .ok_or_else(|| OpenApiError::InvalidSpec("missing 'info' object".to_string()))?,
        )
        .map_err(|e| OpenApiError::InvalidSpec(format!("invalid 'info' object: {}", e)))?;

        let servers = self.servers();
        let schemes = self.security_schemes();
        let security = security_matrix(self.document.get("security"), &schemes);

        let mut operations = Vec::new();
        if let Some(paths) = self.document.get("paths").and_then(Value::as_object) {
            for (path, path_item) in paths {
                for method in HttpMethod::ALL {
                    let Some(operation) = path_item.get(method.as_str().to_ascii_lowercase()) else {
                        continue;
                    };
                    operations.push(parse_operation(
                        path,
                        method,
                        operation,
                        path_item.get("parameters"),
                        &security,
                        &schemes,
                    ));
                }
            }
        }

        debug!(
            title = %info.title,
            servers = servers.len(),
            operations = operations.len(),
            "Parsed OpenAPI document"
        );

        Ok(ApiDocument {
            title: info.title,
            version: info.version,
            description: info.description,
            servers,
            security,
            operations,
        })
    }

    /// Server URLs with variables replaced by their defaults.
    fn servers(&self) -> Vec<String> {
        let Some(declared) = self.document.get("servers") else {
            return Vec::new();
        };
        let servers: Vec<Server> = match serde_json::from_value(declared.clone()) {
            Ok(servers) => servers,
            Err(e) => {
                warn!("Ignoring invalid servers: {}", e);
                return Vec::new();
            }
        };

        servers
            .into_iter()
            .map(|server| {
                let mut url = server.url;
                for (name, variable) in server.variables.iter().flatten() {
                    url = url.replace(&format!("{{{}}}", name), &variable.default);
                }
                self.absolute_server_url(url)
            })
            .collect()
    }

    fn absolute_server_url(&self, url: String) -> String {
        match &self.source_url {
            Some(base) if Url::parse(&url).is_err() => base
                .join(&url)
                .map(|joined| joined.to_string())
                .unwrap_or(url),
            _ => url,
        }
    }

    /// Security schemes from `components.securitySchemes`, by key.
    fn security_schemes(&self) -> IndexMap<String, SecurityScheme> {
        let Some(declared) = self
            .document
            .pointer("/components/securitySchemes")
            .and_then(Value::as_object)
        else {
            return IndexMap::new();
        };

        declared
            .iter()
            .filter_map(|(key, value)| {
                match serde_json::from_value::<openapiv3::SecurityScheme>(value.clone()) {
                    Ok(scheme) => Some((key.clone(), convert_security_scheme(key, scheme))),
                    Err(e) => {
                        warn!("Skipping security scheme {}: {}", key, e);
                        None
                    }
                }
            })
            .collect()
    }
}

fn check_version(raw: &Value) -> Result<()> {
    if let Some(version) = raw.get("openapi").map(version_text) {
        return if version.starts_with("3.") {
            Ok(())
        } else {
            Err(OpenApiError::UnsupportedVersion(version))
        };
    }
    if let Some(version) = raw.get("swagger") {
        return Err(OpenApiError::UnsupportedVersion(version_text(version)));
    }
    Err(OpenApiError::InvalidSpec(
        "missing 'openapi' version field".to_string(),
    ))
}

/// YAML may give an unquoted `3.0` as a number.
fn version_text(version: &Value) -> String {
    match version {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn convert_security_scheme(key: &str, scheme: openapiv3::SecurityScheme) -> SecurityScheme {
    let (kind, description) = match scheme {
        openapiv3::SecurityScheme::APIKey {
            location,
            name,
            description,
            ..
        } => {
            let location = match location {
                APIKeyLocation::Query => ApiKeyLocation::Query,
                APIKeyLocation::Header => ApiKeyLocation::Header,
                APIKeyLocation::Cookie => ApiKeyLocation::Cookie,
            };
            (SecuritySchemeKind::ApiKey { name, location }, description)
        }
        openapiv3::SecurityScheme::HTTP {
            scheme,
            bearer_format,
            description,
            ..
        } => (
            SecuritySchemeKind::from_http_scheme(&scheme, bearer_format),
            description,
        ),
        openapiv3::SecurityScheme::OAuth2 { description, .. } => {
            (SecuritySchemeKind::OAuth2, description)
        }
        openapiv3::SecurityScheme::OpenIDConnect { description, .. } => {
            (SecuritySchemeKind::OpenIdConnect, description)
        }
    };

    SecurityScheme {
        key: key.to_string(),
        description,
        kind,
    }
}

/// Security requirements as a matrix; schemes missing from the components are skipped.
fn security_matrix(
    requirements: Option<&Value>,
    schemes: &IndexMap<String, SecurityScheme>,
) -> SecuritySchemeMatrix {
    let alternatives = requirements
        .and_then(Value::as_array)
        .map(|requirements| {
            requirements
                .iter()
                .filter_map(Value::as_object)
                .map(|requirement| {
                    requirement
                        .keys()
                        .filter_map(|key| {
                            let scheme = schemes.get(key).cloned();
                            if scheme.is_none() {
                                warn!("Unknown security scheme: {}", key);
                            }
                            scheme
                        })
                        .collect()
                })
                .collect()
        })
        .unwrap_or_default();

    SecuritySchemeMatrix::new(alternatives)
}

fn parse_operation(
    path: &str,
    method: HttpMethod,
    operation: &Value,
    path_level_params: Option<&Value>,
    document_security: &SecuritySchemeMatrix,
    schemes: &IndexMap<String, SecurityScheme>,
) -> OperationDescriptor {
    let operation_id = string_field(operation, "operationId")
        .unwrap_or_else(|| generate_operation_id(path, method));

    let tags = operation
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| tags.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();

    // Operation-level security, even an empty list, replaces the document's
    let security = match operation.get("security") {
        Some(requirements) => security_matrix(Some(requirements), schemes),
        None => document_security.clone(),
    };

    OperationDescriptor {
        operation_id,
        method,
        path: path.to_string(),
        summary: string_field(operation, "summary"),
        description: string_field(operation, "description"),
        tags,
        parameters: collect_parameters(path_level_params, operation.get("parameters")),
        request_body: operation.get("requestBody").map(parse_request_body),
        security,
        responses: parse_responses(operation.get("responses")),
    }
}

/// Merge path-level and operation-level parameters.
/// Operation-level overrides path-level on the same name and location.
fn collect_parameters(path_level: Option<&Value>, operation_level: Option<&Value>) -> Vec<Parameter> {
    let mut merged: IndexMap<(String, ParameterLocation), Parameter> = IndexMap::new();

    for source in [path_level, operation_level].into_iter().flatten() {
        for raw in source.as_array().into_iter().flatten() {
            match parse_parameter(raw) {
                Some(parameter) => {
                    merged.insert((parameter.name.clone(), parameter.location), parameter);
                }
                None => warn!("Skipping unparseable parameter: {}", raw),
            }
        }
    }

    merged.into_values().collect()
}

fn parse_parameter(raw: &Value) -> Option<Parameter> {
    let mut parameter: Parameter = serde_json::from_value(raw.clone()).ok()?;
    if parameter.schema.is_none() {
        // `content` form: the schema of its single media type
        parameter.schema = raw
            .get("content")
            .and_then(Value::as_object)
            .and_then(|content| content.values().next())
            .and_then(|media| media.get("schema"))
            .cloned();
    }
    Some(parameter)
}

fn parse_request_body(raw: &Value) -> RequestBody {
    let content = raw.get("content").and_then(Value::as_object);
    let content_types: Vec<String> = content
        .map(|content| content.keys().cloned().collect())
        .unwrap_or_default();

    let preferred = content.and_then(|content| {
        content
            .iter()
            .find(|(media_type, _)| is_json(media_type))
            .or_else(|| content.iter().next())
    });

    RequestBody {
        description: string_field(raw, "description"),
        required: raw.get("required").and_then(Value::as_bool).unwrap_or(false),
        schema: preferred.and_then(|(_, media)| media.get("schema").cloned()),
        content_types,
        examples: content.map(media_type_examples).unwrap_or_default(),
    }
}

fn parse_responses(raw: Option<&Value>) -> Vec<ResponseDescriptor> {
    raw.and_then(Value::as_object)
        .map(|responses| {
            responses
                .iter()
                .filter(|(status, _)| !status.starts_with("x-"))
                .map(|(status, response)| ResponseDescriptor {
                    status: status.clone(),
                    description: string_field(response, "description"),
                    examples: response
                        .get("content")
                        .and_then(Value::as_object)
                        .map(media_type_examples)
                        .unwrap_or_default(),
                    has_headers: response
                        .get("headers")
                        .and_then(Value::as_object)
                        .is_some_and(|headers| !headers.is_empty()),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Examples of every media type of a `content` map.
fn media_type_examples(content: &serde_json::Map<String, Value>) -> MediaTypeExamples {
    content
        .iter()
        .map(|(media_type, media)| (media_type.clone(), examples_of(media)))
        .collect()
}

/// Named `examples` first, then `example`, then the schema's `example`.
fn examples_of(media: &Value) -> Vec<Example> {
    if let Some(named) = media.get("examples").and_then(Value::as_object) {
        let examples: Vec<Example> = named
            .iter()
            .filter_map(|(key, example)| {
                Some(Example {
                    title: Some(key.clone()),
                    summary: string_field(example, "summary"),
                    description: string_field(example, "description"),
                    value: example.get("value")?.clone(),
                })
            })
            .collect();
        if !examples.is_empty() {
            return examples;
        }
    }

    media
        .get("example")
        .or_else(|| media.pointer("/schema/example"))
        .map(|value| {
            vec![Example {
                title: None,
                summary: None,
                description: None,
                value: value.clone(),
            }]
        })
        .unwrap_or_default()
}

fn is_json(media_type: &str) -> bool {
    let essence = media_type.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case("application/json") || essence.ends_with("+json")
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Identifier for an operation without `operationId`, e.g. `get_pets_id`.
fn generate_operation_id(path: &str, method: HttpMethod) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .map(|segment| segment.trim_start_matches('{').trim_end_matches('}'))
        .filter(|segment| !segment.is_empty())
        .collect();

    let path_str = if segments.is_empty() {
        "root".to_string()
    } else {
        segments.join("_")
    };

    format!("{}_{}", method.as_str().to_ascii_lowercase(), path_str)
}
