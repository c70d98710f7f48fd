//! Data structures describing a dereferenced OpenAPI document.
//!
//! These are produced once when a document is loaded and are read-only for the
//! rest of the engine.

use crate::security::SecuritySchemeMatrix;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// HTTP methods an OpenAPI path item can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    /// All methods, in the order a path item lists them.
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    /// Uppercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Parse a method name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(name))
    }

    /// GET and HEAD never carry a body.
    pub fn allows_body(&self) -> bool {
        !matches!(self, HttpMethod::Get | HttpMethod::Head)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Location where a parameter appears in the request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// Path parameter (e.g., /users/{id})
    Path,
    /// Query parameter (e.g., ?search=value)
    Query,
    /// Header parameter (e.g., X-Custom-Header)
    Header,
    /// Cookie parameter
    Cookie,
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "path"),
            ParameterLocation::Query => write!(f, "query"),
            ParameterLocation::Header => write!(f, "header"),
            ParameterLocation::Cookie => write!(f, "cookie"),
        }
    }
}

/// A parameter in an API operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Name as declared in the document
    pub name: String,
    /// Location of the parameter
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Whether the parameter is required
    #[serde(default)]
    pub required: bool,
    /// JSON schema for the parameter
    #[serde(default)]
    pub schema: Option<Value>,
    /// Description of the parameter
    #[serde(default)]
    pub description: Option<String>,
}

/// An example value declared for a media type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    /// Key of the example in a named `examples` map
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub value: Value,
}

impl Example {
    /// Label used when listing examples: title, summary, description, then position.
    pub fn label(&self, index: usize) -> String {
        self.title
            .as_deref()
            .or(self.summary.as_deref())
            .or(self.description.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| index.to_string())
    }
}

/// Examples grouped by media type, in declaration order.
pub type MediaTypeExamples = IndexMap<String, Vec<Example>>;

/// The request body of an operation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// Schema of the preferred media type
    #[serde(default)]
    pub schema: Option<Value>,
    /// Every declared media type, in declaration order
    #[serde(default)]
    pub content_types: Vec<String>,
    #[serde(default)]
    pub examples: MediaTypeExamples,
}

/// One declared response of an operation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResponseDescriptor {
    /// Status code or range (`200`, `4XX`, `default`)
    pub status: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub examples: MediaTypeExamples,
    /// Whether the response declares headers
    #[serde(default)]
    pub has_headers: bool,
}

/// A single method + path combination of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    /// Stable identifier; also the execution cache key
    pub operation_id: String,
    pub method: HttpMethod,
    /// Path template (e.g., "/users/{id}")
    pub path: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub request_body: Option<RequestBody>,
    /// Alternatives of security schemes the caller may satisfy
    #[serde(default)]
    pub security: SecuritySchemeMatrix,
    #[serde(default)]
    pub responses: Vec<ResponseDescriptor>,
}

impl OperationDescriptor {
    /// Parameters declared at the given location, in declaration order.
    pub fn parameters_in(
        &self,
        location: ParameterLocation,
    ) -> impl Iterator<Item = &Parameter> + '_ {
        self.parameters
            .iter()
            .filter(move |parameter| parameter.location == location)
    }

    /// Identifier under which results for this operation are cached.
    pub fn cache_key(&self) -> &str {
        &self.operation_id
    }

    /// Media types a body can be sent as.
    pub fn request_content_types(&self) -> &[String] {
        self.request_body
            .as_ref()
            .map(|body| body.content_types.as_slice())
            .unwrap_or_default()
    }

    /// First tag, used to group operations.
    pub fn primary_tag(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }
}

impl fmt::Display for OperationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// A loaded, dereferenced OpenAPI document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiDocument {
    pub title: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Server URLs with variables substituted
    #[serde(default)]
    pub servers: Vec<String>,
    /// Document-wide security alternatives
    #[serde(default)]
    pub security: SecuritySchemeMatrix,
    #[serde(default)]
    pub operations: Vec<OperationDescriptor>,
}

impl ApiDocument {
    /// Look up an operation by identifier.
    pub fn operation(&self, operation_id: &str) -> Option<&OperationDescriptor> {
        self.operations
            .iter()
            .find(|operation| operation.operation_id == operation_id)
    }

    pub fn default_server(&self) -> Option<&str> {
        self.servers.first().map(String::as_str)
    }

    /// Operations grouped by first tag, in document order. Untagged operations share the `None` group.
    pub fn operations_by_tag(&self) -> IndexMap<Option<&str>, Vec<&OperationDescriptor>> {
        let mut groups: IndexMap<Option<&str>, Vec<&OperationDescriptor>> = IndexMap::new();
        for operation in &self.operations {
            groups
                .entry(operation.primary_tag())
                .or_default()
                .push(operation);
        }
        groups
    }

    /// Key under which the schema history records this document.
    pub fn history_key(&self) -> String {
        format!("{} {}", self.title, self.version)
    }
}
