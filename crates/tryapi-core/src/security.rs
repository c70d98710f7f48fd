//! Security schemes and the security matrix of an operation.

use serde::{Deserialize, Serialize};

/// Where an API key is sent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Header,
    Query,
    Cookie,
}

/// The closed set of scheme kinds a document can declare.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SecuritySchemeKind {
    /// API key sent under `name` at `location`
    ApiKey {
        name: String,
        location: ApiKeyLocation,
    },
    /// `Authorization: Basic <base64(user:password)>`
    HttpBasic,
    /// `Authorization: Bearer <token>`
    HttpBearer {
        #[serde(default)]
        bearer_format: Option<String>,
    },
    /// `Authorization: <scheme> <token>` for any other HTTP scheme
    HttpOther { scheme: String },
    OAuth2,
    OpenIdConnect,
}

impl SecuritySchemeKind {
    /// Classify an `http` scheme by its (case-insensitive) scheme name.
    pub fn from_http_scheme(scheme: &str, bearer_format: Option<String>) -> Self {
        if scheme.eq_ignore_ascii_case("basic") {
            SecuritySchemeKind::HttpBasic
        } else if scheme.eq_ignore_ascii_case("bearer") {
            SecuritySchemeKind::HttpBearer { bearer_format }
        } else {
            SecuritySchemeKind::HttpOther {
                scheme: scheme.to_string(),
            }
        }
    }

    /// The `type` value the document used for this kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            SecuritySchemeKind::ApiKey { .. } => "apiKey",
            SecuritySchemeKind::HttpBasic
            | SecuritySchemeKind::HttpBearer { .. }
            | SecuritySchemeKind::HttpOther { .. } => "http",
            SecuritySchemeKind::OAuth2 => "oauth2",
            SecuritySchemeKind::OpenIdConnect => "openIdConnect",
        }
    }
}

/// A named security scheme from `components.securitySchemes`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecurityScheme {
    /// Key of the scheme in the document
    pub key: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: SecuritySchemeKind,
}

impl SecurityScheme {
    pub fn new(key: impl Into<String>, kind: SecuritySchemeKind) -> Self {
        Self {
            key: key.into(),
            description: None,
            kind,
        }
    }

    /// `key (type)`, as shown in the alternative picker.
    pub fn label(&self) -> String {
        format!("{} ({})", self.key, self.kind.type_name())
    }
}

/// Schemes that must be satisfied together.
pub type SecurityRequirement = Vec<SecurityScheme>;

/// Alternatives of security requirements; satisfying any one of them is enough.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SecuritySchemeMatrix(Vec<SecurityRequirement>);

impl SecuritySchemeMatrix {
    pub fn new(alternatives: Vec<SecurityRequirement>) -> Self {
        Self(alternatives)
    }

    pub fn alternatives(&self) -> &[SecurityRequirement] {
        &self.0
    }

    pub fn alternative(&self, index: usize) -> Option<&SecurityRequirement> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Labels of every alternative, e.g. `api_key (apiKey) & basic (http)`.
    pub fn labels(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|requirement| {
                requirement
                    .iter()
                    .map(SecurityScheme::label)
                    .collect::<Vec<_>>()
                    .join(" & ")
            })
            .collect()
    }
}

impl From<Vec<SecurityRequirement>> for SecuritySchemeMatrix {
    fn from(alternatives: Vec<SecurityRequirement>) -> Self {
        Self(alternatives)
    }
}
