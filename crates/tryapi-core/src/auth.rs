//! Authorization resolution.
//!
//! The user picks one alternative of a [`SecuritySchemeMatrix`] and enters one
//! credential per scheme of that alternative. [`AuthorizationResolver`] turns
//! that input into an [`AuthorizationSelection`]: the concrete header and query
//! values plus the cookie-credentials flag to apply to a request.
//!
//! Supported:
//! - API Key (in header or query parameter)
//! - HTTP Basic (`Authorization: Basic <base64>`)
//! - HTTP Bearer (`Authorization: Bearer <token>`)
//! - Any other HTTP scheme (`Authorization: <scheme> <token>`)
//!
//! Cookie API keys, OAuth2 and OpenID Connect are reported as errors.

use crate::error::{Error, Result};
use crate::security::{ApiKeyLocation, SecurityScheme, SecuritySchemeKind, SecuritySchemeMatrix};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

const AUTHORIZATION_HEADER: &str = "Authorization";

/// Whether the request should carry the cookies of the target origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Credentials {
    #[default]
    SameOrigin,
    Include,
}

/// Header, query and cookie contributions of one authorization layer.
///
/// Always fully defined: the empty selection is the identity for merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationSelection {
    #[serde(default)]
    pub header: BTreeMap<String, String>,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    /// Cookie inclusion is a request flag, not a value
    #[serde(default)]
    pub include_cookies: bool,
}

impl AuthorizationSelection {
    /// The identity selection.
    pub fn none() -> Self {
        Self::default()
    }

    /// Set the cookie flag, e.g. from the global "include credentials" switch.
    pub fn with_cookies(mut self, include: bool) -> Self {
        self.include_cookies = self.include_cookies || include;
        self
    }

    pub fn is_none(&self) -> bool {
        self.header.is_empty() && self.query.is_empty() && !self.include_cookies
    }

    /// Overlay a more specific layer on top of this one, scope by scope.
    ///
    /// Header and query entries are unioned with `other` winning on equal names.
    /// Header names compare case-insensitively, query names exactly.
    /// The cookie flag is OR'd: `false` means "no opinion".
    pub fn overlay(mut self, other: &AuthorizationSelection) -> Self {
        for (name, value) in &other.header {
            self.header
                .retain(|existing, _| !existing.eq_ignore_ascii_case(name));
            self.header.insert(name.clone(), value.clone());
        }
        self.query
            .extend(other.query.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.include_cookies |= other.include_cookies;
        self
    }

    /// Merge layers given most-general first.
    pub fn merge<'a>(layers: impl IntoIterator<Item = &'a AuthorizationSelection>) -> Self {
        layers
            .into_iter()
            .fold(Self::none(), |merged, layer| merged.overlay(layer))
    }

    pub fn credentials(&self) -> Credentials {
        if self.include_cookies {
            Credentials::Include
        } else {
            Credentials::SameOrigin
        }
    }
}

/// A credential the user entered for one scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credential {
    /// API key, bearer token or custom HTTP scheme token
    Token { value: String },
    /// HTTP Basic username and password
    Basic {
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },
}

impl Credential {
    pub fn token(value: impl Into<String>) -> Self {
        Self::Token {
            value: value.into(),
        }
    }

    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }
}

/// User input for one security matrix: the chosen alternative and a credential per scheme key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationInput {
    alternative: Option<usize>,
    #[serde(default)]
    credentials: BTreeMap<String, Credential>,
}

impl AuthorizationInput {
    /// Input with the given alternative selected and no credentials.
    pub fn with_alternative(alternative: usize) -> Self {
        Self {
            alternative: Some(alternative),
            credentials: BTreeMap::new(),
        }
    }

    pub fn alternative(&self) -> Option<usize> {
        self.alternative
    }

    /// Choose an alternative (`None` for no authorization).
    ///
    /// Switching to a different alternative discards the entered credentials.
    pub fn select(&mut self, alternative: Option<usize>) {
        if self.alternative != alternative {
            self.credentials.clear();
        }
        self.alternative = alternative;
    }

    pub fn set_credential(&mut self, scheme_key: impl Into<String>, credential: Credential) {
        self.credentials.insert(scheme_key.into(), credential);
    }

    /// Builder-style [`set_credential`](Self::set_credential).
    pub fn credential(mut self, scheme_key: impl Into<String>, credential: Credential) -> Self {
        self.set_credential(scheme_key, credential);
        self
    }

    pub fn credential_for(&self, scheme_key: &str) -> Option<&Credential> {
        self.credentials.get(scheme_key)
    }
}

/// How serious a configuration diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Warning,
    Error,
}

/// A configuration-time message about one scheme of the selected alternative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeDiagnostic {
    pub scheme: String,
    pub severity: DiagnosticSeverity,
    pub message: String,
}

/// Resolves authorization input against a security matrix.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationResolver;

impl AuthorizationResolver {
    pub fn new() -> Self {
        Self
    }

    /// Compute the selection for the chosen alternative.
    ///
    /// No alternative chosen yields the identity selection. A scheme that cannot
    /// be applied fails the whole resolution without touching the input.
    pub fn resolve(
        &self,
        matrix: &SecuritySchemeMatrix,
        input: &AuthorizationInput,
    ) -> Result<AuthorizationSelection> {
        let Some(index) = input.alternative() else {
            return Ok(AuthorizationSelection::none());
        };
        let requirement =
            matrix
                .alternative(index)
                .ok_or_else(|| Error::InvalidSecurityAlternative {
                    index,
                    available: matrix.len(),
                })?;

        let mut selection = AuthorizationSelection::none();
        for scheme in requirement {
            inject(scheme, input.credential_for(&scheme.key), &mut selection)?;
        }

        debug!(
            alternative = index,
            headers = selection.header.len(),
            query = selection.query.len(),
            "Resolved authorization"
        );
        Ok(selection)
    }

    /// Diagnostics for the schemes of the chosen alternative, to show before any request is made.
    pub fn diagnose(
        &self,
        matrix: &SecuritySchemeMatrix,
        input: &AuthorizationInput,
    ) -> Vec<SchemeDiagnostic> {
        input
            .alternative()
            .and_then(|index| matrix.alternative(index))
            .map(|requirement| requirement.iter().filter_map(diagnose_scheme).collect())
            .unwrap_or_default()
    }
}

fn diagnose_scheme(scheme: &SecurityScheme) -> Option<SchemeDiagnostic> {
    let (severity, message) = match &scheme.kind {
        SecuritySchemeKind::ApiKey {
            location: ApiKeyLocation::Cookie,
            ..
        } => (
            DiagnosticSeverity::Warning,
            "Unsupported position in 'cookie'. Ensure the cookie is present, and enable \
             \"include credentials\" in the global request authorization."
                .to_string(),
        ),
        SecuritySchemeKind::OAuth2 | SecuritySchemeKind::OpenIdConnect => (
            DiagnosticSeverity::Error,
            format!(
                "Unsupported security scheme type '{}'.",
                scheme.kind.type_name()
            ),
        ),
        _ => return None,
    };

    Some(SchemeDiagnostic {
        scheme: scheme.key.clone(),
        severity,
        message,
    })
}

fn inject(
    scheme: &SecurityScheme,
    credential: Option<&Credential>,
    selection: &mut AuthorizationSelection,
) -> Result<()> {
    match &scheme.kind {
        SecuritySchemeKind::ApiKey { name, location } => {
            let target = match location {
                ApiKeyLocation::Header => &mut selection.header,
                ApiKeyLocation::Query => &mut selection.query,
                ApiKeyLocation::Cookie => {
                    return Err(Error::UnsupportedAuthorizationScheme {
                        scheme: scheme.key.clone(),
                        reason: "API keys in cookies are not supported; include credentials instead"
                            .to_string(),
                    });
                }
            };
            if let Some(value) = token(scheme, credential)? {
                target.insert(name.clone(), value.to_string());
            }
        }
        SecuritySchemeKind::HttpBasic => {
            let (username, password) = match credential {
                None => ("", ""),
                Some(Credential::Basic { username, password }) => (
                    username.as_deref().unwrap_or_default(),
                    password.as_deref().unwrap_or_default(),
                ),
                Some(Credential::Token { .. }) => {
                    return Err(Error::CredentialMismatch {
                        scheme: scheme.key.clone(),
                        expected: "username/password",
                    });
                }
            };
            selection.header.insert(
                AUTHORIZATION_HEADER.to_string(),
                basic_authorization(username, password),
            );
        }
        SecuritySchemeKind::HttpBearer { .. } => {
            if let Some(value) = token(scheme, credential)? {
                selection
                    .header
                    .insert(AUTHORIZATION_HEADER.to_string(), format!("Bearer {}", value));
            }
        }
        SecuritySchemeKind::HttpOther { scheme: name } => {
            if let Some(value) = token(scheme, credential)? {
                selection
                    .header
                    .insert(AUTHORIZATION_HEADER.to_string(), format!("{} {}", name, value));
            }
        }
        SecuritySchemeKind::OAuth2 | SecuritySchemeKind::OpenIdConnect => {
            return Err(Error::UnsupportedAuthorizationScheme {
                scheme: scheme.key.clone(),
                reason: format!("'{}' flows are not supported", scheme.kind.type_name()),
            });
        }
    }
    Ok(())
}

/// The token of a token-based scheme, or `None` when nothing was entered yet.
fn token<'a>(scheme: &SecurityScheme, credential: Option<&'a Credential>) -> Result<Option<&'a str>> {
    match credential {
        None => Ok(None),
        Some(Credential::Token { value }) => Ok(Some(value.as_str())),
        Some(Credential::Basic { .. }) => Err(Error::CredentialMismatch {
            scheme: scheme.key.clone(),
            expected: "token",
        }),
    }
}

/// `Basic base64(username:password)` over the UTF-8 bytes.
pub fn basic_authorization(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}
