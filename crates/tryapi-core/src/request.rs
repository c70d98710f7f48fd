//! Request construction.
//!
//! [`RequestBuilder`] turns an operation, the user's form input, the global
//! configuration and the operation-level authorization into a fully resolved
//! [`RequestDescriptor`].

use crate::auth::{AuthorizationSelection, Credentials};
use crate::curl::make_curl_command;
use crate::error::{Error, Result};
use crate::form_state::{OperationFormState, ParametersState};
use crate::headers::HeaderSet;
use crate::media_type::{MediaTypeSerializer, SerializeOptions};
use crate::path::{concat_url_paths, expand_path_template, set_query_pair};
use crate::schema::prune_blank_properties;
use crate::types::{HttpMethod, OperationDescriptor, ParameterLocation};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, instrument};
use url::Url;

const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// Document-wide request settings shared by every operation.
///
/// Replaced as a whole on every edit; builders only read it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalRequestConfig {
    /// Base URL requests are sent to
    pub target_server: String,
    /// Headers sent with every request, lowest precedence
    #[serde(default)]
    pub request_headers: IndexMap<String, String>,
    #[serde(default)]
    pub authorization: AuthorizationSelection,
}

impl GlobalRequestConfig {
    pub fn new(target_server: impl Into<String>) -> Self {
        Self {
            target_server: target_server.into(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_authorization(mut self, authorization: AuthorizationSelection) -> Self {
        self.authorization = authorization;
        self
    }
}

/// The user-entered values a request is built from.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestInput<'a> {
    pub parameters: Option<&'a ParametersState>,
    pub body: Option<&'a Value>,
    pub content_type: Option<&'a str>,
}

impl<'a> RequestInput<'a> {
    fn parameter(&self, name: &str) -> Option<&'a Value> {
        self.parameters?.get(name)?.value.as_ref()
    }
}

impl<'a> From<&'a OperationFormState> for RequestInput<'a> {
    fn from(form: &'a OperationFormState) -> Self {
        Self {
            parameters: form.parameters().as_present(),
            body: form.body_value(),
            content_type: form.content_type(),
        }
    }
}

/// A concrete request, ready to be handed to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    /// Absolute URL; never contains unresolved path placeholders
    pub url: Url,
    pub headers: HeaderSet,
    pub body: Option<String>,
    pub credentials: Credentials,
}

impl RequestDescriptor {
    /// Shell-safe `curl` reproduction of this request.
    pub fn to_curl(&self) -> String {
        make_curl_command(
            self.method.as_str(),
            self.url.as_str(),
            &self.headers,
            self.body.as_deref(),
        )
    }
}

/// Builds [`RequestDescriptor`]s.
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder {
    serializer: MediaTypeSerializer,
    options: SerializeOptions,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self {
            serializer: MediaTypeSerializer::new(),
            options: SerializeOptions::compact(),
        }
    }
}

impl RequestBuilder {
    /// Builder sending compact JSON bodies.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_serialize_options(mut self, options: SerializeOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the request for an operation from its form state.
    pub fn build(
        &self,
        operation: &OperationDescriptor,
        form: &OperationFormState,
        global: &GlobalRequestConfig,
        operation_authorization: &AuthorizationSelection,
    ) -> Result<RequestDescriptor> {
        self.build_from_parts(operation, form.into(), global, operation_authorization)
    }

    /// Build the request from loose inputs.
    ///
    /// Header precedence, lowest first: global headers, header parameters,
    /// `Content-Type`, authorization. Authorization query values likewise
    /// override query parameters of the same name.
    #[instrument(skip_all, fields(operation = %operation.operation_id, method = %operation.method))]
    pub fn build_from_parts(
        &self,
        operation: &OperationDescriptor,
        input: RequestInput<'_>,
        global: &GlobalRequestConfig,
        operation_authorization: &AuthorizationSelection,
    ) -> Result<RequestDescriptor> {
        let path = self.resolve_path(operation, &input)?;
        let raw_url = concat_url_paths(&[&global.target_server, &path]);
        let mut url = Url::parse(&raw_url).map_err(|source| Error::InvalidUrl {
            url: raw_url.clone(),
            source,
        })?;

        for parameter in operation.parameters_in(ParameterLocation::Query) {
            if let Some(value) = present(input.parameter(&parameter.name)) {
                set_query_pair(&mut url, &parameter.name, &stringify(value));
            }
        }

        let mut headers = HeaderSet::new();
        headers.extend(
            global
                .request_headers
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        );
        for parameter in operation.parameters_in(ParameterLocation::Header) {
            if let Some(value) = present(input.parameter(&parameter.name)) {
                headers.set(parameter.name.as_str(), stringify(value));
            }
        }
        if operation.parameters_in(ParameterLocation::Cookie).next().is_some() {
            debug!("Cookie parameters are not sent");
        }
        if let Some(content_type) = input.content_type {
            headers.set(CONTENT_TYPE_HEADER, content_type);
        }

        let authorization =
            AuthorizationSelection::merge([&global.authorization, operation_authorization]);
        for (name, value) in &authorization.query {
            set_query_pair(&mut url, name, value);
        }
        headers.extend(
            authorization
                .header
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        );

        let body = self.serialize_body(operation, &input)?;

        debug!(url = %url, headers = headers.len(), has_body = body.is_some(), "Built request");
        Ok(RequestDescriptor {
            method: operation.method,
            url,
            headers,
            body,
            credentials: authorization.credentials(),
        })
    }

    fn resolve_path(&self, operation: &OperationDescriptor, input: &RequestInput<'_>) -> Result<String> {
        let mut values = HashMap::new();
        for parameter in operation.parameters_in(ParameterLocation::Path) {
            let value = present(input.parameter(&parameter.name)).ok_or_else(|| {
                Error::MissingParameterValue {
                    name: parameter.name.clone(),
                }
            })?;
            values.insert(parameter.name.as_str(), stringify(value));
        }

        expand_path_template(&operation.path, |name| values.get(name).cloned()).map_err(|name| {
            Error::MissingParameterValue {
                name: name.to_string(),
            }
        })
    }

    fn serialize_body(
        &self,
        operation: &OperationDescriptor,
        input: &RequestInput<'_>,
    ) -> Result<Option<String>> {
        let Some(value) = input.body.filter(|_| operation.method.allows_body()) else {
            return Ok(None);
        };
        let content_type = input.content_type.ok_or(Error::MissingContentType)?;
        match operation.request_body.as_ref().and_then(|body| body.schema.as_ref()) {
            Some(schema) => {
                let pruned = prune_blank_properties(value, schema);
                self.serializer.serialize(&pruned, content_type, self.options)
            }
            None => self.serializer.serialize(value, content_type, self.options),
        }
    }
}

/// A value that should be sent; blank and `null` are not.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|value| !value.is_null())
}

/// Text form of a parameter value.
///
/// Strings are verbatim, arrays comma-join their elements, objects become JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) | Value::Bool(_) | Value::Number(_) => value.to_string(),
    }
}
