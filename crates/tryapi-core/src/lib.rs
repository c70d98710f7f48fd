//! Request construction and authorization engine for tryapi
//!
//! This crate turns an operation of a loaded OpenAPI document, the values a
//! user entered for it and the document-wide settings into a concrete HTTP
//! request and its `curl` reproduction. Everything here is synchronous.

pub mod auth;
pub mod config;
pub mod curl;
pub mod error;
pub mod examples;
pub mod form_state;
pub mod headers;
pub mod media_type;
pub mod path;
pub mod pattern_properties;
pub mod request;
pub mod schema;
pub mod security;
pub mod types;

// Re-exports
pub use auth::{
    AuthorizationInput, AuthorizationResolver, AuthorizationSelection, Credential, Credentials,
    DiagnosticSeverity, SchemeDiagnostic,
};
pub use config::TryApiConfig;
pub use error::{Error, Result};
pub use examples::{ExampleSelector, ResponseExamples, SelectedExample};
pub use form_state::{FieldState, FormSlot, OperationFormState, ParametersState, ValidationError};
pub use headers::HeaderSet;
pub use media_type::{MediaTypeSerializer, SerializeOptions, SupportedMediaType};
pub use pattern_properties::{PatternKeyError, PatternPropertiesEditor};
pub use request::{GlobalRequestConfig, RequestBuilder, RequestDescriptor, RequestInput};
pub use schema::{default_value, prune_blank_properties};
pub use security::{
    ApiKeyLocation, SecurityRequirement, SecurityScheme, SecuritySchemeKind, SecuritySchemeMatrix,
};
pub use types::{
    ApiDocument, Example, HttpMethod, MediaTypeExamples, OperationDescriptor, Parameter,
    ParameterLocation, RequestBody, ResponseDescriptor,
};
