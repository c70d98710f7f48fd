//! Per-operation form state: parameter values, body value and content type.
//!
//! State only changes through two kinds of transitions: targeted updates that
//! replace one entry wholesale, and [`OperationFormState::reset_all`] which
//! rebuilds everything from the schema defaults.

use crate::error::{Error, Result};
use crate::examples::SelectedExample;
use crate::schema::default_value;
use crate::types::{OperationDescriptor, Parameter, RequestBody};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// A validation error reported by the form renderer for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// JSON pointer to the offending value
    #[serde(default)]
    pub instance_path: String,
    #[serde(default)]
    pub schema_path: String,
    /// Failing schema keyword, e.g. `required`
    pub keyword: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub message: Option<String>,
}

impl ValidationError {
    pub fn new(keyword: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            instance_path: String::new(),
            schema_path: String::new(),
            keyword: keyword.into(),
            params: Value::Null,
            message: Some(message.into()),
        }
    }
}

/// Current value and validation errors of one field.
///
/// A `None` value means the field is blank; it is never sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldState {
    pub value: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<ValidationError>>,
}

impl FieldState {
    pub fn new(value: Option<Value>) -> Self {
        Self {
            value,
            errors: None,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|errors| !errors.is_empty())
    }
}

/// Parameter states keyed by parameter name, in declaration order.
pub type ParametersState = IndexMap<String, FieldState>;

/// A form section that may not exist for an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum FormSlot<T> {
    /// The operation declares nothing here; no control is shown or submitted
    NotApplicable,
    Present(T),
}

impl<T> FormSlot<T> {
    pub fn as_present(&self) -> Option<&T> {
        match self {
            FormSlot::Present(inner) => Some(inner),
            FormSlot::NotApplicable => None,
        }
    }

    fn as_present_mut(&mut self) -> Option<&mut T> {
        match self {
            FormSlot::Present(inner) => Some(inner),
            FormSlot::NotApplicable => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, FormSlot::Present(_))
    }
}

/// Default parameter states, or `NotApplicable` for an operation without parameters.
///
/// A parameter without a schema starts out as `null`.
pub fn init_parameters(parameters: &[Parameter]) -> FormSlot<ParametersState> {
    if parameters.is_empty() {
        return FormSlot::NotApplicable;
    }
    FormSlot::Present(
        parameters
            .iter()
            .map(|parameter| {
                let value = match &parameter.schema {
                    Some(schema) => default_value(schema),
                    None => Some(Value::Null),
                };
                (parameter.name.clone(), FieldState::new(value))
            })
            .collect(),
    )
}

/// Default body state, or `NotApplicable` for an operation without a request body.
pub fn init_body(request_body: Option<&RequestBody>) -> FormSlot<FieldState> {
    match request_body {
        None => FormSlot::NotApplicable,
        Some(body) => FormSlot::Present(FieldState::new(
            body.schema.as_ref().and_then(default_value),
        )),
    }
}

/// Editable state of one operation's "try it" form.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationFormState {
    parameter_decls: Vec<Parameter>,
    request_body: Option<RequestBody>,
    parameters: FormSlot<ParametersState>,
    body: FormSlot<FieldState>,
    content_type: Option<String>,
}

impl OperationFormState {
    /// Fresh state for an operation, initialized from schema defaults.
    pub fn new(operation: &OperationDescriptor) -> Self {
        let parameter_decls = operation.parameters.clone();
        let request_body = operation.request_body.clone();
        Self {
            parameters: init_parameters(&parameter_decls),
            body: init_body(request_body.as_ref()),
            content_type: default_content_type(request_body.as_ref()),
            parameter_decls,
            request_body,
        }
    }

    pub fn parameters(&self) -> &FormSlot<ParametersState> {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&FieldState> {
        self.parameters.as_present()?.get(name)
    }

    /// Current value of a parameter, `None` when blank or unknown.
    pub fn parameter_value(&self, name: &str) -> Option<&Value> {
        self.parameter(name)?.value.as_ref()
    }

    pub fn body(&self) -> &FormSlot<FieldState> {
        &self.body
    }

    pub fn body_value(&self) -> Option<&Value> {
        self.body.as_present()?.value.as_ref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Content types the body can be sent as, in declaration order.
    pub fn available_content_types(&self) -> &[String] {
        self.request_body
            .as_ref()
            .map(|body| body.content_types.as_slice())
            .unwrap_or_default()
    }

    /// Replace one parameter's state wholesale.
    pub fn update_parameter(
        &mut self,
        name: &str,
        value: Option<Value>,
        errors: Option<Vec<ValidationError>>,
    ) -> Result<()> {
        let entry = self
            .parameters
            .as_present_mut()
            .and_then(|parameters| parameters.get_mut(name))
            .ok_or_else(|| Error::UnknownParameter {
                name: name.to_string(),
            })?;
        *entry = FieldState { value, errors };
        Ok(())
    }

    /// Replace the body state wholesale.
    pub fn update_body(
        &mut self,
        value: Option<Value>,
        errors: Option<Vec<ValidationError>>,
    ) -> Result<()> {
        let body = self.body.as_present_mut().ok_or(Error::BodyNotApplicable)?;
        *body = FieldState { value, errors };
        Ok(())
    }

    pub fn set_content_type(&mut self, content_type: Option<String>) {
        self.content_type = content_type;
    }

    /// Prefill the body from an example and switch to its media type.
    pub fn apply_example(&mut self, selected: &SelectedExample) -> Result<()> {
        self.update_body(Some(selected.example.value.clone()), None)?;
        self.content_type = Some(selected.media_type.clone());
        debug!(media_type = %selected.media_type, "Applied request example");
        Ok(())
    }

    /// Rebuild every parameter and the body from schema defaults, dropping all edits and errors.
    pub fn reset_all(&mut self) {
        self.parameters = init_parameters(&self.parameter_decls);
        self.body = init_body(self.request_body.as_ref());
        self.content_type = default_content_type(self.request_body.as_ref());
    }

    /// Whether any field currently reports validation errors.
    pub fn has_errors(&self) -> bool {
        let parameter_errors = self
            .parameters
            .as_present()
            .is_some_and(|parameters| parameters.values().any(FieldState::has_errors));
        parameter_errors || self.body.as_present().is_some_and(FieldState::has_errors)
    }
}

fn default_content_type(request_body: Option<&RequestBody>) -> Option<String> {
    request_body?.content_types.first().cloned()
}
