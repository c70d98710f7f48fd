//! State of an interactive console over one loaded document

use crate::{ClientError, ExecutedResponse, ExecutionOutcome, RequestExecutor, Result};
use dashmap::DashMap;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, instrument};
use tryapi_core::config::TryApiConfig;
use tryapi_core::{
    ApiDocument, AuthorizationInput, AuthorizationResolver, AuthorizationSelection,
    ExampleSelector, GlobalRequestConfig, OperationDescriptor, OperationFormState,
    PatternPropertiesEditor, RequestBuilder, RequestDescriptor, SchemeDiagnostic,
    SelectedExample, SerializeOptions, ValidationError,
};

/// Per-operation input: the form and the operation's own credentials.
#[derive(Debug, Clone)]
struct OperationSession {
    form: OperationFormState,
    authorization: AuthorizationInput,
}

impl OperationSession {
    fn new(operation: &OperationDescriptor) -> Self {
        Self {
            form: OperationFormState::new(operation),
            authorization: AuthorizationInput::default(),
        }
    }
}

/// Global authorization as entered, kept to re-resolve it.
#[derive(Debug, Clone, Default)]
struct GlobalAuthorization {
    input: AuthorizationInput,
    include_credentials: bool,
}

/// Everything a "try it out" console needs for one document.
///
/// Each operation keeps its own form and credentials. The global request
/// configuration is shared by all of them and is only ever replaced whole, so
/// a build never sees a half-applied edit.
pub struct Console {
    document: ApiDocument,
    /// Global configuration as constructed, without credentials
    seed: GlobalRequestConfig,
    global: RwLock<Arc<GlobalRequestConfig>>,
    global_authorization: RwLock<GlobalAuthorization>,
    sessions: DashMap<String, OperationSession>,
    executor: RequestExecutor,
    builder: RequestBuilder,
    resolver: AuthorizationResolver,
    display_options: SerializeOptions,
}

impl Console {
    pub fn new(document: ApiDocument, global: GlobalRequestConfig, executor: RequestExecutor) -> Self {
        let seed = GlobalRequestConfig {
            authorization: AuthorizationSelection::none(),
            ..global.clone()
        };
        Self {
            document,
            seed,
            global: RwLock::new(Arc::new(global)),
            global_authorization: RwLock::new(GlobalAuthorization::default()),
            sessions: DashMap::new(),
            executor,
            builder: RequestBuilder::new(),
            resolver: AuthorizationResolver::new(),
            display_options: SerializeOptions::default(),
        }
    }

    /// Console seeded from configuration: server, global headers and global credentials.
    pub fn from_config(
        document: ApiDocument,
        config: &TryApiConfig,
        executor: RequestExecutor,
    ) -> Result<Self> {
        let global = config.global_request_config(document.default_server());
        let mut console = Self::new(document, global, executor);
        console.display_options = config.display_options();

        let include_credentials = config.request.include_credentials;
        if console.document.security.is_empty() {
            console.set_include_credentials(include_credentials)?;
        } else {
            console.set_global_authorization(config.authorization_input(), include_credentials)?;
        }
        Ok(console)
    }

    pub fn document(&self) -> &ApiDocument {
        &self.document
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    pub fn display_options(&self) -> SerializeOptions {
        self.display_options
    }

    /// Look up an operation by identifier.
    pub fn operation(&self, operation_id: &str) -> Result<&OperationDescriptor> {
        self.document
            .operation(operation_id)
            .ok_or_else(|| ClientError::UnknownOperation(operation_id.to_string()))
    }

    /// Current global request configuration.
    pub fn global(&self) -> Arc<GlobalRequestConfig> {
        let global = self.global.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&global)
    }

    /// Replace the global request configuration.
    pub fn replace_global(&self, config: GlobalRequestConfig) {
        let mut global = self.global.write().unwrap_or_else(|e| e.into_inner());
        *global = Arc::new(config);
    }

    /// Derive a new global configuration from the current one and swap it in.
    pub fn update_global(&self, update: impl FnOnce(&mut GlobalRequestConfig)) {
        let mut global = self.global.write().unwrap_or_else(|e| e.into_inner());
        let mut next = GlobalRequestConfig::clone(&global);
        update(&mut next);
        *global = Arc::new(next);
    }

    pub fn set_target_server(&self, server: impl Into<String>) {
        let server = server.into();
        debug!(%server, "Target server changed");
        self.update_global(|global| global.target_server = server);
    }

    /// Resolve global credentials against the document's security matrix.
    ///
    /// On error nothing changes.
    pub fn set_global_authorization(
        &self,
        input: AuthorizationInput,
        include_credentials: bool,
    ) -> Result<()> {
        let selection = self
            .resolver
            .resolve(&self.document.security, &input)?
            .with_cookies(include_credentials);
        self.update_global(|global| global.authorization = selection);

        let mut stored = self
            .global_authorization
            .write()
            .unwrap_or_else(|e| e.into_inner());
        *stored = GlobalAuthorization {
            input,
            include_credentials,
        };
        Ok(())
    }

    /// Toggle the global "include credentials" switch.
    pub fn set_include_credentials(&self, include_credentials: bool) -> Result<()> {
        let input = self.global_authorization_input();
        self.set_global_authorization(input, include_credentials)
    }

    pub fn global_authorization_input(&self) -> AuthorizationInput {
        self.global_authorization
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .input
            .clone()
    }

    /// Diagnostics for the globally selected security alternative.
    pub fn global_diagnostics(&self) -> Vec<SchemeDiagnostic> {
        self.resolver
            .diagnose(&self.document.security, &self.global_authorization_input())
    }

    /// Snapshot of an operation's form.
    pub fn form(&self, operation_id: &str) -> Result<OperationFormState> {
        self.with_session(operation_id, |session| Ok(session.form.clone()))
    }

    pub fn update_parameter(
        &self,
        operation_id: &str,
        name: &str,
        value: Option<Value>,
        errors: Option<Vec<ValidationError>>,
    ) -> Result<()> {
        self.with_session(operation_id, |session| {
            Ok(session.form.update_parameter(name, value, errors)?)
        })
    }

    pub fn update_body(
        &self,
        operation_id: &str,
        value: Option<Value>,
        errors: Option<Vec<ValidationError>>,
    ) -> Result<()> {
        self.with_session(operation_id, |session| {
            Ok(session.form.update_body(value, errors)?)
        })
    }

    pub fn set_content_type(&self, operation_id: &str, content_type: Option<String>) -> Result<()> {
        self.with_session(operation_id, |session| {
            session.form.set_content_type(content_type);
            Ok(())
        })
    }

    /// Fill the body from a request example; `None` when there is no such example.
    pub fn apply_example(
        &self,
        operation_id: &str,
        media_type: Option<&str>,
        index: usize,
    ) -> Result<Option<SelectedExample>> {
        let operation = self.operation(operation_id)?;
        let Some(selected) = ExampleSelector::new().select_request_example(operation, media_type, index)
        else {
            return Ok(None);
        };
        self.with_session(operation_id, |session| {
            session.form.apply_example(&selected)?;
            Ok(())
        })?;
        Ok(Some(selected))
    }

    /// Add an entry to a body object whose schema declares `patternProperties`.
    ///
    /// Without an explicit pattern the first one matching `key` is used. The
    /// entry starts at the pattern schema's default unless `value` is given.
    pub fn add_body_entry(
        &self,
        operation_id: &str,
        pattern: Option<&str>,
        key: &str,
        value: Option<Value>,
    ) -> Result<()> {
        let editor = self.body_editor(operation_id)?;
        let pattern = pattern.or_else(|| editor.pattern_for_key(key));
        self.with_session(operation_id, |session| {
            let current = session.form.body_value().cloned().unwrap_or(Value::Null);
            let mut next = editor.add_key(&current, pattern, key)?;
            if let Some(value) = value {
                next = editor.set_value(&next, key, value);
            }
            debug!(operation_id, key, "Added body entry");
            Ok(session.form.update_body(Some(next), None)?)
        })
    }

    /// Remove one entry from the body object.
    pub fn remove_body_entry(&self, operation_id: &str, key: &str) -> Result<()> {
        let editor = self.body_editor(operation_id)?;
        self.with_session(operation_id, |session| {
            let current = session.form.body_value().cloned().unwrap_or(Value::Null);
            let next = editor.remove_key(&current, key);
            Ok(session.form.update_body(Some(next), None)?)
        })
    }

    fn body_editor(&self, operation_id: &str) -> Result<PatternPropertiesEditor> {
        let operation = self.operation(operation_id)?;
        let schema = operation
            .request_body
            .as_ref()
            .and_then(|body| body.schema.as_ref())
            .cloned()
            .unwrap_or(Value::Null);
        Ok(PatternPropertiesEditor::new(&schema)?)
    }

    /// Restore an operation's form to its schema defaults.
    pub fn reset(&self, operation_id: &str) -> Result<()> {
        self.with_session(operation_id, |session| {
            session.form.reset_all();
            Ok(())
        })
    }

    /// Replace the credentials entered for one operation.
    pub fn set_operation_authorization(
        &self,
        operation_id: &str,
        input: AuthorizationInput,
    ) -> Result<()> {
        self.with_session(operation_id, |session| {
            session.authorization = input;
            Ok(())
        })
    }

    pub fn operation_authorization(&self, operation_id: &str) -> Result<AuthorizationInput> {
        self.with_session(operation_id, |session| Ok(session.authorization.clone()))
    }

    /// Diagnostics for the operation's selected security alternative.
    pub fn diagnostics(&self, operation_id: &str) -> Result<Vec<SchemeDiagnostic>> {
        let operation = self.operation(operation_id)?;
        let input = self.operation_authorization(operation_id)?;
        Ok(self.resolver.diagnose(&operation.security, &input))
    }

    /// Build the request the operation would send right now.
    #[instrument(skip(self))]
    pub fn build_request(&self, operation_id: &str) -> Result<RequestDescriptor> {
        let operation = self.operation(operation_id)?;
        let session = self.with_session(operation_id, |session| Ok(session.clone()))?;

        let operation_authorization = if session.authorization.alternative().is_some() {
            self.resolver
                .resolve(&operation.security, &session.authorization)?
        } else {
            AuthorizationSelection::none()
        };

        let global = self.global();
        Ok(self
            .builder
            .build(operation, &session.form, &global, &operation_authorization)?)
    }

    /// `curl` command reproducing the operation's request.
    pub fn curl(&self, operation_id: &str) -> Result<String> {
        Ok(self.build_request(operation_id)?.to_curl())
    }

    /// Build and send the operation's request.
    #[instrument(skip(self))]
    pub async fn execute(&self, operation_id: &str) -> Result<ExecutionOutcome> {
        let request = self.build_request(operation_id)?;
        let key = self.operation(operation_id)?.cache_key().to_string();
        info!(method = %request.method, url = %request.url, "Executing request");
        self.executor.execute(&key, &request).await
    }

    /// The last response received for the operation.
    pub fn response(&self, operation_id: &str) -> Result<Option<ExecutedResponse>> {
        let operation = self.operation(operation_id)?;
        Ok(self.executor.cached(operation.cache_key()))
    }

    pub fn clear_response(&self, operation_id: &str) -> Result<()> {
        let operation = self.operation(operation_id)?;
        self.executor.clear(operation.cache_key());
        Ok(())
    }

    /// Swap in another document, dropping every form, credential and response.
    ///
    /// The global configuration is rebuilt from the one the console was
    /// constructed with, pointed at the new document's first server. Only the
    /// "include credentials" switch carries over.
    pub fn load_document(&mut self, document: ApiDocument) {
        info!(title = %document.title, version = %document.version, "Loading document");
        self.executor.clear_all();
        self.sessions.clear();

        let stored = self
            .global_authorization
            .get_mut()
            .unwrap_or_else(|e| e.into_inner());
        let include_credentials = stored.include_credentials;
        *stored = GlobalAuthorization {
            input: AuthorizationInput::default(),
            include_credentials,
        };

        let mut global = self.seed.clone();
        if let Some(server) = document.default_server() {
            global.target_server = server.to_string();
        }
        global.authorization = AuthorizationSelection::none().with_cookies(include_credentials);
        *self.global.get_mut().unwrap_or_else(|e| e.into_inner()) = Arc::new(global);

        self.document = document;
    }

    fn with_session<R>(
        &self,
        operation_id: &str,
        f: impl FnOnce(&mut OperationSession) -> Result<R>,
    ) -> Result<R> {
        let operation = self.operation(operation_id)?;
        let mut session = self
            .sessions
            .entry(operation_id.to_string())
            .or_insert_with(|| OperationSession::new(operation));
        f(&mut session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HttpTransport;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use tryapi_core::{
        Credential, Credentials, HttpMethod, Parameter, ParameterLocation, PatternKeyError,
        RequestBody, SecurityScheme, SecuritySchemeKind, SecuritySchemeMatrix,
    };

    /// Records requests and answers 200 with an empty JSON object.
    #[derive(Default)]
    struct RecordingTransport {
        requests: Mutex<Vec<RequestDescriptor>>,
    }

    #[async_trait]
    impl HttpTransport for RecordingTransport {
        async fn send(&self, request: &RequestDescriptor) -> Result<ExecutedResponse> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(ExecutedResponse::new(
                200,
                "OK",
                vec![("content-type".to_string(), "application/json".to_string())],
                "{}",
            ))
        }
    }

    fn bearer_matrix() -> SecuritySchemeMatrix {
        SecuritySchemeMatrix::new(vec![vec![SecurityScheme::new(
            "bearerAuth",
            SecuritySchemeKind::HttpBearer {
                bearer_format: None,
            },
        )]])
    }

    fn document() -> ApiDocument {
        ApiDocument {
            title: "Petstore".to_string(),
            version: "1.0.0".to_string(),
            servers: vec!["https://api.example.com/v1".to_string()],
            security: bearer_matrix(),
            operations: vec![
                OperationDescriptor {
                    operation_id: "getPet".to_string(),
                    method: HttpMethod::Get,
                    path: "/pets/{petId}".to_string(),
                    summary: None,
                    description: None,
                    tags: vec!["pets".to_string()],
                    parameters: vec![Parameter {
                        name: "petId".to_string(),
                        location: ParameterLocation::Path,
                        required: true,
                        schema: Some(json!({"type": "integer"})),
                        description: None,
                    }],
                    request_body: None,
                    security: bearer_matrix(),
                    responses: Vec::new(),
                },
                OperationDescriptor {
                    operation_id: "createPet".to_string(),
                    method: HttpMethod::Post,
                    path: "/pets".to_string(),
                    summary: None,
                    description: None,
                    tags: vec!["pets".to_string()],
                    parameters: Vec::new(),
                    request_body: Some(RequestBody {
                        schema: Some(json!({
                            "type": "object",
                            "properties": {"name": {"type": "string"}}
                        })),
                        content_types: vec!["application/json".to_string()],
                        ..Default::default()
                    }),
                    security: SecuritySchemeMatrix::default(),
                    responses: Vec::new(),
                },
            ],
            ..Default::default()
        }
    }

    fn console() -> (Console, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        let executor = RequestExecutor::new(transport.clone());
        let global = GlobalRequestConfig::new("https://api.example.com/v1").with_header("Accept", "*/*");
        (Console::new(document(), global, executor), transport)
    }

    #[test]
    fn test_unknown_operation() {
        let (console, _) = console();
        assert!(matches!(
            console.form("nope"),
            Err(ClientError::UnknownOperation(_))
        ));
    }

    #[test]
    fn test_forms_start_from_defaults() {
        let (console, _) = console();

        let form = console.form("getPet").unwrap();
        assert_eq!(form.parameter_value("petId"), Some(&json!(0)));

        let form = console.form("createPet").unwrap();
        assert_eq!(form.body_value(), Some(&json!({"name": null})));
        assert_eq!(form.content_type(), Some("application/json"));
    }

    #[test]
    fn test_build_uses_form_and_global_state() {
        let (console, _) = console();
        console
            .update_parameter("getPet", "petId", Some(json!(42)), None)
            .unwrap();

        let request = console.build_request("getPet").unwrap();
        assert_eq!(request.url.as_str(), "https://api.example.com/v1/pets/42");
        assert_eq!(request.headers.get("accept"), Some("*/*"));
        assert_eq!(request.credentials, Credentials::SameOrigin);
    }

    #[test]
    fn test_operation_credentials_override_global() {
        let (console, _) = console();
        console
            .set_global_authorization(
                AuthorizationInput::with_alternative(0)
                    .credential("bearerAuth", Credential::token("global")),
                false,
            )
            .unwrap();
        assert_eq!(
            console.build_request("getPet").unwrap().headers.get("authorization"),
            Some("Bearer global")
        );

        console
            .set_operation_authorization(
                "getPet",
                AuthorizationInput::with_alternative(0)
                    .credential("bearerAuth", Credential::token("local")),
            )
            .unwrap();
        assert_eq!(
            console.build_request("getPet").unwrap().headers.get("authorization"),
            Some("Bearer local")
        );
    }

    #[test]
    fn test_failed_global_authorization_changes_nothing() {
        let (console, _) = console();
        let before = console.global();

        let result = console.set_global_authorization(AuthorizationInput::with_alternative(3), true);

        assert!(matches!(
            result,
            Err(ClientError::Build(
                tryapi_core::Error::InvalidSecurityAlternative { index: 3, .. }
            ))
        ));
        assert_eq!(*console.global(), *before);
    }

    #[test]
    fn test_include_credentials_sets_cookie_flag() {
        let (console, _) = console();
        console.set_include_credentials(true).unwrap();
        assert_eq!(
            console.build_request("getPet").unwrap().credentials,
            Credentials::Include
        );
    }

    #[test]
    fn test_global_replacement_is_wholesale() {
        let (console, _) = console();
        let before = console.global();

        console.set_target_server("https://staging.example.com");

        assert_eq!(before.target_server, "https://api.example.com/v1");
        assert_eq!(console.global().target_server, "https://staging.example.com");
        assert_eq!(console.global().request_headers, before.request_headers);
    }

    #[tokio::test]
    async fn test_execute_and_clear_response() {
        let (console, transport) = console();
        console
            .update_body("createPet", Some(json!({"name": "Rex"})), None)
            .unwrap();

        let outcome = console.execute("createPet").await.unwrap();
        assert!(matches!(outcome, ExecutionOutcome::Completed(_)));

        let sent = transport.requests.lock().unwrap()[0].clone();
        assert_eq!(sent.body.as_deref(), Some(r#"{"name":"Rex"}"#));
        assert_eq!(sent.headers.get("content-type"), Some("application/json"));

        assert!(console.response("createPet").unwrap().is_some());
        console.clear_response("createPet").unwrap();
        assert!(console.response("createPet").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_build_error_sends_nothing() {
        let (console, transport) = console();
        console
            .update_parameter("getPet", "petId", None, None)
            .unwrap();

        let result = console.execute("getPet").await;

        assert!(matches!(
            result,
            Err(ClientError::Build(tryapi_core::Error::MissingParameterValue { .. }))
        ));
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_load_document_drops_state() {
        let (mut console, _) = console();
        console
            .update_parameter("getPet", "petId", Some(json!(7)), None)
            .unwrap();
        console
            .set_global_authorization(
                AuthorizationInput::with_alternative(0)
                    .credential("bearerAuth", Credential::token("old-secret")),
                true,
            )
            .unwrap();
        console.update_global(|global| {
            global
                .request_headers
                .insert("X-Scratch".to_string(), "1".to_string());
        });

        let mut next = document();
        next.servers = vec!["https://other.example.com".to_string()];
        console.load_document(next);

        assert_eq!(console.form("getPet").unwrap().parameter_value("petId"), Some(&json!(0)));
        assert_eq!(console.global().target_server, "https://other.example.com");
        assert_eq!(console.global_authorization_input(), AuthorizationInput::default());

        let request = console.build_request("getPet").unwrap();
        assert_eq!(request.headers.get("authorization"), None);
        assert_eq!(request.headers.get("x-scratch"), None);
        assert_eq!(request.headers.get("accept"), Some("*/*"));
        assert_eq!(request.credentials, Credentials::Include);
    }

    fn labels_document() -> ApiDocument {
        let mut doc = document();
        doc.operations[1].request_body = Some(RequestBody {
            schema: Some(json!({
                "type": "object",
                "patternProperties": {
                    "^x-": {"type": "string"},
                    "^n-": {"type": "integer"}
                }
            })),
            content_types: vec!["application/json".to_string()],
            ..Default::default()
        });
        doc
    }

    #[test]
    fn test_body_entries_follow_pattern_properties() {
        let transport = Arc::new(RecordingTransport::default());
        let console = Console::new(
            labels_document(),
            GlobalRequestConfig::new("https://api.example.com/v1"),
            RequestExecutor::new(transport),
        );

        console
            .add_body_entry("createPet", None, "x-color", Some(json!("brown")))
            .unwrap();
        console.add_body_entry("createPet", Some("^n-"), "n-legs", None).unwrap();
        assert_eq!(
            console.form("createPet").unwrap().body_value(),
            Some(&json!({"x-color": "brown", "n-legs": 0}))
        );

        assert!(matches!(
            console.add_body_entry("createPet", None, "x-color", None),
            Err(ClientError::PatternKey(PatternKeyError::DuplicateKey { .. }))
        ));
        assert!(matches!(
            console.add_body_entry("createPet", None, "color", None),
            Err(ClientError::PatternKey(PatternKeyError::NoPatternSelected))
        ));
        assert!(matches!(
            console.add_body_entry("createPet", Some("^n-"), "x-size", None),
            Err(ClientError::PatternKey(PatternKeyError::KeyMismatch { .. }))
        ));

        console.remove_body_entry("createPet", "x-color").unwrap();
        let request = console.build_request("createPet").unwrap();
        assert_eq!(request.body.as_deref(), Some(r#"{"n-legs":0}"#));
    }

    #[test]
    fn test_body_entries_need_pattern_properties() {
        let (console, _) = console();
        assert!(matches!(
            console.add_body_entry("createPet", None, "x-color", None),
            Err(ClientError::PatternKey(PatternKeyError::NoPatternSelected))
        ));
    }
}
