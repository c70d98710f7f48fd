//! Configuration management for tryapi
//!
//! Loads configuration with priority:
//! 1. The given file, or `tryapi.toml` found in the current directory or a parent
//! 2. Defaults
//!
//! String values of the form `${VAR_NAME}` are replaced by the environment variable.

use crate::auth::{AuthorizationInput, Credential};
use crate::media_type::SerializeOptions;
use crate::request::GlobalRequestConfig;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "tryapi.toml";

/// tryapi configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TryApiConfig {
    #[serde(default)]
    pub request: RequestConfig,

    #[serde(default)]
    pub authorization: AuthorizationConfig,

    #[serde(default)]
    pub serializer: SerializerConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Global request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Target server; the document's first server when unset
    pub server: Option<String>,

    /// Headers sent with every request
    #[serde(default = "default_headers")]
    pub headers: IndexMap<String, String>,

    /// Send the target origin's cookies
    #[serde(default)]
    pub include_credentials: bool,
}

/// Global authorization, resolved against the document's security matrix
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizationConfig {
    /// Selected alternative; defaults to the first one when credentials are given
    pub alternative: Option<usize>,

    /// Credentials keyed by security scheme key
    #[serde(default)]
    pub schemes: IndexMap<String, CredentialConfig>,
}

/// Credential for one scheme: a token, or a username/password pair
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialConfig {
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializerConfig {
    /// Indentation used when displaying JSON
    #[serde(default = "default_pretty_print_spacing")]
    pub pretty_print_spacing: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// History file; `~/.tryapi/history.json` when unset
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directive, e.g. `tryapi=debug`
    pub log_filter: Option<String>,
    /// Write logs as JSON lines
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            server: None,
            headers: default_headers(),
            include_credentials: false,
        }
    }
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            pretty_print_spacing: default_pretty_print_spacing(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

impl CredentialConfig {
    /// A username or password makes this a basic credential.
    ///
    /// `None` when no field holds a value, e.g. every `${VAR}` was unset.
    pub fn to_credential(&self) -> Option<Credential> {
        if self.username.is_some() || self.password.is_some() {
            Some(Credential::Basic {
                username: self.username.clone(),
                password: self.password.clone(),
            })
        } else {
            self.token.clone().map(Credential::token)
        }
    }
}

impl TryApiConfig {
    /// Load `tryapi.toml` from the current directory or a parent, or defaults if there is none.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::find_config_file()? {
                Some(found) => found,
                None => {
                    tracing::debug!("No {} found, using defaults", CONFIG_FILE_NAME);
                    return Ok(Self::default());
                }
            },
        };

        tracing::debug!("Loading configuration from: {:?}", config_path);

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))
    }

    /// Parse configuration text and resolve environment references.
    pub fn parse(contents: &str) -> Result<Self> {
        let mut config: TryApiConfig = toml::from_str(contents)?;
        config.resolve_env_vars();
        Ok(config)
    }

    /// Find tryapi.toml by searching current directory and parents
    fn find_config_file() -> Result<Option<PathBuf>> {
        let mut current = env::current_dir()?;

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Ok(Some(config_path));
            }

            if !current.pop() {
                return Ok(None);
            }
        }
    }

    /// Resolve ${VAR_NAME} references to environment variables
    fn resolve_env_vars(&mut self) {
        if let Some(server) = self.request.server.take() {
            self.request.server = Self::resolve_env_var(&server);
        }

        let headers = std::mem::take(&mut self.request.headers);
        self.request.headers = headers
            .into_iter()
            .filter_map(|(name, value)| Self::resolve_env_var(&value).map(|value| (name, value)))
            .collect();

        for credential in self.authorization.schemes.values_mut() {
            for field in [
                &mut credential.token,
                &mut credential.username,
                &mut credential.password,
            ] {
                if let Some(value) = field.take() {
                    *field = Self::resolve_env_var(&value);
                }
            }
        }
    }

    /// Resolve a single ${VAR_NAME} reference
    fn resolve_env_var(value: &str) -> Option<String> {
        match value.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
            Some(var_name) => {
                let resolved = env::var(var_name).ok();
                if resolved.is_none() {
                    tracing::warn!("Environment variable {} is not set", var_name);
                }
                resolved
            }
            None => Some(value.to_string()),
        }
    }

    /// Global request settings for a document whose default server is `default_server`.
    ///
    /// The authorization layer starts empty apart from the cookie flag; resolve
    /// [`authorization_input`](Self::authorization_input) against the document's
    /// security matrix to fill it.
    pub fn global_request_config(&self, default_server: Option<&str>) -> GlobalRequestConfig {
        let target_server = self
            .request
            .server
            .clone()
            .or_else(|| default_server.map(str::to_string))
            .unwrap_or_default();

        let mut global = GlobalRequestConfig::new(target_server);
        global.request_headers = self.request.headers.clone();
        global.authorization = global
            .authorization
            .with_cookies(self.request.include_credentials);
        global
    }

    /// Configured global credentials as authorization input.
    pub fn authorization_input(&self) -> AuthorizationInput {
        let alternative = self
            .authorization
            .alternative
            .or_else(|| (!self.authorization.schemes.is_empty()).then_some(0));

        let mut input = AuthorizationInput::default();
        input.select(alternative);
        for (key, credential) in &self.authorization.schemes {
            match credential.to_credential() {
                Some(credential) => input.set_credential(key.clone(), credential),
                None => tracing::warn!("No credential value configured for scheme {}", key),
            }
        }
        input
    }

    /// Options for displaying JSON to the user.
    pub fn display_options(&self) -> SerializeOptions {
        SerializeOptions::pretty(self.serializer.pretty_print_spacing)
    }
}

fn default_headers() -> IndexMap<String, String> {
    IndexMap::from([("Accept".to_string(), "*/*".to_string())])
}

fn default_pretty_print_spacing() -> usize {
    2
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;

    #[test]
    fn test_default_config() {
        let config = TryApiConfig::default();
        assert_eq!(config.request.headers.get("Accept").map(String::as_str), Some("*/*"));
        assert_eq!(config.serializer.pretty_print_spacing, 2);
        assert!(config.history.enabled);
        assert_eq!(config.authorization_input().alternative(), None);
    }

    #[test]
    fn test_resolve_env_var() {
        unsafe {
            env::set_var("TRYAPI_TEST_VAR", "test_value");
        }

        let resolved = TryApiConfig::resolve_env_var("${TRYAPI_TEST_VAR}");
        assert_eq!(resolved, Some("test_value".to_string()));

        let not_var = TryApiConfig::resolve_env_var("plain_value");
        assert_eq!(not_var, Some("plain_value".to_string()));

        unsafe {
            env::remove_var("TRYAPI_TEST_VAR");
        }
    }

    #[test]
    fn test_parse_full_config() {
        unsafe {
            env::set_var("TRYAPI_TEST_TOKEN", "s3cret");
        }

        let config = TryApiConfig::parse(
            r#"
            [request]
            server = "https://staging.example.com"
            include_credentials = true

            [request.headers]
            X-Client = "tryapi"

            [authorization.schemes.bearer]
            token = "${TRYAPI_TEST_TOKEN}"

            [authorization.schemes.basic]
            username = "alice"

            [serializer]
            pretty_print_spacing = 4

            [history]
            enabled = false
            "#,
        )
        .unwrap();

        unsafe {
            env::remove_var("TRYAPI_TEST_TOKEN");
        }

        assert_eq!(config.request.headers.len(), 1);
        assert_eq!(config.display_options(), SerializeOptions::pretty(4));
        assert!(!config.history.enabled);

        let input = config.authorization_input();
        assert_eq!(input.alternative(), Some(0));
        assert_eq!(input.credential_for("bearer"), Some(&Credential::token("s3cret")));
        assert!(matches!(
            input.credential_for("basic"),
            Some(Credential::Basic { username: Some(_), password: None })
        ));

        let global = config.global_request_config(Some("https://api.example.com"));
        assert_eq!(global.target_server, "https://staging.example.com");
        assert_eq!(global.authorization.credentials(), Credentials::Include);
    }

    #[test]
    fn test_unset_credential_variable_is_skipped() {
        unsafe {
            env::remove_var("TRYAPI_TEST_UNSET_TOKEN");
        }

        let config = TryApiConfig::parse(
            r#"
            [authorization.schemes.bearer]
            token = "${TRYAPI_TEST_UNSET_TOKEN}"

            [authorization.schemes.apiKey]
            token = "k3y"
            "#,
        )
        .unwrap();

        assert_eq!(config.authorization.schemes["bearer"].token, None);
        assert_eq!(config.authorization.schemes["bearer"].to_credential(), None);

        let input = config.authorization_input();
        assert_eq!(input.credential_for("bearer"), None);
        assert_eq!(input.credential_for("apiKey"), Some(&Credential::token("k3y")));
    }

    #[test]
    fn test_server_falls_back_to_document() {
        let global = TryApiConfig::default().global_request_config(Some("https://api.example.com"));
        assert_eq!(global.target_server, "https://api.example.com");
        assert_eq!(global.request_headers.get("Accept").map(String::as_str), Some("*/*"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let missing = Path::new("/nonexistent/tryapi.toml");
        assert!(TryApiConfig::load_from(Some(missing)).is_err());
    }
}
