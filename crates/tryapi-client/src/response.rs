//! Executed responses as the console shows them

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tryapi_core::{MediaTypeSerializer, SerializeOptions};

/// How a response body should be highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    Json,
    Javascript,
    Html,
    Markdown,
    Xml,
    Text,
}

impl ResponseFormat {
    /// Pick the format from a `Content-Type` value; parameters and case are ignored.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let essence = content_type
            .and_then(|value| value.split(';').next())
            .map(|value| value.trim().to_ascii_lowercase())
            .unwrap_or_default();

        match essence.as_str() {
            "application/json" => ResponseFormat::Json,
            "application/javascript" => ResponseFormat::Javascript,
            "text/html" => ResponseFormat::Html,
            "text/markdown" => ResponseFormat::Markdown,
            "application/xml" => ResponseFormat::Xml,
            _ => ResponseFormat::Text,
        }
    }
}

/// A received response, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutedResponse {
    pub status: u16,
    pub status_text: String,
    /// `name: value` lines
    pub headers: String,
    pub content_type: Option<String>,
    pub body: String,
    pub format: ResponseFormat,
}

impl ExecutedResponse {
    pub fn new(
        status: u16,
        status_text: impl Into<String>,
        headers: impl IntoIterator<Item = (String, String)>,
        body: impl Into<String>,
    ) -> Self {
        let headers: Vec<_> = headers.into_iter().collect();
        let content_type = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.clone());

        Self {
            status,
            status_text: status_text.into(),
            headers: headers
                .iter()
                .map(|(name, value)| format!("{}: {}", name, value))
                .collect::<Vec<_>>()
                .join("\n"),
            format: ResponseFormat::from_content_type(content_type.as_deref()),
            content_type,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Status line such as `404 Not Found`.
    pub fn status_line(&self) -> String {
        if self.status_text.is_empty() {
            self.status.to_string()
        } else {
            format!("{} {}", self.status, self.status_text)
        }
    }

    /// The body parsed as JSON, when it is JSON.
    pub fn json(&self) -> Option<Value> {
        let content_type = self.content_type.as_deref()?;
        MediaTypeSerializer::new()
            .deserialize(&self.body, content_type)
            .ok()
    }

    /// Body text for display; JSON bodies are re-indented.
    pub fn display_body(&self, options: SerializeOptions) -> String {
        let pretty = self.json().and_then(|value| {
            MediaTypeSerializer::new()
                .serialize(&value, "application/json", options)
                .ok()
                .flatten()
        });
        pretty.unwrap_or_else(|| self.body.clone())
    }
}
