//! Request body serialization by media type.

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fmt;
use url::form_urlencoded;

/// Widest indentation `pretty_print_spacing` may ask for.
const MAX_SPACING: usize = 10;

/// Media types with a serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedMediaType {
    Json,
    FormUrlEncoded,
}

impl SupportedMediaType {
    pub const ALL: [SupportedMediaType; 2] =
        [SupportedMediaType::Json, SupportedMediaType::FormUrlEncoded];

    pub fn as_str(&self) -> &'static str {
        match self {
            SupportedMediaType::Json => "application/json",
            SupportedMediaType::FormUrlEncoded => "application/x-www-form-urlencoded",
        }
    }

    /// Match a media type, ignoring parameters such as `charset` and ASCII case.
    pub fn parse(media_type: &str) -> Option<Self> {
        let essence = essence(media_type);
        Self::ALL
            .into_iter()
            .find(|supported| supported.as_str().eq_ignore_ascii_case(essence))
    }
}

impl fmt::Display for SupportedMediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media types users can pick that have no serializer yet.
pub const RECOGNIZED_UNSUPPORTED: &[&str] = &[
    "application/xml",
    "text/xml",
    "multipart/form-data",
    "application/octet-stream",
    "text/plain",
];

fn essence(media_type: &str) -> &str {
    media_type.split(';').next().unwrap_or_default().trim()
}

/// Options for [`MediaTypeSerializer::serialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Indentation width for JSON; `None` or `0` produce compact output
    pub pretty_print_spacing: Option<usize>,
}

impl SerializeOptions {
    pub fn compact() -> Self {
        Self {
            pretty_print_spacing: None,
        }
    }

    pub fn pretty(spacing: usize) -> Self {
        Self {
            pretty_print_spacing: Some(spacing),
        }
    }
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self::pretty(2)
    }
}

/// Encodes and decodes bodies for the supported media types.
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaTypeSerializer;

impl MediaTypeSerializer {
    pub fn new() -> Self {
        Self
    }

    pub fn supports(&self, media_type: &str) -> bool {
        SupportedMediaType::parse(media_type).is_some()
    }

    /// Whether the media type can be offered for selection, supported or not.
    pub fn is_recognized(&self, media_type: &str) -> bool {
        self.supports(media_type)
            || RECOGNIZED_UNSUPPORTED
                .iter()
                .any(|known| known.eq_ignore_ascii_case(essence(media_type)))
    }

    /// First candidate that is supported, scanning in the given order.
    pub fn find_first_supported_media_type<'a, S: AsRef<str>>(
        &self,
        candidates: &'a [S],
    ) -> Option<&'a str> {
        candidates
            .iter()
            .map(AsRef::as_ref)
            .find(|candidate| self.supports(candidate))
    }

    /// Encode a value as a body of the given media type.
    ///
    /// Returns `None` only for a form-urlencoded `null`, which has no body.
    pub fn serialize(
        &self,
        value: &Value,
        media_type: &str,
        options: SerializeOptions,
    ) -> Result<Option<String>> {
        match SupportedMediaType::parse(media_type) {
            Some(SupportedMediaType::Json) => {
                serialize_json(value, options.pretty_print_spacing).map(Some)
            }
            Some(SupportedMediaType::FormUrlEncoded) => Ok(serialize_form(value)),
            None => Err(Error::unsupported_media_type(media_type)),
        }
    }

    /// Decode a body; only JSON can be decoded.
    pub fn deserialize(&self, text: &str, media_type: &str) -> Result<Value> {
        match SupportedMediaType::parse(media_type) {
            Some(SupportedMediaType::Json) => Ok(serde_json::from_str(text)?),
            _ => Err(Error::unsupported_media_type(media_type)),
        }
    }
}

fn serialize_json(value: &Value, spacing: Option<usize>) -> Result<String> {
    let spacing = spacing.unwrap_or_default().min(MAX_SPACING);
    if spacing == 0 {
        return Ok(serde_json::to_string(value)?);
    }

    let indent = vec![b' '; spacing];
    let mut buffer = Vec::new();
    let mut serializer =
        Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(&indent));
    value.serialize(&mut serializer)?;
    // serde_json only ever writes valid UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn serialize_form(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Object(map) => {
            let mut encoder = form_urlencoded::Serializer::new(String::new());
            for (key, entry) in map {
                encoder.append_pair(key, &form_value(entry));
            }
            Some(encoder.finish())
        }
        other => Some(form_value(other)),
    }
}

/// Strings pass through verbatim; everything else is its JSON text.
fn form_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
