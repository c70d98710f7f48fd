//! Editing of dynamically keyed maps declared through `patternProperties`.

use crate::schema::default_value;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

/// Why a key cannot be added; the messages are shown to the user as-is.
#[derive(Error, Debug)]
pub enum PatternKeyError {
    #[error("Please select a pattern")]
    NoPatternSelected,

    #[error("Key cannot be empty")]
    EmptyKey,

    #[error("The key \"{key}\" does not match the selected pattern: {pattern}")]
    KeyMismatch { key: String, pattern: String },

    #[error("The key \"{key}\" already exists")]
    DuplicateKey { key: String },

    #[error("Unknown pattern: {0}")]
    UnknownPattern(String),

    #[error("Invalid pattern {pattern}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone)]
struct KeyPattern {
    source: String,
    regex: Regex,
    schema: Value,
}

/// Pure editor over the value of a `patternProperties` object.
///
/// Every edit takes the current value and returns the next one; entries keep
/// their insertion order.
#[derive(Debug, Clone)]
pub struct PatternPropertiesEditor {
    patterns: Vec<KeyPattern>,
}

impl PatternPropertiesEditor {
    /// Whether a schema needs this editor.
    pub fn applies_to(schema: &Value) -> bool {
        schema
            .get("patternProperties")
            .and_then(Value::as_object)
            .is_some_and(|patterns| !patterns.is_empty())
    }

    /// Compile the patterns of a schema, in declaration order.
    pub fn new(schema: &Value) -> Result<Self, PatternKeyError> {
        let mut patterns = Vec::new();
        let declared = schema.get("patternProperties").and_then(Value::as_object);
        for (source, schema) in declared.into_iter().flatten() {
            let regex = Regex::new(source).map_err(|err| PatternKeyError::InvalidPattern {
                pattern: source.clone(),
                source: err,
            })?;
            patterns.push(KeyPattern {
                source: source.clone(),
                regex,
                schema: schema.clone(),
            });
        }
        Ok(Self { patterns })
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> + '_ {
        self.patterns.iter().map(|pattern| pattern.source.as_str())
    }

    /// First pattern matching an existing key.
    pub fn pattern_for_key(&self, key: &str) -> Option<&str> {
        self.find_for_key(key).map(|pattern| pattern.source.as_str())
    }

    /// Schema of the sub-form for an existing key.
    pub fn schema_for_key(&self, key: &str) -> Option<&Value> {
        self.find_for_key(key).map(|pattern| &pattern.schema)
    }

    fn find_for_key(&self, key: &str) -> Option<&KeyPattern> {
        self.patterns.iter().find(|pattern| pattern.regex.is_match(key))
    }

    /// Check a new key against the selected pattern and the existing entries.
    pub fn validate_key(
        &self,
        data: &Value,
        pattern: Option<&str>,
        key: &str,
    ) -> Result<&Value, PatternKeyError> {
        let pattern = pattern
            .filter(|pattern| !pattern.is_empty())
            .ok_or(PatternKeyError::NoPatternSelected)?;
        if key.is_empty() {
            return Err(PatternKeyError::EmptyKey);
        }
        let selected = self
            .patterns
            .iter()
            .find(|candidate| candidate.source == pattern)
            .ok_or_else(|| PatternKeyError::UnknownPattern(pattern.to_string()))?;
        if !selected.regex.is_match(key) {
            return Err(PatternKeyError::KeyMismatch {
                key: key.to_string(),
                pattern: pattern.to_string(),
            });
        }
        if data.get(key).is_some() {
            return Err(PatternKeyError::DuplicateKey {
                key: key.to_string(),
            });
        }
        Ok(&selected.schema)
    }

    /// Add a key holding the default value of the pattern's schema.
    pub fn add_key(&self, data: &Value, pattern: Option<&str>, key: &str) -> Result<Value, PatternKeyError> {
        let schema = self.validate_key(data, pattern, key)?;
        let mut entries = entries(data);
        entries.insert(key.to_string(), default_value(schema).unwrap_or(Value::Null));
        Ok(Value::Object(entries))
    }

    /// Replace the value of one entry.
    pub fn set_value(&self, data: &Value, key: &str, value: Value) -> Value {
        let mut entries = entries(data);
        entries.insert(key.to_string(), value);
        Value::Object(entries)
    }

    /// Remove one entry, keeping the order of the others.
    pub fn remove_key(&self, data: &Value, key: &str) -> Value {
        Value::Object(
            entries(data)
                .into_iter()
                .filter(|(existing, _)| existing != key)
                .collect(),
        )
    }
}

fn entries(data: &Value) -> Map<String, Value> {
    data.as_object().cloned().unwrap_or_default()
}
