//! Default values derived from JSON Schemas.

use serde_json::{Map, Value};

/// Default value of a schema, or `None` when the field starts out blank.
///
/// Rules, first match wins:
/// 1. `const`
/// 2. `default`
/// 3. by `type`: `string` is blank, `number`/`integer` are `0`, `boolean` is
///    `false`, `array` is `[]`, `object` holds every declared property
///    defaulted recursively, anything else is `null`.
///
/// A blank property inside an object default is kept as a `null` key so the
/// object carries exactly the declared properties.
pub fn default_value(schema: &Value) -> Option<Value> {
    if let Some(constant) = schema.get("const") {
        return Some(constant.clone());
    }
    if let Some(default) = schema.get("default") {
        return Some(default.clone());
    }

    match schema_type(schema) {
        Some("string") => None,
        Some("number" | "integer") => Some(Value::from(0)),
        Some("boolean") => Some(Value::Bool(false)),
        Some("array") => Some(Value::Array(Vec::new())),
        Some("object") => {
            let properties = schema
                .get("properties")
                .and_then(Value::as_object)
                .map(|properties| {
                    properties
                        .iter()
                        .map(|(key, property)| {
                            (key.clone(), default_value(property).unwrap_or(Value::Null))
                        })
                        .collect::<Map<_, _>>()
                })
                .unwrap_or_default();
            Some(Value::Object(properties))
        }
        _ => Some(Value::Null),
    }
}

/// Drop the object keys a user left blank before a body is sent.
///
/// A key goes when its value is `null` and its property schema starts out
/// blank (see [`default_value`]) without admitting `null`. Nested objects are
/// pruned against their own property schemas; undeclared keys are kept.
pub fn prune_blank_properties(value: &Value, schema: &Value) -> Value {
    let (Value::Object(entries), Some(properties)) = (
        value,
        schema.get("properties").and_then(Value::as_object),
    ) else {
        return value.clone();
    };

    entries
        .iter()
        .filter_map(|(key, entry)| match properties.get(key) {
            Some(property)
                if entry.is_null() && default_value(property).is_none() && !admits_null(property) =>
            {
                None
            }
            Some(property) => Some((key.clone(), prune_blank_properties(entry, property))),
            None => Some((key.clone(), entry.clone())),
        })
        .collect::<Map<_, _>>()
        .into()
}

fn admits_null(schema: &Value) -> bool {
    if schema.get("nullable").and_then(Value::as_bool) == Some(true) {
        return true;
    }
    match schema.get("type") {
        Some(Value::String(name)) => name == "null",
        Some(Value::Array(names)) => names.iter().any(|name| name == "null"),
        _ => false,
    }
}

/// The declared `type`; for a type list the first non-`null` entry.
fn schema_type(schema: &Value) -> Option<&str> {
    match schema.get("type")? {
        Value::String(name) => Some(name),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .find(|name| *name != "null"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_const_then_default_win() {
        assert_eq!(
            default_value(&json!({"type": "string", "const": "fixed", "default": "x"})),
            Some(json!("fixed"))
        );
        assert_eq!(
            default_value(&json!({"type": "integer", "default": 7})),
            Some(json!(7))
        );
        assert_eq!(
            default_value(&json!({"type": "string", "default": null})),
            Some(Value::Null)
        );
    }

    #[test]
    fn test_type_fallbacks() {
        assert_eq!(default_value(&json!({"type": "string"})), None);
        assert_eq!(default_value(&json!({"type": "number"})), Some(json!(0)));
        assert_eq!(default_value(&json!({"type": "integer"})), Some(json!(0)));
        assert_eq!(default_value(&json!({"type": "boolean"})), Some(json!(false)));
        assert_eq!(default_value(&json!({"type": "array"})), Some(json!([])));
        assert_eq!(default_value(&json!({})), Some(Value::Null));
        assert_eq!(default_value(&json!({"type": "file"})), Some(Value::Null));
    }

    #[test]
    fn test_object_has_exactly_declared_properties() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "integer"},
                "owner": {
                    "type": "object",
                    "properties": {"verified": {"type": "boolean"}},
                    "additionalProperties": {"type": "string"}
                }
            },
            "patternProperties": {"^x-": {"type": "string", "default": "ignored"}}
        });

        assert_eq!(
            default_value(&schema),
            Some(json!({"name": null, "age": 0, "owner": {"verified": false}}))
        );
        assert_eq!(default_value(&json!({"type": "object"})), Some(json!({})));
    }

    #[test]
    fn test_prune_blank_properties() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "nickname": {"type": ["string", "null"]},
                "note": {"type": "string", "nullable": true},
                "age": {"type": "integer"},
                "owner": {
                    "type": "object",
                    "properties": {"email": {"type": "string"}}
                }
            }
        });
        let form = json!({
            "name": null,
            "nickname": null,
            "note": null,
            "age": 0,
            "owner": {"email": null},
            "extra": null
        });

        assert_eq!(
            prune_blank_properties(&form, &schema),
            json!({"nickname": null, "note": null, "age": 0, "owner": {}, "extra": null})
        );
        assert_eq!(
            prune_blank_properties(&json!({"name": "Rex"}), &schema),
            json!({"name": "Rex"})
        );
        assert_eq!(prune_blank_properties(&json!([null]), &schema), json!([null]));
    }

    #[test]
    fn test_nullable_type_list() {
        assert_eq!(
            default_value(&json!({"type": ["null", "boolean"]})),
            Some(json!(false))
        );
    }
}
