//! Inlining of local `$ref`s.
//!
//! Every `{"$ref": "#/..."}` object is replaced by a copy of the value it
//! points to. A reference that leads back into itself is left in place, so
//! recursive schemas stay finite. `$id` keys are dropped along the way.

use serde_json::{Map, Value};
use tracing::warn;

const REF_KEY: &str = "$ref";
const ID_KEY: &str = "$id";

/// Return a copy of `root` with local references inlined.
pub fn inline_local_refs(root: &Value) -> Value {
    let mut active = Vec::new();
    inline(root, root, &mut active)
}

fn inline(node: &Value, root: &Value, active: &mut Vec<String>) -> Value {
    match node {
        Value::Object(map) => {
            if let Some(reference) = local_ref(map) {
                return resolve(node, reference, root, active);
            }
            Value::Object(
                map.iter()
                    .filter(|(key, _)| key.as_str() != ID_KEY)
                    .map(|(key, value)| (key.clone(), inline(value, root, active)))
                    .collect::<Map<_, _>>(),
            )
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| inline(item, root, active))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn resolve(node: &Value, reference: &str, root: &Value, active: &mut Vec<String>) -> Value {
    if active.iter().any(|seen| seen == reference) {
        return node.clone();
    }
    let Some(target) = root.pointer(&reference[1..]) else {
        warn!(reference, "Unresolvable reference left in place");
        return node.clone();
    };

    active.push(reference.to_string());
    let resolved = inline(target, root, active);
    active.pop();
    resolved
}

fn local_ref(map: &Map<String, Value>) -> Option<&str> {
    map.get(REF_KEY)
        .and_then(Value::as_str)
        .filter(|reference| reference.starts_with('#'))
}
