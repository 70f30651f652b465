//! Prototype-conformance validation.
//!
//! A resource type's prototype is a leaf-typed JSON skeleton: every leaf
//! value in the document must have the same JSON type as the corresponding
//! prototype leaf, but a key that doesn't trace back to the prototype is
//! silently dropped rather than rejected. This is deliberately not full JSON
//! Schema (see spec design notes): no bounds, patterns, or enums, only shape
//! and leaf type.

use serde_json::Value;

use crate::error::{Result, StoreError};

/// Checks `document` against `prototype`'s leaf types and returns a sanitized
/// copy with any key not present in the prototype dropped. Only a wrong-typed
/// *known* leaf raises [`StoreError::ValidationError`].
pub fn validate(prototype: &Value, document: &Value) -> Result<Value> {
    walk(prototype, document, "")
}

fn walk(prototype: &Value, document: &Value, path: &str) -> Result<Value> {
    match (prototype, document) {
        (Value::Object(proto_map), Value::Object(doc_map)) => {
            let mut sanitized = serde_json::Map::new();
            for (key, doc_value) in doc_map {
                let Some(proto_value) = proto_map.get(key) else {
                    continue;
                };
                let field_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                sanitized.insert(key.clone(), walk(proto_value, doc_value, &field_path)?);
            }
            Ok(Value::Object(sanitized))
        }
        (Value::Array(proto_items), Value::Array(doc_items)) => {
            let Some(proto_item) = proto_items.first() else {
                return Ok(Value::Array(doc_items.clone()));
            };
            let mut sanitized = Vec::with_capacity(doc_items.len());
            for (i, doc_item) in doc_items.iter().enumerate() {
                sanitized.push(walk(proto_item, doc_item, &format!("{path}[{i}]"))?);
            }
            Ok(Value::Array(sanitized))
        }
        (proto, doc) => {
            if leaf_type_matches(proto, doc) {
                Ok(doc.clone())
            } else {
                Err(StoreError::ValidationError(format!(
                    "field '{path}' expected {}, got {}",
                    type_name(proto),
                    type_name(doc)
                )))
            }
        }
    }
}

fn leaf_type_matches(prototype: &Value, document: &Value) -> bool {
    if matches!(document, Value::Null) {
        return true;
    }
    match (prototype, document) {
        (Value::String(_), Value::String(_)) => true,
        (Value::Number(_), Value::Number(_)) => true,
        (Value::Bool(_), Value::Bool(_)) => true,
        (Value::Null, _) => true,
        _ => false,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_matching_shape() {
        let prototype = json!({"names": [{"full_name": ""}], "age": 0});
        let doc = json!({"names": [{"full_name": "John"}], "age": 30});
        assert_eq!(validate(&prototype, &doc).unwrap(), doc);
    }

    #[test]
    fn strips_unknown_field() {
        let prototype = json!({"age": 0});
        let doc = json!({"age": 30, "nickname": "JD"});
        let sanitized = validate(&prototype, &doc).unwrap();
        assert_eq!(sanitized, json!({"age": 30}));
    }

    #[test]
    fn strips_unknown_field_nested_inside_an_object() {
        let prototype = json!({"address": {"city": ""}});
        let doc = json!({"address": {"city": "Helsinki", "planet": "Earth"}});
        let sanitized = validate(&prototype, &doc).unwrap();
        assert_eq!(sanitized, json!({"address": {"city": "Helsinki"}}));
    }

    #[test]
    fn rejects_type_mismatch() {
        let prototype = json!({"age": 0});
        let doc = json!({"age": "thirty"});
        assert!(validate(&prototype, &doc).is_err());
    }

    #[test]
    fn allows_null_for_any_leaf() {
        let prototype = json!({"age": 0});
        let doc = json!({"age": null});
        assert!(validate(&prototype, &doc).is_ok());
    }
}
