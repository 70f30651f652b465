//! Document shredding: turns a resource body into (a) a flattened containment
//! form used for the search index, and (b) a flattened list form, one row
//! per array element anywhere in the document, used to answer list-aware
//! search predicates.

use serde_json::Value;
use std::collections::BTreeMap;

/// A single leaf path/value pair produced while walking a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub path: Vec<String>,
    pub value: Value,
}

/// Lowercases string values so search comparisons are case-insensitive; all
/// other value kinds pass through unchanged.
pub fn clean_search_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.to_ascii_lowercase()),
        other => other.clone(),
    }
}

/// Flattens `data` into a single object of `{"a.b.c": lowercased-scalar}`
/// pairs suitable for a containment-style index: arrays are walked but not
/// represented (list membership is answered by the aux table instead).
pub fn flatten_for_gin(data: &Value) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    walk_gin(data, &mut Vec::new(), &mut out);
    out
}

fn walk_gin(value: &Value, path: &mut Vec<String>, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                path.push(k.clone());
                walk_gin(v, path, out);
                path.pop();
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_gin(item, path, out);
            }
        }
        leaf => {
            if !path.is_empty() {
                out.insert(path.join("."), clean_search_value(leaf));
            }
        }
    }
}

/// Separates out every non-list-of-lists array element found in `data`,
/// tagged with the dotted path to the array that contained it. Mirrors the
/// reference's `_separate_lists` generator.
fn separate_lists(data: &Value, path: &[String], out: &mut Vec<(Vec<String>, Value)>) {
    match data {
        Value::Object(map) => {
            for (k, v) in map {
                let mut next = path.to_vec();
                next.push(k.clone());
                separate_lists(v, &next, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                if !matches!(item, Value::Array(_)) {
                    out.push((path.to_vec(), strip_lists(item)));
                }
                separate_lists(item, path, out);
            }
        }
        _ => {}
    }
}

/// Returns a copy of `value` with every list-valued key removed, recursively.
/// Matches the reference's `strip_lists`: nested lists are dropped from the
/// per-element row stored in the aux table, since they get their own rows.
fn strip_lists(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !matches!(v, Value::Array(_)))
                .map(|(k, v)| (k.clone(), strip_lists(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Groups the separated list elements by the path to their containing array,
/// preserving within-group order. Mirrors the reference's `iter_lists`.
pub fn iter_lists(data: &Value) -> Vec<(Vec<String>, Vec<Value>)> {
    let mut separated = Vec::new();
    separate_lists(data, &[], &mut separated);
    separated.sort_by(|a, b| a.0.cmp(&b.0));

    let mut groups: Vec<(Vec<String>, Vec<Value>)> = Vec::new();
    for (path, value) in separated {
        match groups.last_mut() {
            Some((last_path, values)) if *last_path == path => values.push(value),
            _ => groups.push((path, vec![value])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_nested_scalars_with_lowercasing() {
        let doc = json!({"names": [{"full_name": "John Doe"}], "age": 3});
        let flat = flatten_for_gin(&doc);
        assert_eq!(flat.get("names.full_name").unwrap(), &json!("john doe"));
        assert_eq!(flat.get("age").unwrap(), &json!(3));
    }

    #[test]
    fn iter_lists_groups_by_path() {
        let doc = json!({
            "names": [
                {"full_name": "John Doe"},
                {"full_name": "Jane Doe"},
            ],
            "emails": [{"value": "a@example.com"}],
        });
        let groups = iter_lists(&doc);
        let names_group = groups
            .iter()
            .find(|(p, _)| p == &vec!["names".to_string()])
            .unwrap();
        assert_eq!(names_group.1.len(), 2);
        let emails_group = groups
            .iter()
            .find(|(p, _)| p == &vec!["emails".to_string()])
            .unwrap();
        assert_eq!(emails_group.1.len(), 1);
    }

    #[test]
    fn strip_lists_removes_nested_arrays() {
        let item = json!({"full_name": "John", "tags": ["a", "b"]});
        assert_eq!(strip_lists(&item), json!({"full_name": "John"}));
    }
}
