//! Evaluates a parsed [`Query`] against a resource's document, projects
//! matching resources, and applies sort/offset/limit.
//!
//! A predicate's field names a leaf by its dotted path suffix, matched
//! against every leaf reachable anywhere in the document (array indices
//! don't count as path segments, so a list-valued sub-document is matched
//! the same way a scalar field is) — the same leaf-name keying the
//! containment index uses, rather than an absolute path from the document
//! root.

use serde_json::Value;

use super::parser::{CompareOp, Predicate, Query};
use crate::shredder::clean_search_value;

/// Collects every `(path, leaf value)` pair reachable from `doc`, walking
/// through objects and transparently through arrays at any depth. `path`
/// never contains array indices, so every element of a list-valued field
/// shares its parent's path.
fn collect_leaves<'a>(doc: &'a Value, path: &mut Vec<&'a str>, out: &mut Vec<(Vec<&'a str>, &'a Value)>) {
    match doc {
        Value::Object(map) => {
            for (key, value) in map {
                path.push(key.as_str());
                collect_leaves(value, path, out);
                path.pop();
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_leaves(item, path, out);
            }
        }
        leaf => out.push((path.clone(), leaf)),
    }
}

/// True if `path`'s trailing segments equal `field` exactly — i.e. `field`
/// names a leaf at any depth, not just at the document root.
fn path_matches_field(path: &[&str], field: &[&str]) -> bool {
    field.len() <= path.len() && path[path.len() - field.len()..] == *field
}

fn compare(op: &CompareOp, value: &Value, target: &str) -> bool {
    let cleaned = clean_search_value(value);
    let target_lower = target.to_ascii_lowercase();
    match op {
        CompareOp::Exact => scalar_as_string(&cleaned).as_deref() == Some(target_lower.as_str()),
        CompareOp::Ne => scalar_as_string(&cleaned).as_deref() != Some(target_lower.as_str()),
        CompareOp::Startswith => scalar_as_string(&cleaned)
            .map(|s| s.starts_with(&target_lower))
            .unwrap_or(false),
        CompareOp::Contains => scalar_as_string(&cleaned)
            .map(|s| s.contains(&target_lower))
            .unwrap_or(false),
        CompareOp::Ge | CompareOp::Gt | CompareOp::Le | CompareOp::Lt => {
            match (scalar_as_string(&cleaned), target.parse::<f64>().ok()) {
                (Some(s), Some(target_num)) if value.is_number() => {
                    let Ok(num) = s.parse::<f64>() else {
                        return false;
                    };
                    match op {
                        CompareOp::Ge => num >= target_num,
                        CompareOp::Gt => num > target_num,
                        CompareOp::Le => num <= target_num,
                        CompareOp::Lt => num < target_num,
                        _ => unreachable!(),
                    }
                }
                (Some(s), _) => match op {
                    CompareOp::Ge => s.as_str() >= target_lower.as_str(),
                    CompareOp::Gt => s.as_str() > target_lower.as_str(),
                    CompareOp::Le => s.as_str() <= target_lower.as_str(),
                    CompareOp::Lt => s.as_str() < target_lower.as_str(),
                    _ => unreachable!(),
                },
                _ => false,
            }
        }
    }
}

fn scalar_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn matches_predicate(doc: &Value, predicate: &Predicate) -> bool {
    let field: Vec<&str> = predicate.field.split('.').collect();
    let mut path = Vec::new();
    let mut leaves = Vec::new();
    collect_leaves(doc, &mut path, &mut leaves);
    leaves
        .into_iter()
        .any(|(leaf_path, value)| path_matches_field(&leaf_path, &field) && compare(&predicate.op, value, &predicate.value))
}

/// Returns true if `doc` satisfies every predicate in `query` (conjunction).
pub fn matches(doc: &Value, query: &Query) -> bool {
    query.predicates.iter().all(|p| matches_predicate(doc, p))
}

/// Projects a matched resource's JSON according to the query's `show`/`show_all`.
pub fn project(doc: &Value, id: &str, revision: &str, query: &Query) -> Value {
    if query.show_all {
        let mut obj = doc.as_object().cloned().unwrap_or_default();
        obj.insert("id".to_string(), Value::String(id.to_string()));
        obj.insert("revision".to_string(), Value::String(revision.to_string()));
        Value::Object(obj)
    } else if !query.show_fields.is_empty() {
        let mut obj = serde_json::Map::new();
        for field in &query.show_fields {
            if let Some(v) = doc.get(field) {
                obj.insert(field.clone(), v.clone());
            }
        }
        obj.insert("id".to_string(), Value::String(id.to_string()));
        obj.insert("revision".to_string(), Value::String(revision.to_string()));
        Value::Object(obj)
    } else {
        let mut obj = serde_json::Map::new();
        obj.insert("id".to_string(), Value::String(id.to_string()));
        obj.insert("revision".to_string(), Value::String(revision.to_string()));
        Value::Object(obj)
    }
}

/// Sorts `rows` in place by the query's sort keys (each a field to compare as
/// a string, ascending), then applies offset/limit.
pub fn sort_and_page(mut rows: Vec<(Value, Value)>, query: &Query) -> Vec<Value> {
    if !query.sort_keys.is_empty() {
        rows.sort_by(|(a_doc, _), (b_doc, _)| {
            for key in &query.sort_keys {
                let a = a_doc.get(key).and_then(scalar_as_string).unwrap_or_default();
                let b = b_doc.get(key).and_then(scalar_as_string).unwrap_or_default();
                match a.cmp(&b) {
                    std::cmp::Ordering::Equal => continue,
                    other => return other,
                }
            }
            std::cmp::Ordering::Equal
        });
    }

    let offset = query.offset.unwrap_or(0);
    let iter = rows.into_iter().skip(offset).map(|(_, projected)| projected);
    match query.limit {
        Some(limit) => iter.take(limit).collect(),
        None => iter.collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::parser::parse;
    use serde_json::json;

    #[test]
    fn exact_matches_nested_list_element() {
        let doc = json!({"names": [{"full_name": "John Doe"}, {"full_name": "Jane"}]});
        let query = parse("exact/names.full_name/John Doe").unwrap();
        assert!(matches(&doc, &query));
    }

    #[test]
    fn ne_excludes_matching_value() {
        let doc = json!({"status": "active"});
        let query = parse("ne/status/active").unwrap();
        assert!(!matches(&doc, &query));
    }

    #[test]
    fn startswith_matches_an_element_of_a_plain_string_array() {
        let doc = json!({"names": ["abc", "def"]});
        let query = parse("startswith/names/de").unwrap();
        assert!(matches(&doc, &query));
        let miss = parse("contains/names/x").unwrap();
        assert!(!matches(&doc, &miss));
    }

    #[test]
    fn exact_matches_a_leaf_nested_inside_a_list_without_the_list_prefix() {
        let doc = json!({
            "gov_org_ids": [
                {"country": "FI", "org_id_type": "registration_number", "gov_org_id": "1234567-9"}
            ]
        });
        let by_type = parse("exact/org_id_type/registration_number").unwrap();
        assert!(matches(&doc, &by_type));
        let by_id = parse("exact/gov_org_id/1234567-9").unwrap();
        assert!(matches(&doc, &by_id));
        let miss = parse("exact/gov_org_id/0000000-0").unwrap();
        assert!(!matches(&doc, &miss));
    }

    #[test]
    fn startswith_is_case_insensitive() {
        let doc = json!({"name": "Johnson"});
        let query = parse("startswith/name/john").unwrap();
        assert!(matches(&doc, &query));
    }

    #[test]
    fn project_show_all_includes_id_and_revision() {
        let doc = json!({"name": "a"});
        let query = parse("show_all").unwrap();
        let projected = project(&doc, "id1", "rev1", &query);
        assert_eq!(projected["id"], "id1");
        assert_eq!(projected["name"], "a");
    }

    #[test]
    fn project_default_only_has_id_and_revision() {
        let doc = json!({"name": "a"});
        let query = parse("").unwrap();
        let projected = project(&doc, "id1", "rev1", &query);
        assert_eq!(projected.as_object().unwrap().len(), 2);
    }
}
