//! Parses the `/`-separated search-path DSL into a structured query.
//! Each operator consumes a fixed number of following path segments as its
//! arguments.

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub enum CompareOp {
    Exact,
    Startswith,
    Contains,
    Ge,
    Gt,
    Le,
    Lt,
    Ne,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub op: CompareOp,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub predicates: Vec<Predicate>,
    pub show_fields: Vec<String>,
    pub show_all: bool,
    pub sort_keys: Vec<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

fn operator_arity(op: &str) -> Option<usize> {
    Some(match op {
        "contains" | "exact" | "ge" | "gt" | "le" | "lt" | "ne" | "startswith" => 2,
        "show" | "sort" | "offset" | "limit" => 1,
        "show_all" => 0,
        _ => return None,
    })
}

/// Parses a `/`-separated, percent-decoded search path into a [`Query`].
pub fn parse(search_path: &str) -> Result<Query> {
    let words: Vec<String> = if search_path.is_empty() {
        Vec::new()
    } else {
        search_path
            .split('/')
            .map(percent_decode)
            .collect::<Result<Vec<_>>>()?
    };

    let mut query = Query::default();
    let mut i = 0;
    while i < words.len() {
        let op_name = &words[i];
        let arity = operator_arity(op_name)
            .ok_or_else(|| StoreError::InvalidSearch(format!("unknown operator '{op_name}'")))?;
        if i + 1 + arity > words.len() {
            return Err(StoreError::InvalidSearch(format!(
                "operator '{op_name}' requires {arity} argument(s)"
            )));
        }
        let args = &words[i + 1..i + 1 + arity];
        match op_name.as_str() {
            "show_all" => query.show_all = true,
            "show" => query.show_fields.push(args[0].clone()),
            "sort" => query.sort_keys.push(args[0].clone()),
            "offset" => {
                query.offset = Some(args[0].parse().map_err(|_| {
                    StoreError::InvalidSearch(format!("invalid offset '{}'", args[0]))
                })?)
            }
            "limit" => {
                query.limit = Some(args[0].parse().map_err(|_| {
                    StoreError::InvalidSearch(format!("invalid limit '{}'", args[0]))
                })?)
            }
            "exact" | "startswith" | "contains" | "ge" | "gt" | "le" | "lt" | "ne" => {
                let op = match op_name.as_str() {
                    "exact" => CompareOp::Exact,
                    "startswith" => CompareOp::Startswith,
                    "contains" => CompareOp::Contains,
                    "ge" => CompareOp::Ge,
                    "gt" => CompareOp::Gt,
                    "le" => CompareOp::Le,
                    "lt" => CompareOp::Lt,
                    "ne" => CompareOp::Ne,
                    _ => unreachable!(),
                };
                query.predicates.push(Predicate {
                    field: args[0].clone(),
                    op,
                    value: args[1].clone(),
                });
            }
            _ => unreachable!(),
        }
        i += 1 + arity;
    }
    Ok(query)
}

fn percent_decode(segment: &str) -> Result<String> {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|s| u8::from_str_radix(s, 16).ok());
            match hex {
                Some(byte) => {
                    out.push(byte);
                    i += 3;
                }
                None => {
                    out.push(bytes[i]);
                    i += 1;
                }
            }
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|e| StoreError::InvalidSearch(e.to_string()))
}
