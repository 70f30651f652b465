//! Resource and resource-type schema data structures.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A declarative resource-type prototype: a leaf-typed JSON skeleton describing
/// the shape every resource of this type must conform to, plus named
/// sub-paths and file sub-paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceTypeSchema {
    /// Resource type name, e.g. `"person"`.
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Mount path, e.g. `"/persons"`.
    pub path: String,

    /// Leaf-typed JSON skeleton. Every key present in a resource must trace
    /// back to a key present here; leaf values carry the expected JSON type.
    pub prototype: Value,

    /// Named sub-resources, each with its own prototype.
    #[serde(default)]
    pub subpaths: HashMap<String, SubpathSchema>,

    /// Names of subpaths that hold an opaque binary blob instead of JSON.
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubpathSchema {
    pub prototype: Value,
}

/// A stored resource: its id, current revision, and JSON body (sub-paths
/// excluded — those are stored and fetched separately).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub revision: String,
    #[serde(flatten)]
    pub data: Value,
}

/// One row of the auxiliary flattened-list table: one element of a JSON array
/// found anywhere in a resource's document, grouped by the path to that array
/// and keyed back to the owning resource/subpath.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuxListRow {
    pub id: String,
    pub subpath: String,
    pub path: Vec<String>,
    pub data: Value,
}
