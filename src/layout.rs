//! Logical table/index naming and idempotent layout registration.
//!
//! Derives deterministic table/index names from a resource type, truncating
//! long names via `chop_long_name` so they fit inside a 63-byte identifier
//! limit, and registers each resource type's layout idempotently. This store
//! has no physical tables — everything lives under RocksDB column families
//! keyed by resource type — but still derives and records these logical
//! names, since diagnostics, the CLI, and tests all surface them.

use crate::id::chop_long_name;
use crate::store::column_families::CF_LAYOUT;
use crate::store::db::Storage;
use crate::error::Result;

/// Postgres's identifier length limit, kept as the truncation budget even
/// though this store has no physical Postgres tables.
pub const MAX_NAME_LEN: usize = 63;

pub fn main_table_name(resource_type: &str) -> String {
    chop_long_name(resource_type, MAX_NAME_LEN)
}

pub fn aux_table_name(resource_type: &str, subpath: &str, path: &[String]) -> String {
    let suffix = if subpath.is_empty() {
        format!("__aux__{}", path.join("__"))
    } else {
        format!("__sub__{subpath}__aux__{}", path.join("__"))
    };
    chop_long_name(&format!("{resource_type}{suffix}"), MAX_NAME_LEN)
}

pub fn gin_index_name(resource_type: &str) -> String {
    chop_long_name(&format!("gin_idx_{resource_type}"), MAX_NAME_LEN)
}

pub fn files_table_name(resource_type: &str) -> String {
    chop_long_name(&format!("{resource_type}__files"), MAX_NAME_LEN)
}

/// Records that `resource_type`'s layout has been created, so repeated
/// startups don't redo (or double-log) the work — the RocksDB analogue of
/// checking `information_schema` before `CREATE TABLE`.
pub fn ensure_layout(storage: &Storage, resource_type: &str) -> Result<bool> {
    let key = resource_type.as_bytes();
    if storage.get(CF_LAYOUT, key)?.is_some() {
        return Ok(false);
    }
    storage.put(CF_LAYOUT, key, main_table_name(resource_type).as_bytes())?;
    Ok(true)
}
