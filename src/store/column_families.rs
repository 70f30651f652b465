//! Column family layout.
//!
//! Resources, auxiliary list rows, files, the change log, and table-layout
//! bookkeeping each get their own column family, one per logical "table" in
//! this store's relational vocabulary.

/// Main resource rows: `id -> Resource` (JSON-encoded).
pub const CF_RESOURCES: &str = "resources";

/// Auxiliary flattened-list rows, one key per (resource id, subpath, path, index).
pub const CF_AUX: &str = "aux";

/// Binary file sub-path blobs: `(id, subpath) -> bytes`.
pub const CF_FILES: &str = "files";

/// Append-only change log: `(resource_type, sequence) -> Change`.
pub const CF_CHANGES: &str = "changes";

/// Layout registry: records which resource types have had their logical
/// "tables" (i.e. key namespaces) created, standing in for
/// `information_schema` reflection in the Postgres-flavored original.
pub const CF_LAYOUT: &str = "layout";

pub fn all_column_families() -> Vec<&'static str> {
    vec![CF_RESOURCES, CF_AUX, CF_FILES, CF_CHANGES, CF_LAYOUT]
}
