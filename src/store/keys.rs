//! Key encoding for each column family.
//!
//! Keys are `\0`-joined segments so prefix scans line up on segment
//! boundaries (no segment may itself contain `\0`, which holds for resource
//! ids/types and subpath names in this domain).

const SEP: u8 = 0;

pub fn encode_resource_key(resource_type: &str, id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(resource_type.len() + id.len() + 1);
    key.extend_from_slice(resource_type.as_bytes());
    key.push(SEP);
    key.extend_from_slice(id.as_bytes());
    key
}

pub fn encode_resource_prefix(resource_type: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(resource_type.len() + 1);
    key.extend_from_slice(resource_type.as_bytes());
    key.push(SEP);
    key
}

pub fn encode_file_key(resource_type: &str, id: &str, subpath: &str) -> Vec<u8> {
    let mut key = encode_resource_key(resource_type, id);
    key.push(SEP);
    key.extend_from_slice(subpath.as_bytes());
    key
}

/// Auxiliary list row key: `{resource_type}\0{id}\0{subpath}\0{path}\0{index:08}`.
///
/// Prefixing on `{resource_type}\0{id}\0` yields every aux row for a resource
/// (used to delete-then-reinsert on write); prefixing on `{resource_type}\0`
/// yields every aux row for a type (used by the search compiler).
pub fn encode_aux_key(resource_type: &str, id: &str, subpath: &str, path: &str, index: usize) -> Vec<u8> {
    let mut key = encode_resource_key(resource_type, id);
    key.push(SEP);
    key.extend_from_slice(subpath.as_bytes());
    key.push(SEP);
    key.extend_from_slice(path.as_bytes());
    key.push(SEP);
    key.extend_from_slice(format!("{index:08}").as_bytes());
    key
}

/// Prefix covering every aux row for a resource, across all subpaths.
pub fn encode_aux_resource_prefix(resource_type: &str, id: &str) -> Vec<u8> {
    let mut key = encode_resource_key(resource_type, id);
    key.push(SEP);
    key
}

/// Prefix covering only the aux rows for one (resource, subpath) pair —
/// `""` for the main document. Used to rebuild a single subpath's aux rows
/// without disturbing the others.
pub fn encode_aux_subpath_prefix(resource_type: &str, id: &str, subpath: &str) -> Vec<u8> {
    let mut key = encode_aux_resource_prefix(resource_type, id);
    key.extend_from_slice(subpath.as_bytes());
    key.push(SEP);
    key
}

/// Change log key: `{resource_type}\0{sequence:020}`, zero-padded so
/// lexicographic order matches insertion order.
pub fn encode_change_key(resource_type: &str, sequence: u64) -> Vec<u8> {
    let mut key = encode_resource_prefix(resource_type);
    key.extend_from_slice(format!("{sequence:020}").as_bytes());
    key
}

pub fn decode_resource_id<'a>(resource_type: &str, key: &'a [u8]) -> Option<&'a str> {
    let prefix = encode_resource_prefix(resource_type);
    key.strip_prefix(prefix.as_slice())
        .and_then(|rest| std::str::from_utf8(rest).ok())
}
