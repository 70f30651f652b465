//! Identifier generation: `TTTT-RRRR...RRRR-CCCCCCCC`.

use rand::RngCore;
use sha2::{Digest, Sha256, Sha512};

/// Generates a new 46-character resource/revision identifier for `resource_type`.
///
/// The type field is the first 4 hex chars of `sha512(resource_type)`, the
/// random field is 16 cryptographically random bytes hex-encoded, and the
/// checksum field is the first 8 hex chars of `sha512(type_field + random_field)`.
pub fn get_new_id(resource_type: &str) -> String {
    let mut random_bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut random_bytes);
    let random_field = hex::encode(random_bytes);
    get_new_id_with_random(resource_type, &random_field)
}

/// Same as [`get_new_id`] but with the random field supplied, for deterministic tests.
pub fn get_new_id_with_random(resource_type: &str, random_field: &str) -> String {
    let type_field = &hex::encode(Sha512::digest(resource_type.as_bytes()))[..4];
    let checksum_input = format!("{type_field}{random_field}");
    let checksum_field = &hex::encode(Sha512::digest(checksum_input.as_bytes()))[..8];
    format!("{type_field}-{random_field}-{checksum_field}")
}

/// Truncates `name` to fit within `maxlen` bytes, appending a deterministic
/// 6-hex-char suffix derived from `sha256(name)` when truncation is needed, so
/// that distinct long names don't collide once chopped.
pub fn chop_long_name(name: &str, maxlen: usize) -> String {
    if name.len() <= maxlen {
        return name.to_string();
    }
    let digest = hex::encode(Sha256::digest(name.as_bytes()));
    let suffix = &digest[digest.len() - 6..];
    let head_len = maxlen - 7;
    format!("{}_{}", &name[..head_len], suffix)
}
