//! Cache key derivation
//!
//! Cache entries are content-addressed: the key is the SHA-256 of the item's
//! stable identifier (URL, ticket ID, instruction + input, ...). Parts are
//! joined with a unit separator so `["ab", "c"]` and `["a", "bc"]` differ.

use sha2::{Digest, Sha256};

const SEPARATOR: &[u8] = b"\x1f";

/// Hex SHA-256 over the given identifier parts.
pub fn cache_key(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (idx, part) in parts.iter().enumerate() {
        if idx > 0 {
            hasher.update(SEPARATOR);
        }
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// File name for a cache entry.
pub fn entry_file_name(key: &str) -> String {
    format!("{key}.json")
}
