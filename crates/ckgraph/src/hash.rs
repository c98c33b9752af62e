//! Content hashing for change detection.

use sha2::{Digest, Sha256};

/// Length of a hex-encoded content hash.
pub const CONTENT_HASH_LEN: usize = 64;

/// SHA-256 of `bytes`, lowercase hex.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Whether `value` has the shape of a [`content_hash`] result.
pub fn is_content_hash(value: &str) -> bool {
    value.len() == CONTENT_HASH_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
