//! Content hashing for cache keys.

/// Hex-encoded blake3 digest of `content`.
#[inline]
pub fn content_hash(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}
