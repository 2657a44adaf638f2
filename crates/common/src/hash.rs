//! Key hashing for equivalence policies.
//!
//! Equivalence policies hash one projection of a directory (its name, path,
//! creation time or size). The hash only has to agree with equality under the
//! same projection, so a fast non-cryptographic XXH3 digest is used.

use xxhash_rust::xxh3::Xxh3;

/// Compute the XXH3 64-bit hash of a byte slice.
///
/// # Arguments
/// * `data` - Bytes to hash
pub fn hash_bytes(data: &[u8]) -> u64 {
    xxhash_rust::xxh3::xxh3_64(data)
}

/// Streaming hasher for composite keys.
///
/// Each field is prefixed with a tag byte so keys of different kinds never
/// produce the same byte stream.
pub struct KeyHasher {
    inner: Xxh3,
}

impl KeyHasher {
    /// Create a new streaming hasher.
    pub fn new() -> Self {
        Self { inner: Xxh3::new() }
    }

    /// Feed a tagged string field.
    ///
    /// # Arguments
    /// * `tag` - Discriminator for the kind of value
    /// * `value` - String content
    pub fn write_str(&mut self, tag: u8, value: &str) -> &mut Self {
        self.inner.update(&[tag]);
        self.inner.update(value.as_bytes());
        self
    }

    /// Feed a tagged integer field.
    ///
    /// # Arguments
    /// * `tag` - Discriminator for the kind of value
    /// * `value` - Integer content
    pub fn write_u128(&mut self, tag: u8, value: u128) -> &mut Self {
        self.inner.update(&[tag]);
        self.inner.update(&value.to_le_bytes());
        self
    }

    /// Finalize and return the 64-bit digest.
    pub fn finish(&self) -> u64 {
        self.inner.digest()
    }
}

impl Default for KeyHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_bytes_deterministic() {
        assert_eq!(hash_bytes(b"photos"), hash_bytes(b"photos"));
        assert_ne!(hash_bytes(b"photos"), hash_bytes(b"Photos"));
    }

    #[test]
    fn test_key_hasher_equal_inputs() {
        let a: u64 = KeyHasher::new().write_str(1, "photos").finish();
        let b: u64 = KeyHasher::new().write_str(1, "photos").finish();
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_hasher_tag_separates_kinds() {
        let as_name: u64 = KeyHasher::new().write_str(1, "42").finish();
        let as_path: u64 = KeyHasher::new().write_str(2, "42").finish();
        assert_ne!(as_name, as_path);
    }

    #[test]
    fn test_key_hasher_integer() {
        let a: u64 = KeyHasher::new().write_u128(4, 1024).finish();
        let b: u64 = KeyHasher::new().write_u128(4, 1025).finish();
        assert_ne!(a, b);
    }
}
