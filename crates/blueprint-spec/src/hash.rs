//! Content hashing for cache keys
//!
//! [`ContentHash`] is a Blake3 digest over either raw bytes or the canonical
//! JSON projection of a serializable value. The cache layer keys component
//! resolutions and template renders by these digests.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// A 32-byte Blake3 digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Wrap raw digest bytes
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hash arbitrary bytes
    #[inline]
    #[must_use]
    pub fn of_bytes(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Hash the JSON encoding of a value
    ///
    /// Object keys are hashed in the order the value serializes them, so two
    /// maps with the same entries in a different insertion order can produce
    /// different digests when the map type preserves order.
    ///
    /// # Errors
    /// Returns [`HashError::Serialization`] if the value cannot be encoded.
    pub fn of_json<T>(value: &T) -> Result<Self, HashError>
    where
        T: serde::Serialize + ?Sized,
    {
        let encoded = serde_json::to_vec(value)?;
        Ok(Self::of_bytes(&encoded))
    }

    /// Full lowercase hex form
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 bytes as hex, for log lines
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decoded = hex::decode(s)?;
        let bytes: [u8; 32] = decoded
            .as_slice()
            .try_into()
            .map_err(|_| HashError::InvalidLength(decoded.len()))?;
        Ok(Self(bytes))
    }
}

impl serde::Serialize for ContentHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for ContentHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors produced while computing or decoding a [`ContentHash`]
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// Decoded digest has the wrong size
    #[error("invalid digest length: expected 32 bytes, got {0}")]
    InvalidLength(usize),

    /// Hex decoding failed
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// Value could not be encoded for hashing
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn same_bytes_same_digest() {
        assert_eq!(ContentHash::of_bytes(b"home"), ContentHash::of_bytes(b"home"));
        assert_ne!(ContentHash::of_bytes(b"home"), ContentHash::of_bytes(b"about"));
    }

    #[test]
    fn hex_form_parses_back() {
        let hash = ContentHash::of_bytes(b"layout");
        let parsed: ContentHash = hash.to_string().parse().unwrap();
        assert_eq!(hash, parsed);
        assert!(hash.to_hex().starts_with(&hash.short()));
        assert_eq!(hash.short().len(), 16);
    }

    #[test]
    fn short_hex_is_rejected() {
        let result = "abcd".parse::<ContentHash>();
        assert!(matches!(result, Err(HashError::InvalidLength(2))));
    }

    #[test]
    fn json_hash_is_sensitive_to_insertion_order() {
        // Documented caveat: ordered maps hash in iteration order.
        let mut a = IndexMap::new();
        a.insert("label", 1);
        a.insert("variant", 2);
        let mut b = IndexMap::new();
        b.insert("variant", 2);
        b.insert("label", 1);

        let ha = ContentHash::of_json(&a).unwrap();
        let hb = ContentHash::of_json(&b).unwrap();
        assert_ne!(ha, hb);
    }

    #[test]
    fn serde_uses_hex_string() {
        let hash = ContentHash::of_bytes(b"route");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", hash.to_hex()));
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }
}
