use crate::url::CanonicalUrl;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

/// 128-bit fingerprint of a canonical URL, used by the dedup index
///
/// The first 16 bytes of the SHA-256 digest of the canonical string.
/// Serialized as 32 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    /// Computes the fingerprint of a canonical URL
    pub fn of(url: &CanonicalUrl) -> Self {
        let digest = Sha256::digest(url.as_str().as_bytes());
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Self(bytes)
    }

    /// Returns the fingerprint as a hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a fingerprint from its hex form
    pub fn from_hex(s: &str) -> Option<Self> {
        let decoded = hex::decode(s).ok()?;
        let bytes: [u8; 16] = decoded.try_into().ok()?;
        Some(Self(bytes))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Fingerprint::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid fingerprint: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::canonicalize;

    #[test]
    fn test_equivalent_urls_share_fingerprint() {
        let a = canonicalize("https://Example.org/a/#x", None).unwrap();
        let b = canonicalize("https://example.org/a", None).unwrap();
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn test_different_urls_differ() {
        let a = canonicalize("https://example.org/a", None).unwrap();
        let b = canonicalize("https://example.org/b", None).unwrap();
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn test_hex_form() {
        let url = canonicalize("https://example.org/", None).unwrap();
        let fp = Fingerprint::of(&url);
        let hex = fp.to_hex();
        assert_eq!(hex.len(), 32);
        assert_eq!(Fingerprint::from_hex(&hex), Some(fp));

        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, format!("\"{}\"", hex));
    }

    #[test]
    fn test_invalid_hex_rejected() {
        assert_eq!(Fingerprint::from_hex("zz"), None);
        assert_eq!(Fingerprint::from_hex("abcd"), None);
        assert!(serde_json::from_str::<Fingerprint>("\"not-hex\"").is_err());
    }
}
