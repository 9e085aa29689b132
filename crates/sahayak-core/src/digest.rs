//! # Content Digest
//!
//! SHA-256 digests over [`CanonicalBytes`]. The receiver uses them as packet
//! identities: the same emergency delivered twice (once through a relay
//! hop, once by reconnect replay) hashes to the same digest and is shown
//! once.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;

/// A SHA-256 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest(pub [u8; 32]);

impl ContentDigest {
    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> String {
        self.0.iter().take(6).map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

/// Compute a SHA-256 digest from canonical bytes.
///
/// Accepts only `&CanonicalBytes`, so every digest in the system is taken
/// over the same byte sequence a verifier would reconstruct.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let hash = Sha256::digest(data.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_digest() {
        // sha256("{}")
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        assert_eq!(
            sha256_digest(&cb).to_hex(),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn test_key_order_does_not_change_digest() {
        let a = CanonicalBytes::new(&serde_json::json!({"a": 1, "b": 2})).unwrap();
        let b = CanonicalBytes::new(&serde_json::json!({"b": 2, "a": 1})).unwrap();
        assert_eq!(sha256_digest(&a), sha256_digest(&b));
    }

    #[test]
    fn test_display_and_short() {
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        let d = sha256_digest(&cb);
        assert!(d.to_string().starts_with("sha256:44136fa3"));
        assert_eq!(d.short().len(), 12);
    }
}
