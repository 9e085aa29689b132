//! # Ed25519 Trip Keys
//!
//! ## Security Invariant
//!
//! - Signing input is `&CanonicalBytes`; raw byte slices cannot be signed.
//! - `TripKeyPair` does not implement `Serialize`, `Clone`, or a revealing
//!   `Debug`. It is owned by one trip session and dropped with it; the
//!   underlying dalek key zeroizes on drop.
//! - Public keys travel as 32 raw bytes and are re-validated on import.

use ed25519_dalek::{Signer, Verifier};
use sahayak_core::{CanonicalBytes, EmergencyPayload};

use crate::error::CryptoError;

/// An Ed25519 public key (32 bytes).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey(ed25519_dalek::VerifyingKey);

/// An Ed25519 signature (64 bytes).
#[derive(Clone, PartialEq, Eq)]
pub struct Signature([u8; 64]);

/// A per-trip Ed25519 key pair.
pub struct TripKeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

impl PublicKey {
    /// Wire representation: the 32 raw public key bytes.
    pub fn export(&self) -> Vec<u8> {
        self.0.to_bytes().to_vec()
    }

    /// Parse a public key from its wire representation.
    ///
    /// # Errors
    ///
    /// [`CryptoError::InvalidPublicKey`] for wrong length or bytes that do not
    /// decode to a curve point.
    pub fn import(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidPublicKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        ed25519_dalek::VerifyingKey::from_bytes(&arr)
            .map(Self)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }

    /// Verify `signature` over `data`.
    pub fn verify(&self, data: &CanonicalBytes, signature: &Signature) -> Result<(), CryptoError> {
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        self.0
            .verify(data.as_bytes(), &sig)
            .map_err(|e| CryptoError::VerificationFailed(e.to_string()))
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({}...)", hex_prefix(self.0.as_bytes()))
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

impl Signature {
    /// Parse a signature from raw bytes.
    ///
    /// # Errors
    ///
    /// [`CryptoError::InvalidSignatureLength`] unless exactly 64 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignatureLength(bytes.len()))?;
        Ok(Self(arr))
    }

    /// The raw 64 signature bytes.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Borrow the raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({}...)", hex_prefix(&self.0))
    }
}

// ---------------------------------------------------------------------------
// TripKeyPair
// ---------------------------------------------------------------------------

impl TripKeyPair {
    /// Generate a fresh random key pair from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Deterministic key pair from a 32-byte seed. Intended for fixtures.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// The public half.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key())
    }

    /// Sign canonical bytes. Ed25519 is deterministic: same input, same
    /// signature.
    pub fn sign(&self, data: &CanonicalBytes) -> Signature {
        Signature(self.signing_key.sign(data.as_bytes()).to_bytes())
    }

    /// Canonicalize and sign an emergency payload.
    pub fn sign_payload(&self, payload: &EmergencyPayload) -> Result<Signature, CryptoError> {
        let canonical = payload.canonical_bytes()?;
        Ok(self.sign(&canonical))
    }
}

impl std::fmt::Debug for TripKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TripKeyPair(<private>)")
    }
}

fn hex_prefix(bytes: &[u8]) -> String {
    bytes.iter().take(4).map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sahayak_core::{Coordinate, Severity, Timestamp, TripId};

    fn payload() -> EmergencyPayload {
        EmergencyPayload::new(
            TripId::new(),
            Coordinate::new(12.9716, 77.5946).unwrap(),
            Timestamp::from_millis(1_760_000_000_000).unwrap(),
            Severity::High,
        )
    }

    #[test]
    fn test_sign_and_verify() {
        let kp = TripKeyPair::generate();
        let p = payload();
        let sig = kp.sign_payload(&p).unwrap();
        let canonical = p.canonical_bytes().unwrap();
        kp.public_key().verify(&canonical, &sig).expect("valid signature");
    }

    #[test]
    fn test_wrong_key_fails() {
        let kp1 = TripKeyPair::generate();
        let kp2 = TripKeyPair::generate();
        let p = payload();
        let sig = kp1.sign_payload(&p).unwrap();
        let canonical = p.canonical_bytes().unwrap();
        assert!(kp2.public_key().verify(&canonical, &sig).is_err());
    }

    #[test]
    fn test_deterministic_from_seed() {
        let seed = [7u8; 32];
        let a = TripKeyPair::from_seed(&seed);
        let b = TripKeyPair::from_seed(&seed);
        assert_eq!(a.public_key(), b.public_key());
        let p = payload();
        assert_eq!(a.sign_payload(&p).unwrap(), b.sign_payload(&p).unwrap());
    }

    #[test]
    fn test_public_key_export_import() {
        let kp = TripKeyPair::generate();
        let exported = kp.public_key().export();
        assert_eq!(exported.len(), 32);
        assert_eq!(PublicKey::import(&exported).unwrap(), kp.public_key());
    }

    #[test]
    fn test_import_rejects_wrong_length() {
        assert!(matches!(
            PublicKey::import(&[0u8; 31]),
            Err(CryptoError::InvalidPublicKey(_))
        ));
        assert!(PublicKey::import(&[]).is_err());
    }

    #[test]
    fn test_signature_from_slice_length() {
        assert!(matches!(
            Signature::from_slice(&[0u8; 63]),
            Err(CryptoError::InvalidSignatureLength(63))
        ));
        assert!(Signature::from_slice(&[0u8; 64]).is_ok());
    }

    #[test]
    fn test_debug_does_not_leak_private_key() {
        let kp = TripKeyPair::generate();
        assert_eq!(format!("{kp:?}"), "TripKeyPair(<private>)");
    }
}
