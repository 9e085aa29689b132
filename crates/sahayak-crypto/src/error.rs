//! # Cryptographic Error Types
//!
//! Errors from key import and signing. Verification does not use these at
//! its public surface: it folds every failure into a [`PacketVerdict`].
//!
//! [`PacketVerdict`]: crate::PacketVerdict

use sahayak_core::CanonicalizationError;
use thiserror::Error;

/// Errors from cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Ed25519 signature verification failed.
    #[error("Ed25519 verification failed: {0}")]
    VerificationFailed(String),

    /// Signature is not 64 bytes.
    #[error("invalid Ed25519 signature length: expected 64 bytes, got {0}")]
    InvalidSignatureLength(usize),

    /// Public key bytes are not a valid Ed25519 point.
    #[error("invalid Ed25519 public key: {0}")]
    InvalidPublicKey(String),

    /// The payload could not be canonicalized for signing.
    #[error("payload canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}
