//! # sahayak-crypto — Emergency Packet Codec
//!
//! - **Ed25519** key pairs, one per trip, generated when the trip starts so
//!   nothing expensive happens at the critical moment.
//! - **Signing** over the canonical bytes of an [`EmergencyPayload`], so the
//!   same payload always yields the same signing input.
//! - **Export/import** of the public key as 32 raw bytes (hex on the wire).
//! - **Verification** that returns a verdict and never errors or panics on
//!   malformed input.
//!
//! ## Crate Policy
//!
//! - Private key material never implements `Serialize` and never appears in
//!   `Debug` output.
//! - No mocking of cryptographic operations in tests; every test uses real
//!   Ed25519 over real canonical bytes.
//!
//! [`EmergencyPayload`]: sahayak_core::EmergencyPayload

pub mod ed25519;
pub mod error;
pub mod packet;

pub use ed25519::{PublicKey, Signature, TripKeyPair};
pub use error::CryptoError;
pub use packet::{seal, verify, verify_packet, PacketVerdict};
