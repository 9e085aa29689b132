//! # Packet Sealing and Verification
//!
//! `seal` is the sender side: sign when a key is available, otherwise fall
//! back to an unsigned packet. Emission never waits on, or fails because of,
//! key material.
//!
//! `verify` and `verify_packet` are the receiver side. They map every
//! failure (bad hex length, invalid key bytes, wrong signature, payload that
//! cannot be canonicalized) to a negative outcome and never panic.

use sahayak_core::{EmergencyPayload, SignedPacket};
use serde::{Deserialize, Serialize};

use crate::ed25519::{PublicKey, Signature, TripKeyPair};

/// Receiver-side outcome for a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketVerdict {
    /// Signature checks out against the embedded public key.
    Verified,
    /// Signature present but does not verify.
    Invalid,
    /// No signature was attached.
    Unsigned,
}

impl PacketVerdict {
    /// Canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Invalid => "invalid",
            Self::Unsigned => "unsigned",
        }
    }
}

impl std::fmt::Display for PacketVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build a packet for `payload`, signed with `key` when present.
///
/// A missing key or a signing failure yields an unsigned packet; the failure
/// is logged and otherwise swallowed.
pub fn seal(key: Option<&TripKeyPair>, payload: EmergencyPayload) -> SignedPacket {
    let Some(key) = key else {
        tracing::warn!(trip_id = %payload.trip_id, "trip key not ready, emitting unsigned packet");
        return SignedPacket::unsigned(payload);
    };
    match key.sign_payload(&payload) {
        Ok(signature) => {
            SignedPacket::new(payload, signature.to_vec(), key.public_key().export())
        }
        Err(e) => {
            tracing::warn!(trip_id = %payload.trip_id, error = %e, "signing failed, emitting unsigned packet");
            SignedPacket::unsigned(payload)
        }
    }
}

/// Check `signature` over the canonical form of `payload` using the exported
/// `public_key`. Returns false for any malformed input.
pub fn verify(public_key: &[u8], payload: &EmergencyPayload, signature: &[u8]) -> bool {
    let Ok(key) = PublicKey::import(public_key) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(signature) else {
        return false;
    };
    let Ok(canonical) = payload.canonical_bytes() else {
        return false;
    };
    key.verify(&canonical, &signature).is_ok()
}

/// Classify a received packet.
pub fn verify_packet(packet: &SignedPacket) -> PacketVerdict {
    if packet.is_unsigned() {
        return PacketVerdict::Unsigned;
    }
    if verify(packet.public_key(), packet.payload(), packet.signature()) {
        PacketVerdict::Verified
    } else {
        PacketVerdict::Invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sahayak_core::{Coordinate, Severity, Timestamp, TripId};

    fn payload() -> EmergencyPayload {
        EmergencyPayload::new(
            TripId::new(),
            Coordinate::new(12.9716, 77.6046).unwrap(),
            Timestamp::from_millis(1_760_000_000_000).unwrap(),
            Severity::High,
        )
    }

    #[test]
    fn test_seal_with_key_verifies() {
        let kp = TripKeyPair::generate();
        let packet = seal(Some(&kp), payload());
        assert!(!packet.is_unsigned());
        assert_eq!(packet.signature().len(), 64);
        assert_eq!(packet.public_key().len(), 32);
        assert_eq!(verify_packet(&packet), PacketVerdict::Verified);
    }

    #[test]
    fn test_seal_without_key_is_unsigned() {
        let packet = seal(None, payload());
        assert!(packet.is_unsigned());
        assert!(packet.public_key().is_empty());
        assert_eq!(verify_packet(&packet), PacketVerdict::Unsigned);
    }

    #[test]
    fn test_tampered_payload_is_invalid() {
        let kp = TripKeyPair::generate();
        let packet = seal(Some(&kp), payload());
        let mut other = packet.payload().clone();
        other.severity = Severity::Low;
        assert!(!verify(packet.public_key(), &other, packet.signature()));
        let forged = SignedPacket::new(
            other,
            packet.signature().to_vec(),
            packet.public_key().to_vec(),
        );
        assert_eq!(verify_packet(&forged), PacketVerdict::Invalid);
    }

    #[test]
    fn test_malformed_inputs_never_panic() {
        let p = payload();
        assert!(!verify(&[], &p, &[]));
        assert!(!verify(&[0u8; 32], &p, &[0u8; 64]));
        assert!(!verify(&[1u8; 5], &p, &[1u8; 64]));
        assert!(!verify(&[0u8; 32], &p, &[1u8; 3]));
    }

    #[test]
    fn test_signature_without_key_is_invalid() {
        let kp = TripKeyPair::generate();
        let sealed = seal(Some(&kp), payload());
        let packet = SignedPacket::new(
            sealed.payload().clone(),
            sealed.signature().to_vec(),
            Vec::new(),
        );
        assert_eq!(verify_packet(&packet), PacketVerdict::Invalid);
    }

    #[test]
    fn test_verdict_survives_wire() {
        let kp = TripKeyPair::generate();
        let packet = seal(Some(&kp), payload());
        let json = serde_json::to_string(&packet).unwrap();
        let decoded: SignedPacket = serde_json::from_str(&json).unwrap();
        assert_eq!(verify_packet(&decoded), PacketVerdict::Verified);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn any_single_bit_flip_in_signature_invalidates(byte in 0usize..64, bit in 0u8..8) {
                let kp = TripKeyPair::from_seed(&[42u8; 32]);
                let packet = seal(Some(&kp), payload());
                let mut sig = packet.signature().to_vec();
                sig[byte] ^= 1 << bit;
                prop_assert!(!verify(packet.public_key(), packet.payload(), &sig));
            }

            #[test]
            fn signed_payload_verifies_for_any_location(
                lat in -90.0f64..=90.0,
                lng in -180.0f64..=180.0,
                millis in 0i64..4_000_000_000_000,
            ) {
                let kp = TripKeyPair::from_seed(&[9u8; 32]);
                let p = EmergencyPayload::new(
                    TripId::new(),
                    Coordinate::new(lat, lng).unwrap(),
                    Timestamp::from_millis(millis).unwrap(),
                    Severity::High,
                );
                let packet = seal(Some(&kp), p);
                prop_assert_eq!(verify_packet(&packet), PacketVerdict::Verified);
            }

            #[test]
            fn arbitrary_bytes_never_verify(
                key in proptest::collection::vec(any::<u8>(), 0..40),
                sig in proptest::collection::vec(any::<u8>(), 0..80),
            ) {
                prop_assert!(!verify(&key, &payload(), &sig));
            }
        }
    }
}
