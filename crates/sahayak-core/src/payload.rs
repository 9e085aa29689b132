//! # Emergency Payload and Signed Packet
//!
//! The emergency record that leaves the rider's device. `EmergencyPayload`
//! is the signed content; `SignedPacket` bundles it with the signature and
//! the exporting public key.
//!
//! ## Wire Form
//!
//! ```json
//! {
//!   "payload": {
//!     "trip_id": "…uuid…",
//!     "location": {"lat_e6": 12971600, "lng_e6": 77604600},
//!     "timestamp_millis": 1760000000000,
//!     "severity": "HIGH"
//!   },
//!   "signature": "…128 hex chars… or empty",
//!   "public_key": "…64 hex chars… or empty"
//! }
//! ```
//!
//! An empty `signature` marks the packet as *unsigned*: the key was not ready
//! when the emergency fired. Receivers treat that as a distinct outcome from
//! an invalid signature.
//!
//! [`WirePacket`] has the same JSON shape with the hex fields left as text,
//! so a receiver can record a packet whose signature does not even decode.

use serde::{Deserialize, Serialize};

use crate::canonical::CanonicalBytes;
use crate::coordinate::Coordinate;
use crate::digest::{sha256_digest, ContentDigest};
use crate::error::{CanonicalizationError, CoreError};
use crate::identity::TripId;
use crate::temporal::Timestamp;

/// Severity carried in an emergency payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Advisory only.
    Low,
    /// Sustained deviation, not yet critical.
    Medium,
    /// Critical risk; the only severity the risk machine emits.
    High,
}

impl Severity {
    /// Canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signed content of an emergency record. Pure data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyPayload {
    /// Trip the emergency belongs to.
    pub trip_id: TripId,
    /// Position at the moment of emission, microdegree precision.
    #[serde(with = "crate::coordinate::microdegrees")]
    pub location: Coordinate,
    /// Emission time.
    #[serde(rename = "timestamp_millis")]
    pub timestamp: Timestamp,
    /// Severity of the emergency.
    pub severity: Severity,
}

impl EmergencyPayload {
    /// Build a payload. The location is quantized to microdegrees so the
    /// value the sender signs is exactly the value the receiver decodes.
    pub fn new(trip_id: TripId, location: Coordinate, timestamp: Timestamp, severity: Severity) -> Self {
        Self {
            trip_id,
            location: location.quantized(),
            timestamp,
            severity,
        }
    }

    /// Canonical bytes of this payload: the exact signing input.
    pub fn canonical_bytes(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        CanonicalBytes::new(self)
    }
}

/// An emergency payload with its signature and public key. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedPacket {
    payload: EmergencyPayload,
    #[serde(with = "hex_bytes")]
    signature: Vec<u8>,
    #[serde(with = "hex_bytes")]
    public_key: Vec<u8>,
}

impl SignedPacket {
    /// Assemble a packet from its parts.
    pub fn new(payload: EmergencyPayload, signature: Vec<u8>, public_key: Vec<u8>) -> Self {
        Self {
            payload,
            signature,
            public_key,
        }
    }

    /// A packet with empty signature and public key.
    pub fn unsigned(payload: EmergencyPayload) -> Self {
        Self::new(payload, Vec::new(), Vec::new())
    }

    /// The signed content.
    pub fn payload(&self) -> &EmergencyPayload {
        &self.payload
    }

    /// Raw signature bytes (empty when unsigned).
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Raw exported public key bytes (empty when unsigned).
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Whether the packet carries no signature.
    pub fn is_unsigned(&self) -> bool {
        self.signature.is_empty()
    }

    /// Content identity of the whole packet (payload, signature and key).
    pub fn digest(&self) -> Result<ContentDigest, CanonicalizationError> {
        Ok(sha256_digest(&CanonicalBytes::new(self)?))
    }
}

/// A packet as received, hex fields not yet decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirePacket {
    /// The signed content.
    pub payload: EmergencyPayload,
    /// Hex signature as sent.
    pub signature: String,
    /// Hex public key as sent.
    pub public_key: String,
}

impl WirePacket {
    /// Decode the hex fields.
    ///
    /// # Errors
    ///
    /// [`CoreError::MalformedPacket`] when either field is not valid hex.
    pub fn decode(&self) -> Result<SignedPacket, CoreError> {
        let signature = hex_bytes::decode(&self.signature)
            .map_err(|e| CoreError::MalformedPacket(format!("signature: {e}")))?;
        let public_key = hex_bytes::decode(&self.public_key)
            .map_err(|e| CoreError::MalformedPacket(format!("public_key: {e}")))?;
        Ok(SignedPacket::new(self.payload.clone(), signature, public_key))
    }

    /// Content identity. Equal to [`SignedPacket::digest`] for a packet
    /// whose hex fields are lowercase.
    pub fn digest(&self) -> Result<ContentDigest, CanonicalizationError> {
        Ok(sha256_digest(&CanonicalBytes::new(self)?))
    }
}

impl From<&SignedPacket> for WirePacket {
    fn from(packet: &SignedPacket) -> Self {
        Self {
            payload: packet.payload.clone(),
            signature: hex_bytes::encode(&packet.signature),
            public_key: hex_bytes::encode(&packet.public_key),
        }
    }
}

/// Serde adapter writing bytes as a lowercase hex string.
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize bytes as lowercase hex.
    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(bytes))
    }

    /// Deserialize bytes from a hex string.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        decode(&s).map_err(serde::de::Error::custom)
    }

    /// Encode bytes as lowercase hex.
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Decode a hex string (either case, surrounding whitespace ignored).
    pub fn decode(hex: &str) -> Result<Vec<u8>, String> {
        let hex = hex.trim();
        if hex.len() % 2 != 0 {
            return Err("hex string must have even length".to_string());
        }
        (0..hex.len())
            .step_by(2)
            .map(|i| {
                hex.get(i..i + 2)
                    .ok_or_else(|| format!("invalid hex at position {i}"))
                    .and_then(|pair| {
                        u8::from_str_radix(pair, 16)
                            .map_err(|e| format!("invalid hex at position {i}: {e}"))
                    })
            })
            .collect()
    }
}
