//! Packets sealed on the device must verify on the console after crossing
//! the JSON transport.

use sahayak_core::{Coordinate, EmergencyPayload, Severity, Timestamp, TransportEvent, TripId};
use sahayak_crypto::{seal, verify_packet, PacketVerdict, PublicKey, TripKeyPair};

fn payload() -> EmergencyPayload {
    EmergencyPayload::new(
        TripId::new(),
        Coordinate::new(12.3051, 76.6551).unwrap(),
        Timestamp::from_millis(1_760_000_123_456).unwrap(),
        Severity::High,
    )
}

#[test]
fn signed_emergency_event_verifies_after_transport() {
    let kp = TripKeyPair::generate();
    let event = TransportEvent::Emergency {
        packet: seal(Some(&kp), payload()),
    };
    let json = serde_json::to_string(&event).unwrap();

    let received: TransportEvent = serde_json::from_str(&json).unwrap();
    let TransportEvent::Emergency { packet } = received else {
        panic!("expected emergency event");
    };
    assert_eq!(verify_packet(&packet), PacketVerdict::Verified);
    assert_eq!(PublicKey::import(packet.public_key()).unwrap(), kp.public_key());
}

#[test]
fn hex_edit_of_location_breaks_signature() {
    let kp = TripKeyPair::generate();
    let packet = seal(Some(&kp), payload());
    let json = serde_json::to_string(&packet)
        .unwrap()
        .replace("12305100", "12305101");
    let tampered = serde_json::from_str(&json).unwrap();
    assert_eq!(verify_packet(&tampered), PacketVerdict::Invalid);
}

#[test]
fn unsigned_packet_is_reported_separately_from_invalid() {
    let json = serde_json::to_string(&seal(None, payload())).unwrap();
    let received = serde_json::from_str(&json).unwrap();
    assert_eq!(verify_packet(&received), PacketVerdict::Unsigned);
}
