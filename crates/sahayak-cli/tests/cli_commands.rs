//! Subcommand handlers driven the way the binary drives them.

use std::path::Path;

use sahayak_cli::resolve::{run_resolve, ResolveArgs};
use sahayak_cli::simulate::{run_simulate, SimulateArgs};
use sahayak_cli::verify::{run_verify, VerifyArgs};
use sahayak_core::{Coordinate, EmergencyPayload, Severity, SignedPacket, Timestamp, TransportEvent, TripId};
use sahayak_crypto::{seal, TripKeyPair};

const STATIONS: &str = r#"[
    {"id": "ps_001", "name": "Cubbon Park PS", "address": "Kasturba Rd", "phone": "", "lat": 12.9763, "lng": 77.5929, "area": "Bangalore Central"},
    {"id": "ps_002", "name": "Indiranagar PS", "address": "HAL 2nd Stage", "phone": "", "lat": 12.9784, "lng": 77.6408, "area": "Bangalore East"}
]"#;

fn packet(signed: bool) -> SignedPacket {
    let payload = EmergencyPayload::new(
        TripId::new(),
        Coordinate::new(12.9716, 77.6046).unwrap(),
        Timestamp::from_millis(1_760_000_000_000).unwrap(),
        Severity::High,
    );
    if signed {
        seal(Some(&TripKeyPair::generate()), payload)
    } else {
        seal(None, payload)
    }
}

fn verify_file(path: &Path) -> (u8, String) {
    let mut out = Vec::new();
    let code = run_verify(
        &VerifyArgs {
            file: path.to_path_buf(),
        },
        &mut out,
    )
    .unwrap();
    (code, String::from_utf8(out).unwrap())
}

#[test]
fn offline_simulation_relays_then_replays_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("monitor.yaml");
    std::fs::write(&config, "relay:\n  scanning_ms: 40\n  connecting_ms: 30\n").unwrap();

    let args = SimulateArgs {
        ticks: 20,
        offline_at_critical: true,
        relay_nodes: Some(2),
        config: Some(config),
    };
    let mut out = Vec::new();
    assert_eq!(run_simulate(&args, &mut out).unwrap(), 0);
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("transport offline"));
    assert!(text.contains("relay QUEUED"), "{text}");
    assert!(text.contains("transport online"));
    assert!(text.contains("summary: 1 emergency event(s), 1 verified, 1 replay(s)"), "{text}");
}

#[test]
fn verify_classifies_packet_files() {
    let dir = tempfile::tempdir().unwrap();

    let signed = dir.path().join("signed.json");
    std::fs::write(&signed, serde_json::to_string(&packet(true)).unwrap()).unwrap();
    let (code, text) = verify_file(&signed);
    assert_eq!(code, 0);
    assert!(text.contains("signature: verified"));
    assert!(text.contains("severity:  HIGH"));

    let unsigned = dir.path().join("unsigned.json");
    std::fs::write(&unsigned, serde_json::to_string(&packet(false)).unwrap()).unwrap();
    assert_eq!(verify_file(&unsigned).0, 3);

    let mut tampered = serde_json::to_value(packet(true)).unwrap();
    tampered["payload"]["severity"] = serde_json::json!("LOW");
    let tampered_path = dir.path().join("tampered.json");
    std::fs::write(&tampered_path, tampered.to_string()).unwrap();
    assert_eq!(verify_file(&tampered_path).0, 2);
}

#[test]
fn verify_accepts_wrapped_emergency_event() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("event.json");
    let event = TransportEvent::Emergency {
        packet: packet(true),
    };
    std::fs::write(&path, serde_json::to_string(&event).unwrap()).unwrap();
    assert_eq!(verify_file(&path).0, 0);
}

#[test]
fn verify_rejects_non_packet_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("junk.json");
    std::fs::write(&path, r#"{"hello": "world"}"#).unwrap();
    let result = run_verify(&VerifyArgs { file: path }, &mut Vec::new());
    assert!(result.is_err());
}

#[test]
fn resolve_prints_nearest_station() {
    let dir = tempfile::tempdir().unwrap();
    let stations = dir.path().join("stations.json");
    std::fs::write(&stations, STATIONS).unwrap();

    let mut out = Vec::new();
    let args = ResolveArgs {
        stations: stations.clone(),
        lat: 12.9716,
        lng: 77.5946,
        radius_km: 2.0,
    };
    assert_eq!(run_resolve(&args, &mut out).unwrap(), 0);
    let assignment: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(assignment["station_id"], "ps_001");

    let far = ResolveArgs {
        stations,
        lat: 13.3,
        lng: 77.9,
        radius_km: 2.0,
    };
    assert_eq!(run_resolve(&far, &mut Vec::new()).unwrap(), 2);
}
