//! # Verify Subcommand
//!
//! Classifies an emergency packet file the way the alert console does.
//! The file may hold a bare `SignedPacket` or an `emergency` transport
//! event wrapping one.
//!
//! Exit codes: `0` verified, `2` invalid signature, `3` unsigned.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use sahayak_core::{SignedPacket, TransportEvent};
use sahayak_crypto::{verify_packet, PacketVerdict};

/// Arguments for `sahayak verify`.
#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    /// Packet JSON file.
    #[arg(value_name = "PACKET")]
    pub file: PathBuf,
}

/// Read a packet from `path`.
pub fn read_packet(path: &Path) -> Result<SignedPacket> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if let Ok(TransportEvent::Emergency { packet }) = serde_json::from_str::<TransportEvent>(&raw) {
        return Ok(packet);
    }
    serde_json::from_str(&raw).with_context(|| format!("{} is not an emergency packet", path.display()))
}

/// Execute the verify subcommand.
pub fn run_verify(args: &VerifyArgs, out: &mut impl Write) -> Result<u8> {
    let packet = read_packet(&args.file)?;
    let payload = packet.payload();
    let verdict = verify_packet(&packet);
    writeln!(out, "trip:      {}", payload.trip_id)?;
    writeln!(out, "severity:  {}", payload.severity)?;
    writeln!(out, "location:  {}", payload.location)?;
    writeln!(out, "emitted:   {}", payload.timestamp)?;
    writeln!(out, "signature: {verdict}")?;
    Ok(match verdict {
        PacketVerdict::Verified => 0,
        PacketVerdict::Invalid => 2,
        PacketVerdict::Unsigned => 3,
    })
}
