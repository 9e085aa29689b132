//! # Simulate Subcommand
//!
//! Runs the reference Bengaluru trip through the real monitoring actor: a
//! trip from MG Road toward Indiranagar, then position ticks alternating
//! ±0.01° longitude around the start until the risk score goes critical.
//!
//! With `--offline-at-critical` the transport drops as soon as the rider
//! leaves the corridor, so the critical crossing happens offline. The
//! emergency then traverses the relay queue with the configured delays and
//! is replayed when the transport comes back.
//!
//! Progress lines and every emitted transport event (one JSON object per
//! line) go to the given writer.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use tokio::time::Instant;

use sahayak_core::{Coordinate, TransportEvent};
use sahayak_crypto::verify_packet;
use sahayak_monitor::{
    spawn_monitor, Connectivity, FixedDiscovery, MonitorConfig, MonitorHandle, QueueChannel,
    RelayDiscovery, SessionSnapshot, SimulatedDiscovery,
};
use sahayak_state::{RelayPhase, TripStatus};

/// MG Road.
pub const START: (f64, f64) = (12.9716, 77.5946);
/// Indiranagar.
pub const DESTINATION: (f64, f64) = (12.99, 77.62);

const POLL: Duration = Duration::from_millis(20);
const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Arguments for `sahayak simulate`.
#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Number of position ticks to feed.
    #[arg(long, default_value_t = 20)]
    pub ticks: usize,

    /// Drop the transport once the rider leaves the corridor.
    #[arg(long)]
    pub offline_at_critical: bool,

    /// Fixed number of relay peers (default: 1 to 3 simulated peers).
    #[arg(long)]
    pub relay_nodes: Option<usize>,

    /// Monitor configuration (YAML). Defaults apply to missing fields.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Tick `i` of the alternating pattern.
pub fn alternating(i: usize) -> (f64, f64) {
    let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
    (START.0, START.1 + sign * 0.01)
}

/// Outcome of a simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSummary {
    /// Emergency events delivered to the transport.
    pub emergencies: usize,
    /// Of those, how many verify.
    pub verified: usize,
    /// Reconnect replays performed.
    pub replays: u64,
}

/// Execute the simulate subcommand.
pub fn run_simulate(args: &SimulateArgs, out: &mut impl Write) -> Result<u8> {
    let config = match &args.config {
        Some(path) => MonitorConfig::load(path)
            .with_context(|| format!("failed to load monitor config {}", path.display()))?,
        None => MonitorConfig::default(),
    };
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    let summary = runtime.block_on(simulate(args, config, out))?;
    writeln!(
        out,
        "summary: {} emergency event(s), {} verified, {} replay(s)",
        summary.emergencies, summary.verified, summary.replays
    )?;
    Ok(0)
}

/// Drive one trip through a fresh monitor.
pub async fn simulate(
    args: &SimulateArgs,
    config: MonitorConfig,
    out: &mut impl Write,
) -> Result<SimulationSummary> {
    let timing = config.relay.clone();
    let (channel, mut rx) = QueueChannel::unbounded();
    let discovery: Arc<dyn RelayDiscovery> = match args.relay_nodes {
        Some(n) => Arc::new(FixedDiscovery(n)),
        None => Arc::new(SimulatedDiscovery::default()),
    };
    let handle = spawn_monitor(config, Arc::new(channel), discovery);

    let start = Coordinate::new(START.0, START.1)?;
    let destination = Coordinate::new(DESTINATION.0, DESTINATION.1)?;
    let trip_id = handle.start_trip(start, Some(destination)).await?;
    writeln!(out, "{trip_id} started at {start}, destination {destination}")?;
    wait_until(&handle, "trip key", SETTLE_TIMEOUT, |s| {
        s.trip.as_ref().is_some_and(|t| t.key_ready)
    })
    .await?;

    let mut offline = false;
    let mut emitted = false;
    for i in 0..args.ticks {
        let (lat, lng) = alternating(i);
        handle.tick(lat, lng).await?;
        let snapshot = handle.snapshot().await?;
        let trip = snapshot.trip.context("trip ended unexpectedly")?;
        writeln!(
            out,
            "tick {:>2}  {:<9} score {:>5.1}  {:<8} relay {}",
            i + 1,
            trip.status.name(),
            trip.score,
            trip.level.name(),
            trip.relay_phase.name()
        )?;
        emitted = trip.emitted;
        if args.offline_at_critical && !offline && trip.status == TripStatus::Alert {
            if trip.emitted {
                writeln!(out, "emergency already emitted, staying online")?;
            } else {
                handle.set_connectivity(Connectivity::Offline).await?;
                offline = true;
                writeln!(out, "transport offline")?;
            }
        }
    }

    if emitted && offline {
        let budget = timing.scanning() + timing.connecting() + SETTLE_TIMEOUT;
        follow_relay(&handle, budget, out).await?;
        handle.set_connectivity(Connectivity::Online).await?;
        writeln!(out, "transport online")?;
    }
    let snapshot = if emitted {
        wait_until(&handle, "emergency delivery", SETTLE_TIMEOUT, |s| s.emergencies_sent >= 1).await?
    } else {
        writeln!(out, "risk never reached critical, no emergency emitted")?;
        handle.snapshot().await?
    };

    handle.end_trip().await?;
    drop(handle);

    let mut summary = SimulationSummary {
        emergencies: 0,
        verified: 0,
        replays: snapshot.replays,
    };
    while let Ok(event) = rx.try_recv() {
        writeln!(out, "{}", serde_json::to_string(&event)?)?;
        if let TransportEvent::Emergency { packet } = &event {
            summary.emergencies += 1;
            let verdict = verify_packet(packet);
            writeln!(out, "  signature: {verdict}")?;
            if verdict == sahayak_crypto::PacketVerdict::Verified {
                summary.verified += 1;
            }
        }
    }
    Ok(summary)
}

async fn follow_relay(handle: &MonitorHandle, budget: Duration, out: &mut impl Write) -> Result<()> {
    let deadline = Instant::now() + budget;
    let mut last = None;
    loop {
        let snapshot = handle.snapshot().await?;
        let Some(trip) = snapshot.trip else {
            bail!("trip ended while relaying");
        };
        if last != Some(trip.relay_phase) {
            writeln!(
                out,
                "relay {:<10} hops {} peers {}",
                trip.relay_phase.name(),
                trip.relay_hop_count,
                trip.relay_nodes.len()
            )?;
            last = Some(trip.relay_phase);
        }
        if trip.relay_phase == RelayPhase::Queued {
            return Ok(());
        }
        if Instant::now() >= deadline {
            bail!("relay did not reach the queued phase within {budget:?}");
        }
        tokio::time::sleep(POLL).await;
    }
}

async fn wait_until(
    handle: &MonitorHandle,
    what: &str,
    timeout: Duration,
    pred: impl Fn(&SessionSnapshot) -> bool,
) -> Result<SessionSnapshot> {
    let deadline = Instant::now() + timeout;
    loop {
        let snapshot = handle.snapshot().await?;
        if pred(&snapshot) {
            return Ok(snapshot);
        }
        if Instant::now() >= deadline {
            bail!("timed out waiting for {what}");
        }
        tokio::time::sleep(POLL).await;
    }
}
