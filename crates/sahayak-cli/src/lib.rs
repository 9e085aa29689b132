//! # sahayak-cli — Command-Line Tool for the Trip Safety Engine
//!
//! ## Subcommands
//!
//! - `sahayak simulate` — Bengaluru trip scenario through the monitoring
//!   actor, optionally going offline before the critical crossing.
//! - `sahayak verify <packet.json>` — signature classification of a packet.
//! - `sahayak resolve --stations <file> --lat --lng` — nearest station.
//!
//! Every handler writes to a caller-supplied writer and returns the process
//! exit code, so the binary stays a thin dispatcher.
//!
//! ```bash
//! sahayak simulate --offline-at-critical
//! sahayak verify packet.json
//! sahayak resolve --stations police_stations.json --lat 12.9716 --lng 77.5946
//! ```

pub mod resolve;
pub mod simulate;
pub mod verify;

/// Log filter directive for the binary.
///
/// `-v` flags win; without them `RUST_LOG` (passed as `env`) applies, and
/// with neither only warnings reach stderr so command output stays clean.
pub fn log_directive(verbose: u8, env: Option<&str>) -> String {
    match (verbose, env.map(str::trim).filter(|e| !e.is_empty())) {
        (0, Some(env)) => env.to_string(),
        (0, None) => "warn".to_string(),
        (1, _) => "info".to_string(),
        (2, _) => "debug".to_string(),
        _ => "trace".to_string(),
    }
}
