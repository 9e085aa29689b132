//! # Resolve Subcommand
//!
//! Nearest-authority lookup against a station dataset file.
//!
//! Exit codes: `0` inside the coverage radius, `2` outside it.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use sahayak_core::Coordinate;
use sahayak_jurisdiction::{JurisdictionPolicy, StationRegistry, DEFAULT_RADIUS_KM};

/// Arguments for `sahayak resolve`.
#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Station dataset (JSON array from the scraper).
    #[arg(long, env = "STATIONS_FILE")]
    pub stations: PathBuf,

    /// Latitude in degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude in degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub lng: f64,

    /// Coverage radius in kilometres.
    #[arg(long, default_value_t = DEFAULT_RADIUS_KM)]
    pub radius_km: f64,
}

/// Execute the resolve subcommand. Prints the assignment as JSON.
pub fn run_resolve(args: &ResolveArgs, out: &mut impl Write) -> Result<u8> {
    let policy = JurisdictionPolicy::with_radius(args.radius_km)?;
    let position = Coordinate::new(args.lat, args.lng)?;
    let registry = StationRegistry::load(&args.stations)?;
    let assignment = registry
        .nearest(&position, &policy)
        .with_context(|| format!("{} contains no usable stations", args.stations.display()))?;
    writeln!(out, "{}", serde_json::to_string_pretty(&assignment)?)?;
    Ok(if assignment.inside_radius { 0 } else { 2 })
}
