//! # sahayak CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sahayak_cli::log_directive;
use sahayak_cli::resolve::{run_resolve, ResolveArgs};
use sahayak_cli::simulate::{run_simulate, SimulateArgs};
use sahayak_cli::verify::{run_verify, VerifyArgs};

/// Sahayak trip safety toolkit.
#[derive(Parser, Debug)]
#[command(name = "sahayak", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the Bengaluru trip scenario through the monitoring session.
    Simulate(SimulateArgs),

    /// Classify an emergency packet file.
    Verify(VerifyArgs),

    /// Find the police station responsible for a position.
    Resolve(ResolveArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = EnvFilter::try_new(log_directive(cli.verbose, rust_log.as_deref()))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let mut out = std::io::stdout().lock();
    let result = match &cli.command {
        Commands::Simulate(args) => run_simulate(args, &mut out),
        Commands::Verify(args) => run_verify(args, &mut out),
        Commands::Resolve(args) => run_resolve(args, &mut out),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
