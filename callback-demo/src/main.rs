//! Callback Registry Demo CLI
//!
//! Command-line driver for the callback-registry library. It registers the
//! four demo callbacks, fires synthetic triggers and unregisters a callback,
//! then prints what the callbacks saw.
//!
//! Without arguments it replays the built-in scenario; `--scenario` replays
//! a TOML file instead.

use anyhow::Result;
use callback_registry::{DuplicatePolicy, KeyPolicy};
use clap::Parser;
use std::io;
use std::path::PathBuf;

mod callbacks;
mod config;
mod report;
mod runner;

/// Callback Registry Demo - register, trigger and unset callbacks
#[derive(Parser, Debug)]
#[command(name = "callback-demo")]
#[command(about = "Replay callback registration and trigger scenarios", long_about = None)]
#[command(version)]
struct Args {
    /// Path to a scenario file (default: the built-in scenario)
    #[arg(short, long, value_name = "FILE")]
    scenario: Option<PathBuf>,

    /// Let string keys such as "14" alias the integer key 14
    #[arg(long)]
    alias_keys: bool,

    /// Keep one entry per registration instead of de-duplicating
    #[arg(long)]
    allow_duplicates: bool,

    /// Print the full run report as JSON
    #[arg(long)]
    json: bool,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Callback Registry Demo v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using registry library v{}", callback_registry::VERSION);

    let mut scenario = match &args.scenario {
        Some(path) => {
            log::info!("Loading scenario from: {:?}", path);
            config::load_scenario(path)?
        }
        None => config::Scenario::builtin(),
    };

    // Command line flags override the scenario's registry settings
    if args.alias_keys {
        scenario.registry.key_policy = KeyPolicy::Aliased;
    }
    if args.allow_duplicates {
        scenario.registry.duplicate_policy = DuplicatePolicy::Append;
    }

    let report = runner::run_scenario(&scenario)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        report::write_json(&mut out, &report)?;
    } else {
        report::write_text(&mut out, &report)?;
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
