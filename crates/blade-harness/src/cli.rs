#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::error::{HarnessError, Result};
use crate::runner::Runner;
use crate::scenario::Scenario;

#[derive(Debug, Parser)]
#[command(
    name = "blade-harness",
    about = "Replay blade navigation scenarios and fingerprint their traces",
    version
)]
pub struct Cli {
    /// Log engine activity to stderr (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replay a scenario and print its trace.
    Run(RunArgs),

    /// Replay a scenario and compare its digest.
    Check(CheckArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Scenario file (TOML, or JSON by extension).
    pub file: PathBuf,

    /// Print the JSONL trace instead of a summary.
    #[arg(long)]
    pub json: bool,

    /// Print the blake3 digest of the trace.
    #[arg(long)]
    pub digest: bool,
}

#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    /// Scenario file (TOML, or JSON by extension).
    pub file: PathBuf,

    /// Expected digest (`blake3:<hex>`).
    #[arg(long)]
    pub digest: String,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => run_scenario(&args),
        Commands::Check(args) => check_scenario(&args),
    }
}

fn run_scenario(args: &RunArgs) -> Result<()> {
    let scenario = Scenario::load(&args.file)?;
    let trace = Runner::run(&scenario)?;
    if args.json {
        print!("{}", trace.to_jsonl()?);
    } else if let Some(last) = trace.last() {
        println!(
            "{}: {} steps, {} blades, {} pending, dock [{}]",
            display_name(&scenario, &args.file),
            trace.snapshots.len(),
            last.stack_count,
            last.pending,
            last.dock.join(", ")
        );
    }
    if args.digest {
        println!("{}", trace.digest()?);
    }
    Ok(())
}

fn check_scenario(args: &CheckArgs) -> Result<()> {
    let scenario = Scenario::load(&args.file)?;
    let actual = Runner::run(&scenario)?.digest()?;
    if actual != args.digest {
        return Err(HarnessError::DigestMismatch {
            expected: args.digest.clone(),
            actual,
        });
    }
    println!("{}: ok", display_name(&scenario, &args.file));
    Ok(())
}

fn display_name(scenario: &Scenario, file: &std::path::Path) -> String {
    if scenario.name.is_empty() {
        file.display().to_string()
    } else {
        scenario.name.clone()
    }
}

/// Install a stderr subscriber. `RUST_LOG` overrides the verbosity flag.
fn init_tracing(verbose: u8, json: bool) {
    if verbose == 0 && std::env::var_os("RUST_LOG").is_none() {
        return;
    }
    let level = match verbose {
        0 | 1 => "bladestack=debug",
        _ => "bladestack=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
