//! TLB cache simulator CLI.
//!
//! This binary provides a single entry point for simulation runs. It performs:
//! 1. **Run:** Execute one workload script per process against a shared TLB and print statistics.
//! 2. **Config dump:** Print the default configuration as JSON, as a starting point for `--config`.
//!
//! Logging goes to stderr and is controlled with `RUST_LOG` (e.g. `RUST_LOG=tlbsim_core=debug`).

use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tlbsim_core::config::Config;
use tlbsim_core::sim::{SimError, Simulator, Workload};
use tlbsim_core::stats;

#[derive(Parser, Debug)]
#[command(
    name = "tlbsim",
    author,
    version,
    about = "Two-way set-associative TLB cache simulator",
    long_about = "Run per-process memory workloads against a simulated TLB and report hit rates.\n\nExamples:\n  tlbsim run 1=workloads/p1.txt 2=workloads/p2.txt\n  tlbsim run --config sim.json 7=workloads/scan.txt\n  tlbsim dump-config > sim.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run workloads, one thread per process.
    Run {
        /// JSON configuration file; defaults are used when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Workloads as `<pid>=<script path>`.
        #[arg(required = true, value_parser = parse_workload_arg)]
        workloads: Vec<(u16, PathBuf)>,
    },

    /// Print the default configuration as JSON.
    DumpConfig,
}

/// Splits a `<pid>=<path>` argument.
fn parse_workload_arg(arg: &str) -> Result<(u16, PathBuf), String> {
    let (pid, path) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected <pid>=<path>, got `{arg}`"))?;
    let pid = pid
        .parse::<u16>()
        .map_err(|e| format!("invalid pid `{pid}`: {e}"))?;
    if path.is_empty() {
        return Err(format!("missing script path for pid {pid}"));
    }
    Ok((pid, PathBuf::from(path)))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run { config, workloads } => cmd_run(config, &workloads),
        Commands::DumpConfig => cmd_dump_config(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Loads the configuration and scripts, runs every workload and prints the statistics table.
fn cmd_run(config: Option<PathBuf>, workloads: &[(u16, PathBuf)]) -> Result<(), SimError> {
    let config = match config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let programs = workloads
        .iter()
        .map(|(pid, path)| Workload::from_file(*pid, path))
        .collect::<Result<Vec<_>, _>>()?;

    println!(
        "TLB: {} bytes ({} sets)  RAM: {} KiB  Dump: {}",
        config.tlb.size_bytes,
        config.tlb.num_sets(),
        config.memory.ram_size / 1024,
        config.general.dump
    );
    println!();

    let sim = Simulator::new(&config)?;
    let reports = sim.run(&programs)?;

    let failed: usize = reports.iter().map(|r| r.failed).sum();
    info!(processes = reports.len(), failed, "run complete");

    let rows: Vec<_> = reports.iter().map(|r| (r.pid, r.stats)).collect();
    let mut out = io::stdout().lock();
    stats::write_report(&mut out, &rows)?;
    if failed > 0 {
        writeln!(out, "{failed} instruction(s) rejected by the memory manager")?;
    }
    out.flush()?;
    Ok(())
}

/// Prints `Config::default()` as pretty JSON.
fn cmd_dump_config() -> Result<(), SimError> {
    let json = serde_json::to_string_pretty(&Config::default())
        .map_err(|e| SimError::Io(io::Error::other(e)))?;
    println!("{json}");
    Ok(())
}
