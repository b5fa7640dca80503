#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line host for Training Defence runs.
//!
//! Runs scripted sessions, lists save slots and moves snapshot files in and
//! out of the store directory.

mod plan;
mod session;

use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use training_defence_engine::{Engine, SystemCalendar};
use training_defence_system_persistence::{DirectoryStore, LoadOutcome};
use training_defence_system_progression::Leaderboard;

use crate::plan::SessionPlan;

/// Headless host for Training Defence.
#[derive(Debug, Parser)]
#[command(name = "training-defence", version)]
struct Cli {
    /// Directory holding saves and progress records.
    #[arg(long, global = true, default_value = ".training-defence")]
    store: PathBuf,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Plays a TOML session plan from a fresh run.
    Run {
        /// Plan file to play.
        plan: PathBuf,
    },
    /// Lists the save slots and campaign progress.
    Slots,
    /// Prints the current run as JSON.
    Export {
        /// Write to a file instead of standard output.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Applies a snapshot file and saves it into the active slot.
    Import {
        /// Snapshot file to apply.
        file: PathBuf,
    },
    /// Shows the global board, or the daily one.
    Leaderboard {
        /// Show the board of today's daily challenge.
        #[arg(long)]
        daily: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let store = DirectoryStore::open(&cli.store)
        .with_context(|| format!("cannot open store at {}", cli.store.display()))?;
    let mut engine = Engine::new(store, SystemCalendar);

    match cli.command {
        CliCommand::Run { plan } => {
            let plan = SessionPlan::load(&plan)?;
            let report = session::run(&mut engine, &plan)?;
            for wave in &report.waves {
                println!("{wave}");
            }
            if report.saved {
                println!("saved to slot {}", report.slot);
            } else {
                println!("slot {} could not be saved", report.slot);
            }
        }
        CliCommand::Slots => {
            let active = engine.active_slot();
            for (slot, preview) in engine.slot_previews() {
                let marker = if slot == active { '*' } else { ' ' };
                println!("{marker} slot {slot}: {preview}");
            }
            let progress = engine.campaign_progress();
            match progress.map {
                Some(map) => println!(
                    "campaign stage {}: wave {} on {map} ({:.0}%)",
                    progress.stage,
                    progress.target_wave,
                    progress.fraction * 100.0
                ),
                None => println!("campaign complete"),
            }
        }
        CliCommand::Export { output } => {
            let json = engine
                .export_snapshot()
                .context("cannot encode the current run")?;
            match output {
                Some(path) => fs::write(&path, json)
                    .with_context(|| format!("cannot write {}", path.display()))?,
                None => println!("{json}"),
            }
        }
        CliCommand::Import { file } => {
            let json = fs::read_to_string(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            match engine.import_snapshot(&json) {
                LoadOutcome::Applied => {
                    println!(
                        "imported wave {} into slot {}",
                        engine.wave(),
                        engine.active_slot()
                    );
                }
                LoadOutcome::Rejected(reason) => bail!("import rejected: {reason}"),
                LoadOutcome::Empty => bail!("nothing to import"),
            }
        }
        CliCommand::Leaderboard { daily } => {
            if daily {
                let record = engine.daily_record();
                println!("daily streak {}", record.streak());
                match engine.daily_leaderboard() {
                    Some(board) => print_board(board),
                    None => println!("no daily runs recorded"),
                }
            } else {
                print_board(engine.leaderboard());
            }
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn print_board(board: &Leaderboard) {
    if board.is_empty() {
        println!("no runs recorded");
        return;
    }
    for (rank, entry) in board.entries().iter().enumerate() {
        println!(
            "{}. wave {} | {} kills | {:.1}s | {}",
            rank + 1,
            entry.wave,
            entry.kills,
            entry.time,
            entry.map
        );
    }
}
