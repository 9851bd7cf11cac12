#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Marble Smash levels with a scripted player.
//!
//! Every event is printed to stdout as one JSON line; a summary goes to stderr.

mod autoplay;
mod config;
mod listener;

use std::{io, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use marble_smash_core::LevelStatus;
use marble_smash_session::{EventListener, Session};
use marble_smash_world::query;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    autoplay::choose_move,
    config::RunConfig,
    listener::JsonLines,
};

/// Command-line arguments accepted by the runner.
#[derive(Debug, Parser)]
#[command(name = "marble-smash", about = "Plays a Marble Smash level and logs its events")]
struct Cli {
    /// Run configuration listing level files and director tuning.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Level file to play; repeat to build a sequence. Overrides the config's list.
    #[arg(long = "level")]
    levels: Vec<PathBuf>,
    /// 1-based display level; values past the sequence loop back.
    #[arg(long, default_value_t = 1)]
    level_number: u32,
    /// Seed for the spawn director.
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,
    /// Upper bound on the number of turns played.
    #[arg(long, default_value_t = 200)]
    turns: u32,
    /// Suppresses the JSON event log.
    #[arg(long)]
    quiet: bool,
}

/// Entry point for the Marble Smash command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut run = match &cli.config {
        Some(path) => config::load_run_config(path)?,
        None => RunConfig::default(),
    };
    if !cli.levels.is_empty() {
        run.levels = cli.levels.clone();
    }

    let sequence = config::load_sequence(&run.levels, run.loop_start)?;
    let level = sequence.level_for(cli.level_number);

    let log = JsonLines::new(io::stdout());
    let log_status = log.status();
    let mut listeners: Vec<Box<dyn EventListener>> = Vec::new();
    if !cli.quiet {
        listeners.push(Box::new(log));
    }
    let mut session = Session::with_listeners(
        level,
        cli.level_number,
        run.director,
        ChaCha8Rng::seed_from_u64(cli.seed),
        listeners,
    );

    for turn in 1..=cli.turns {
        if session.status() != LevelStatus::InProgress {
            break;
        }
        let Some((slot, anchor)) = choose_move(session.world()) else {
            break;
        };
        let report = session
            .play_turn(slot, anchor)
            .with_context(|| format!("failed to play turn {turn}"))?;
        if report.rejected() {
            bail!("scripted placement of slot {} at {anchor} was rejected", slot.get());
        }
        log_status
            .check()
            .context("failed to write the event log")?;
    }
    log_status
        .check()
        .context("failed to write the event log")?;

    eprintln!(
        "level {} (id {}): {:?} after {} turns, score {}/{}",
        cli.level_number,
        query::level_id(session.world()),
        session.status(),
        query::turn(session.world()),
        session.score(),
        query::goal(session.world()),
    );
    Ok(())
}
