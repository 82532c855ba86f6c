use std::{
    io::{stdin, stdout, IsTerminal, Write},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use geo::Point;
use itertools::Itertools;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{
    config::{parse_position, Config, Mode},
    listing::SchemaError,
    selection::{LinePrompt, Outcome, TerminalPrompt},
    visits::VisitStore,
};

mod config;
mod distance;
mod fingerprint;
mod listing;
mod ranking;
mod selection;
mod utils;
mod visits;

/// Pick a San Francisco food truck you haven't been to lately.
///
/// Trucks are listed least visited first, then nearest first.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// current location as latitude,longitude (no spaces)
    #[arg(value_parser = parse_position, allow_hyphen_values = true)]
    latlong: Option<Point>,
    /// testing mode with canned data and a separate database
    #[arg(long)]
    test: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = run(cli);
    if let Err(e) = &result {
        error!("{e:#}");
    }
    ExitCode::from(exit_code(&result))
}

// 1 when the listing no longer matches the expected layout, 2 for anything else
fn exit_code(result: &Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) if e.downcast_ref::<SchemaError>().is_some() => 1,
        Err(_) => 2,
    }
}

fn run(cli: Cli) -> Result<()> {
    let mode = if cli.test {
        Mode::Testing
    } else {
        Mode::Production
    };
    let config = Config::load(cli.latlong, mode)?;
    info!(
        position = ?config.position.x_y(),
        ?mode,
        data_dir = %config.data_dir.display(),
        "starting"
    );

    let store = VisitStore::new(config.store_path());
    let visits = store
        .load_all()
        .with_context(|| format!("failed to load visits from {}", store.path().display()))?;

    let text = listing::fetch(&config.source())?;
    let rows = listing::decode(&text)?;
    let ranking = ranking::rank(&rows, config.position, &visits);
    info!(
        rows = rows.len(),
        candidates = ranking.candidates.len(),
        skipped = ranking.skipped.len(),
        "ranked listing"
    );
    for (reason, count) in ranking.skipped.iter().counts_by(|(_, x)| x.label()) {
        info!(reason, count, "skipped rows");
    }

    let mut out = stdout().lock();
    let outcome = if stdin().is_terminal() {
        selection::choose(&ranking.candidates, &mut TerminalPrompt, &mut out)?
    } else {
        let mut prompt = LinePrompt::new(stdin().lock(), stdout());
        selection::choose(&ranking.candidates, &mut prompt, &mut out)?
    };

    match outcome {
        Outcome::Chosen(fingerprint) => {
            let visits = store.increment(&fingerprint)?;
            match visits {
                1 => writeln!(out, "Enjoy your first visit!")?,
                n => writeln!(out, "Enjoy! That makes {n} visits.")?,
            }
        }
        Outcome::NoneChosen => info!("no truck chosen"),
        Outcome::Cancelled => info!("cancelled"),
    }

    Ok(())
}
