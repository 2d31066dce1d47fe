//! Gamify Control - operator CLI for the Bvester progression engine
//!
//! Inspects catalogs and replays recorded platform event streams through
//! a fresh engine, so support and growth teams can answer "why did this
//! user end up at this level" without touching production state.

mod commands;
mod replay;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gamifyctl")]
#[command(about = "Bvester gamification - catalog inspection and event replay", long_about = None)]
#[command(version)]
struct Cli {
    /// Catalog TOML file (defaults to the built-in catalog)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the loaded catalog: actions, levels, achievements, challenges
    Catalog,

    /// Replay a JSON-lines event file through a fresh engine
    Replay {
        /// Event file, one JSON object per line
        file: PathBuf,

        /// Print this user's final stats after the replay
        #[arg(long)]
        user: Option<String>,

        /// Leaderboard period to print (defaults to all-time)
        #[arg(long)]
        period: Option<String>,

        /// Leaderboard rows to print
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Dump emitted engine events as JSON lines instead of a summary
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Catalog => commands::catalog(cli.catalog.as_deref()),
        Commands::Replay {
            file,
            user,
            period,
            limit,
            json,
        } => commands::replay(
            cli.catalog.as_deref(),
            &file,
            user.as_deref(),
            period.as_deref(),
            limit,
            json,
        ),
    }
}
