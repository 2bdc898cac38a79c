use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::{
    config::{Config, LooperConfig},
    looper::{Looper, PortInfo},
    records::{LineState, LineStatusRecord},
};

/// The command line interface for serial looper.
///
/// Runs a looper fed by a mock port, logging everything delivered.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a configuration file
    pub config: Option<PathBuf>,

    /// Also log to daily rotated files in this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Log every delivery, not only line events
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Commands available in the command line interface.
#[derive(Subcommand)]
pub enum Commands {
    /// Examples for user convenience.
    #[clap(subcommand)]
    Examples(Examples),
}

/// Helpful examples for users.
#[derive(Subcommand, Clone)]
pub enum Examples {
    /// Show an example of a configuration file's contents.
    Config,

    /// Show an example JSON line event as handed to listeners.
    LineEvent,

    /// Show an example JSON stats report.
    Stats,
}

/// Print the requested example to stdout.
pub fn handle_command(command: Commands) -> color_eyre::Result<()> {
    match command {
        Commands::Examples(example) => match example {
            Examples::Config => {
                println!("{}", Config::example().serialize_pretty()?);
            }
            Examples::LineEvent => {
                let record = LineStatusRecord::new(LineState::DSR, LineState::CTS | LineState::DSR);
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
            Examples::Stats => {
                let looper = Looper::new(
                    LooperConfig {
                        data_capacity: 3,
                        ..Default::default()
                    },
                    PortInfo::new(1, "/dev/ttyExample"),
                )?;

                for word in ["A", "B", "C", "D", "E"] {
                    looper.insert_data(word.as_bytes());
                }
                looper.insert_line_event(LineState::CTS);

                println!("{}", serde_json::to_string_pretty(&looper.stats())?);
            }
        },
    }

    Ok(())
}

