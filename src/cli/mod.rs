pub mod onboard;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "LiftLog",
    about = "Workout log with 1RM progress, training calendar and CSV transfer"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Onboard {
        #[arg(long)]
        anonymous: bool,
    },
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    Status,
    Log {
        exercise: String,
        weight: String,
        reps: String,
        #[arg(long)]
        date: Option<String>,
    },
    Delete {
        id: i64,
    },
    History {
        #[arg(long)]
        limit: Option<usize>,
    },
    Calendar {
        #[arg(long)]
        month: Option<String>,
    },
    Progress {
        exercise: Option<String>,
    },
    Estimate {
        weight: String,
        reps: String,
    },
    Exercise {
        #[command(subcommand)]
        command: ExerciseCommands,
    },
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    Import {
        file: PathBuf,
    },
    Serve,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    Set { key: String, value: String },
    Get { key: String },
}

#[derive(Debug, Subcommand)]
pub enum ExerciseCommands {
    Add { name: String },
    List,
}
