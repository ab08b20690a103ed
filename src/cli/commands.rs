//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - validate: check a loop definition file for structural problems
//! - inspect: summarize an archived execution snapshot
//! - simulate: run a definition through the engine end to end

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cadence - a phase/skill/gate execution engine for guided work loops
#[derive(Parser, Debug)]
#[command(name = "cadence")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a loop definition file
    Validate {
        /// Path to the loop definition YAML
        path: PathBuf,
    },

    /// Summarize an archived execution snapshot
    Inspect {
        /// Path to a snapshot JSON file
        path: PathBuf,

        /// Also print the execution log
        #[arg(short, long)]
        log: bool,
    },

    /// Run a definition through a full simulated execution
    Simulate {
        /// Path to the loop definition YAML
        path: PathBuf,

        /// Workspace root evaluated by gate guarantees
        #[arg(short, long, default_value = ".")]
        workspace: PathBuf,

        /// Write the terminal snapshot to this file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}
