//! Command-line interface for cadence.
//!
//! Provides subcommands for validating loop definitions, inspecting
//! archived snapshots, and simulating an execution end to end.

pub mod commands;

pub use commands::Cli;
