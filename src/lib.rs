//! Cadence - a phase/skill/gate execution engine for guided work loops
//!
//! Cadence runs multi-phase loop definitions where each phase carries
//! skills and a trailing approval gate. Gates hold declarative guarantees
//! evaluated against a workspace, and an autonomous supervisor can pass
//! automatic gates unattended, escalating to a human when evidence never
//! materializes.

pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod id;
pub mod storage;
pub mod supervisor;
pub mod workspace;

pub use error::{CadenceError, Result};
