//! CLI module for hubdrift.
//!
//! This module provides the command-line interface for detecting and
//! deploying content hub updates.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
