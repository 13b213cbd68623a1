//! CLI module
//!
//! Command-line interface for running scrapes.
//!
//! # Commands
//!
//! - `run` - Scrape every seed and append records to the results file
//! - `validate` - Check the configuration
//! - `seeds` - Print the seeds a run would process
//! - `pages` - Print rental list page URLs for a geo
//! - `complete` - Append placeholders for seed rows with no record

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
