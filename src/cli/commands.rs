//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Incremental travel-listings scraper
#[derive(Parser, Debug)]
#[command(name = "travelscrape")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON or YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline configuration JSON, takes precedence over --config
    #[arg(long, global = true)]
    pub config_json: Option<String>,

    /// Results file (JSON Lines), overrides the configured output
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Upstream API key
    #[arg(long, global = true, env = "TRAVELSCRAPE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scrape every seed and append records to the results file
    Run,

    /// Validate the configuration
    Validate,

    /// Resolve and print the seeds a run would process
    Seeds,

    /// Print the vacation-rental list page URLs after the first page
    Pages {
        /// Geo id of the listing
        location_id: u64,

        /// Page count shown on the first list page
        page_count: u32,
    },

    /// Append placeholders for seed rows missing from the results file
    Complete,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
