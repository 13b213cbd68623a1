// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # travelscrape
//!
//! Incremental scraper for travel listings: hotels, restaurants,
//! attractions and vacation rentals, with date-bounded review pagination.
//!
//! ## Features
//!
//! - **Incremental Reviews**: review pages are walked newest-first and the
//!   walk stops at the first review older than the last seen date
//! - **Multiple Sources**: GraphQL and REST review sources behind one
//!   paged-fetch trait
//! - **Seeds**: CSV from a local file or a Google Sheets export, or a
//!   location search
//! - **Sessions**: one HTTP client, cookie jar and proxy session per entity
//! - **JSON Lines Output**: append-only, one record per line, with
//!   placeholders for seed rows that produced nothing
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use travelscrape::config::ScrapeConfig;
//! use travelscrape::engine::Crawler;
//! use travelscrape::sink::JsonlSink;
//!
//! #[tokio::main]
//! async fn main() -> travelscrape::Result<()> {
//!     let config = ScrapeConfig::from_path("run.yaml")?;
//!     config.validate()?;
//!
//!     let sink = Arc::new(JsonlSink::open(&config.output).await?);
//!     let stats = Crawler::new(Arc::new(config), sink).run().await?;
//!     println!("{} records", stats.records_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            Crawler                              │
//! │  seeds → expand rental lists → assemble (concurrent) → complete │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │   Seed   │   HTTP    │  Pagination   │  Sources  │    Sink     │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ CSV file │ Session   │ Boundary scan │ GraphQL   │ JSON Lines  │
//! │ Sheets   │ Retry     │ Review loop   │ REST      │ Placeholders│
//! │ Search   │ Rate Limit│ Accumulate    │ Keywords  │             │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Run configuration
pub mod config;

/// Template interpolation
pub mod template;

/// HTTP client, rate limiting and sessions
pub mod http;

/// HTML extraction
pub mod extract;

/// Review pagination and boundary detection
pub mod pagination;

/// Output records
pub mod record;

/// Upstream review, keyword and location sources
pub mod sources;

/// Vacation-rental list pages
pub mod listing;

/// Seed rows
pub mod seed;

/// Record sinks
pub mod sink;

/// Entity assembly
pub mod assemble;

/// Main execution engine
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::ScrapeConfig;
pub use engine::{Crawler, RunStats};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
