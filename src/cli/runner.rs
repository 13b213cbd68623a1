//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::ScrapeConfig;
use crate::engine::Crawler;
use crate::error::{Error, Result};
use crate::listing::ListPager;
use crate::seed::SeedRow;
use crate::sink::{self, JsonlSink, MemorySink};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run => self.scrape().await,
            Commands::Validate => self.validate(),
            Commands::Seeds => self.seeds().await,
            Commands::Pages {
                location_id,
                page_count,
            } => self.pages(*location_id, *page_count),
            Commands::Complete => self.complete().await,
        }
    }

    /// Load configuration and apply command-line overrides
    fn load_config(&self) -> Result<ScrapeConfig> {
        let mut config = if let Some(json_str) = &self.cli.config_json {
            ScrapeConfig::from_json_str(json_str)?
        } else if let Some(path) = &self.cli.config {
            ScrapeConfig::from_path(path)?
        } else {
            return Err(Error::config(
                "Configuration not specified (use -C or --config-json)",
            ));
        };

        if let Some(ref key) = self.cli.api_key {
            config.api_key = Some(key.clone());
        }
        if let Some(ref output) = self.cli.output {
            config.output = output.clone();
        }

        Ok(config)
    }

    /// Load and validate configuration
    fn load_valid_config(&self) -> Result<Arc<ScrapeConfig>> {
        let config = self.load_config()?;
        config.validate()?;
        Ok(Arc::new(config))
    }

    /// Scrape every seed into the results file
    async fn scrape(&self) -> Result<()> {
        let config = self.load_valid_config()?;
        let sink = Arc::new(JsonlSink::open(&config.output).await?);
        info!(output = %sink.path().display(), "Writing records");

        let crawler = Crawler::new(config.clone(), sink);
        let stats = crawler.run().await?;

        self.output_message(&json!({
            "type": "RUN_SUMMARY",
            "summary": {
                "status": if stats.entities_failed == 0 { "SUCCEEDED" } else { "PARTIAL" },
                "stats": stats,
                "output": config.output.to_string_lossy(),
            }
        }));

        Ok(())
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        let config = self.load_valid_config()?;

        let source = if config.seed_file.is_some() {
            "seed file"
        } else if config.googlesheet_link.is_some() {
            "spreadsheet"
        } else {
            "location search"
        };
        let types: Vec<&str> = config
            .enabled_types()
            .iter()
            .map(|t| t.as_str())
            .collect();

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Configuration is valid: seeds from {source}, types [{}], reviews {}",
                    types.join(", "),
                    match config.cutoff() {
                        Some(date) => format!("since {date}"),
                        None if config.include_reviews => "all".to_string(),
                        None => "disabled".to_string(),
                    }
                )
            }
        }));

        Ok(())
    }

    /// Print resolved seeds
    async fn seeds(&self) -> Result<()> {
        let config = self.load_valid_config()?;
        let crawler = Crawler::new(config, Arc::new(MemorySink::new()));

        let seeds = crawler.resolve_seeds().await?;
        for seed in &seeds {
            self.output_message(&json!({
                "type": "SEED",
                "seed": seed_json(seed),
            }));
        }

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!("Resolved {} seeds", seeds.len())
            }
        }));

        Ok(())
    }

    /// Print rental list page URLs
    fn pages(&self, location_id: u64, page_count: u32) -> Result<()> {
        // site base only; the config is optional here
        let site_base = match self.load_config() {
            Ok(config) => config.endpoints.site_base,
            Err(_) => ScrapeConfig::default().endpoints.site_base,
        };

        let pager = ListPager::new(&site_base);
        let mut urls = vec![pager.first_page(location_id)?];
        urls.extend(pager.discover_pages(location_id, page_count)?);

        self.output_message(&json!({
            "type": "PAGES",
            "pages": {
                "location_id": location_id,
                "page_count": page_count,
                "urls": urls,
            }
        }));

        Ok(())
    }

    /// Append placeholders for seed rows missing from the results file
    async fn complete(&self) -> Result<()> {
        let config = self.load_valid_config()?;
        let sink = Arc::new(JsonlSink::open(&config.output).await?);
        let crawler = Crawler::new(config.clone(), sink.clone());

        let seeds = crawler.resolve_seeds().await?;
        let written = sink::complete_missing(&seeds, sink.as_ref()).await?;

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Appended {written} placeholders to {}",
                    config.output.display()
                )
            }
        }));

        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

fn seed_json(seed: &SeedRow) -> Value {
    json!({
        "rowId": seed.row_id,
        "type": seed.content_type,
        "id_tripadvisor": seed.external_id,
        "url_tripadvisor": seed.source_url,
        "id_datatourisme": seed.id_datatourisme,
    })
}
