//! Execution engine module
//!
//! # Overview
//!
//! [`Crawler`] drives a whole run:
//! 1. resolve seeds (seed file, sheet, or location search + listings)
//! 2. expand vacation-rental list pages into listing seeds
//! 3. assemble every seed concurrently, each with its own [`Session`]
//! 4. append placeholders for seed rows that produced nothing

mod types;

pub use types::{Outcome, RunStats};

use crate::assemble::EntityAssembler;
use crate::config::ScrapeConfig;
use crate::error::Result;
use crate::extract;
use crate::http::{RequestConfig, Session};
use crate::listing::{geo_id, is_rental_list_url, ListPager};
use crate::seed::{self, SeedRow};
use crate::sink::{self, RecordSink};
use crate::types::ContentType;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Run driver
pub struct Crawler {
    config: Arc<ScrapeConfig>,
    assembler: EntityAssembler,
    sink: Arc<dyn RecordSink>,
    next_session: AtomicU64,
}

impl Crawler {
    pub fn new(config: Arc<ScrapeConfig>, sink: Arc<dyn RecordSink>) -> Self {
        Self {
            assembler: EntityAssembler::new(config.clone()),
            config,
            sink,
            next_session: AtomicU64::new(1),
        }
    }

    /// Open a fresh session with its own id
    pub fn open_session(&self) -> Result<Session> {
        let id = self.next_session.fetch_add(1, Ordering::Relaxed);
        Session::new(format!("s{id}"), &self.config)
    }

    /// Resolve, expand and process every seed, then complete missing rows
    pub async fn run(&self) -> Result<RunStats> {
        let seeds = self.resolve_seeds().await?;
        self.run_seeds(&seeds).await
    }

    /// Process the given seeds, then complete missing rows
    pub async fn run_seeds(&self, seeds: &[SeedRow]) -> Result<RunStats> {
        let start = Instant::now();
        let mut stats = RunStats::new();

        let work = self.expand(seeds).await;
        stats.seeds = work.len();
        info!(
            seeds = work.len(),
            concurrency = self.config.max_concurrency,
            "Starting crawl"
        );

        let outcomes: Vec<Result<Outcome>> = stream::iter(work.iter())
            .map(|seed| self.process(seed))
            .buffer_unordered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        for outcome in outcomes {
            stats.record(&outcome?);
        }

        stats.placeholders_written = sink::complete_missing(seeds, self.sink.as_ref()).await?;
        stats.set_duration(start.elapsed().as_millis() as u64);

        info!(
            written = stats.records_written,
            failed = stats.entities_failed,
            reviews = stats.reviews_collected,
            placeholders = stats.placeholders_written,
            "Crawl finished"
        );
        Ok(stats)
    }

    /// Seeds named by the configuration, restricted to enabled types
    pub async fn resolve_seeds(&self) -> Result<Vec<SeedRow>> {
        let session = self.open_session()?;

        let seeds = if self.config.seed_file.is_some() || self.config.googlesheet_link.is_some() {
            seed::load_seeds(&self.config, &session).await?
        } else if let Some(ref name) = self.config.location_full_name {
            self.seeds_for_location(name, &session).await?
        } else {
            Vec::new()
        };

        let (kept, dropped): (Vec<SeedRow>, Vec<SeedRow>) = seeds
            .into_iter()
            .partition(|s| self.config.includes(s.content_type));
        if !dropped.is_empty() {
            debug!(count = dropped.len(), "Ignoring seeds of disabled types");
        }
        Ok(kept)
    }

    async fn seeds_for_location(&self, name: &str, session: &Session) -> Result<Vec<SeedRow>> {
        let locations = self.assembler.locations();
        let geo = locations
            .search(name, self.config.country.as_deref(), session)
            .await?;
        info!(query = name, geo, "Resolved search location");

        let mut seeds = Vec::new();
        for content_type in self.config.enabled_types() {
            match locations
                .list_locations(geo, content_type, session, self.assembler.accumulator())
                .await
            {
                Ok(mut found) => seeds.append(&mut found),
                Err(e) => error!(geo, %content_type, "Could not list locations: {e}"),
            }
        }
        Ok(seeds)
    }

    /// Replace rental list-page seeds by one seed per listing they link to.
    /// Listings inherit the list seed's row id.
    pub async fn expand(&self, seeds: &[SeedRow]) -> Vec<SeedRow> {
        let mut work = Vec::with_capacity(seeds.len());

        for seed in seeds {
            let list_url = seed
                .source_url
                .as_deref()
                .filter(|url| seed.content_type == ContentType::VacationRental && is_rental_list_url(url));

            match list_url {
                Some(url) => match self.expand_rental_list(url, seed).await {
                    Ok(mut listings) => work.append(&mut listings),
                    Err(e) => error!(url, "Could not read rental list: {e}"),
                },
                None => work.push(seed.clone()),
            }
        }

        work
    }

    async fn expand_rental_list(&self, url: &str, seed: &SeedRow) -> Result<Vec<SeedRow>> {
        let session = self.open_session()?;
        let site_base = &self.config.endpoints.site_base;

        let html = session.client().get_text(url, RequestConfig::new()).await?;
        let first = extract::parse_rental_list(&html, site_base);
        let mut detail_urls = first.detail_urls;

        let geo = geo_id(url).or(seed.external_id);
        if let (Some(geo), Some(last_page)) = (geo, first.last_page) {
            let pages = ListPager::new(site_base).discover_pages(geo, last_page)?;
            debug!(geo, pages = pages.len(), "Walking rental list pages");

            for page_url in pages {
                tokio::time::sleep(self.config.page_delay()).await;
                match session.client().get_text(&page_url, RequestConfig::new()).await {
                    Ok(html) => {
                        for url in extract::parse_rental_list(&html, site_base).detail_urls {
                            if !detail_urls.contains(&url) {
                                detail_urls.push(url);
                            }
                        }
                    }
                    Err(e) => warn!(url = %page_url, "Skipping rental list page: {e}"),
                }
            }
        }

        info!(url, listings = detail_urls.len(), "Expanded rental list");
        Ok(detail_urls
            .into_iter()
            .map(|detail| SeedRow {
                row_id: seed.row_id.clone(),
                id_datatourisme: seed.id_datatourisme.clone(),
                ..SeedRow::from_url(ContentType::VacationRental, detail)
            })
            .collect())
    }

    /// Assemble and write one entity. Entity failures are logged and
    /// reported as [`Outcome::Failed`]; only sink failures are errors.
    async fn process(&self, seed: &SeedRow) -> Result<Outcome> {
        let mut session = match self.open_session() {
            Ok(session) => session,
            Err(e) => {
                error!(seed = %seed.label(), "Could not open session: {e}");
                return Ok(Outcome::Failed);
            }
        };

        if self.needs_security_token(seed.content_type) {
            if let Err(e) = session.bootstrap(&self.config.endpoints).await {
                warn!(session = session.id(), "Session bootstrap failed: {e}");
            }
        }

        match self.assembler.assemble(seed, &session).await {
            Ok(record) => {
                let reviews = record.reviews.len();
                sink::push(self.sink.as_ref(), &record).await?;
                debug!(seed = %seed.label(), reviews, "Record written");
                Ok(Outcome::Written { reviews })
            }
            Err(e) => {
                error!(seed = %seed.label(), "Could not assemble entity: {e}");
                Ok(Outcome::Failed)
            }
        }
    }

    fn needs_security_token(&self, content_type: ContentType) -> bool {
        self.config.include_reviews && content_type != ContentType::Attraction
    }
}
