//! Entity assembly
//!
//! Turns one seed into one [`EntityRecord`]: entity detail, reviews
//! collected down to the cutoff date, keyword tags and the rating
//! histogram. Review and tag failures degrade to empty values; only a
//! failed detail lookup fails the entity.

mod place;
mod rental;

use crate::config::ScrapeConfig;
use crate::error::{Error, Result};
use crate::http::Session;
use crate::pagination::{PageAccumulator, ReviewCollector, ReviewSource};
use crate::record::{EntityRecord, Review, ReviewTags};
use crate::seed::SeedRow;
use crate::sources::{
    AttractionReviewFetcher, GraphQlReviewFetcher, KeywordFetcher, LocationClient,
};
use crate::types::{ContentType, LocationId};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Builds entity records for every content type
#[derive(Debug, Clone)]
pub struct EntityAssembler {
    config: Arc<ScrapeConfig>,
    locations: LocationClient,
    place_reviews: GraphQlReviewFetcher,
    rental_reviews: GraphQlReviewFetcher,
    attraction_reviews: AttractionReviewFetcher,
    keywords: KeywordFetcher,
    collector: ReviewCollector,
    accumulator: PageAccumulator,
}

impl EntityAssembler {
    pub fn new(config: Arc<ScrapeConfig>) -> Self {
        Self {
            locations: LocationClient::new(&config),
            place_reviews: GraphQlReviewFetcher::hotels(&config),
            rental_reviews: GraphQlReviewFetcher::rentals(&config),
            attraction_reviews: AttractionReviewFetcher::new(&config),
            keywords: KeywordFetcher::new(&config),
            collector: ReviewCollector::new(config.page_delay()),
            accumulator: PageAccumulator::new(config.page_delay(), config.max_list_pages),
            config,
        }
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    pub fn locations(&self) -> &LocationClient {
        &self.locations
    }

    pub fn accumulator(&self) -> &PageAccumulator {
        &self.accumulator
    }

    /// Build the record for one seed
    pub async fn assemble(&self, seed: &SeedRow, session: &Session) -> Result<EntityRecord> {
        match seed.content_type {
            ContentType::VacationRental => self.assemble_rental(seed, session).await,
            _ => {
                let location_id = seed.external_id.ok_or_else(|| {
                    Error::lookup(seed.label(), "seed has no location id")
                })?;
                let detail = self.locations.location_detail(location_id, session).await?;
                Ok(self.assemble_place(seed, &detail, session).await)
            }
        }
    }

    /// Review source serving a content type
    fn review_source(&self, content_type: ContentType) -> &dyn ReviewSource {
        match content_type {
            ContentType::Hotel | ContentType::Restaurant => &self.place_reviews,
            ContentType::Attraction => &self.attraction_reviews,
            ContentType::VacationRental => &self.rental_reviews,
        }
    }

    /// Reviews newer than the cutoff; empty when disabled or on failure
    async fn collect_reviews(
        &self,
        location_id: LocationId,
        content_type: ContentType,
        session: &Session,
    ) -> Vec<Review> {
        if !self.config.include_reviews {
            return Vec::new();
        }

        let source = self.review_source(content_type);
        match self
            .collector
            .collect(location_id, source, session, self.config.cutoff())
            .await
        {
            Ok(reviews) => {
                info!(location_id, %content_type, count = reviews.len(), "Collected reviews");
                reviews
            }
            Err(e) => {
                error!(location_id, %content_type, "Could not get reviews: {e}");
                Vec::new()
            }
        }
    }

    /// Keyword tags; empty when disabled or on failure
    async fn collect_tags(&self, location_id: LocationId, session: &Session) -> ReviewTags {
        if !self.config.include_tags {
            return ReviewTags::default();
        }

        match self
            .keywords
            .collect(location_id, session, &self.accumulator)
            .await
        {
            Ok(tags) => tags,
            Err(e) => {
                warn!(location_id, "Could not get review tags: {e}");
                ReviewTags::default()
            }
        }
    }
}

#[cfg(test)]
mod tests;
