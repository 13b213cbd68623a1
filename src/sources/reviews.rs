//! REST review source (attractions)

use super::{api_url, parse_rest_page};
use crate::config::ScrapeConfig;
use crate::error::Result;
use crate::http::Session;
use crate::pagination::{Page, PagedFetcher, PaginationCursor, ReviewSource};
use crate::record::Review;
use crate::types::LocationId;
use async_trait::async_trait;
use serde_json::Value;

const REVIEWS_PATH: &str = "/1.14/location/{{ location_id }}/reviews";

/// Attraction reviews from the REST API, snake_case fields
#[derive(Debug, Clone)]
pub struct AttractionReviewFetcher {
    api_base: String,
    language: String,
    page_size: u32,
}

impl AttractionReviewFetcher {
    pub fn new(config: &ScrapeConfig) -> Self {
        Self {
            api_base: config.endpoints.api_base.clone(),
            language: config.language.clone(),
            page_size: config.attraction_review_page_size,
        }
    }
}

#[async_trait]
impl PagedFetcher for AttractionReviewFetcher {
    fn name(&self) -> &str {
        "attraction_reviews"
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    async fn fetch(
        &self,
        location_id: LocationId,
        cursor: PaginationCursor,
        session: &Session,
    ) -> Result<Page<Value>> {
        let url = api_url(&self.api_base, REVIEWS_PATH, location_id)?;
        let request = session
            .api_request()
            .query("limit", cursor.limit)
            .query("offset", cursor.offset)
            .query("lang", &self.language);

        let body: Value = session.client().get_json(&url, request).await?;
        Ok(parse_rest_page(&body, cursor))
    }
}

impl ReviewSource for AttractionReviewFetcher {
    fn date_field(&self) -> &str {
        "published_date"
    }

    fn to_review(&self, raw: &Value) -> Review {
        Review::from_rest(raw)
    }
}
