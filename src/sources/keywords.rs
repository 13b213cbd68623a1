//! Review keyword source

use super::{api_url, parse_rest_page};
use crate::config::ScrapeConfig;
use crate::error::Result;
use crate::http::Session;
use crate::pagination::{Page, PageAccumulator, PagedFetcher, PaginationCursor};
use crate::record::ReviewTags;
use crate::types::LocationId;
use async_trait::async_trait;
use serde_json::Value;

const KEYWORDS_PATH: &str = "/1.14/location/{{ location_id }}/keywords";

/// Keyword frequencies for a location; pages carry no date order
#[derive(Debug, Clone)]
pub struct KeywordFetcher {
    api_base: String,
    language: String,
    page_size: u32,
}

impl KeywordFetcher {
    pub fn new(config: &ScrapeConfig) -> Self {
        Self {
            api_base: config.endpoints.api_base.clone(),
            language: config.language.clone(),
            page_size: config.tag_page_size,
        }
    }

    /// Drain every keyword page into tags
    pub async fn collect(
        &self,
        location_id: LocationId,
        session: &Session,
        accumulator: &PageAccumulator,
    ) -> Result<ReviewTags> {
        let items = accumulator.accumulate(location_id, self, session).await?;
        Ok(ReviewTags::from_keywords(&items))
    }
}

#[async_trait]
impl PagedFetcher for KeywordFetcher {
    fn name(&self) -> &str {
        "keywords"
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
        let url = api_url(&self.api_base, KEYWORDS_PATH, location_id)?;
        let request = session
            .api_request()
            .query("currency", "USD")
            .query("lang", &self.language)
            .query("limit", cursor.limit)
            .query("offset", cursor.offset);

        let body: Value = session.client().get_json(&url, request).await?;
        Ok(parse_rest_page(&body, cursor))
    }
}
