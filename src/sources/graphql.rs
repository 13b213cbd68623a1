//! GraphQL review source (hotels, restaurants, vacation rentals)

use crate::config::ScrapeConfig;
use crate::error::{Error, Result};
use crate::http::Session;
use crate::pagination::{Page, PagedFetcher, PaginationCursor, ReviewSource};
use crate::record::{lenient_u64, Review};
use crate::types::LocationId;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;

const REVIEW_LIST_QUERY: &str = "query ReviewListQuery($locationId: Int!, $offset: Int, \
$limit: Int, $filters: [FilterConditionInput!], $prefs: ReviewListPrefsInput, \
$initialPrefs: ReviewListPrefsInput, $filterCacheKey: String, $prefsCacheKey: String, \
$keywordVariant: String!, $needKeywords: Boolean = true) { \
locations(locationIds: [$locationId]) { locationId name \
reviewList(page: {offset: $offset, limit: $limit}, filters: $filters, prefs: $prefs, \
initialPrefs: $initialPrefs, filterCacheKey: $filterCacheKey, prefsCacheKey: $prefsCacheKey) { \
totalCount reviews { id url location { locationId name } createdDate publishedDate \
userProfile { id userId: id username displayName \
hometown { fallbackString location { locationId additionalNames { long } name } } \
contributionCounts { sumReview } } \
rating title text language originalLanguage translationType helpfulVotes \
tripInfo { stayDate tripType } additionalRatings { rating ratingLabel } } } \
keywordCounts(keywordVariant: $keywordVariant) @include(if: $needKeywords) { keyword count } } }";

/// Rentals are served through the hotel review preferences as well
const PREFS_CACHE_KEY: &str = "hotelReviewPrefs";

/// Reviews from the site's batched GraphQL endpoint
#[derive(Debug, Clone)]
pub struct GraphQlReviewFetcher {
    name: &'static str,
    endpoint: String,
    page_size: u32,
    keyword_variant: String,
}

impl GraphQlReviewFetcher {
    fn named(name: &'static str, config: &ScrapeConfig) -> Self {
        Self {
            name,
            endpoint: format!(
                "{}/batched",
                config.endpoints.graphql_url.trim_end_matches('/')
            ),
            page_size: config.review_page_size,
            keyword_variant: format!("location_keywords_v2_llr_order_30_{}", config.language),
        }
    }

    /// Source for hotel and restaurant reviews
    pub fn hotels(config: &ScrapeConfig) -> Self {
        Self::named("graphql_reviews", config)
    }

    /// Source for vacation-rental reviews
    pub fn rentals(config: &ScrapeConfig) -> Self {
        Self::named("rental_reviews", config)
    }

    fn request_body(&self, location_id: LocationId, cursor: PaginationCursor) -> Value {
        json!([{
            "operationName": "ReviewListQuery",
            "variables": {
                "locationId": location_id,
                "offset": cursor.offset,
                "filters": [],
                "prefs": null,
                "initialPrefs": {},
                "limit": cursor.limit,
                "filterCacheKey": null,
                "prefsCacheKey": PREFS_CACHE_KEY,
                "needKeywords": false,
                "keywordVariant": self.keyword_variant,
            },
            "query": REVIEW_LIST_QUERY,
        }])
    }
}

#[async_trait]
impl PagedFetcher for GraphQlReviewFetcher {
    fn name(&self) -> &str {
        self.name
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
        let body = self.request_body(location_id, cursor);
        let response: Value = session
            .client()
            .post_json(&self.endpoint, session.graphql_request(body))
            .await?;

        parse_review_list(&response, cursor)
    }
}

impl ReviewSource for GraphQlReviewFetcher {
    fn date_field(&self) -> &str {
        "publishedDate"
    }

    fn to_review(&self, raw: &Value) -> Review {
        Review::from_graphql(raw)
    }
}

/// Read `[0].data.locations[0].reviewList` from a batched response
pub(crate) fn parse_review_list(response: &Value, cursor: PaginationCursor) -> Result<Page<Value>> {
    let batch = response
        .get(0)
        .ok_or_else(|| Error::decode("GraphQL response is not a non-empty batch"))?;

    let data = batch.get("data").filter(|d| !d.is_null());
    if let Some(errors) = batch.get("errors").filter(|e| !e.is_null()) {
        if data.is_none() {
            return Err(Error::graphql(errors.to_string()));
        }
        warn!("GraphQL returned partial errors: {errors}");
    }

    let Some(review_list) = data
        .and_then(|d| d.pointer("/locations/0/reviewList"))
        .filter(|r| !r.is_null())
    else {
        return Ok(Page::empty());
    };

    let items = review_list
        .get("reviews")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let total_count = review_list
        .get("totalCount")
        .and_then(lenient_u64)
        .unwrap_or(cursor.offset + items.len() as u64);
    let has_next = cursor.offset + u64::from(cursor.limit) < total_count;

    Ok(Page::new(items, total_count, has_next))
}
