//! Location lookup: detail payloads, name search and per-type listings

use super::{api_url, parse_rest_page};
use crate::config::ScrapeConfig;
use crate::error::{Error, Result};
use crate::http::Session;
use crate::listing::ListPager;
use crate::pagination::{Page, PageAccumulator, PagedFetcher, PaginationCursor};
use crate::record::{lenient_u64, LocationDetail};
use crate::seed::SeedRow;
use crate::types::{ContentType, LocationId};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

const DETAIL_PATH: &str = "/1.14/location/{{ location_id }}";
const TYPEAHEAD_PATH: &str = "/1.14/typeahead";

/// REST lookups that resolve seeds into locations
#[derive(Debug, Clone)]
pub struct LocationClient {
    api_base: String,
    site_base: String,
    language: String,
    list_page_size: u32,
}

impl LocationClient {
    pub fn new(config: &ScrapeConfig) -> Self {
        Self {
            api_base: config.endpoints.api_base.clone(),
            site_base: config.endpoints.site_base.clone(),
            language: config.language.clone(),
            list_page_size: config.list_page_size,
        }
    }

    /// Fetch the detail payload of one location
    pub async fn location_detail(
        &self,
        location_id: LocationId,
        session: &Session,
    ) -> Result<LocationDetail> {
        let url = api_url(&self.api_base, DETAIL_PATH, location_id)?;
        let request = session
            .api_request()
            .query("currency", "USD")
            .query("lang", &self.language);

        let body: Value = match session.client().get_json(&url, request).await {
            Ok(body) => body,
            Err(Error::HttpStatus { status: 404, .. }) => {
                return Err(Error::lookup(location_id.to_string(), "location not found"));
            }
            Err(e) => return Err(e),
        };

        if body.is_null() || body.as_object().is_some_and(serde_json::Map::is_empty) {
            return Err(Error::lookup(location_id.to_string(), "empty location payload"));
        }

        serde_json::from_value(body)
            .map_err(|e| Error::lookup(location_id.to_string(), format!("unreadable payload: {e}")))
    }

    /// Resolve a free-text location name, optionally constrained to a country
    pub async fn search(
        &self,
        name: &str,
        country: Option<&str>,
        session: &Session,
    ) -> Result<LocationId> {
        let url = format!("{}{TYPEAHEAD_PATH}", self.api_base.trim_end_matches('/'));
        let request = session
            .api_request()
            .query("query", name)
            .query("alternate_tag_name", true)
            .query("auto_broaden", true)
            .query("category_type", "neighborhoods,geos")
            .query("currency", "USD")
            .query("lang", &self.language)
            .json(Value::Object(serde_json::Map::new()));

        let body: Value = session.client().post_json(&url, request).await?;
        let results = body
            .get("data")
            .and_then(Value::as_array)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| Error::lookup(name, "no search results"))?;

        let found = match country {
            None => results
                .first()
                .and_then(|r| r.pointer("/result_object/location_id"))
                .and_then(lenient_u64),
            Some(country) => results
                .iter()
                .filter_map(|r| r.get("result_object"))
                .find(|location| matches_city_and_country(location, name, country))
                .and_then(|location| location.get("location_id"))
                .and_then(lenient_u64),
        };

        let id = found.ok_or_else(|| match country {
            Some(country) => Error::lookup(name, format!("no match in {country}")),
            None => Error::lookup(name, "first result has no location id"),
        })?;

        debug!(query = name, location_id = id, "Resolved location");
        Ok(id)
    }

    /// Seed rows for every location of one type under a geo
    pub async fn list_locations(
        &self,
        geo_id: LocationId,
        content_type: ContentType,
        session: &Session,
        accumulator: &PageAccumulator,
    ) -> Result<Vec<SeedRow>> {
        if content_type == ContentType::VacationRental {
            let url = ListPager::new(&self.site_base).first_page(geo_id)?;
            return Ok(vec![SeedRow::from_url(ContentType::VacationRental, url)]);
        }

        let fetcher = LocationListFetcher {
            api_base: self.api_base.clone(),
            language: self.language.clone(),
            page_size: self.list_page_size,
            content_type,
        };
        let items = accumulator.accumulate(geo_id, &fetcher, session).await?;

        let seeds: Vec<SeedRow> = items
            .iter()
            .filter_map(|item| item.get("location_id").and_then(lenient_u64))
            .map(|id| SeedRow::from_location(content_type, id))
            .collect();

        info!(geo_id, %content_type, count = seeds.len(), "Listed locations");
        Ok(seeds)
    }
}

fn matches_city_and_country(location: &Value, city: &str, country: &str) -> bool {
    let Some(last_ancestor) = location
        .get("ancestors")
        .and_then(Value::as_array)
        .and_then(|a| a.last())
    else {
        return false;
    };

    let ancestor_country = last_ancestor.get("name").and_then(Value::as_str);
    let location_name = location.get("name").and_then(Value::as_str);

    location_name.is_some_and(|n| n.eq_ignore_ascii_case(city.trim()))
        && ancestor_country.is_some_and(|c| c.eq_ignore_ascii_case(country.trim()))
}

/// Paged listing of hotels, restaurants or attractions under a geo
#[derive(Debug, Clone)]
struct LocationListFetcher {
    api_base: String,
    language: String,
    page_size: u32,
    content_type: ContentType,
}

#[async_trait]
impl PagedFetcher for LocationListFetcher {
    fn name(&self) -> &str {
        match self.content_type {
            ContentType::Hotel => "hotel_list",
            ContentType::Restaurant => "restaurant_list",
            _ => "attraction_list",
        }
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
        let path = match self.content_type {
            ContentType::Hotel => "/1.14/location/{{ location_id }}/all",
            ContentType::Restaurant => "/1.14/location/{{ location_id }}/restaurants",
            _ => "/1.14/location/{{ location_id }}/attractions",
        };
        let url = api_url(&self.api_base, path, location_id)?;

        let mut request = session
            .api_request()
            .query("currency", "USD")
            .query("lang", &self.language)
            .query("limit", cursor.limit)
            .query("offset", cursor.offset);
        if self.content_type == ContentType::Hotel {
            request = request.query("category", "hotels");
        }

        let body: Value = session.client().get_json(&url, request).await?;
        Ok(parse_rest_page(&body, cursor))
    }
}
