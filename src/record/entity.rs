//! Entity records
//!
//! [`LocationDetail`] is the upstream location payload as received.
//! [`EntityRecord`] is what gets written to the sink.

use super::review::{lenient_u64, Review};
use crate::extract::RentalPage;
use crate::types::{ContentType, LocationId};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// Upstream Detail
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Named {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAward {
    #[serde(default)]
    pub year: Option<Value>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DayRange {
    #[serde(default)]
    pub open_time: Option<Value>,
    #[serde(default)]
    pub close_time: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Hours {
    #[serde(default)]
    pub week_ranges: Option<Vec<Vec<DayRange>>>,
}

/// Location payload from the REST API; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocationDetail {
    pub location_id: Option<Value>,
    pub name: Option<String>,
    pub photo: Option<Value>,
    pub awards: Option<Vec<RawAward>>,
    pub ranking_position: Option<Value>,
    pub price_level: Option<String>,
    pub price: Option<String>,
    pub ranking_category: Option<Value>,
    pub rating: Option<Value>,
    pub hotel_class: Option<Value>,
    pub hotel_class_attribution: Option<Value>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub amenities: Option<Vec<Named>>,
    pub latitude: Option<Value>,
    pub longitude: Option<Value>,
    pub web_url: Option<String>,
    pub website: Option<String>,
    pub ranking: Option<String>,
    pub num_reviews: Option<Value>,
    pub ranking_denominator: Option<Value>,
    pub is_closed: Option<bool>,
    pub is_long_closed: Option<bool>,
    pub cuisine: Option<Vec<Named>>,
    #[serde(alias = "mealTypes")]
    pub meal_types: Option<Vec<Named>>,
    pub hours: Option<Hours>,
    pub rating_histogram: Option<Value>,
}

impl LocationDetail {
    /// Numeric id, whether sent as a number or a string
    pub fn id(&self) -> Option<LocationId> {
        self.location_id.as_ref().and_then(lenient_u64)
    }
}

fn names(list: Option<&Vec<Named>>) -> Vec<String> {
    list.map(|l| l.iter().filter_map(|n| n.name.clone()).collect())
        .unwrap_or_default()
}

// ============================================================================
// Output Pieces
// ============================================================================

/// Award as written to the sink
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Award {
    pub year: Option<Value>,
    pub name: Option<String>,
}

/// One opening range of a day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpeningRange {
    pub open: Option<Value>,
    pub close: Option<Value>,
}

/// Review keyword frequencies
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewTags {
    /// Keyword to number of reviews mentioning it
    pub frequencies: BTreeMap<String, u64>,
    /// Keywords in upstream order
    pub labels: Vec<String>,
}

impl ReviewTags {
    /// Build from keyword items `{text, review_count}`
    pub fn from_keywords(items: &[Value]) -> Self {
        let mut tags = Self::default();
        for item in items {
            let Some(text) = item.get("text").and_then(Value::as_str) else {
                continue;
            };
            let count = item.get("review_count").and_then(lenient_u64).unwrap_or(0);
            tags.frequencies.insert(text.to_string(), count);
            tags.labels.push(text.to_string());
        }
        tags
    }
}

/// Count of ratings per star, 1 to 5
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingHistogram(pub [u64; 5]);

impl RatingHistogram {
    /// Read `count_1`..`count_5`; absent buckets are zero
    pub fn from_raw(raw: Option<&Value>) -> Self {
        let mut counts = [0; 5];
        if let Some(raw) = raw {
            for (star, count) in counts.iter_mut().enumerate() {
                *count = raw
                    .get(format!("count_{}", star + 1))
                    .and_then(lenient_u64)
                    .unwrap_or(0);
            }
        }
        Self(counts)
    }

    pub fn count(&self, star: usize) -> u64 {
        star.checked_sub(1)
            .and_then(|i| self.0.get(i))
            .copied()
            .unwrap_or(0)
    }
}

impl Serialize for RatingHistogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        for (i, count) in self.0.iter().enumerate() {
            map.serialize_entry(&(i + 1).to_string(), count)?;
        }
        map.end()
    }
}

// ============================================================================
// Entity Detail
// ============================================================================

/// Fields shared by hotels, restaurants and attractions
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDetail {
    pub name: Option<String>,
    pub photo: Option<Value>,
    pub awards: Vec<Award>,
    pub ranking_position: Option<Value>,
    pub price_level: Option<String>,
    pub price: Option<String>,
    pub category: Option<Value>,
    pub rating: Option<Value>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub latitude: Option<Value>,
    pub longitude: Option<Value>,
    pub web_url: Option<String>,
    pub website: Option<String>,
    pub ranking_string: Option<String>,
    pub number_of_reviews: Option<Value>,
    pub ranking_denominator: Option<Value>,
    /// Per-criterion notes from the site page, hotels and restaurants only
    pub about_rating_notes: BTreeMap<String, f64>,
    #[serde(flatten)]
    pub extras: PlaceExtras,
}

/// Hotel and attraction fields
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LodgingExtras {
    pub hotel_class: Option<Value>,
    pub hotel_class_attribution: Option<Value>,
    pub amenities: Vec<String>,
}

/// Restaurant fields
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantExtras {
    pub is_closed: Option<bool>,
    pub is_long_closed: Option<bool>,
    pub cuisine: Vec<String>,
    pub meal_types: Vec<String>,
    pub hours: Vec<Vec<OpeningRange>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PlaceExtras {
    Lodging(LodgingExtras),
    Restaurant(RestaurantExtras),
}

impl PlaceDetail {
    /// Map an upstream location payload for the given content type
    pub fn from_location(detail: &LocationDetail, content_type: ContentType) -> Self {
        let extras = match content_type {
            ContentType::Restaurant => PlaceExtras::Restaurant(RestaurantExtras {
                is_closed: detail.is_closed,
                is_long_closed: detail.is_long_closed,
                cuisine: names(detail.cuisine.as_ref()),
                meal_types: names(detail.meal_types.as_ref()),
                hours: opening_hours(detail),
            }),
            _ => PlaceExtras::Lodging(LodgingExtras {
                hotel_class: detail.hotel_class.clone(),
                hotel_class_attribution: detail.hotel_class_attribution.clone(),
                amenities: names(detail.amenities.as_ref()),
            }),
        };

        Self {
            name: detail.name.clone(),
            photo: detail.photo.clone(),
            awards: detail
                .awards
                .iter()
                .flatten()
                .map(|a| Award {
                    year: a.year.clone(),
                    name: a.display_name.clone(),
                })
                .collect(),
            ranking_position: detail.ranking_position.clone(),
            price_level: detail.price_level.clone(),
            price: detail.price.clone(),
            category: detail.ranking_category.clone(),
            rating: detail.rating.clone(),
            phone: detail.phone.clone(),
            address: detail.address.clone(),
            email: detail.email.clone(),
            latitude: detail.latitude.clone(),
            longitude: detail.longitude.clone(),
            web_url: detail.web_url.clone(),
            website: detail.website.clone(),
            ranking_string: detail.ranking.clone(),
            number_of_reviews: detail.num_reviews.clone(),
            ranking_denominator: detail.ranking_denominator.clone(),
            about_rating_notes: BTreeMap::new(),
            extras,
        }
    }
}

fn opening_hours(detail: &LocationDetail) -> Vec<Vec<OpeningRange>> {
    let Some(weeks) = detail.hours.as_ref().and_then(|h| h.week_ranges.as_ref()) else {
        return Vec::new();
    };

    weeks
        .iter()
        .map(|day| {
            day.iter()
                .map(|r| OpeningRange {
                    open: r.open_time.clone(),
                    close: r.close_time.clone(),
                })
                .collect()
        })
        .collect()
}

/// Vacation-rental fields read from its detail page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalDetail {
    pub name: Option<String>,
    pub description: Option<String>,
    pub area_served: Option<Value>,
    pub image: Option<Value>,
    pub rating: Option<Value>,
    pub number_of_reviews: Option<Value>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub amenities: Vec<String>,
    pub category: Option<String>,
    pub price_per_night: Option<String>,
    #[serde(rename = "chambres")]
    pub bedrooms: Option<String>,
    #[serde(rename = "salles_de_bains")]
    pub bathrooms: Option<String>,
    #[serde(rename = "personnes")]
    pub guests: Option<String>,
    #[serde(rename = "nuits")]
    pub minimum_nights: Option<String>,
    pub web_url: String,
}

impl RentalDetail {
    pub fn from_page(page: RentalPage, web_url: impl Into<String>) -> Self {
        Self {
            name: page.name,
            description: page.description,
            area_served: page.area_served,
            image: page.image,
            rating: page.rating,
            number_of_reviews: page.number_of_reviews,
            latitude: page.latitude,
            longitude: page.longitude,
            amenities: page.amenities,
            category: page.category,
            price_per_night: page.price_per_night,
            bedrooms: page.bedrooms,
            bathrooms: page.bathrooms,
            guests: page.guests,
            minimum_nights: page.minimum_nights,
            web_url: web_url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityDetail {
    Place(PlaceDetail),
    Rental(RentalDetail),
}

// ============================================================================
// Records
// ============================================================================

/// One assembled entity, written to the sink exactly once
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub row_id: Option<String>,
    #[serde(rename = "id_datatourisme")]
    pub id_datatourisme: Option<String>,
    #[serde(rename = "id_tripadvisor")]
    pub id_tripadvisor: LocationId,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    #[serde(flatten)]
    pub detail: EntityDetail,
    pub reviews: Vec<Review>,
    pub tags_object: BTreeMap<String, u64>,
    pub tags_array: Vec<String>,
    pub rating_histogram: RatingHistogram,
}

impl EntityRecord {
    /// Attach collected tags
    pub fn set_tags(&mut self, tags: ReviewTags) {
        self.tags_object = tags.frequencies;
        self.tags_array = tags.labels;
    }
}

/// Marker for a seed row that produced no entity record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderRecord {
    pub row_id: String,
}
