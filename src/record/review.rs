//! Normalized review
//!
//! Both review shapes the upstream returns (GraphQL camelCase and REST
//! snake_case) normalize into one [`Review`]. Missing fields fall back to
//! defaults instead of failing.

use crate::pagination::parse_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reviewer summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub username: String,
    pub helpful_votes: u64,
    pub location: Option<String>,
    pub contributions: Option<u64>,
}

/// One review, immutable once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub text: String,
    pub title: String,
    pub rating: Option<f64>,
    /// Publication date as sent by the upstream
    pub published_date: Option<String>,
    pub travel_date: Option<String>,
    pub author: Option<Author>,
    pub language: String,
    pub machine_translated: bool,
    pub subratings: Option<Value>,
}

impl Review {
    /// Build from a GraphQL `reviewList.reviews[]` item
    pub fn from_graphql(raw: &Value) -> Self {
        let author = raw.get("userProfile").filter(|v| v.is_object()).map(|profile| {
            let hometown = profile.get("hometown");
            let location = hometown
                .and_then(|h| h.pointer("/location/additionalNames/long"))
                .or_else(|| hometown.and_then(|h| h.get("fallbackString")))
                .and_then(Value::as_str)
                .map(str::to_string);

            Author {
                username: str_field(profile, "username")
                    .or_else(|| str_field(profile, "displayName"))
                    .unwrap_or_default(),
                helpful_votes: raw.get("helpfulVotes").and_then(lenient_u64).unwrap_or(0),
                location,
                contributions: profile
                    .pointer("/contributionCounts/sumReview")
                    .and_then(lenient_u64),
            }
        });

        let machine_translated = raw
            .get("translationType")
            .and_then(Value::as_str)
            .is_some_and(|t| t.eq_ignore_ascii_case("machine"));

        Self {
            text: str_field(raw, "text").unwrap_or_default(),
            title: str_field(raw, "title").unwrap_or_default(),
            rating: raw.get("rating").and_then(lenient_f64),
            published_date: str_field(raw, "publishedDate"),
            travel_date: raw
                .pointer("/tripInfo/stayDate")
                .and_then(Value::as_str)
                .map(str::to_string),
            author,
            language: str_field(raw, "language").unwrap_or_default(),
            machine_translated,
            subratings: raw
                .get("additionalRatings")
                .filter(|v| !v.is_null())
                .cloned(),
        }
    }

    /// Build from a REST `data[]` review item
    pub fn from_rest(raw: &Value) -> Self {
        let author = raw.get("user").filter(|v| v.is_object()).map(|user| Author {
            username: str_field(user, "username").unwrap_or_default(),
            helpful_votes: user.get("helpful_votes").and_then(lenient_u64).unwrap_or(0),
            location: user
                .pointer("/user_location/name")
                .and_then(Value::as_str)
                .map(str::to_string),
            contributions: None,
        });

        Self {
            text: str_field(raw, "text").unwrap_or_default(),
            title: str_field(raw, "title").unwrap_or_default(),
            rating: raw.get("rating").and_then(lenient_f64),
            published_date: str_field(raw, "published_date"),
            travel_date: str_field(raw, "travel_date"),
            author,
            language: str_field(raw, "lang").unwrap_or_default(),
            machine_translated: raw
                .get("machine_translated")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            subratings: raw.get("subratings").filter(|v| !v.is_null()).cloned(),
        }
    }

    /// Publication date parsed to a calendar date
    pub fn published_on(&self) -> Option<NaiveDate> {
        self.published_date.as_deref().and_then(parse_date)
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Number that may arrive as a JSON number or a numeric string
pub(crate) fn lenient_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Float that may arrive as a JSON number or a numeric string
pub(crate) fn lenient_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
