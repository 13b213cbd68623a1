//! Common types used throughout travelscrape
//!
//! Shared type aliases and small enums used across modules.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// Numeric location identifier used by the upstream API
pub type LocationId = u64;

// ============================================================================
// Content Type
// ============================================================================

/// Kind of place being scraped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Hotel,
    Restaurant,
    Attraction,
    VacationRental,
}

impl ContentType {
    /// All content types, in the order they are reported
    pub const ALL: [ContentType; 4] = [
        ContentType::Hotel,
        ContentType::Restaurant,
        ContentType::Attraction,
        ContentType::VacationRental,
    ];

    /// Label used in output records and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Hotel => "hotel",
            ContentType::Restaurant => "restaurant",
            ContentType::Attraction => "attraction",
            ContentType::VacationRental => "vacation_rental",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = Error;

    /// Accepts the labels found in seed spreadsheets, case-insensitive
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "hotel" | "hotels" => Ok(ContentType::Hotel),
            "restaurant" | "restaurants" => Ok(ContentType::Restaurant),
            "attraction" | "attractions" | "things to do" => Ok(ContentType::Attraction),
            "vacation rental" | "vacation rentals" => Ok(ContentType::VacationRental),
            _ => Err(Error::parse("type", format!("unknown content type '{s}'"))),
        }
    }
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Backoff strategy for HTTP retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Same delay every attempt
    Constant,
    /// Delay grows by the initial delay every attempt
    Linear,
    /// Delay doubles every attempt
    #[default]
    Exponential,
}
