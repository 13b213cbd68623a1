//! Run configuration
//!
//! A single immutable [`ScrapeConfig`] is loaded once per run, validated,
//! wrapped in an `Arc` and threaded through every component.

use crate::error::{Error, Result};
use crate::types::{BackoffType, ContentType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Input options for one scrape run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrapeConfig {
    /// Location to search when no spreadsheet is given (e.g. "Lyon, France")
    pub location_full_name: Option<String>,

    /// Country used to disambiguate `location_full_name`
    pub country: Option<String>,

    /// Google Sheets link holding the seed rows
    pub googlesheet_link: Option<String>,

    /// Local CSV file holding the seed rows
    pub seed_file: Option<PathBuf>,

    pub include_hotels: bool,
    pub include_restaurants: bool,
    pub include_attractions: bool,
    pub include_vacation_rentals: bool,

    /// Fetch reviews for every entity
    pub include_reviews: bool,

    /// Fetch review keyword frequencies for every entity
    pub include_tags: bool,

    /// Reviews published before this date are not collected
    pub last_review_date: Option<NaiveDate>,

    /// Site language (e.g. "en", "fr")
    pub language: String,

    /// Upstream API key
    pub api_key: Option<String>,

    pub proxy_configuration: ProxyConfig,

    /// Page size for GraphQL review pages
    pub review_page_size: u32,

    /// Page size for attraction review pages
    pub attraction_review_page_size: u32,

    /// Page size for keyword pages
    pub tag_page_size: u32,

    /// Page size for location list pages
    pub list_page_size: u32,

    /// Upper bound on pages accumulated from non-date-ordered sources
    pub max_list_pages: u32,

    /// Delay between successive page fetches of one entity
    pub page_delay_ms: u64,

    /// Number of entities processed concurrently
    pub max_concurrency: usize,

    pub endpoints: EndpointConfig,

    pub http: HttpSettings,

    /// JSON Lines file receiving the records
    pub output: PathBuf,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            location_full_name: None,
            country: None,
            googlesheet_link: None,
            seed_file: None,
            include_hotels: true,
            include_restaurants: true,
            include_attractions: true,
            include_vacation_rentals: true,
            include_reviews: true,
            include_tags: true,
            last_review_date: None,
            language: "en".to_string(),
            api_key: None,
            proxy_configuration: ProxyConfig::default(),
            review_page_size: 20,
            attraction_review_page_size: 50,
            tag_page_size: 50,
            list_page_size: 30,
            max_list_pages: 200,
            page_delay_ms: 300,
            max_concurrency: 4,
            endpoints: EndpointConfig::default(),
            http: HttpSettings::default(),
            output: PathBuf::from("results.jsonl"),
        }
    }
}

impl ScrapeConfig {
    /// Parse a config from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("Invalid config JSON: {e}")))
    }

    /// Parse a config from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::config(format!("Invalid config YAML: {e}")))
    }

    /// Load a config file, choosing the format from the extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&contents),
            _ => Self::from_json_str(&contents),
        }
    }

    /// Check the config before any fetching begins
    pub fn validate(&self) -> Result<()> {
        if self.location_full_name.is_none()
            && self.googlesheet_link.is_none()
            && self.seed_file.is_none()
        {
            return Err(Error::config(
                "At least one of locationFullName, googlesheetLink or seedFile must be set",
            ));
        }

        if self.enabled_types().is_empty() {
            return Err(Error::config(
                "At least one of includeHotels, includeRestaurants, includeAttractions \
                 or includeVacationRentals must be true",
            ));
        }

        if self.language.trim().is_empty() {
            return Err(Error::invalid_value("language", "must not be empty"));
        }

        for (field, value) in [
            ("reviewPageSize", self.review_page_size),
            ("attractionReviewPageSize", self.attraction_review_page_size),
            ("tagPageSize", self.tag_page_size),
            ("listPageSize", self.list_page_size),
        ] {
            if value == 0 {
                return Err(Error::invalid_value(field, "must be greater than zero"));
            }
        }

        if self.max_concurrency == 0 {
            return Err(Error::invalid_value(
                "maxConcurrency",
                "must be greater than zero",
            ));
        }

        self.proxy_configuration.validate()?;

        Ok(())
    }

    /// Content types enabled for this run
    pub fn enabled_types(&self) -> Vec<ContentType> {
        ContentType::ALL
            .into_iter()
            .filter(|t| self.includes(*t))
            .collect()
    }

    /// Whether a content type is enabled
    pub fn includes(&self, content_type: ContentType) -> bool {
        match content_type {
            ContentType::Hotel => self.include_hotels,
            ContentType::Restaurant => self.include_restaurants,
            ContentType::Attraction => self.include_attractions,
            ContentType::VacationRental => self.include_vacation_rentals,
        }
    }

    /// Review cutoff date, if incremental collection is requested
    pub fn cutoff(&self) -> Option<NaiveDate> {
        self.last_review_date
    }

    /// Delay between page fetches
    pub fn page_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.page_delay_ms)
    }
}

// ============================================================================
// Proxy
// ============================================================================

/// Proxy and session-grouping options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyConfig {
    /// Route requests through the proxy
    pub use_proxy: bool,

    /// Proxy groups to request
    pub groups: Vec<String>,

    /// Proxy password
    pub password: Option<String>,

    /// Proxy host and port
    pub host: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            use_proxy: false,
            groups: Vec::new(),
            password: None,
            host: "proxy.apify.com:8000".to_string(),
        }
    }
}

impl ProxyConfig {
    fn validate(&self) -> Result<()> {
        if self.use_proxy && self.password.as_deref().unwrap_or("").is_empty() {
            return Err(Error::missing_field("proxyConfiguration.password"));
        }
        if self.use_proxy {
            self.base_url()?;
        }
        Ok(())
    }

    fn base_url(&self) -> Result<Url> {
        Url::parse(&format!("http://{}", self.host))
            .ok()
            .filter(|url| url.has_host())
            .ok_or_else(|| Error::invalid_value("proxyConfiguration.host", "not a host[:port]"))
    }

    /// Proxy URL pinned to one session id, so every request of a session
    /// leaves through the same exit IP
    pub fn proxy_url(&self, session_id: &str) -> Option<String> {
        if !self.use_proxy {
            return None;
        }
        let password = self.password.as_deref()?;

        let username = if self.groups.is_empty() {
            format!("session-{session_id}")
        } else {
            format!("groups-{},session-{session_id}", self.groups.join("+"))
        };

        let mut url = self.base_url().ok()?;
        url.set_username(&username).ok()?;
        url.set_password(Some(password)).ok()?;
        Some(url.into())
    }
}

// ============================================================================
// Endpoints
// ============================================================================

/// Upstream base URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EndpointConfig {
    /// REST API base (`/1.14/location/...` paths are appended)
    pub api_base: String,

    /// GraphQL endpoint base (`/batched` is appended)
    pub graphql_url: String,

    /// Public site base, used for listing pages
    pub site_base: String,

    /// Site page fetched to open a session
    pub bootstrap_path: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.tripadvisor.com/api/internal".to_string(),
            graphql_url: "https://www.tripadvisor.co.uk/data/graphql".to_string(),
            site_base: "https://www.tripadvisor.com".to_string(),
            bootstrap_path: "/Hotels-g28953-New_York-Hotels.html".to_string(),
        }
    }
}

impl EndpointConfig {
    /// Point every endpoint at one base URL (used against mock servers)
    pub fn all_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            api_base: format!("{base}/api/internal"),
            graphql_url: format!("{base}/data/graphql"),
            site_base: base.to_string(),
            ..Self::default()
        }
    }
}

// ============================================================================
// HTTP Settings
// ============================================================================

/// HTTP client options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpSettings {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Retries for retryable failures
    pub max_retries: u32,

    /// Backoff strategy between retries
    pub backoff: BackoffType,

    /// Initial backoff delay in milliseconds
    pub initial_backoff_ms: u64,

    /// Requests per second per session (0 disables the limiter)
    pub requests_per_second: u32,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            backoff: BackoffType::Exponential,
            initial_backoff_ms: 500,
            requests_per_second: 5,
        }
    }
}
