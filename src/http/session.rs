//! Per-entity HTTP identity
//!
//! A [`Session`] bundles one client (with its own cookie jar and proxy
//! session id), the site security token and the API key. Every entity is
//! processed with a fresh session; sessions are never shared.

use super::client::{HttpClient, HttpClientConfig, RequestConfig};
use crate::config::{EndpointConfig, ScrapeConfig};
use crate::error::Result;
use crate::extract;
use serde_json::Value;
use tracing::{debug, warn};

/// Header carrying the upstream API key
pub const API_KEY_HEADER: &str = "X-TripAdvisor-API-Key";

/// Header carrying the site security token on GraphQL calls
pub const SECURITY_TOKEN_HEADER: &str = "x-requested-by";

/// One entity's HTTP identity
#[derive(Debug)]
pub struct Session {
    id: String,
    client: HttpClient,
    security_token: Option<String>,
    api_key: Option<String>,
}

impl Session {
    /// Open a session for the given id, pinning the proxy to it
    pub fn new(id: impl Into<String>, config: &ScrapeConfig) -> Result<Self> {
        let id = id.into();
        let client_config = HttpClientConfig {
            proxy: config.proxy_configuration.proxy_url(&id),
            ..HttpClientConfig::from_settings(&config.http)
        };

        let client = HttpClient::with_config(client_config)?;
        Ok(Self::from_client(id, client, config.api_key.clone()))
    }

    /// Wrap an existing client
    pub fn from_client(id: impl Into<String>, client: HttpClient, api_key: Option<String>) -> Self {
        Self {
            id: id.into(),
            client,
            security_token: None,
            api_key,
        }
    }

    /// Set the security token explicitly
    #[must_use]
    pub fn with_security_token(mut self, token: impl Into<String>) -> Self {
        self.security_token = Some(token.into());
        self
    }

    /// Fetch a site page to pick up cookies and the security token
    pub async fn bootstrap(&mut self, endpoints: &EndpointConfig) -> Result<()> {
        let url = format!(
            "{}{}",
            endpoints.site_base.trim_end_matches('/'),
            endpoints.bootstrap_path
        );
        let html = self.client.get_text(&url, RequestConfig::new()).await?;

        match extract::security_token(&html) {
            Some(token) => {
                debug!(session = %self.id, "Security token acquired");
                self.security_token = Some(token);
            }
            None => warn!(session = %self.id, "No security token on {url}, continuing without it"),
        }

        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    pub fn security_token(&self) -> Option<&str> {
        self.security_token.as_deref()
    }

    /// Request template for REST API calls
    pub fn api_request(&self) -> RequestConfig {
        match self.api_key {
            Some(ref key) => RequestConfig::new().header(API_KEY_HEADER, key.clone()),
            None => RequestConfig::new(),
        }
    }

    /// Request template for GraphQL calls
    pub fn graphql_request(&self, body: Value) -> RequestConfig {
        let request = RequestConfig::new().json(body);
        match self.security_token {
            Some(ref token) => request.header(SECURITY_TOKEN_HEADER, token.clone()),
            None => request,
        }
    }
}
