//! HTTP client module
//!
//! Retrying, rate-limited HTTP client and the per-entity [`Session`] built
//! on top of it.
//!
//! # Features
//!
//! - **Automatic Retries**: configurable retry logic with backoff
//! - **Rate Limiting**: token bucket rate limiter using governor
//! - **Sessions**: own cookie jar, proxy session id and security token

mod client;
mod rate_limit;
mod session;

pub use client::{HttpClient, HttpClientConfig, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use session::{Session, API_KEY_HEADER, SECURITY_TOKEN_HEADER};
