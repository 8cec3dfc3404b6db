//! Amazon Selling Partner API: credentials, tokens, errors and requirements

pub mod client;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod requirements;
pub mod token;

pub use client::SpApiClient;
pub use credentials::{Region, SpApiConfigError, SpApiCredentials};
pub use error::{SpApiError, SpApiErrorKind};
pub use requirements::{missing_requirements, ListingRequirements, ProductTypeSummary};
pub use token::{CachedToken, LwaTokenProvider, TokenError, TokenManager, TokenProvider, TokenState, TokenStatus};

use anyhow::{Context, Result};
use std::time::Duration;

/// Shared HTTP client with pooled connections and timeouts
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .timeout(Duration::from_secs(constants::REQUEST_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("channel-lister/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}
