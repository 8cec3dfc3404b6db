//! Login with Amazon access tokens
//!
//! `TokenManager` hands out a cached access token and fetches a new one
//! through its `TokenProvider` once the cached token is inside the safety
//! margin. The cache is checked in memory first, then in the database when
//! persistence is enabled. No lock is held while a token is being fetched,
//! so concurrent refreshes may both hit the provider; the last write wins.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use super::constants::{DEFAULT_TOKEN_LIFETIME_SECS, LWA_TOKEN_URL, REQUEST_TIMEOUT_SECS, TOKEN_SAFETY_MARGIN_SECS};
use super::credentials::{SpApiConfigError, SpApiCredentials};
use crate::config::repository::tokens;
use crate::settings::AmazonSettings;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error(transparent)]
    Config(#[from] SpApiConfigError),

    #[error("access token request was rejected: {message}")]
    Authentication { status: Option<u16>, message: String },

    #[error("access token request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    pub token_type: String,
    pub obtained_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedToken")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("obtained_at", &self.obtained_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl CachedToken {
    pub fn new(access_token: impl Into<String>, token_type: impl Into<String>, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            access_token: access_token.into(),
            token_type: token_type.into(),
            obtained_at: now,
            expires_at: now + lifetime,
        }
    }

    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }

    /// Usable when more than `margin` of its lifetime is left
    pub fn is_valid_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.remaining_at(now) > margin
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenState {
    NoToken,
    Obtaining,
    Valid,
    Expiring,
    Expired,
    InvalidConfig,
}

impl std::fmt::Display for TokenState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            TokenState::NoToken => "no token",
            TokenState::Obtaining => "obtaining",
            TokenState::Valid => "valid",
            TokenState::Expiring => "expiring",
            TokenState::Expired => "expired",
            TokenState::InvalidConfig => "invalid configuration",
        };
        f.write_str(text)
    }
}

/// Snapshot of the cached token for status reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenStatus {
    pub obtained_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub expires_in_seconds: i64,
    pub is_valid: bool,
    pub token_type: String,
}

/// Source of fresh access tokens
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn fetch_token(&self) -> Result<CachedToken, TokenError>;
}

#[derive(Debug, Deserialize)]
struct LwaTokenResponse {
    access_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<i64>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Exchanges the refresh token for an access token at the LWA endpoint
pub struct LwaTokenProvider {
    http: reqwest::Client,
    credentials: SpApiCredentials,
    token_url: String,
}

impl LwaTokenProvider {
    pub fn new(credentials: SpApiCredentials, http: reqwest::Client) -> Self {
        Self {
            http,
            credentials,
            token_url: LWA_TOKEN_URL.to_string(),
        }
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }
}

/// Turn an LWA response into a token; rejections and malformed bodies are authentication errors
fn parse_token_response(status: u16, body: &str) -> Result<CachedToken, TokenError> {
    let parsed: LwaTokenResponse = serde_json::from_str(body).map_err(|e| TokenError::Authentication {
        status: Some(status),
        message: format!("malformed token response: {}", e),
    })?;

    if !(200..300).contains(&status) || parsed.error.is_some() {
        let message = match (parsed.error, parsed.error_description) {
            (Some(error), Some(description)) => format!("{}: {}", error, description),
            (Some(error), None) => error,
            (None, Some(description)) => description,
            (None, None) => format!("HTTP {}", status),
        };
        return Err(TokenError::Authentication {
            status: Some(status),
            message,
        });
    }

    let access_token = parsed
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| TokenError::Authentication {
            status: Some(status),
            message: "token response has no access_token".to_string(),
        })?;

    let lifetime = parsed.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
    Ok(CachedToken::new(
        access_token,
        parsed.token_type.unwrap_or_else(|| "bearer".to_string()),
        Duration::seconds(lifetime),
    ))
}

#[async_trait]
impl TokenProvider for LwaTokenProvider {
    async fn fetch_token(&self) -> Result<CachedToken, TokenError> {
        debug!("Requesting access token from {}", self.token_url);

        let response = self
            .http
            .post(&self.token_url)
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.credentials.refresh_token.as_str()),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("Token request status: {}", status);

        parse_token_response(status, &body)
    }
}

/// Counts one provider fetch for as long as it is alive, including when the
/// caller drops the request mid-fetch
struct FetchGuard<'a>(&'a AtomicUsize);

impl<'a> FetchGuard<'a> {
    fn enter(in_flight: &'a AtomicUsize) -> Self {
        in_flight.fetch_add(1, Ordering::SeqCst);
        Self(in_flight)
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct TokenStore {
    pool: SqlitePool,
    cache_key: String,
}

pub struct TokenManager {
    provider: Result<Arc<dyn TokenProvider>, SpApiConfigError>,
    cache: Arc<RwLock<Option<CachedToken>>>,
    in_flight: AtomicUsize,
    store: Option<TokenStore>,
    safety_margin: Duration,
}

impl TokenManager {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider: Ok(provider),
            cache: Arc::new(RwLock::new(None)),
            in_flight: AtomicUsize::new(0),
            store: None,
            safety_margin: Duration::seconds(TOKEN_SAFETY_MARGIN_SECS),
        }
    }

    /// A manager that reports `InvalidConfig` and fails every token request
    pub fn invalid(error: SpApiConfigError) -> Self {
        Self {
            provider: Err(error),
            cache: Arc::new(RwLock::new(None)),
            in_flight: AtomicUsize::new(0),
            store: None,
            safety_margin: Duration::seconds(TOKEN_SAFETY_MARGIN_SECS),
        }
    }

    /// LWA-backed manager from settings. Configuration problems are kept and
    /// reported through `state()` and `get_access_token()`.
    pub fn from_settings(settings: &AmazonSettings, http: reqwest::Client, pool: Option<SqlitePool>) -> Self {
        match SpApiCredentials::from_settings(settings) {
            Ok(credentials) => {
                let cache_key = credentials.cache_key();
                let manager = Self::new(Arc::new(LwaTokenProvider::new(credentials, http)));
                match pool {
                    Some(pool) if settings.persist_token => manager.with_store(pool, cache_key),
                    _ => manager,
                }
            }
            Err(error) => {
                warn!("Amazon SP-API is not usable: {}", error);
                Self::invalid(error)
            }
        }
    }

    /// Persist tokens in the database under `cache_key`
    pub fn with_store(mut self, pool: SqlitePool, cache_key: impl Into<String>) -> Self {
        self.store = Some(TokenStore {
            pool,
            cache_key: cache_key.into(),
        });
        self
    }

    pub fn safety_margin(&self) -> Duration {
        self.safety_margin
    }

    pub async fn state(&self) -> TokenState {
        if self.provider.is_err() {
            return TokenState::InvalidConfig;
        }
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            return TokenState::Obtaining;
        }

        let now = Utc::now();
        match self.cache.read().await.as_ref() {
            None => TokenState::NoToken,
            Some(token) if token.is_expired_at(now) => TokenState::Expired,
            Some(token) if !token.is_valid_at(now, self.safety_margin) => TokenState::Expiring,
            Some(_) => TokenState::Valid,
        }
    }

    /// A usable access token, fetching a new one when the cached token is
    /// missing or inside the safety margin
    pub async fn get_access_token(&self) -> Result<String, TokenError> {
        let provider = self.provider.as_ref().map_err(Clone::clone)?;
        let now = Utc::now();

        if let Some(token) = self.cache.read().await.as_ref() {
            if token.is_valid_at(now, self.safety_margin) {
                debug!("Using cached access token");
                return Ok(token.access_token.clone());
            }
            debug!("Cached access token is expiring, refreshing");
        }

        if let Some(token) = self.load_persisted(now).await {
            debug!("Using access token from database");
            let access_token = token.access_token.clone();
            *self.cache.write().await = Some(token);
            return Ok(access_token);
        }

        let fetched = {
            let _guard = FetchGuard::enter(&self.in_flight);
            provider.fetch_token().await
        };
        let token = fetched?;

        info!("Obtained access token, expires at {}", token.expires_at);
        self.persist(&token).await;
        let access_token = token.access_token.clone();
        *self.cache.write().await = Some(token);

        Ok(access_token)
    }

    /// Drop the cached token so the next request fetches a new one
    pub async fn invalidate_token(&self) {
        *self.cache.write().await = None;

        if let Some(store) = &self.store {
            if let Err(e) = tokens::delete(&store.pool, &store.cache_key).await {
                warn!("Failed to delete persisted token: {:#}", e);
            }
        }
    }

    /// Force a new token. Failures are logged and yield `None`.
    pub async fn refresh_access_token(&self) -> Option<String> {
        self.invalidate_token().await;
        match self.get_access_token().await {
            Ok(token) => Some(token),
            Err(e) => {
                warn!("Failed to refresh access token: {}", e);
                None
            }
        }
    }

    pub async fn get_token_info(&self) -> Option<TokenStatus> {
        let now = Utc::now();
        self.cache.read().await.as_ref().map(|token| TokenStatus {
            obtained_at: token.obtained_at,
            expires_at: token.expires_at,
            expires_in_seconds: token.remaining_at(now).num_seconds().max(0),
            is_valid: token.is_valid_at(now, self.safety_margin),
            token_type: token.token_type.clone(),
        })
    }

    /// Obtain a token to prove the credentials work
    pub async fn test_connection(&self) -> Result<(), TokenError> {
        self.get_access_token().await.map(|_| ())
    }

    async fn load_persisted(&self, now: DateTime<Utc>) -> Option<CachedToken> {
        let store = self.store.as_ref()?;
        match tokens::get(&store.pool, &store.cache_key).await {
            Ok(Some(token)) if token.is_valid_at(now, self.safety_margin) => Some(token),
            Ok(_) => None,
            Err(e) => {
                warn!("Failed to read persisted token: {:#}", e);
                None
            }
        }
    }

    async fn persist(&self, token: &CachedToken) {
        if let Some(store) = &self.store {
            if let Err(e) = tokens::save(&store.pool, &store.cache_key, token).await {
                warn!("Failed to persist access token: {:#}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    struct CountingProvider {
        calls: AtomicU32,
        lifetime_secs: i64,
    }

    #[async_trait]
    impl TokenProvider for CountingProvider {
        async fn fetch_token(&self) -> Result<CachedToken, TokenError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(CachedToken::new(format!("token-{}", n), "bearer", Duration::seconds(self.lifetime_secs)))
        }
    }

    fn counting(lifetime_secs: i64) -> Arc<CountingProvider> {
        Arc::new(CountingProvider {
            calls: AtomicU32::new(0),
            lifetime_secs,
        })
    }

    #[test]
    fn test_parse_token_response() {
        let token = parse_token_response(
            200,
            r#"{"access_token":"Atza|x","refresh_token":"Atzr|y","token_type":"bearer","expires_in":3600}"#,
        )
        .unwrap();
        assert_eq!(token.access_token, "Atza|x");
        assert_eq!((token.expires_at - token.obtained_at).num_seconds(), 3600);

        let err = parse_token_response(400, r#"{"error":"invalid_grant","error_description":"bad token"}"#)
            .unwrap_err();
        assert!(matches!(err, TokenError::Authentication { status: Some(400), ref message } if message == "invalid_grant: bad token"));

        assert!(matches!(
            parse_token_response(200, "<html>"),
            Err(TokenError::Authentication { .. })
        ));
        assert!(matches!(
            parse_token_response(200, r#"{"token_type":"bearer"}"#),
            Err(TokenError::Authentication { .. })
        ));
    }

    #[tokio::test]
    async fn test_cached_token_reused() {
        let provider = counting(3600);
        let manager = TokenManager::new(provider.clone());

        assert_eq!(manager.state().await, TokenState::NoToken);
        assert_eq!(manager.get_access_token().await.unwrap(), "token-1");
        assert_eq!(manager.get_access_token().await.unwrap(), "token-1");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(manager.state().await, TokenState::Valid);
    }

    #[tokio::test]
    async fn test_token_inside_safety_margin_is_refreshed() {
        let provider = counting(200);
        let manager = TokenManager::new(provider.clone());

        manager.get_access_token().await.unwrap();
        assert_eq!(manager.state().await, TokenState::Expiring);
        assert!(!manager.get_token_info().await.unwrap().is_valid);

        assert_eq!(manager.get_access_token().await.unwrap(), "token-2");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_once() {
        let provider = counting(-5);
        let manager = TokenManager::new(provider.clone());

        assert_eq!(manager.get_access_token().await.unwrap(), "token-1");
        assert_eq!(manager.state().await, TokenState::Expired);
        let info = manager.get_token_info().await.unwrap();
        assert_eq!(info.expires_in_seconds, 0);
        assert!(!info.is_valid);

        assert_eq!(manager.get_access_token().await.unwrap(), "token-2");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    /// Fetches that wait for a permit before answering
    struct GatedProvider {
        gate: tokio::sync::Semaphore,
        started: AtomicU32,
        finished: AtomicU32,
    }

    #[async_trait]
    impl TokenProvider for GatedProvider {
        async fn fetch_token(&self) -> Result<CachedToken, TokenError> {
            let n = self.started.fetch_add(1, Ordering::SeqCst) + 1;
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(CachedToken::new(format!("token-{}", n), "bearer", Duration::seconds(3600)))
        }
    }

    fn gated() -> Arc<GatedProvider> {
        Arc::new(GatedProvider {
            gate: tokio::sync::Semaphore::new(0),
            started: AtomicU32::new(0),
            finished: AtomicU32::new(0),
        })
    }

    async fn wait_for(counter: &AtomicU32, value: u32) {
        while counter.load(Ordering::SeqCst) < value {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
    }

    #[tokio::test]
    async fn test_obtaining_until_last_fetch_finishes() {
        let provider = gated();
        let manager = Arc::new(TokenManager::new(provider.clone()));

        let first = tokio::spawn({
            let manager = manager.clone();
            async move { manager.get_access_token().await }
        });
        let second = tokio::spawn({
            let manager = manager.clone();
            async move { manager.get_access_token().await }
        });
        wait_for(&provider.started, 2).await;
        assert_eq!(manager.state().await, TokenState::Obtaining);

        provider.gate.add_permits(1);
        wait_for(&provider.finished, 1).await;
        assert_eq!(manager.state().await, TokenState::Obtaining);

        provider.gate.add_permits(1);
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();
        assert_eq!(manager.state().await, TokenState::Valid);
    }

    #[tokio::test]
    async fn test_abandoned_fetch_does_not_stick_in_obtaining() {
        let provider = gated();
        let manager = TokenManager::new(provider.clone());

        let attempt =
            tokio::time::timeout(std::time::Duration::from_millis(20), manager.get_access_token()).await;
        assert!(attempt.is_err());
        assert_eq!(provider.started.load(Ordering::SeqCst), 1);
        assert_eq!(manager.state().await, TokenState::NoToken);
    }

    #[tokio::test]
    async fn test_refresh_and_invalidate() {
        let provider = counting(3600);
        let manager = TokenManager::new(provider.clone());

        manager.get_access_token().await.unwrap();
        assert_eq!(manager.refresh_access_token().await.as_deref(), Some("token-2"));

        manager.invalidate_token().await;
        assert_eq!(manager.state().await, TokenState::NoToken);
        assert!(manager.get_token_info().await.is_none());
    }

    #[tokio::test]
    async fn test_invalid_config() {
        let manager = TokenManager::invalid(SpApiConfigError::Missing("client id"));
        assert_eq!(manager.state().await, TokenState::InvalidConfig);
        assert!(matches!(manager.get_access_token().await, Err(TokenError::Config(_))));
        assert!(manager.refresh_access_token().await.is_none());
        assert!(manager.test_connection().await.is_err());
    }

    #[tokio::test]
    async fn test_token_info() {
        let manager = TokenManager::new(counting(3600));
        manager.test_connection().await.unwrap();

        let info = manager.get_token_info().await.unwrap();
        assert!(info.is_valid);
        assert!(info.expires_in_seconds > 3590 && info.expires_in_seconds <= 3600);
        assert_eq!(info.token_type, "bearer");
    }

    #[tokio::test]
    async fn test_persisted_token_survives_new_manager() {
        let config = crate::config::Config::new_test().await.unwrap();
        let provider = counting(3600);

        let first = TokenManager::new(provider.clone()).with_store(config.pool().clone(), "sp-api:test");
        assert_eq!(first.get_access_token().await.unwrap(), "token-1");

        let second = TokenManager::new(provider.clone()).with_store(config.pool().clone(), "sp-api:test");
        assert_eq!(second.get_access_token().await.unwrap(), "token-1");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let credentials = SpApiCredentials::from_settings(&AmazonSettings {
            client_id: Some("id".to_string()),
            client_secret: Some("secret".to_string()),
            refresh_token: Some("refresh".to_string()),
            ..AmazonSettings::default()
        })
        .unwrap();
        let provider = LwaTokenProvider::new(credentials, reqwest::Client::new())
            .with_token_url("http://127.0.0.1:1/auth/o2/token");

        assert!(matches!(provider.fetch_token().await, Err(TokenError::Transport(_))));
    }
}
