//! Category data sources

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::{CategoryHit, SearchMarketplace};
use crate::fields::custom::MIN_SEARCH_QUERY_LENGTH;
use crate::fields::definition::FieldDefinition;
use crate::settings::SearchSettings;

const SUCCESS_STATUS: &str = "success";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("category search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("category search returned status '{status}': {}", .message.as_deref().unwrap_or("no message"))]
    Envelope { status: String, message: Option<String> },

    #[error("category search is not configured: {0}")]
    NotConfigured(String),
}

/// Fields that depend on the selected category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeBlock {
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    /// Fields of the main form these replace while the block is shown
    #[serde(default)]
    pub remove_fields: Vec<String>,
}

#[async_trait]
pub trait CategorySource: Send + Sync {
    async fn search(&self, marketplace: SearchMarketplace, query: &str) -> Result<Vec<CategoryHit>, SearchError>;

    /// Display path of an Amazon browse node
    async fn node_path(&self, category_id: &str) -> Result<String, SearchError>;

    async fn attributes(&self, marketplace: SearchMarketplace, key: &str) -> Result<AttributeBlock, SearchError>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

/// Category lookups served over HTTP under `{base_url}/channel-lister/{marketplace}/...`
pub struct HttpCategorySource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCategorySource {
    pub fn new(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &SearchSettings) -> Result<Self, SearchError> {
        let base_url = settings
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| SearchError::NotConfigured("no search base URL set".to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self::new(base_url, http))
    }

    fn url(&self, marketplace: SearchMarketplace, tail: &str) -> String {
        format!("{}/channel-lister/{}/{}", self.base_url, marketplace.as_str(), tail)
    }

    async fn get<T: DeserializeOwned + Default>(&self, url: &str, query: &[(&str, &str)]) -> Result<T, SearchError> {
        log::debug!("GET {}", url);
        let envelope: Envelope<T> = self
            .http
            .get(url)
            .query(query)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if envelope.status != SUCCESS_STATUS {
            log::warn!("Category search at {} answered '{}'", url, envelope.status);
            return Err(SearchError::Envelope {
                status: envelope.status,
                message: envelope.message,
            });
        }

        Ok(envelope.data.unwrap_or_default())
    }
}

#[async_trait]
impl CategorySource for HttpCategorySource {
    async fn search(&self, marketplace: SearchMarketplace, query: &str) -> Result<Vec<CategoryHit>, SearchError> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_QUERY_LENGTH {
            return Ok(Vec::new());
        }

        let hits: Vec<CategoryHit> = self.get(&self.url(marketplace, "categories"), &[("q", query)]).await?;
        log::debug!("{} categories for '{}' on {}", hits.len(), query, marketplace);
        Ok(hits)
    }

    async fn node_path(&self, category_id: &str) -> Result<String, SearchError> {
        let tail = format!("nodes/{}/path", urlencoding::encode(category_id));
        self.get(&self.url(SearchMarketplace::Amazon, &tail), &[]).await
    }

    async fn attributes(&self, marketplace: SearchMarketplace, key: &str) -> Result<AttributeBlock, SearchError> {
        let tail = format!("attributes/{}", urlencoding::encode(key));
        self.get(&self.url(marketplace, &tail), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let envelope: Envelope<Vec<CategoryHit>> = serde_json::from_str(
            r#"{"status": "success", "data": [{"id": "1", "display_path": "Home > Kitchen"}]}"#,
        )
        .unwrap();
        assert_eq!(envelope.status, "success");
        assert_eq!(envelope.data.unwrap()[0].display_path, "Home > Kitchen");

        let envelope: Envelope<Vec<CategoryHit>> =
            serde_json::from_str(r#"{"status": "error", "message": "index offline"}"#).unwrap();
        assert!(envelope.data.is_none());
        assert_eq!(envelope.message.as_deref(), Some("index offline"));
    }

    #[test]
    fn test_missing_base_url_is_not_configured() {
        let settings = SearchSettings::default();
        assert!(matches!(
            HttpCategorySource::from_settings(&settings),
            Err(SearchError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn test_short_query_skips_request() {
        // Nothing listens on port 1; a request would fail
        let source = HttpCategorySource::new("http://127.0.0.1:1", reqwest::Client::new());
        assert!(source.search(SearchMarketplace::Walmart, " mu ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let source = HttpCategorySource::new("http://127.0.0.1:1/", reqwest::Client::new());
        let err = source.search(SearchMarketplace::Walmart, "mugs").await.unwrap_err();
        assert!(matches!(err, SearchError::Transport(_)));
    }
}
